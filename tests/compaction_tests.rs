//! Properties of history compaction.

use serde_json::json;

use toolloop::agent_loop::keep_only;
use toolloop::types::{validate_tool_pairing, Message, Role, ToolCall, ToolResult};

/// A conversation of `rounds` tool exchanges behind one system prompt.
fn conversation(rounds: usize) -> Vec<Message> {
    let mut messages = vec![Message::system("You are terse."), Message::user("start")];
    for round in 0..rounds {
        let id = format!("call_{round}");
        messages.push(Message::assistant_with_tool_calls(
            format!("step {round}"),
            vec![ToolCall {
                id: id.clone(),
                name: "step".into(),
                input: json!({ "round": round }),
            }],
        ));
        messages.push(Message::tool_results(vec![ToolResult::success(
            id,
            json!(round),
        )]));
    }
    messages.push(Message::assistant("finished"));
    messages
}

#[test]
fn scenario_keeps_system_and_latest_messages() {
    let messages = vec![
        Message::system("S"),
        Message::user("U1"),
        Message::assistant("A1"),
        Message::user("U2"),
        Message::assistant("A2"),
    ];
    let kept = keep_only(&messages, 3);
    let texts: Vec<&str> = kept.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec!["S", "U2", "A2"]);
}

#[test]
fn never_exceeds_bound_when_system_fits() {
    let messages = conversation(5);
    for max in 1..=messages.len() + 2 {
        let kept = keep_only(&messages, max);
        assert!(kept.len() <= max, "max={max} kept={}", kept.len());
    }
}

#[test]
fn system_messages_always_survive() {
    let messages = conversation(4);
    for max in 0..=messages.len() {
        let kept = keep_only(&messages, max);
        assert_eq!(kept[0].role, Role::System, "max={max}");
        assert_eq!(kept.iter().filter(|m| m.role == Role::System).count(), 1);
    }
}

#[test]
fn kept_history_never_opens_with_orphaned_result() {
    let messages = conversation(6);
    for max in 0..=messages.len() {
        let kept = keep_only(&messages, max);
        let first_non_system = kept.iter().find(|m| m.role != Role::System);
        if let Some(first) = first_non_system {
            assert!(!first.is_tool_result(), "max={max}");
        }
        validate_tool_pairing(&kept).unwrap_or_else(|e| panic!("max={max}: {e}"));
    }
}

#[test]
fn keeps_a_suffix_in_original_order() {
    let messages = conversation(3);
    let kept = keep_only(&messages, 4);
    let tail = &kept[1..];
    let start = messages.len() - tail.len();
    assert_eq!(tail, &messages[start..]);
}

#[test]
fn compaction_is_idempotent() {
    let messages = conversation(5);
    for max in 0..=messages.len() {
        let once = keep_only(&messages, max);
        assert_eq!(keep_only(&once, max), once, "max={max}");
    }
}

#[test]
fn empty_history_stays_empty() {
    assert!(keep_only(&[], 0).is_empty());
    assert!(keep_only(&[], 5).is_empty());
}
