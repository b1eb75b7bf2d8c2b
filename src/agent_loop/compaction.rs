use crate::types::{Message, Role};

/// Trim `messages` to at most `max_messages`, newest first.
///
/// System messages are always kept, each one taking the slot of a non-system
/// message. Leading tool-result turns whose calls were cut are dropped so
/// the retained history never opens with an orphaned result. Relative order
/// is preserved. A list already within the bound is returned unchanged.
pub fn keep_only(messages: &[Message], max_messages: usize) -> Vec<Message> {
    if messages.len() <= max_messages {
        return messages.to_vec();
    }

    let system_count = messages.iter().filter(|m| m.role == Role::System).count();
    let budget = max_messages.saturating_sub(system_count);

    let non_system: Vec<usize> = messages
        .iter()
        .enumerate()
        .filter(|(_, m)| m.role != Role::System)
        .map(|(idx, _)| idx)
        .collect();

    let mut cut = non_system.len().saturating_sub(budget);
    while cut < non_system.len() && messages[non_system[cut]].is_tool_result() {
        cut += 1;
    }
    let first_kept = non_system.get(cut).copied().unwrap_or(messages.len());

    messages
        .iter()
        .enumerate()
        .filter(|(idx, m)| m.role == Role::System || *idx >= first_kept)
        .map(|(_, m)| m.clone())
        .collect()
}
