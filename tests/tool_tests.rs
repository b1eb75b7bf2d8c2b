//! Tests for the tool system.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use toolloop::agent_loop::PendingToolUse;
use toolloop::error::LoopError;
use toolloop::tools::*;

fn ctx() -> ToolContext {
    ToolContext::default()
}

fn search_params() -> ToolParameters {
    ToolParameters::object()
        .string("query", "Search query", true)
        .integer("limit", "Max results", false)
        .default_value(json!(10))
        .boolean("verbose", "Enable verbose output", false)
        .build()
}

#[test]
fn parameter_builder_constructs_schema() {
    let schema = search_params().to_json_schema();
    assert_eq!(schema["type"], "object");
    assert_eq!(schema["properties"]["query"]["type"], "string");
    assert_eq!(schema["properties"]["limit"]["type"], "integer");
    assert_eq!(schema["required"], json!(["query"]));
}

#[test]
fn parameter_builder_string_enum() {
    let params = ToolParameters::object()
        .string_enum("format", "Output format", &["json", "text", "csv"], true)
        .build();

    let schema = params.to_json_schema();
    let enums = schema["properties"]["format"]["enum"].as_array().unwrap();
    assert_eq!(enums.len(), 3);
}

#[test]
fn context_parameter_is_hidden_from_model() {
    let params = ToolParameters::object()
        .context("ctx")
        .string("path", "File path", true)
        .build();
    let schema = params.to_json_schema();
    assert!(schema["properties"].get("ctx").is_none());
    assert_eq!(schema["required"], json!(["path"]));
}

#[test]
fn empty_parameters() {
    let params = ToolParameters::empty();
    assert!(params.is_empty());
    assert_eq!(params.to_json_schema()["type"], "object");
}

#[test]
fn binding_fills_defaults_and_ignores_extra_keys() {
    let args = bind_arguments(
        "search",
        &search_params(),
        &json!({"query": "rust", "unexpected": 1}),
        &ctx(),
    )
    .unwrap();

    assert_eq!(args.len(), 3);
    assert_eq!(args.get_str("query").unwrap(), "rust");
    assert_eq!(args.get_i64("limit").unwrap(), 10);
    assert_eq!(args.raw("verbose"), Some(&serde_json::Value::Null));
    assert!(args.raw("unexpected").is_none());
    assert_eq!(args.to_value(), json!({"query": "rust", "limit": 10, "verbose": null}));
}

#[test]
fn binding_accepts_stringified_and_null_input() {
    let params = ToolParameters::object()
        .string("city", "City", false)
        .build();
    let args = bind_arguments("w", &params, &json!("{\"city\":\"Oslo\"}"), &ctx()).unwrap();
    assert_eq!(args.get_str("city").unwrap(), "Oslo");

    let args = bind_arguments("w", &params, &serde_json::Value::Null, &ctx()).unwrap();
    assert!(args.get_str_opt("city").is_none());
}

#[test]
fn binding_rejects_missing_required_and_wrong_types() {
    let err = bind_arguments("search", &search_params(), &json!({}), &ctx()).unwrap_err();
    assert!(
        matches!(&err, LoopError::SchemaBinding { message, .. } if message.contains("query")),
        "{err}"
    );

    let err = bind_arguments(
        "search",
        &search_params(),
        &json!({"query": "x", "limit": "ten"}),
        &ctx(),
    )
    .unwrap_err();
    assert!(matches!(err, LoopError::SchemaBinding { .. }));

    let err = bind_arguments("search", &search_params(), &json!([1, 2]), &ctx()).unwrap_err();
    assert!(matches!(err, LoopError::SchemaBinding { .. }));
}

#[test]
fn nullable_parameter_accepts_explicit_null() {
    let params = ToolParameters::object()
        .string("note", "Optional note", true)
        .nullable()
        .build();
    let args = bind_arguments("n", &params, &json!({"note": null}), &ctx()).unwrap();
    assert_eq!(args.raw("note"), Some(&serde_json::Value::Null));
}

#[test]
fn nested_objects_and_arrays_are_checked() {
    let address = ToolParameters::object()
        .string("city", "City", true)
        .build();
    let params = ToolParameters::object()
        .object("address", "Postal address", address, true)
        .array("tags", "Tags", ParameterKind::String, false)
        .build();

    assert!(bind_arguments(
        "p",
        &params,
        &json!({"address": {"city": "Oslo"}, "tags": ["a", "b"]}),
        &ctx()
    )
    .is_ok());
    assert!(bind_arguments("p", &params, &json!({"address": {}}), &ctx()).is_err());
    assert!(bind_arguments(
        "p",
        &params,
        &json!({"address": {"city": "Oslo"}, "tags": ["a", 2]}),
        &ctx()
    )
    .is_err());
}

#[test]
fn bound_arguments_deserialize_into_struct() {
    #[derive(Deserialize)]
    struct Search {
        query: String,
        limit: i64,
    }

    let args = bind_arguments("search", &search_params(), &json!({"query": "q"}), &ctx()).unwrap();
    let search: Search = args.deserialize().unwrap();
    assert_eq!(search.query, "q");
    assert_eq!(search.limit, 10);
}

#[test]
fn context_accessor_requires_declaration() {
    let args = bind_arguments("search", &search_params(), &json!({"query": "q"}), &ctx()).unwrap();
    assert!(matches!(args.context(), Err(LoopError::InvalidState(_))));

    let params = ToolParameters::object().context("ctx").build();
    let shared = ctx();
    let args = bind_arguments("c", &params, &json!({}), &shared).unwrap();
    args.context().unwrap().cancel();
    assert!(shared.is_cancelled());
}

#[test]
fn schema_document_derives_descriptor() {
    let tool = Tool::from_schema(
        "lookup",
        "Look up a key",
        json!({
            "type": "object",
            "properties": {
                "key": {"type": "string", "description": "Key"},
                "fresh": {"type": "boolean"}
            },
            "required": ["key"]
        }),
        |args| async move { Ok(args.get_str("key")?.len()) },
    )
    .unwrap();

    let params = tool.parameters().params();
    assert_eq!(params[0].name, "key");
    assert!(params[0].required);
    assert_eq!(params[1].kind, ParameterKind::Boolean);
    assert_eq!(tool.definition().parameters["properties"]["fresh"]["type"], "boolean");
}

#[test]
fn unrepresentable_schema_is_rejected() {
    let result = Tool::from_schema(
        "bad",
        "Bad schema",
        json!({"type": "array"}),
        |_args| async move { Ok(()) },
    );
    assert!(result.is_err());
}

#[test]
fn tool_set_rejects_duplicates_and_bad_names() {
    let make = |name: &str| Tool::new(name, "t", ToolParameters::empty(), |_| async { Ok(()) });

    let err = ToolSet::new(vec![make("same"), make("same")]).unwrap_err();
    assert!(matches!(err, LoopError::InvalidTool(_)));
    assert!(ToolSet::new(vec![make("has space")]).is_err());
    assert!(ToolSet::new(vec![make("")]).is_err());

    let set = ToolSet::new(vec![make("b_tool"), make("a-tool")]).unwrap();
    let names: Vec<String> = set.definitions().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["b_tool", "a-tool"]);
    assert!(set.get("a-tool").is_some());
    assert!(set.get("A-tool").is_none());
}

fn counter_tool(calls: Arc<AtomicUsize>) -> Tool {
    Tool::new(
        "count",
        "Count",
        ToolParameters::object().integer("by", "Step", true).build(),
        move |args| {
            let calls = calls.clone();
            async move {
                let by = args.get_i64("by")?;
                Ok(calls.fetch_add(by as usize, Ordering::SeqCst) + by as usize)
            }
        },
    )
}

#[tokio::test]
async fn use_tool_invokes_bound_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tools = ToolSet::new(vec![counter_tool(calls.clone())]).unwrap();
    let pending = PendingToolUse::new("c1", "count", json!({"by": 3}));

    let outcome = use_tool(&tools, &pending, &ctx(), InvokeOptions::default())
        .await
        .unwrap();

    assert!(matches!(outcome, ToolOutcome::Success(ref v) if v == &json!(3)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let result = outcome.into_tool_result("c1").unwrap();
    assert!(!result.is_error);
}

#[tokio::test]
async fn use_tool_sentinels_when_ignoring() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tools = ToolSet::new(vec![counter_tool(calls.clone())]).unwrap();
    let options = InvokeOptions {
        ignore_unknown_tools: true,
        ignore_invalid_schema: true,
    };

    let unknown = PendingToolUse::new("u1", "nope", json!({}));
    let outcome = use_tool(&tools, &unknown, &ctx(), options).await.unwrap();
    assert!(matches!(outcome, ToolOutcome::UnknownTool(ref v) if v == &json!(UNKNOWN_TOOL_RESULT)));

    let invalid = PendingToolUse::new("i1", "count", json!({"by": "three"}));
    let outcome = use_tool(&tools, &invalid, &ctx(), options).await.unwrap();
    assert!(matches!(outcome, ToolOutcome::InvalidInput(ref v) if v == &json!(INVALID_INPUT_RESULT)));
    assert!(outcome.into_tool_result("i1").unwrap().is_error);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn use_tool_gates_on_approval() {
    let calls = Arc::new(AtomicUsize::new(0));
    let tools = ToolSet::new(vec![counter_tool(calls.clone()).requiring_approval()]).unwrap();
    let mut pending = PendingToolUse::new("a1", "count", json!({"by": 1}));

    let outcome = use_tool(&tools, &pending, &ctx(), InvokeOptions::default())
        .await
        .unwrap();
    assert!(matches!(outcome, ToolOutcome::ApprovalRequired));
    assert!(outcome.into_tool_result("a1").is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    pending.approved = true;
    use_tool(&tools, &pending, &ctx(), InvokeOptions::default())
        .await
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn handler_failure_is_tool_execution_error() {
    let tool = Tool::new("boom", "Fails", ToolParameters::empty(), |_| async {
        Err::<(), _>(LoopError::InvalidState("disk full".into()))
    });
    let tools = ToolSet::new(vec![tool]).unwrap();
    let pending = PendingToolUse::new("b1", "boom", json!({}));

    let err = use_tool(&tools, &pending, &ctx(), InvokeOptions::default())
        .await
        .unwrap_err();
    assert!(
        matches!(&err, LoopError::ToolExecution { tool_name, message }
            if tool_name == "boom" && message.contains("disk full")),
        "{err}"
    );
}

#[tokio::test]
async fn accessor_error_in_handler_counts_as_invalid_input() {
    let tool = Tool::new("loose", "Reads undeclared key", ToolParameters::empty(), |args| async move {
        Ok(args.get_str("missing")?.to_string())
    });
    let tools = ToolSet::new(vec![tool]).unwrap();
    let pending = PendingToolUse::new("l1", "loose", json!({}));
    let options = InvokeOptions {
        ignore_unknown_tools: false,
        ignore_invalid_schema: true,
    };

    let outcome = use_tool(&tools, &pending, &ctx(), options).await.unwrap();
    assert!(matches!(outcome, ToolOutcome::InvalidInput(_)));
}
