//! Reassembling streamed model output into a single [`ModelTurn`].

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use serde_json::Value;
use uuid::Uuid;

use super::{ModelProvider, ModelTurn, StopReason, ToolUseRequest, TurnRequest};
use crate::error::{LoopError, Result};
use crate::types::Usage;

/// One incremental piece of a streamed model turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnDelta {
    Text(String),
    /// A tool-use block opened at `index`. An empty id gets a generated one.
    ToolUseStart {
        index: usize,
        id: String,
        name: String,
    },
    /// Fragment of the JSON input of the tool use at `index`.
    ToolInputDelta {
        index: usize,
        partial_json: String,
    },
    Usage(Usage),
    Stop(StopReason),
}

/// Provider that streams its output as [`TurnDelta`]s.
#[async_trait]
pub trait StreamingModelProvider: Send + Sync {
    fn provider_name(&self) -> &str;

    async fn stream_turn(
        &self,
        request: &TurnRequest,
    ) -> Result<BoxStream<'static, Result<TurnDelta>>>;
}

/// Adapts a [`StreamingModelProvider`] to the loop's [`ModelProvider`].
#[derive(Debug, Clone)]
pub struct Streamed<P>(pub P);

#[async_trait]
impl<P: StreamingModelProvider> ModelProvider for Streamed<P> {
    fn provider_name(&self) -> &str {
        self.0.provider_name()
    }

    async fn submit_turn(&self, request: &TurnRequest) -> Result<ModelTurn> {
        let stream = self.0.stream_turn(request).await?;
        collect_turn(self.0.provider_name(), stream).await
    }
}

struct PartialToolUse {
    index: usize,
    id: String,
    name: String,
    input_json: String,
}

/// Drain `stream` and assemble the complete turn.
///
/// Tool inputs are parsed once their stream ends; an empty input becomes
/// `{}`. Without an explicit stop delta the stop reason is inferred from
/// whether tools were requested.
pub async fn collect_turn(
    provider_name: &str,
    mut stream: BoxStream<'_, Result<TurnDelta>>,
) -> Result<ModelTurn> {
    let mut text = String::new();
    let mut partials: Vec<PartialToolUse> = Vec::new();
    let mut usage = Usage::default();
    let mut stop_reason = None;

    while let Some(delta) = stream.next().await {
        match delta? {
            TurnDelta::Text(chunk) => text.push_str(&chunk),
            TurnDelta::ToolUseStart { index, id, name } => {
                let id = if id.trim().is_empty() {
                    format!("toolu_{}", Uuid::new_v4().simple())
                } else {
                    id
                };
                partials.push(PartialToolUse {
                    index,
                    id,
                    name,
                    input_json: String::new(),
                });
            }
            TurnDelta::ToolInputDelta {
                index,
                partial_json,
            } => {
                let partial = partials
                    .iter_mut()
                    .rev()
                    .find(|p| p.index == index)
                    .ok_or_else(|| {
                        LoopError::provider(
                            provider_name,
                            format!("tool input delta for unknown block {index}"),
                        )
                    })?;
                partial.input_json.push_str(&partial_json);
            }
            TurnDelta::Usage(delta) => usage.merge(&delta),
            TurnDelta::Stop(reason) => stop_reason = Some(reason),
        }
    }

    let mut tool_uses = Vec::with_capacity(partials.len());
    for partial in partials {
        let input = if partial.input_json.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&partial.input_json).map_err(|e| {
                LoopError::provider(
                    provider_name,
                    format!("malformed input for tool '{}': {e}", partial.name),
                )
            })?
        };
        tool_uses.push(ToolUseRequest {
            id: partial.id,
            name: partial.name,
            input,
        });
    }

    let stop_reason = stop_reason.unwrap_or(if tool_uses.is_empty() {
        StopReason::EndTurn
    } else {
        StopReason::ToolUse
    });

    Ok(ModelTurn {
        text,
        tool_uses,
        stop_reason,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::json;

    fn boxed(deltas: Vec<TurnDelta>) -> BoxStream<'static, Result<TurnDelta>> {
        stream::iter(deltas.into_iter().map(Ok)).boxed()
    }

    #[tokio::test]
    async fn reassembles_text_and_tool_inputs() {
        let turn = collect_turn(
            "mock",
            boxed(vec![
                TurnDelta::Text("Let me ".into()),
                TurnDelta::Text("check.".into()),
                TurnDelta::ToolUseStart {
                    index: 1,
                    id: "toolu_1".into(),
                    name: "get_weather".into(),
                },
                TurnDelta::ToolInputDelta {
                    index: 1,
                    partial_json: "{\"city\":".into(),
                },
                TurnDelta::ToolInputDelta {
                    index: 1,
                    partial_json: "\"Oslo\"}".into(),
                },
                TurnDelta::Usage(Usage {
                    input_tokens: 12,
                    output_tokens: 7,
                }),
                TurnDelta::Stop(StopReason::ToolUse),
            ]),
        )
        .await
        .unwrap();
        assert_eq!(turn.text, "Let me check.");
        assert_eq!(turn.tool_uses.len(), 1);
        assert_eq!(turn.tool_uses[0].input, json!({"city": "Oslo"}));
        assert_eq!(turn.usage.total_tokens(), 19);
        assert_eq!(turn.stop_reason, StopReason::ToolUse);
    }

    #[tokio::test]
    async fn empty_input_becomes_empty_object_and_stop_is_inferred() {
        let turn = collect_turn(
            "mock",
            boxed(vec![TurnDelta::ToolUseStart {
                index: 0,
                id: String::new(),
                name: "now".into(),
            }]),
        )
        .await
        .unwrap();
        assert_eq!(turn.tool_uses[0].input, json!({}));
        assert!(turn.tool_uses[0].id.starts_with("toolu_"));
        assert_eq!(turn.stop_reason, StopReason::ToolUse);
    }

    #[tokio::test]
    async fn malformed_input_is_provider_error() {
        let err = collect_turn(
            "mock",
            boxed(vec![
                TurnDelta::ToolUseStart {
                    index: 0,
                    id: "a".into(),
                    name: "f".into(),
                },
                TurnDelta::ToolInputDelta {
                    index: 0,
                    partial_json: "{\"x\":".into(),
                },
            ]),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, LoopError::Provider { .. }));
    }

    #[tokio::test]
    async fn delta_for_unknown_block_is_provider_error() {
        let err = collect_turn(
            "mock",
            boxed(vec![TurnDelta::ToolInputDelta {
                index: 3,
                partial_json: "{}".into(),
            }]),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("unknown block 3"));
    }
}
