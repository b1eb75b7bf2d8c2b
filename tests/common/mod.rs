//! Shared test helpers and scripted provider.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use toolloop::error::{LoopError, Result};
use toolloop::provider::{ModelProvider, ModelTurn, ToolUseRequest, TurnRequest};
use toolloop::types::{Message, Usage};

/// A provider that replays queued turns and records every request.
#[derive(Default)]
pub struct ScriptedProvider {
    turns: Mutex<VecDeque<Result<ModelTurn>>>,
    requests: Mutex<Vec<TurnRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a final text answer.
    pub fn queue_text(&self, text: &str) {
        self.push(Ok(ModelTurn::text(text).with_usage(usage(10, 20))));
    }

    /// Queue a turn requesting the given `(id, name, input)` tool uses.
    pub fn queue_tool_uses(&self, text: &str, uses: &[(&str, &str, Value)]) {
        let requests = uses
            .iter()
            .map(|(id, name, input)| ToolUseRequest {
                id: id.to_string(),
                name: name.to_string(),
                input: input.clone(),
            })
            .collect();
        self.push(Ok(
            ModelTurn::tool_uses(text, requests).with_usage(usage(10, 5))
        ));
    }

    pub fn queue_error(&self, message: &str) {
        self.push(Err(LoopError::provider("scripted", message)));
    }

    fn push(&self, turn: Result<ModelTurn>) {
        self.turns.lock().unwrap().push_back(turn);
    }

    pub fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.turns.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn submit_turn(&self, request: &TurnRequest) -> Result<ModelTurn> {
        self.requests.lock().unwrap().push(request.clone());
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ModelTurn::text("Scripted response")))
    }
}

pub fn usage(input_tokens: u32, output_tokens: u32) -> Usage {
    Usage {
        input_tokens,
        output_tokens,
    }
}

/// Messages with generation metadata removed, for comparing runs.
pub fn without_generation_data(messages: &[Message]) -> Vec<Message> {
    messages
        .iter()
        .cloned()
        .map(|mut m| {
            m.generation_data = None;
            m
        })
        .collect()
}
