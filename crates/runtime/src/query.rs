//! The query orchestration loop.
//!
//! One top-level query runs on a fresh conversation buffer: the model is
//! called with the conversation and the tool specs; any requested tool
//! calls are dispatched strictly in order, each producing exactly one
//! result (error-flagged on failure) appended before the next model call.
//! The loop is bounded: on the last permitted round the specs are
//! withheld, forcing a textual answer.

use crate::model::{Backend, Message, ModelRequest, ToolCall, ToolResult};
use crate::tools::ToolHost;
use tracing::{debug, warn};

/// Model calls allowed per query. A value of 2 means a single tool wave:
/// one round that may call tools, one follow-up for the answer.
pub const DEFAULT_MAX_ROUNDS: usize = 4;

enum State {
    AwaitingModel { round: usize },
    HasToolCalls { round: usize, calls: Vec<ToolCall> },
    Done,
}

/// Drive one query to completion and return the concatenated answer text.
pub async fn run_query<B, H>(
    backend: &B,
    host: &H,
    query: &str,
    max_rounds: usize,
) -> crate::Result<String>
where
    B: Backend,
    H: ToolHost,
{
    let max_rounds = max_rounds.max(1);
    let mut conversation = vec![Message::user(query)];
    let mut fragments: Vec<String> = Vec::new();
    let mut state = State::AwaitingModel { round: 1 };

    loop {
        state = match state {
            State::AwaitingModel { round } => {
                let specs = if round < max_rounds { host.specs() } else { &[] };
                debug!(round, tools = specs.len(), "calling model");
                let response = backend
                    .call(ModelRequest {
                        messages: &conversation,
                        tools: specs,
                    })
                    .await
                    .map_err(crate::Error::Model)?;

                let text = response.message.text();
                if !text.is_empty() {
                    fragments.push(text);
                }

                let calls = response.message.tool_calls();
                if calls.is_empty() || round >= max_rounds {
                    State::Done
                } else {
                    // The assistant message is kept verbatim: the next round
                    // references these call ids.
                    conversation.push(response.message);
                    State::HasToolCalls { round, calls }
                }
            }
            State::HasToolCalls { round, calls } => {
                let mut results = Vec::with_capacity(calls.len());
                for call in &calls {
                    debug!(tool = %call.name, id = %call.id, "dispatching tool call");
                    let result = match host.execute(call).await {
                        Ok(output) => ToolResult::success(&call.id, &call.name, output),
                        Err(error) => {
                            warn!(tool = %call.name, id = %call.id, %error, "tool call failed");
                            ToolResult::failure(&call.id, &call.name, error)
                        }
                    };
                    results.push(result);
                }
                conversation.push(Message::tool_results(results));
                State::AwaitingModel { round: round + 1 }
            }
            State::Done => return Ok(fragments.join("\n")),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelError, ModelResponse, Part, Role, ToolSpec, Usage};
    use crate::tools::{normalize_arguments, ToolError};
    use serde_json::{json, Value};
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a script of responses and records every request it saw.
    struct ScriptedBackend {
        script: Mutex<VecDeque<ModelResponse>>,
        seen: Mutex<Vec<(Vec<Message>, usize)>>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<ModelResponse>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<(Vec<Message>, usize)> {
            self.seen.lock().unwrap().clone()
        }
    }

    impl Backend for ScriptedBackend {
        async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
            self.seen
                .lock()
                .unwrap()
                .push((request.messages.to_vec(), request.tools.len()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ModelError::Api("script exhausted".into()))
        }
    }

    /// Dispatches like the real host: normalizes arguments, then "calls"
    /// a server that only knows `get_alerts`.
    struct AlertsHost {
        specs: Vec<ToolSpec>,
    }

    impl AlertsHost {
        fn new() -> Self {
            Self {
                specs: vec![ToolSpec {
                    name: "get_alerts".into(),
                    description: "Fetch active weather alerts for a US state".into(),
                    schema: json!({
                        "type": "object",
                        "properties": { "state": { "type": "string" } },
                        "required": ["state"]
                    }),
                }],
            }
        }
    }

    impl ToolHost for AlertsHost {
        fn specs(&self) -> &[ToolSpec] {
            &self.specs
        }

        async fn execute(&self, call: &ToolCall) -> Result<Value, ToolError> {
            normalize_arguments(&call.input)?;
            match call.name.as_str() {
                "get_alerts" => Ok(Value::String("No active alerts for this state.".into())),
                other => Err(ToolError::Execution(format!("unknown tool: {other}"))),
            }
        }
    }

    fn text_response(text: &str) -> ModelResponse {
        ModelResponse {
            message: Message {
                role: Role::Assistant,
                parts: vec![Part::Text(text.into())],
            },
            usage: Usage::default(),
        }
    }

    fn tool_call_response(calls: Vec<ToolCall>) -> ModelResponse {
        ModelResponse {
            message: Message {
                role: Role::Assistant,
                parts: calls.into_iter().map(Part::ToolCall).collect(),
            },
            usage: Usage::default(),
        }
    }

    fn call(id: &str, name: &str, input: Value) -> ToolCall {
        ToolCall {
            id: id.into(),
            name: name.into(),
            input,
        }
    }

    fn results_of(message: &Message) -> Vec<&ToolResult> {
        message
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::ToolResult(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn no_tool_calls_returns_first_text_verbatim() {
        let backend = ScriptedBackend::new(vec![text_response("Just an answer.")]);
        let host = AlertsHost::new();

        let answer = run_query(&backend, &host, "hi", DEFAULT_MAX_ROUNDS)
            .await
            .unwrap();

        assert_eq!(answer, "Just an answer.");
        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        // Tools were on offer even though the model declined them.
        assert_eq!(requests[0].1, 1);
    }

    #[tokio::test]
    async fn empty_model_text_yields_empty_answer() {
        let backend = ScriptedBackend::new(vec![text_response("")]);
        let host = AlertsHost::new();

        let answer = run_query(&backend, &host, "hi", DEFAULT_MAX_ROUNDS)
            .await
            .unwrap();
        assert_eq!(answer, "");
    }

    #[tokio::test]
    async fn weather_alert_scenario() {
        let backend = ScriptedBackend::new(vec![
            tool_call_response(vec![call("c1", "get_alerts", json!({ "state": "CA" }))]),
            text_response("Good news: No active alerts for this state."),
        ]);
        let host = AlertsHost::new();

        let answer = run_query(
            &backend,
            &host,
            "What's the weather alert for CA?",
            DEFAULT_MAX_ROUNDS,
        )
        .await
        .unwrap();

        assert!(answer.contains("No active alerts for this state."));

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);

        // Follow-up sees: user, assistant (verbatim tool call), results.
        let follow_up = &requests[1].0;
        assert_eq!(follow_up.len(), 3);
        assert_eq!(follow_up[1].role, Role::Assistant);
        assert_eq!(follow_up[1].tool_calls()[0].id, "c1");

        let results = results_of(&follow_up[2]);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id(), "c1");
        assert!(!results[0].is_error());
    }

    #[tokio::test]
    async fn failing_call_is_error_flagged_and_round_continues() {
        let backend = ScriptedBackend::new(vec![
            tool_call_response(vec![
                call("c1", "get_radar", json!({})),
                call("c2", "get_alerts", json!({ "state": "CA" })),
            ]),
            text_response("Partial answer."),
        ]);
        let host = AlertsHost::new();

        let answer = run_query(&backend, &host, "radar and alerts?", DEFAULT_MAX_ROUNDS)
            .await
            .unwrap();
        assert_eq!(answer, "Partial answer.");

        let requests = backend.requests();
        let results = results_of(&requests[1].0[2]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id(), "c1");
        assert!(results[0].is_error());
        assert_eq!(results[1].id(), "c2");
        assert!(!results[1].is_error());
    }

    #[tokio::test]
    async fn malformed_second_arguments_are_recovered() {
        let backend = ScriptedBackend::new(vec![
            tool_call_response(vec![
                call("c1", "get_alerts", json!({ "state": "CA" })),
                call("c2", "get_alerts", Value::String("{not json".into())),
            ]),
            text_response("Done."),
        ]);
        let host = AlertsHost::new();

        run_query(&backend, &host, "two alerts", DEFAULT_MAX_ROUNDS)
            .await
            .unwrap();

        let requests = backend.requests();
        // Both results were appended before the follow-up call went out.
        assert_eq!(requests.len(), 2);
        let results = results_of(&requests[1].0[2]);
        assert_eq!(results.len(), 2);
        assert!(!results[0].is_error());
        assert!(results[1].is_error());
        let ToolResult::Failure { error, .. } = results[1] else {
            panic!("expected failure");
        };
        assert!(matches!(error, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn round_budget_forces_final_text_round() {
        // The model keeps asking for tools; the loop must cut it off.
        let backend = ScriptedBackend::new(vec![
            tool_call_response(vec![call("c1", "get_alerts", json!({ "state": "CA" }))]),
            text_response("Forced answer."),
        ]);
        let host = AlertsHost::new();

        let answer = run_query(&backend, &host, "alerts", 2).await.unwrap();
        assert_eq!(answer, "Forced answer.");

        let requests = backend.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].1, 1, "first round offers tools");
        assert_eq!(requests[1].1, 0, "final round withholds tools");
    }

    #[tokio::test]
    async fn text_fragments_join_with_newline() {
        let backend = ScriptedBackend::new(vec![
            ModelResponse {
                message: Message {
                    role: Role::Assistant,
                    parts: vec![
                        Part::Text("Let me check.".into()),
                        Part::ToolCall(call("c1", "get_alerts", json!({ "state": "CA" }))),
                    ],
                },
                usage: Usage::default(),
            },
            text_response("All clear."),
        ]);
        let host = AlertsHost::new();

        let answer = run_query(&backend, &host, "alerts", DEFAULT_MAX_ROUNDS)
            .await
            .unwrap();
        assert_eq!(answer, "Let me check.\nAll clear.");
    }

    #[tokio::test]
    async fn gateway_error_aborts_the_query() {
        let backend = ScriptedBackend::new(vec![]);
        let host = AlertsHost::new();

        let err = run_query(&backend, &host, "hi", DEFAULT_MAX_ROUNDS)
            .await
            .unwrap_err();
        assert!(matches!(err, crate::Error::Model(_)));
    }
}
