//! Tool-calling orchestrator: one user turn in, one assistant reply out.
//!
//! A turn is at most two backend round trips:
//! 1. `complete` with the registry's tool definitions
//! 2. if the reply requested tools, run them in order, append the results,
//!    then ask again *without* tools so the turn always terminates
//!
//! `respond` returns the final text; `respond_stream` yields it as filtered
//! fragments. Both append exactly one final assistant message to the
//! conversation, and neither ever fails: transport errors become the
//! classified error text in place of the reply.

use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt};
use uuid::Uuid;

use crate::inference::{ChatBackend, ChatMessage, FragmentStream, InferenceError, ToolCallWire, ToolDefinition};
use crate::tools::ToolRegistry;

use super::config::AgentConfig;
use super::conversation::Conversation;
use super::think_filter::ThinkFilter;
use super::tool_router::ToolRouter;
use super::types::ToolCall;

// ─── Orchestrator ───────────────────────────────────────────────────────────

/// Drives turns against a backend with a fixed tool registry.
///
/// Holds no per-turn state, so one instance serves any number of
/// concurrent turns on different conversations.
pub struct Orchestrator {
    backend: Arc<dyn ChatBackend>,
    router: ToolRouter,
    /// Snapshot of the registry's definitions, advertised on every first round.
    tool_definitions: Vec<ToolDefinition>,
    config: AgentConfig,
    default_model: String,
}

impl Orchestrator {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        registry: Arc<ToolRegistry>,
        config: AgentConfig,
        default_model: impl Into<String>,
    ) -> Self {
        let tool_definitions = registry.definitions();
        Self {
            backend,
            router: ToolRouter::new(registry, config.max_tool_result_chars),
            tool_definitions,
            config,
            default_model: default_model.into(),
        }
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Tools for the first round; `None` means plain chat.
    fn offered_tools(&self) -> Option<&[ToolDefinition]> {
        if self.config.enabled && !self.tool_definitions.is_empty() {
            Some(&self.tool_definitions)
        } else {
            None
        }
    }

    fn resolve_model<'a>(&'a self, model: Option<&'a str>) -> &'a str {
        match model {
            Some(m) if !m.trim().is_empty() => m,
            _ => &self.default_model,
        }
    }

    // ─── Buffered ───────────────────────────────────────────────────────

    /// Run one turn and return the final reply text.
    ///
    /// The caller has already appended the user message. The returned text
    /// is also appended as the final assistant message.
    pub async fn respond(&self, conversation: &mut Conversation, model: Option<&str>) -> String {
        let model = self.resolve_model(model);
        let turn = Uuid::new_v4();
        tracing::info!(turn = %turn, model = %model, messages = conversation.len(), "turn started");

        let first = match self
            .backend
            .complete(conversation.messages(), model, self.offered_tools())
            .await
        {
            Ok(reply) => reply,
            Err(e) => return self.fail_turn(conversation, turn, &e),
        };

        if !first.has_tool_calls() {
            tracing::info!(turn = %turn, reply_len = first.content.len(), "answered without tools");
            conversation.push(ChatMessage::assistant(first.content.clone()));
            return first.content;
        }

        self.run_tools(conversation, turn, first.requested_tool_calls()).await;

        match self.backend.complete(conversation.messages(), model, None).await {
            Ok(last) => {
                if last.has_tool_calls() {
                    tracing::warn!(turn = %turn, "ignoring tool calls in the final round");
                }
                tracing::info!(turn = %turn, reply_len = last.content.len(), "turn finished");
                conversation.push(ChatMessage::assistant(last.content.clone()));
                last.content
            }
            Err(e) => self.fail_turn(conversation, turn, &e),
        }
    }

    // ─── Streaming ──────────────────────────────────────────────────────

    /// Run one turn, yielding visible reply fragments as they arrive.
    ///
    /// Hidden reasoning spans are filtered out. A direct first-round answer
    /// comes out as exactly one fragment. Dropping the stream stops network
    /// reads; a turn abandoned mid-reply appends no assistant message.
    pub fn respond_stream<'a>(
        &'a self,
        conversation: &'a mut Conversation,
        model: Option<&str>,
    ) -> impl Stream<Item = String> + Send + 'a {
        let turn = StreamTurn {
            orchestrator: self,
            conversation,
            model: self.resolve_model(model).to_string(),
            id: Uuid::new_v4(),
            phase: Phase::Start,
        };

        stream::unfold(turn, |mut turn| async move {
            let fragment = turn.next_fragment().await;
            fragment.map(|f| (f, turn))
        })
    }

    // ─── Shared steps ───────────────────────────────────────────────────

    /// Append the tool-call message and one tool message per call, in order.
    async fn run_tools(&self, conversation: &mut Conversation, turn: Uuid, requested: &[ToolCallWire]) {
        let calls: Vec<ToolCall> = requested.iter().map(ToolCall::from_wire).collect();
        tracing::info!(
            turn = %turn,
            count = calls.len(),
            tools = ?calls.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "executing tool calls"
        );

        conversation.push(ChatMessage::assistant_tool_calls(
            calls.iter().map(ToolCall::to_wire).collect(),
        ));

        let results = self.router.dispatch_tool_calls(&calls).await;
        for (call, result) in calls.iter().zip(&results) {
            conversation.push(ChatMessage::tool(&call.name, self.router.render_result(result)));
        }
    }

    /// Append and return the classified error text as the turn's reply.
    fn fail_turn(&self, conversation: &mut Conversation, turn: Uuid, err: &InferenceError) -> String {
        tracing::error!(turn = %turn, error = %err, "turn failed");
        let text = err.user_message();
        conversation.push(ChatMessage::assistant(text.clone()));
        text
    }
}

// ─── Stream state machine ───────────────────────────────────────────────────

enum Phase {
    /// First round (or the only round in plain chat) not yet sent.
    Start,
    /// Relaying the final round's stream through the filter.
    Relaying {
        stream: FragmentStream,
        filter: ThinkFilter,
        /// Unfiltered text so far, appended when the stream ends.
        raw: String,
    },
    Done,
}

struct StreamTurn<'a> {
    orchestrator: &'a Orchestrator,
    conversation: &'a mut Conversation,
    model: String,
    id: Uuid,
    phase: Phase,
}

impl StreamTurn<'_> {
    /// Advance until there is a non-empty fragment or the turn is over.
    async fn next_fragment(&mut self) -> Option<String> {
        loop {
            match std::mem::replace(&mut self.phase, Phase::Done) {
                Phase::Done => return None,
                Phase::Start => {
                    if let Some(fragment) = self.start().await {
                        return Some(fragment);
                    }
                }
                Phase::Relaying {
                    mut stream,
                    mut filter,
                    mut raw,
                } => match stream.next().await {
                    Some(Ok(fragment)) => {
                        raw.push_str(&fragment);
                        let visible = filter.push(&fragment);
                        self.phase = Phase::Relaying { stream, filter, raw };
                        if !visible.is_empty() {
                            return Some(visible);
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!(turn = %self.id, error = %e, "stream failed mid-reply");
                        let mut tail = filter.finish();
                        let mut error_text = e.user_message();
                        if !raw.is_empty() {
                            error_text.insert_str(0, "\n\n");
                        }
                        raw.push_str(&error_text);
                        tail.push_str(&error_text);
                        self.conversation.push(ChatMessage::assistant(raw));
                        return Some(tail);
                    }
                    None => {
                        let tail = filter.finish();
                        tracing::info!(turn = %self.id, reply_len = raw.len(), "turn finished");
                        self.conversation.push(ChatMessage::assistant(raw));
                        return (!tail.is_empty()).then_some(tail);
                    }
                },
            }
        }
    }

    /// Run the buffered first round and open the final stream.
    ///
    /// Returns a fragment when the turn ends here (direct answer or error);
    /// otherwise leaves the phase at `Relaying`.
    async fn start(&mut self) -> Option<String> {
        let orch = self.orchestrator;
        let model = self.model.as_str();
        tracing::info!(turn = %self.id, model = %model, messages = self.conversation.len(), "streaming turn started");

        if let Some(tools) = orch.offered_tools() {
            let first = match orch
                .backend
                .complete(self.conversation.messages(), model, Some(tools))
                .await
            {
                Ok(reply) => reply,
                Err(e) => return Some(orch.fail_turn(self.conversation, self.id, &e)),
            };

            if !first.has_tool_calls() {
                // Only the buffered reply exists: emit it whole, filtered
                let visible = ThinkFilter::filter_complete(&orch.config.hidden_block, &first.content);
                tracing::info!(turn = %self.id, reply_len = first.content.len(), "answered without tools");
                self.conversation.push(ChatMessage::assistant(first.content));
                return Some(visible);
            }

            orch.run_tools(self.conversation, self.id, first.requested_tool_calls())
                .await;
        }

        match orch.backend.complete_stream(self.conversation.messages(), model).await {
            Ok(stream) => {
                self.phase = Phase::Relaying {
                    stream,
                    filter: ThinkFilter::new(&orch.config.hidden_block),
                    raw: String::new(),
                };
                None
            }
            Err(e) => Some(orch.fail_turn(self.conversation, self.id, &e)),
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
