//! NDJSON streaming response decoder for Ollama chat completions.
//!
//! Reads the HTTP body as a byte stream, splits it on newlines, decodes each
//! line as a [`ChatResponseFrame`] and yields the content deltas. Lines may
//! be split across network chunks; undecodable lines are skipped. Consumption
//! stops at the first frame with `done: true`.

use futures::stream::{self, Stream, StreamExt};

use super::errors::InferenceError;
use super::types::{ChatMessage, ChatResponseFrame};

/// What a single NDJSON line contributes to the output.
enum FrameOutcome {
    /// Blank or undecodable line.
    Skip,
    Delta { content: String, done: bool },
    Failed(String),
}

/// Decode an NDJSON byte stream into content fragments.
///
/// Dropping the returned stream drops `byte_stream`, which for a reqwest body
/// closes the underlying connection.
pub fn parse_ndjson_stream<S, B>(
    byte_stream: S,
) -> impl Stream<Item = Result<String, InferenceError>> + Send
where
    S: Stream<Item = Result<B, InferenceError>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send,
{
    stream::unfold(
        Some((byte_stream, Vec::<u8>::new())),
        |state| async move {
            let (mut byte_stream, mut buffer) = state?;
            loop {
                // Drain every complete line already buffered
                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    match decode_frame(&line) {
                        FrameOutcome::Skip => continue,
                        FrameOutcome::Failed(reason) => {
                            return Some((Err(InferenceError::StreamError { reason }), None));
                        }
                        FrameOutcome::Delta { content, done: true } => {
                            // Completion observed; remaining frames are discarded
                            return if content.is_empty() {
                                None
                            } else {
                                Some((Ok(content), None))
                            };
                        }
                        FrameOutcome::Delta { content, done: false } => {
                            if content.is_empty() {
                                continue;
                            }
                            return Some((Ok(content), Some((byte_stream, buffer))));
                        }
                    }
                }

                match byte_stream.next().await {
                    Some(Ok(bytes)) => buffer.extend_from_slice(bytes.as_ref()),
                    Some(Err(e)) => return Some((Err(e), None)),
                    None => {
                        // Body ended; a final frame may lack its trailing newline
                        return match decode_frame(&buffer) {
                            FrameOutcome::Delta { content, .. } if !content.is_empty() => {
                                Some((Ok(content), None))
                            }
                            FrameOutcome::Failed(reason) => {
                                Some((Err(InferenceError::StreamError { reason }), None))
                            }
                            _ => None,
                        };
                    }
                }
            }
        },
    )
}

/// Decode one NDJSON line.
fn decode_frame(line: &[u8]) -> FrameOutcome {
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return FrameOutcome::Skip;
    }

    match serde_json::from_str::<ChatResponseFrame>(trimmed) {
        Ok(frame) => {
            if let Some(reason) = &frame.error {
                return FrameOutcome::Failed(format!("model backend reported: {reason}"));
            }
            FrameOutcome::Delta {
                content: frame.content().to_string(),
                done: frame.done,
            }
        }
        Err(e) => {
            tracing::debug!(error = %e, line_len = trimmed.len(), "skipping undecodable stream frame");
            FrameOutcome::Skip
        }
    }
}

/// Parse a non-streaming response body into an assistant message.
pub fn parse_chat_response(body: &str) -> Result<ChatMessage, InferenceError> {
    let frame: ChatResponseFrame =
        serde_json::from_str(body).map_err(|e| InferenceError::StreamError {
            reason: format!("failed to parse chat response: {e}"),
        })?;

    if let Some(reason) = frame.error {
        return Err(InferenceError::StreamError {
            reason: format!("model backend reported: {reason}"),
        });
    }

    Ok(frame.into_assistant_message())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
