//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. Structured logging
//! is the caller's responsibility. These types carry the context needed to build
//! meaningful log entries. `user_message()` renders the text that stands in for
//! an assistant reply when a round trip fails.

use thiserror::Error;

/// Errors that can occur while talking to the model backend.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// TCP/HTTP connection to the model endpoint failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The model endpoint did not respond within the configured timeout.
    #[error("inference timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// The backend answered HTTP 404 for the requested model.
    #[error("model not found: {model}")]
    ModelNotFound { model: String },

    /// Any other non-2xx HTTP response from the model endpoint.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// Response body or stream-level failure.
    #[error("stream error: {reason}")]
    StreamError { reason: String },

    /// Client construction or configuration error.
    #[error("config error: {reason}")]
    ConfigError { reason: String },
}

impl InferenceError {
    /// Classified, human-readable text shown to the user in place of a reply.
    pub fn user_message(&self) -> String {
        match self {
            InferenceError::ConnectionFailed { endpoint, .. } => format!(
                "Error: cannot reach the local AI service at {endpoint}.\n\n\
                 Make sure Ollama is running:\n\
                 1. Check that an `ollama` process exists\n\
                 2. Start it manually with: ollama serve"
            ),
            InferenceError::Timeout { duration_secs } => format!(
                "Error: the request timed out after {duration_secs}s. \
                 The model may still be loading, please try again shortly."
            ),
            InferenceError::ModelNotFound { model } => format!(
                "Error: model '{model}' was not found.\n\n\
                 Install it with Ollama first:\nollama pull {model}"
            ),
            InferenceError::HttpError { status, body } => {
                let detail = body.trim();
                if detail.is_empty() {
                    format!("Error: the Ollama API returned status {status}")
                } else {
                    format!("Error: the Ollama API returned status {status}\nDetails: {detail}")
                }
            }
            InferenceError::StreamError { reason } => format!("Error: {reason}"),
            InferenceError::ConfigError { reason } => {
                format!("Error: the model client is misconfigured ({reason})")
            }
        }
    }

    /// Whether the backend could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            InferenceError::ConnectionFailed { .. } | InferenceError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_not_found_message_names_model() {
        let err = InferenceError::ModelNotFound {
            model: "qwen3:8b".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("'qwen3:8b'"));
        assert!(msg.contains("ollama pull qwen3:8b"));
    }

    #[test]
    fn test_each_class_has_distinct_message() {
        let messages = [
            InferenceError::ConnectionFailed {
                endpoint: "http://localhost:11434".into(),
                reason: "refused".into(),
            }
            .user_message(),
            InferenceError::Timeout { duration_secs: 60 }.user_message(),
            InferenceError::ModelNotFound { model: "m".into() }.user_message(),
            InferenceError::HttpError {
                status: 500,
                body: String::new(),
            }
            .user_message(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in messages.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_http_error_includes_body_detail() {
        let err = InferenceError::HttpError {
            status: 500,
            body: "  out of memory ".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("500"));
        assert!(msg.ends_with("Details: out of memory"));
    }

    #[test]
    fn test_is_unreachable() {
        assert!(InferenceError::Timeout { duration_secs: 5 }.is_unreachable());
        assert!(!InferenceError::ModelNotFound { model: "m".into() }.is_unreachable());
    }
}
