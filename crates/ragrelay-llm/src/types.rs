//! Wire and domain types shared by every backend implementation.

use serde::{Deserialize, Serialize};

/// Dense embedding produced by the embedding model.
///
/// Dimensionality is fixed by the model and opaque to this crate.
pub type EmbeddingVector = Vec<f32>;

// ─────────────────────────────────────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a conversation participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Streaming
// ─────────────────────────────────────────────────────────────────────────────

/// One incremental unit of a chat response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamChunk {
    /// Generated text, forwarded verbatim.
    TextDelta { text: String },
    /// The backend finished generating. Always the last successful item.
    Done,
}

impl StreamChunk {
    /// Convenience constructor for a text delta.
    pub fn text(text: impl Into<String>) -> Self {
        Self::TextDelta { text: text.into() }
    }

    /// Returns true for the terminal marker.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// One line of a model-pull progress stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullProgressEvent {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<u64>,
    #[serde(default)]
    pub done: bool,
}

impl PullProgressEvent {
    /// Create an in-progress event with just a status line.
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            digest: None,
            total: None,
            completed: None,
            done: false,
        }
    }

    /// Create the terminal event.
    pub fn finished() -> Self {
        Self {
            done: true,
            ..Self::status("success")
        }
    }

    /// Attach layer download progress.
    pub fn with_progress(mut self, digest: impl Into<String>, completed: u64, total: u64) -> Self {
        self.digest = Some(digest.into());
        self.completed = Some(completed);
        self.total = Some(total);
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Models
// ─────────────────────────────────────────────────────────────────────────────

/// A model known to the serving backend.
///
/// Only `name` is interpreted; the remaining fields are passed through to
/// callers unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ModelInfo {
    /// Create a model entry with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
            modified_at: None,
            size: None,
            digest: None,
            details: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serialization() {
        let msg = ChatMessage::user("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);

        let parsed: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hello"}"#).unwrap();
        assert_eq!(parsed.role, Role::Assistant);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let parsed = serde_json::from_str::<ChatMessage>(r#"{"role":"tool","content":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_pull_event_skips_absent_fields() {
        let event = PullProgressEvent::status("pulling manifest");
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"status":"pulling manifest","done":false}"#);

        let event = PullProgressEvent::status("downloading").with_progress("sha256:ab", 5, 10);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["completed"], 5);
        assert_eq!(value["total"], 10);
        assert_eq!(value["digest"], "sha256:ab");
    }

    #[test]
    fn test_model_info_passthrough() {
        let json = r#"{"name":"qwen:14b","size":123,"details":{"family":"qwen2"}}"#;
        let info: ModelInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.name, "qwen:14b");
        assert_eq!(info.size, Some(123));
        assert_eq!(info.details.unwrap()["family"], "qwen2");
    }
}
