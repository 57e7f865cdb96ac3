//! Streaming chat endpoint.

use axum::extract::State;
use axum::response::Response;
use ragrelay_domain::{ChatMessage, ChatRequest, DomainConfig};
use serde::{Deserialize, Deserializer};

use crate::error::Result;
use crate::extract::ValidJson;
use crate::relay::{ChatEncoder, relay};
use crate::state::AppState;

/// Wire body of `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatBody {
    pub messages: Vec<ChatMessage>,
    /// Correlation id; absent, null and `0` all mean unset.
    #[serde(default)]
    pub id: Option<u64>,
    /// `"1"`/`"0"`, `true`/`false` or `1`/`0`.
    #[serde(default, deserialize_with = "rag_flag")]
    pub rag: Option<bool>,
    #[serde(default)]
    pub model: Option<String>,
}

impl ChatBody {
    /// Fill unset fields from configuration.
    pub fn into_request(self, defaults: &DomainConfig) -> ChatRequest {
        ChatRequest {
            messages: self.messages,
            id: self.id.unwrap_or(0),
            rag_enabled: self.rag.unwrap_or(defaults.rag_by_default),
            model: self
                .model
                .unwrap_or_else(|| defaults.default_model.clone()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RagFlag {
    Bool(bool),
    Int(i64),
    Text(String),
}

fn rag_flag<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let Some(flag) = Option::<RagFlag>::deserialize(deserializer)? else {
        return Ok(None);
    };

    match flag {
        RagFlag::Bool(b) => Ok(Some(b)),
        RagFlag::Int(1) => Ok(Some(true)),
        RagFlag::Int(0) => Ok(Some(false)),
        RagFlag::Text(s) => match s.trim() {
            "1" | "true" => Ok(Some(true)),
            "0" | "false" => Ok(Some(false)),
            other => Err(D::Error::custom(format!(
                "invalid rag flag '{}', expected \"1\" or \"0\"",
                other
            ))),
        },
        RagFlag::Int(n) => Err(D::Error::custom(format!(
            "invalid rag flag {}, expected 1 or 0",
            n
        ))),
    }
}

/// POST /chat - stream a chat completion.
///
/// With a non-zero `id` the body is newline-delimited `{"id","text"}`
/// records; otherwise the generated text is written raw.
pub async fn chat_handler(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<ChatBody>,
) -> Result<Response> {
    let request = body.into_request(state.services.config());
    let turn = state.services.chat().start(request).await?;

    Ok(relay(
        turn.stream,
        ChatEncoder::new(turn.correlation_id),
        state.relay_options("chat"),
    ))
}
