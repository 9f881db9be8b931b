//! Per-request scheduling context.

use serde::{Deserialize, Serialize};

/// One message within a structured chat prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// Prompt payload attached to a routing request.
///
/// Carries either flat completion text or a structured message list.
/// Scoring only ever consumes the flattened text form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptPayload {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
}

impl PromptPayload {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            messages: Vec::new(),
        }
    }

    pub fn from_messages(messages: Vec<PromptMessage>) -> Self {
        Self {
            text: String::new(),
            messages,
        }
    }

    /// Flat text if present, otherwise message contents concatenated in
    /// order. Empty output means there is nothing to match on.
    pub fn flattened_text(&self) -> String {
        if !self.text.is_empty() {
            return self.text.clone();
        }
        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect()
    }

    /// True when neither flat text nor any message carries content.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.messages.iter().all(|m| m.content.is_empty())
    }
}

/// Context exposed to scoring plugins for one routing decision.
///
/// The framework owns the request lifecycle; plugins read the model name and
/// prompt payload and nothing else. No cancellation is threaded through:
/// scoring is bounded in-memory compute.
#[derive(Debug, Clone)]
pub struct ScoringContext {
    pub model: String,
    pub prompt: PromptPayload,
}

impl ScoringContext {
    pub fn new(model: impl Into<String>, prompt: PromptPayload) -> Self {
        Self {
            model: model.into(),
            prompt,
        }
    }
}
