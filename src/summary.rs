use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

use crate::error::ContentError;

/// Upper bound on the body text sent to the model.
const MAX_BODY_CHARS: usize = 8_000;

const INSTRUCTIONS: &str = "You summarize blog posts. Reply with a single short \
paragraph (2-3 sentences) capturing the post's main argument. No preamble.";

/// Black-box summary seam. Callers get either a summary or one generic
/// failure; model and quota details never leak past this boundary.
#[async_trait]
pub trait SummaryService: Send + Sync {
    async fn suggest_summary(&self, body: &str) -> Result<String, ContentError>;
}

/// Chat-completion implementation.
pub struct OpenAiSummaryService {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSummaryService {
    /// Uses `OPENAI_API_KEY` from the environment.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl SummaryService for OpenAiSummaryService {
    async fn suggest_summary(&self, body: &str) -> Result<String, ContentError> {
        let body = truncate_chars(body, MAX_BODY_CHARS);

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(INSTRUCTIONS)
                    .build()
                    .map_err(|e| {
                        tracing::error!("Failed to build summary request: {e}");
                        ContentError::Summary
                    })?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(body)
                    .build()
                    .map_err(|e| {
                        tracing::error!("Failed to build summary request: {e}");
                        ContentError::Summary
                    })?
                    .into(),
            ])
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build summary request: {e}");
                ContentError::Summary
            })?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!("Summary generation failed: {e}");
            ContentError::Summary
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|summary| summary.trim().to_string())
            .filter(|summary| !summary.is_empty())
            .ok_or(ContentError::Summary)
    }
}

/// Truncate at a char boundary without allocating when the body fits.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
