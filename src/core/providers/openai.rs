//! Hosted OpenAI-style completion API backend.

use super::{ChatBackend, ProviderOptions, ProviderSpec};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

pub const SPEC: ProviderSpec = ProviderSpec {
    id: "openai",
    display_name: "OpenAI",
    default_model: DEFAULT_MODEL,
    requires_credential: true,
    credential_env: Some(API_KEY_ENV_VAR),
    feature: "openai",
    available: cfg!(feature = "openai"),
    connect,
};

#[cfg(feature = "openai")]
fn connect(options: &ProviderOptions, credential: &str) -> Option<Box<dyn ChatBackend>> {
    Some(Box::new(backend::OpenAiBackend::new(
        &options.openai_base_url,
        credential,
    )))
}

#[cfg(not(feature = "openai"))]
fn connect(_options: &ProviderOptions, _credential: &str) -> Option<Box<dyn ChatBackend>> {
    None
}

#[cfg(feature = "openai")]
pub use backend::OpenAiBackend;

#[cfg(feature = "openai")]
mod backend {
    use super::DEFAULT_MODEL;
    use crate::api::{to_chat_messages, ChatRequest, CompletionResponse};
    use crate::core::message::Message;
    use crate::core::providers::error::summarize_error_body;
    use crate::core::providers::{ChatBackend, ChatError};
    use crate::utils::url::construct_api_url;
    use async_trait::async_trait;
    use tracing::debug;

    pub struct OpenAiBackend {
        client: reqwest::Client,
        base_url: String,
        api_key: String,
    }

    impl OpenAiBackend {
        pub fn new(base_url: &str, api_key: &str) -> Self {
            Self {
                client: reqwest::Client::new(),
                base_url: base_url.to_string(),
                api_key: api_key.to_string(),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for OpenAiBackend {
        async fn chat(&self, model: &str, messages: &[Message]) -> Result<String, ChatError> {
            let url = construct_api_url(&self.base_url, "chat/completions");
            let model = if model.trim().is_empty() {
                DEFAULT_MODEL
            } else {
                model
            };
            debug!(%url, "calling hosted completion API");

            let request = ChatRequest {
                model: model.to_string(),
                messages: to_chat_messages(messages),
            };

            let response = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request)
                .send()
                .await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(ChatError::Status {
                    status,
                    message: summarize_error_body(&body),
                });
            }

            let completion: CompletionResponse = response.json().await?;
            let choice = completion
                .choices
                .into_iter()
                .next()
                .ok_or(ChatError::EmptyResponse)?;
            Ok(choice.message.content.unwrap_or_default())
        }
    }
}
