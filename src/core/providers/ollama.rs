//! Local Ollama daemon backend (`POST /api/chat`, non-streaming).

use super::{ChatBackend, ProviderOptions, ProviderSpec};

pub const DEFAULT_HOST: &str = "http://localhost:11434";
pub const DEFAULT_PORT: u16 = 11434;
pub const HOST_ENV_VAR: &str = "OLLAMA_HOST";
pub const DEFAULT_MODEL: &str = "llama3.2";

pub const SPEC: ProviderSpec = ProviderSpec {
    id: "ollama",
    display_name: "Ollama",
    default_model: DEFAULT_MODEL,
    requires_credential: false,
    credential_env: None,
    feature: "ollama",
    available: cfg!(feature = "ollama"),
    connect,
};

#[cfg(feature = "ollama")]
fn connect(options: &ProviderOptions, _credential: &str) -> Option<Box<dyn ChatBackend>> {
    Some(Box::new(backend::OllamaBackend::new(&options.ollama_host)))
}

#[cfg(not(feature = "ollama"))]
fn connect(_options: &ProviderOptions, _credential: &str) -> Option<Box<dyn ChatBackend>> {
    None
}

#[cfg(feature = "ollama")]
pub use backend::OllamaBackend;

#[cfg(feature = "ollama")]
mod backend {
    use crate::api::{to_chat_messages, OllamaChatRequest, OllamaChatResponse};
    use crate::core::message::Message;
    use crate::core::providers::error::summarize_error_body;
    use crate::core::providers::{ChatBackend, ChatError};
    use crate::utils::url::{construct_api_url, with_default_port, with_default_scheme};
    use async_trait::async_trait;
    use tracing::debug;

    use super::DEFAULT_PORT;

    pub struct OllamaBackend {
        client: reqwest::Client,
        host: String,
    }

    impl OllamaBackend {
        /// Plain `http` hosts without a port get the daemon's port.
        pub fn new(host: &str) -> Self {
            let host = with_default_scheme(host);
            let host = if host.starts_with("http://") {
                with_default_port(&host, DEFAULT_PORT)
            } else {
                host
            };
            Self {
                client: reqwest::Client::new(),
                host,
            }
        }

        pub fn host(&self) -> &str {
            &self.host
        }
    }

    #[async_trait]
    impl ChatBackend for OllamaBackend {
        async fn chat(&self, model: &str, messages: &[Message]) -> Result<String, ChatError> {
            let url = construct_api_url(&self.host, "api/chat");
            debug!(%url, "calling ollama");

            let request = OllamaChatRequest {
                model: model.to_string(),
                messages: to_chat_messages(messages),
                stream: false,
            };

            let response = self.client.post(&url).json(&request).send().await?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                return Err(ChatError::Status {
                    status,
                    message: summarize_error_body(&body),
                });
            }

            let reply: OllamaChatResponse = response.json().await?;
            Ok(reply.message.content)
        }
    }
}
