//! Provider registry.
//!
//! Each backend registers one [`ProviderSpec`] in [`PROVIDERS`]. Resolution
//! looks the identifier up in that table, checks the backend is compiled in
//! and has its credential, and hands back a [`ProviderBinding`] that exposes
//! the single `chat(model, messages)` capability.

pub mod error;
pub mod ollama;
pub mod openai;

use crate::core::message::Message;
use async_trait::async_trait;
use std::env;
use std::fmt;
use tracing::debug;

pub use error::{ChatError, ResolveError};

/// A chat backend: given a model and an ordered message list, produce the
/// assistant's reply text.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, model: &str, messages: &[Message]) -> Result<String, ChatError>;
}

/// Endpoint settings shared by the backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOptions {
    pub ollama_host: String,
    pub openai_base_url: String,
}

impl Default for ProviderOptions {
    fn default() -> Self {
        Self {
            ollama_host: ollama::DEFAULT_HOST.to_string(),
            openai_base_url: openai::DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ProviderOptions {
    /// Defaults overridden by `OLLAMA_HOST` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ollama_host: non_empty_env(ollama::HOST_ENV_VAR).unwrap_or(defaults.ollama_host),
            openai_base_url: non_empty_env(openai::BASE_URL_ENV_VAR)
                .unwrap_or(defaults.openai_base_url),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

type Connect = fn(&ProviderOptions, &str) -> Option<Box<dyn ChatBackend>>;

#[derive(Debug, Clone, Copy)]
pub struct ProviderSpec {
    pub id: &'static str,
    pub display_name: &'static str,
    pub default_model: &'static str,
    pub requires_credential: bool,
    /// Environment variable consulted when no credential is stored.
    pub credential_env: Option<&'static str>,
    /// Cargo feature that compiles the backend in.
    pub feature: &'static str,
    pub available: bool,
    connect: Connect,
}

impl ProviderSpec {
    /// The stored credential, or the provider's environment variable when
    /// nothing is stored.
    pub fn credential_from(&self, stored: &str) -> String {
        if !stored.trim().is_empty() {
            return stored.trim().to_string();
        }
        self.credential_env
            .and_then(non_empty_env)
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    }
}

pub const PROVIDERS: &[ProviderSpec] = &[ollama::SPEC, openai::SPEC];

pub fn providers() -> &'static [ProviderSpec] {
    PROVIDERS
}

/// Case-insensitive lookup by identifier.
pub fn find_provider(identifier: &str) -> Option<&'static ProviderSpec> {
    let normalized = identifier.trim().to_lowercase();
    PROVIDERS.iter().find(|spec| spec.id == normalized)
}

pub fn resolve(identifier: &str, credential: &str) -> Result<ProviderBinding, ResolveError> {
    resolve_with(identifier, credential, &ProviderOptions::from_env())
}

pub fn resolve_with(
    identifier: &str,
    credential: &str,
    options: &ProviderOptions,
) -> Result<ProviderBinding, ResolveError> {
    let spec = find_provider(identifier).ok_or_else(|| ResolveError::UnsupportedProvider {
        identifier: identifier.trim().to_string(),
    })?;
    resolve_spec(spec, credential, options)
}

fn resolve_spec(
    spec: &ProviderSpec,
    credential: &str,
    options: &ProviderOptions,
) -> Result<ProviderBinding, ResolveError> {
    let dependency_missing = || ResolveError::DependencyMissing {
        provider: spec.id.to_string(),
        feature: spec.feature.to_string(),
    };

    if !spec.available {
        return Err(dependency_missing());
    }

    let credential = credential.trim();
    if spec.requires_credential && credential.is_empty() {
        return Err(ResolveError::MissingCredential {
            provider: spec.id.to_string(),
        });
    }

    let backend = (spec.connect)(options, credential).ok_or_else(dependency_missing)?;
    debug!(provider = spec.id, "resolved provider");
    Ok(ProviderBinding::new(
        spec.id,
        spec.display_name,
        spec.default_model,
        backend,
    ))
}

/// A resolved provider: identifier, default model and the backend to call.
pub struct ProviderBinding {
    identifier: String,
    display_name: String,
    default_model: String,
    backend: Box<dyn ChatBackend>,
}

impl ProviderBinding {
    pub fn new(
        identifier: impl Into<String>,
        display_name: impl Into<String>,
        default_model: impl Into<String>,
        backend: Box<dyn ChatBackend>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            default_model: default_model.into(),
            backend,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// `model` unless it is missing or blank, else the default model.
    pub fn model_or_default(&self, model: Option<&str>) -> String {
        model
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(self.default_model.as_str())
            .to_string()
    }

    pub async fn chat(&self, model: &str, messages: &[Message]) -> Result<String, ChatError> {
        debug!(
            provider = %self.identifier,
            model,
            context = messages.len(),
            "sending chat request"
        );
        let result = self.backend.chat(model, messages).await;
        if let Err(err) = &result {
            debug!(provider = %self.identifier, error = %err, "chat request failed");
        }
        result
    }
}

impl fmt::Debug for ProviderBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinding")
            .field("identifier", &self.identifier)
            .field("display_name", &self.display_name)
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}
