use std::error::Error;
use std::fmt;

const SETUP_FIXES: &[&str] = &[
    "kodeka setup                    # Choose a provider interactively",
    "kodeka set provider ollama      # Use the local Ollama daemon",
];
const CREDENTIAL_FIXES: &[&str] = &[
    "kodeka set api-key sk-...       # Store the key in the config",
    "export OPENAI_API_KEY=sk-...    # Or provide it through the environment",
];
const REBUILD_FIXES: &[&str] = &[
    "cargo install kodeka            # Default build includes every backend",
];

/// Failure to turn a provider identifier into a usable binding. These are
/// raised before a session starts and end the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    UnsupportedProvider {
        identifier: String,
    },
    MissingCredential {
        provider: String,
    },
    /// The backend for a registered provider was not compiled in.
    DependencyMissing {
        provider: String,
        feature: String,
    },
}

impl ResolveError {
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, ResolveError::DependencyMissing { .. })
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_configuration_error() {
            2
        } else {
            1
        }
    }

    pub fn quick_fixes(&self) -> &'static [&'static str] {
        match self {
            ResolveError::UnsupportedProvider { .. } => SETUP_FIXES,
            ResolveError::MissingCredential { .. } => CREDENTIAL_FIXES,
            ResolveError::DependencyMissing { .. } => REBUILD_FIXES,
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnsupportedProvider { identifier } => {
                write!(f, "Unsupported provider: {identifier}")
            }
            ResolveError::MissingCredential { provider } => {
                write!(f, "An API key is required for provider '{provider}'")
            }
            ResolveError::DependencyMissing { provider, feature } => write!(
                f,
                "The '{provider}' backend is not available in this build (enable the '{feature}' feature)"
            ),
        }
    }
}

impl Error for ResolveError {}

/// Failure of a single chat call. The turn is abandoned; the session goes on.
#[derive(Debug)]
pub enum ChatError {
    Http(reqwest::Error),
    Status { status: u16, message: String },
    Decode(String),
    EmptyResponse,
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::Http(err) => write!(f, "Request failed: {err}"),
            ChatError::Status { status, message } => {
                write!(f, "API request failed with status {status}: {message}")
            }
            ChatError::Decode(detail) => write!(f, "Unexpected response: {detail}"),
            ChatError::EmptyResponse => write!(f, "The provider returned no choices"),
        }
    }
}

impl Error for ChatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChatError::Http(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ChatError::Decode(err.to_string())
        } else {
            ChatError::Http(err)
        }
    }
}

/// Pulls a one-line summary out of an error body, trying `error.message`,
/// a string `error`, then `message`, before falling back to the raw text.
pub(crate) fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let summary = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .and_then(|v| v.as_str())
                .or_else(|| value.get("error").and_then(|v| v.as_str()))
                .or_else(|| value.get("message").and_then(|v| v.as_str()))
                .map(str::to_owned)
        });

    let text = summary.unwrap_or_else(|| trimmed.to_string());
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_exit_with_two() {
        let unsupported = ResolveError::UnsupportedProvider {
            identifier: "nope".to_string(),
        };
        assert!(unsupported.is_configuration_error());
        assert_eq!(unsupported.exit_code(), 2);
        assert_eq!(unsupported.to_string(), "Unsupported provider: nope");

        let missing = ResolveError::DependencyMissing {
            provider: "openai".to_string(),
            feature: "openai".to_string(),
        };
        assert!(!missing.is_configuration_error());
        assert_eq!(missing.exit_code(), 1);
        assert!(!missing.quick_fixes().is_empty());
    }

    #[test]
    fn error_bodies_are_summarised() {
        assert_eq!(
            summarize_error_body(r#"{"error":{"message":"Invalid   API key","type":"auth"}}"#),
            "Invalid API key"
        );
        assert_eq!(
            summarize_error_body(r#"{"error":"model 'llama9' not found"}"#),
            "model 'llama9' not found"
        );
        assert_eq!(summarize_error_body(r#"{"message":"busy"}"#), "busy");
        assert_eq!(summarize_error_body("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(summarize_error_body("  "), "<empty>");
    }
}
