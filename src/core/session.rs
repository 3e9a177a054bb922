use crate::core::history::HistoryStore;
use crate::core::persistence::PersistenceError;
use crate::core::providers::{ChatError, ProviderBinding};
use std::error::Error;
use std::fmt;

/// Number of most recent messages sent as context with each request.
pub const CONTEXT_WINDOW: usize = 14;

#[derive(Debug)]
pub enum TurnError {
    Persistence(PersistenceError),
    Provider(ChatError),
}

impl fmt::Display for TurnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnError::Persistence(err) => write!(f, "{err}"),
            TurnError::Provider(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TurnError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TurnError::Persistence(err) => Some(err),
            TurnError::Provider(err) => Some(err),
        }
    }
}

impl From<PersistenceError> for TurnError {
    fn from(err: PersistenceError) -> Self {
        TurnError::Persistence(err)
    }
}

impl From<ChatError> for TurnError {
    fn from(err: ChatError) -> Self {
        TurnError::Provider(err)
    }
}

/// One conversation against one provider.
#[derive(Debug)]
pub struct ChatSession {
    history: HistoryStore,
    binding: ProviderBinding,
    model: String,
    window: usize,
}

impl ChatSession {
    /// `model` falls back to the binding's default when missing or blank.
    pub fn new(history: HistoryStore, binding: ProviderBinding, model: Option<&str>) -> Self {
        let model = binding.model_or_default(model);
        Self {
            history,
            binding,
            model,
            window: CONTEXT_WINDOW,
        }
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn binding(&self) -> &ProviderBinding {
        &self.binding
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs one turn: records the user's message, asks the provider with the
    /// recent window as context, and records the reply.
    ///
    /// A failed provider call leaves the user's message in place and records
    /// nothing else.
    pub async fn send(&mut self, input: &str) -> Result<String, TurnError> {
        self.history.add_user_message(input)?;

        let context = self.history.get_recent_history(self.window);
        let reply = self.binding.chat(&self.model, context).await?;

        self.history.add_assistant_message(reply.clone())?;
        Ok(reply)
    }

    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        self.history.clear()
    }
}
