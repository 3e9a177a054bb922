//! Per-session conversation log.
//!
//! Every mutating call rewrites the session's record before returning, so the
//! in-memory sequence and the file on disk never drift apart.

use crate::core::message::{format_timestamp, Message, Role};
use crate::core::persistence::{read_json, write_json, PersistenceError};
use chrono::Utc;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    InvalidSessionName(String),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryError::InvalidSessionName(name) => write!(
                f,
                "Invalid session name {name:?}: use letters, digits, '-', '_' or '.', not starting with '.'"
            ),
        }
    }
}

impl std::error::Error for HistoryError {}

/// Session names become file names, so anything that could escape the
/// history directory is refused.
pub fn validate_session_name(name: &str) -> Result<(), HistoryError> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name
            .chars()
            .any(|c| c == '/' || c == '\\' || c == ':' || c.is_control());
    if invalid {
        Err(HistoryError::InvalidSessionName(name.to_string()))
    } else {
        Ok(())
    }
}

/// The last `max_messages` entries of `messages`, in their original order.
pub fn recent_window(messages: &[Message], max_messages: usize) -> &[Message] {
    let start = messages.len().saturating_sub(max_messages);
    &messages[start..]
}

pub fn session_file(history_dir: &Path, session_name: &str) -> PathBuf {
    history_dir.join(format!("{session_name}.json"))
}

/// Names of all sessions with a record in `history_dir`, sorted.
pub fn list_sessions(history_dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(history_dir) else {
        return Vec::new();
    };

    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string)
        })
        .filter(|name| validate_session_name(name).is_ok())
        .collect();
    names.sort();
    names
}

#[derive(Debug)]
pub struct HistoryStore {
    session_name: String,
    path: PathBuf,
    messages: Vec<Message>,
}

impl HistoryStore {
    /// Opens the named session under `history_dir` and loads its messages.
    pub fn open(history_dir: &Path, session_name: &str) -> Result<Self, HistoryError> {
        validate_session_name(session_name)?;
        let mut store = Self {
            session_name: session_name.to_string(),
            path: session_file(history_dir, session_name),
            messages: Vec::new(),
        };
        store.load();
        Ok(store)
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Replaces the in-memory sequence with the stored one. An absent or
    /// unreadable record yields an empty sequence.
    pub fn load(&mut self) -> &[Message] {
        self.messages = match read_json::<Vec<Message>>(&self.path) {
            Ok(Some(messages)) => messages,
            Ok(None) => Vec::new(),
            Err(err) => {
                warn!(
                    session = %self.session_name,
                    error = %err,
                    "ignoring unreadable history; starting empty"
                );
                Vec::new()
            }
        };
        &self.messages
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) -> Result<(), PersistenceError> {
        self.append(Role::User, content.into())
    }

    pub fn add_assistant_message(
        &mut self,
        content: impl Into<String>,
    ) -> Result<(), PersistenceError> {
        self.append(Role::Assistant, content.into())
    }

    pub fn get_recent_history(&self, max_messages: usize) -> &[Message] {
        recent_window(&self.messages, max_messages)
    }

    /// Empties the session and persists the empty sequence; the file stays.
    pub fn clear(&mut self) -> Result<(), PersistenceError> {
        let previous = std::mem::take(&mut self.messages);
        if let Err(err) = self.save() {
            self.messages = previous;
            return Err(err);
        }
        Ok(())
    }

    fn append(&mut self, role: Role, content: String) -> Result<(), PersistenceError> {
        let mut now = Utc::now();
        // Clock steps backwards must not reorder timestamps.
        if let Some(previous) = self.messages.last().and_then(Message::parsed_timestamp) {
            now = now.max(previous);
        }
        self.messages.push(Message {
            role,
            content,
            timestamp: format_timestamp(now),
        });
        // A failed write leaves memory matching the last good record.
        if let Err(err) = self.save() {
            self.messages.pop();
            return Err(err);
        }
        Ok(())
    }

    fn save(&self) -> Result<(), PersistenceError> {
        write_json(&self.path, &self.messages)
    }
}
