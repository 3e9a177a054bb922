use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_THEME: &str = "default";

/// The persisted settings record.
///
/// Keys missing from a stored record are backfilled from [`Config::default`];
/// keys this version does not know about are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub api_key: String,
    pub model: Option<String>,
    #[serde(deserialize_with = "null_as_default_theme")]
    pub theme: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: None,
            api_key: String::new(),
            model: None,
            theme: DEFAULT_THEME.to_string(),
            extra: Map::new(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default_theme<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| DEFAULT_THEME.to_string()))
}

/// Settings that can be changed from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Provider,
    ApiKey,
    Model,
    Theme,
}

impl SettingKey {
    pub const ALL: [SettingKey; 4] = [
        SettingKey::Provider,
        SettingKey::ApiKey,
        SettingKey::Model,
        SettingKey::Theme,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingKey::Provider => "provider",
            SettingKey::ApiKey => "api-key",
            SettingKey::Model => "model",
            SettingKey::Theme => "theme",
        }
    }

    pub fn parse(key: &str) -> Result<Self, SettingsError> {
        let normalized = key.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| SettingsError::UnknownKey(key.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    UnknownKey(String),
    EmptyValue(SettingKey),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::UnknownKey(key) => {
                let known: Vec<&str> = SettingKey::ALL.iter().map(|k| k.as_str()).collect();
                write!(
                    f,
                    "Unknown config key: {key} (expected one of: {})",
                    known.join(", ")
                )
            }
            SettingsError::EmptyValue(key) => {
                write!(f, "A value is required for {}", key.as_str())
            }
        }
    }
}

impl std::error::Error for SettingsError {}

impl Config {
    /// Stored provider identifier, ignoring blank values.
    pub fn provider_id(&self) -> Option<&str> {
        self.provider
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Stored model name, ignoring blank values.
    pub fn model_name(&self) -> Option<&str> {
        self.model
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    pub fn needs_setup(&self) -> bool {
        self.provider_id().is_none()
    }

    pub fn set(&mut self, key: SettingKey, value: &str) -> Result<(), SettingsError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(SettingsError::EmptyValue(key));
        }
        match key {
            SettingKey::Provider => self.provider = Some(value.to_lowercase()),
            SettingKey::ApiKey => self.api_key = value.to_string(),
            SettingKey::Model => self.model = Some(value.to_string()),
            SettingKey::Theme => self.theme = value.to_string(),
        }
        Ok(())
    }

    pub fn unset(&mut self, key: SettingKey) {
        match key {
            SettingKey::Provider => self.provider = None,
            SettingKey::ApiKey => self.api_key.clear(),
            SettingKey::Model => self.model = None,
            SettingKey::Theme => self.theme = DEFAULT_THEME.to_string(),
        }
    }

    /// Pretty JSON for display, with the credential masked.
    pub fn redacted_json(&self) -> String {
        let mut shown = self.clone();
        shown.api_key = mask_secret(&self.api_key);
        serde_json::to_string_pretty(&shown).unwrap_or_else(|err| format!("<{err}>"))
    }
}

/// Shows only the last four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count == 0 {
        return String::new();
    }
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}
