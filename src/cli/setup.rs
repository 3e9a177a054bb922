//! First-run configuration prompts.

use crate::core::config::{Config, ConfigStore, SettingKey};
use crate::core::persistence::PersistenceError;
use crate::core::providers::{find_provider, providers};
use crate::utils::masked_input::{prompt_masked, MaskedInputError};
use std::fmt;
use std::io::{self, BufRead, Write};

#[derive(Debug)]
pub enum SetupError {
    /// Input ended or the user cancelled before setup finished.
    Aborted,
    Io(io::Error),
    Save(PersistenceError),
}

impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupError::Aborted => write!(f, "Setup aborted"),
            SetupError::Io(err) => write!(f, "Failed to read input: {err}"),
            SetupError::Save(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for SetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SetupError::Aborted => None,
            SetupError::Io(err) => Some(err),
            SetupError::Save(err) => Some(err),
        }
    }
}

impl From<io::Error> for SetupError {
    fn from(err: io::Error) -> Self {
        SetupError::Io(err)
    }
}

impl From<MaskedInputError> for SetupError {
    fn from(err: MaskedInputError) -> Self {
        match err {
            MaskedInputError::Cancelled => SetupError::Aborted,
            MaskedInputError::Terminal(err) => SetupError::Io(err),
        }
    }
}

/// Source of answers for the setup prompts. Answers come back trimmed.
pub trait SetupPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String, SetupError>;
    fn ask_secret(&mut self, prompt: &str) -> Result<String, SetupError>;
}

/// Reads answers from stdin; secrets are read without echo.
pub struct TerminalPrompter;

impl SetupPrompter for TerminalPrompter {
    fn ask(&mut self, prompt: &str) -> Result<String, SetupError> {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            println!();
            return Err(SetupError::Aborted);
        }
        Ok(line.trim().to_string())
    }

    fn ask_secret(&mut self, prompt: &str) -> Result<String, SetupError> {
        Ok(prompt_masked(prompt)?)
    }
}

/// Asks for provider, credential and model, then saves the record.
pub fn run_setup<P, W>(
    store: &ConfigStore,
    config: &mut Config,
    prompter: &mut P,
    output: &mut W,
) -> Result<(), SetupError>
where
    P: SetupPrompter + ?Sized,
    W: Write,
{
    writeln!(output, "Welcome to Kodeka! Let's set things up.")?;
    writeln!(output)?;
    writeln!(output, "Available providers:")?;
    for spec in providers() {
        let note = if spec.available { "" } else { " (not in this build)" };
        writeln!(output, "  {} - {}{}", spec.id, spec.display_name, note)?;
    }
    writeln!(output)?;

    let ids: Vec<&str> = providers().iter().map(|spec| spec.id).collect();
    let provider_prompt = format!("Provider [{}]: ", ids.join("/"));
    let spec = loop {
        let answer = prompter.ask(&provider_prompt)?;
        match find_provider(&answer) {
            Some(spec) => break spec,
            None if answer.is_empty() => writeln!(output, "Please choose a provider.")?,
            None => writeln!(output, "Unknown provider: {answer}")?,
        }
    };
    config.provider = Some(spec.id.to_string());

    if spec.requires_credential {
        let key = prompter.ask_secret("API key (input hidden): ")?;
        if key.is_empty() {
            config.unset(SettingKey::ApiKey);
            if let Some(var) = spec.credential_env {
                writeln!(output, "No key stored; {var} will be used if set.")?;
            }
        } else {
            config.api_key = key;
        }
    }

    let model = prompter.ask(&format!("Model [default: {}]: ", spec.default_model))?;
    config.model = Some(model).filter(|model| !model.is_empty());

    store.save(config).map_err(SetupError::Save)?;
    writeln!(output, "Configuration saved")?;
    Ok(())
}
