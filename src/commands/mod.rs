//! Chat-loop input classification.

mod registry;

pub use registry::{all_commands, find_command, CommandSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Clear,
    Config,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Command(Command),
    Chat(String),
}

/// Classifies one line of user input. Anything that is not blank and not a
/// known command is a chat turn, including unrecognised `/words`.
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    match find_command(trimmed) {
        Some(spec) => Input::Command(spec.command),
        None => Input::Chat(trimmed.to_string()),
    }
}

pub fn help_text() -> String {
    let width = all_commands()
        .iter()
        .map(|spec| spec.usage.len())
        .max()
        .unwrap_or(0);
    let mut text = String::from("Commands:\n");
    for spec in all_commands() {
        text.push_str(&format!("  {:<width$}  {}\n", spec.usage, spec.help));
    }
    text.push_str("Anything else is sent to the model.");
    text
}
