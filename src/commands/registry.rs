use super::Command;

pub struct CommandSpec {
    pub names: &'static [&'static str],
    pub usage: &'static str,
    pub help: &'static str,
    pub command: Command,
}

pub fn all_commands() -> &'static [CommandSpec] {
    COMMANDS
}

/// Exact, case-insensitive match against every name and alias.
pub fn find_command(input: &str) -> Option<&'static CommandSpec> {
    all_commands().iter().find(|spec| {
        spec.names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(input))
    })
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        names: &["/help"],
        usage: "/help",
        help: "Show available commands.",
        command: Command::Help,
    },
    CommandSpec {
        names: &["/clear"],
        usage: "/clear",
        help: "Erase this session's conversation history.",
        command: Command::Clear,
    },
    CommandSpec {
        names: &["/config"],
        usage: "/config",
        help: "Show the provider and model in use, then the stored configuration (credential masked).",
        command: Command::Config,
    },
    CommandSpec {
        names: &["/exit", "exit", "quit", ":q"],
        usage: "/exit, exit, quit, :q",
        help: "End the session.",
        command: Command::Exit,
    },
];
