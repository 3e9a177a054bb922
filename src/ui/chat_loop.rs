//! Line-oriented chat loop.
//!
//! Reads one line at a time, runs commands locally and sends everything else
//! to the session. Provider calls are awaited on the given runtime, so at most
//! one request is in flight.

use crate::commands::{help_text, parse_input, Command, Input};
use crate::core::config::Config;
use crate::core::session::ChatSession;
use ratatui::crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};
use std::future::Future;
use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;
use tracing::warn;

pub const PROMPT: &str = "You > ";
pub const REPLY_PREFIX: &str = "Kodeka: ";

#[derive(Debug, Clone, Copy, Default)]
pub struct ChatLoopOptions {
    /// Clear the terminal on `/clear`. Only meaningful when output is a TTY.
    pub clear_screen: bool,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Command,
    EndOfInput,
}

pub fn banner(session: &ChatSession) -> String {
    format!(
        "Kodeka ({}) – model: {}\nSession '{}'. Type /help for commands, /exit to quit.",
        session.binding().display_name(),
        session.model(),
        session.history().session_name(),
    )
}

pub fn run_chat_loop<R, W>(
    rt: &Runtime,
    session: &mut ChatSession,
    config: &Config,
    mut input: R,
    mut output: W,
    options: ChatLoopOptions,
) -> io::Result<LoopExit>
where
    R: BufRead,
    W: Write,
{
    writeln!(output, "{}", banner(session))?;

    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        // Undecodable bytes become U+FFFD instead of ending the session.
        let mut buffer = Vec::new();
        if input.read_until(b'\n', &mut buffer)? == 0 {
            write_farewell(&mut output)?;
            return Ok(LoopExit::EndOfInput);
        }
        let line = String::from_utf8_lossy(&buffer);

        match parse_input(&line) {
            Input::Empty => {}
            Input::Command(Command::Help) => writeln!(output, "{}", help_text())?,
            Input::Command(Command::Config) => {
                writeln!(
                    output,
                    "In use: provider {} – model: {}",
                    session.binding().identifier(),
                    session.model()
                )?;
                writeln!(output, "Stored configuration:")?;
                writeln!(output, "{}", config.redacted_json())?;
            }
            Input::Command(Command::Exit) => {
                writeln!(output, "Session ended.")?;
                return Ok(LoopExit::Command);
            }
            Input::Command(Command::Clear) => match session.clear() {
                Ok(()) => {
                    if options.clear_screen {
                        queue!(output, Clear(ClearType::All), MoveTo(0, 0))?;
                    }
                    writeln!(output, "Conversation cleared.")?;
                }
                Err(err) => {
                    warn!(error = %err, "failed to clear history");
                    writeln!(output, "Error: {err}")?;
                }
            },
            Input::Chat(text) => match rt.block_on(session.send(&text)) {
                Ok(reply) => writeln!(output, "{REPLY_PREFIX}{reply}")?,
                Err(err) => writeln!(output, "Error: {err}")?,
            },
        }
    }
}

fn write_farewell<W: Write>(output: &mut W) -> io::Result<()> {
    writeln!(output)?;
    writeln!(output, "Goodbye.")?;
    output.flush()
}

/// Waits on its own thread for `signal` (normally `tokio::signal::ctrl_c()`),
/// then says goodbye on `output` and calls `on_interrupt`.
///
/// History is written through on every change, so nothing is lost when
/// `on_interrupt` exits the process mid-turn.
pub fn spawn_interrupt_watcher<F, W, E>(
    signal: F,
    mut output: W,
    on_interrupt: E,
) -> io::Result<JoinHandle<()>>
where
    F: Future<Output = io::Result<()>> + Send + 'static,
    W: Write + Send + 'static,
    E: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name("interrupt-watcher".to_string())
        .spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(err) => {
                    warn!(error = %err, "could not start interrupt watcher");
                    return;
                }
            };
            match rt.block_on(signal) {
                Ok(()) => {
                    if let Err(err) = write_farewell(&mut output) {
                        warn!(error = %err, "failed to print farewell");
                    }
                    on_interrupt();
                }
                Err(err) => warn!(error = %err, "could not listen for Ctrl-C"),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::history::HistoryStore;
    use crate::core::session::tests::{scripted_binding, ScriptedBackend};
    use std::io::Cursor;
    use std::sync::{mpsc, Arc, Mutex};
    use tempfile::TempDir;

    fn runtime() -> Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn run(
        temp_dir: &TempDir,
        backend: &ScriptedBackend,
        script: impl AsRef<[u8]>,
        options: ChatLoopOptions,
    ) -> (LoopExit, String, ChatSession) {
        let history = HistoryStore::open(temp_dir.path(), "loop").unwrap();
        let mut session = ChatSession::new(history, scripted_binding(backend), None);
        let config = Config {
            provider: Some("scripted".to_string()),
            api_key: "sk-secretvalue".to_string(),
            ..Config::default()
        };
        let mut output = Vec::new();
        let exit = run_chat_loop(
            &runtime(),
            &mut session,
            &config,
            Cursor::new(script.as_ref().to_vec()),
            &mut output,
            options,
        )
        .unwrap();
        (exit, String::from_utf8(output).unwrap(), session)
    }

    #[test]
    fn chat_turns_print_replies_and_end_on_eof() {
        let temp_dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new(vec![Ok("Hi there"), Ok("Fine")]);

        let (exit, output, session) = run(
            &temp_dir,
            &backend,
            "hello\n\n   \nhow are you?  \n",
            ChatLoopOptions::default(),
        );

        assert_eq!(exit, LoopExit::EndOfInput);
        assert!(output.starts_with("Kodeka (Scripted) – model: scripted-1\n"));
        assert!(output.contains("Kodeka: Hi there\n"));
        assert!(output.contains("Kodeka: Fine\n"));
        assert!(output.ends_with("Goodbye.\n"));
        assert_eq!(backend.calls().len(), 2);
        assert_eq!(
            backend.calls()[1].contents.last().map(String::as_str),
            Some("how are you?")
        );
        assert_eq!(session.history().len(), 4);
    }

    #[test]
    fn provider_errors_are_reported_and_the_loop_continues() {
        let temp_dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new(vec![Err("model overloaded"), Ok("recovered")]);

        let (_, output, session) = run(
            &temp_dir,
            &backend,
            "first\nsecond\n/exit\n",
            ChatLoopOptions::default(),
        );

        assert!(output.contains("Error: API request failed with status 500: model overloaded\n"));
        assert!(output.contains("Kodeka: recovered\n"));
        assert!(output.ends_with("Session ended.\n"));
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn exit_aliases_stop_before_later_input() {
        for alias in ["/exit", "exit", "quit", ":q"] {
            let temp_dir = TempDir::new().unwrap();
            let backend = ScriptedBackend::new(vec![Ok("unused")]);

            let script = format!("{alias}\nnever sent\n");
            let (exit, output, _) = run(&temp_dir, &backend, &script, ChatLoopOptions::default());

            assert_eq!(exit, LoopExit::Command, "{alias}");
            assert!(output.ends_with("Session ended.\n"));
            assert!(backend.calls().is_empty());
        }
    }

    #[test]
    fn clear_empties_history_without_calling_the_provider() {
        let temp_dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new(vec![Ok("one")]);

        let (_, output, session) = run(
            &temp_dir,
            &backend,
            "hi\n/clear\n",
            ChatLoopOptions { clear_screen: true },
        );

        assert!(output.contains("\x1b[2J"));
        assert!(output.contains("Conversation cleared.\n"));
        assert!(session.history().is_empty());
        assert!(HistoryStore::open(temp_dir.path(), "loop")
            .unwrap()
            .is_empty());
        assert_eq!(backend.calls().len(), 1);
    }

    #[test]
    fn config_and_help_are_local_commands() {
        let temp_dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new(vec![]);

        let (_, output, session) = run(
            &temp_dir,
            &backend,
            "/config\n/help\n",
            ChatLoopOptions::default(),
        );

        assert!(output.contains("In use: provider scripted – model: scripted-1\n"));
        assert!(output.contains("Stored configuration:\n"));
        assert!(output.contains("**********alue"));
        assert!(!output.contains("sk-secretvalue"));
        assert!(output.contains("Commands:"));
        assert!(output.contains("/clear"));
        assert!(backend.calls().is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn undecodable_input_does_not_end_the_session() {
        let temp_dir = TempDir::new().unwrap();
        let backend = ScriptedBackend::new(vec![Ok("one"), Ok("two"), Ok("three")]);

        let (exit, output, session) = run(
            &temp_dir,
            &backend,
            b"hello\ncaf\xe9\nstill here?\n".as_slice(),
            ChatLoopOptions::default(),
        );

        assert_eq!(exit, LoopExit::EndOfInput);
        let calls = backend.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].contents.last().map(String::as_str), Some("caf\u{FFFD}"));
        assert_eq!(calls[2].contents.last().map(String::as_str), Some("still here?"));
        assert!(output.contains("Kodeka: three\n"));
        assert_eq!(session.history().len(), 6);
    }

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn interrupt_says_goodbye_before_exiting() {
        let output = SharedBuffer::default();
        let (exited_tx, exited_rx) = mpsc::channel();

        let watcher = spawn_interrupt_watcher(async { Ok(()) }, output.clone(), move || {
            exited_tx.send(()).unwrap();
        })
        .unwrap();
        watcher.join().unwrap();

        assert!(exited_rx.try_recv().is_ok());
        assert_eq!(output.contents(), "\nGoodbye.\n");
    }

    #[test]
    fn failing_to_listen_for_interrupts_is_not_an_exit() {
        let output = SharedBuffer::default();
        let (exited_tx, exited_rx) = mpsc::channel();

        let watcher = spawn_interrupt_watcher(
            async { Err(io::Error::other("no signal support")) },
            output.clone(),
            move || {
                exited_tx.send(()).unwrap();
            },
        )
        .unwrap();
        watcher.join().unwrap();

        assert!(exited_rx.try_recv().is_err());
        assert!(output.contents().is_empty());
    }
}
