//! Hidden single-line prompt for credentials.

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Insert(char),
    Backspace,
    ClearAll,
    Paste(String),
    Submit,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Continue { redraw: bool },
    Submit(String),
    Cancelled,
}

#[derive(Debug)]
pub enum MaskedInputError {
    Cancelled,
    Terminal(io::Error),
}

impl fmt::Display for MaskedInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskedInputError::Cancelled => write!(f, "Cancelled by user"),
            MaskedInputError::Terminal(err) => write!(f, "Terminal error: {err}"),
        }
    }
}

impl std::error::Error for MaskedInputError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MaskedInputError::Cancelled => None,
            MaskedInputError::Terminal(err) => Some(err),
        }
    }
}

impl From<io::Error> for MaskedInputError {
    fn from(err: io::Error) -> Self {
        MaskedInputError::Terminal(err)
    }
}

/// Prints `prompt` and reads a line without echoing it. When stdin is not a
/// terminal the line is read as-is.
pub fn prompt_masked(prompt: &str) -> Result<String, MaskedInputError> {
    if !io::stdin().is_terminal() {
        print!("{prompt}");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        return Ok(line.trim().to_string());
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, event::EnableBracketedPaste)?;

    let result = read_hidden(prompt);

    let restore = disable_raw_mode().and_then(|_| execute!(stdout, event::DisableBracketedPaste));
    println!();

    let value = result?;
    restore?;
    Ok(value)
}

fn read_hidden(prompt: &str) -> Result<String, MaskedInputError> {
    let mut text = String::new();
    let mut needs_redraw = true;

    loop {
        if needs_redraw {
            redraw(prompt, &text)?;
            needs_redraw = false;
        }

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let action = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => map_key_event(&key),
            Event::Paste(pasted) => Some(EditAction::Paste(pasted)),
            _ => None,
        };
        let Some(action) = action else {
            continue;
        };
        match apply(&mut text, action) {
            EditOutcome::Continue { redraw } => needs_redraw = redraw,
            EditOutcome::Submit(value) => return Ok(value.trim().to_string()),
            EditOutcome::Cancelled => return Err(MaskedInputError::Cancelled),
        }
    }
}

fn redraw(prompt: &str, text: &str) -> io::Result<()> {
    print!("\r\x1b[K{}{}", prompt, "*".repeat(text.chars().count()));
    io::stdout().flush()
}

pub fn map_key_event(key: &KeyEvent) -> Option<EditAction> {
    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Some(EditAction::Submit),
        KeyCode::Esc => Some(EditAction::Cancel),
        KeyCode::Backspace => Some(EditAction::Backspace),
        KeyCode::Char('c') if control => Some(EditAction::Cancel),
        KeyCode::Char('u') if control => Some(EditAction::ClearAll),
        KeyCode::Char(c) if !control => Some(EditAction::Insert(c)),
        _ => None,
    }
}

pub fn apply(text: &mut String, action: EditAction) -> EditOutcome {
    match action {
        EditAction::Insert('\n' | '\r') | EditAction::Submit => EditOutcome::Submit(text.clone()),
        EditAction::Insert(c) => {
            text.push(c);
            EditOutcome::Continue { redraw: true }
        }
        EditAction::Backspace => EditOutcome::Continue {
            redraw: text.pop().is_some(),
        },
        EditAction::ClearAll => {
            let redraw = !text.is_empty();
            text.clear();
            EditOutcome::Continue { redraw }
        }
        EditAction::Paste(pasted) => {
            let pasted = sanitize(&pasted);
            let first_line = pasted.split('\n').next().unwrap_or("");
            text.push_str(first_line);
            if pasted.contains('\n') {
                EditOutcome::Submit(text.clone())
            } else {
                EditOutcome::Continue {
                    redraw: !first_line.is_empty(),
                }
            }
        }
        EditAction::Cancel => EditOutcome::Cancelled,
    }
}

/// Drops control characters from pasted text, keeping line breaks so a
/// trailing newline still submits.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\r' | '\n' => Some('\n'),
            '\t' => None,
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}
