//! Line-oriented console abstraction
//!
//! Workflows never touch stdin/stdout directly; they talk to a `Console` so
//! the interactive flows can be driven from scripted input in tests. The
//! binary provides the stdin-backed implementation.

use std::collections::VecDeque;
use thiserror::Error;

/// Errors from the operator console
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("input stream ended")]
    Eof,
}

/// The input/output collaborator: prompt, read a line, print a line
pub trait Console {
    /// Prints `prompt` and reads one line of operator input, without the
    /// trailing newline
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError>;

    /// Prints one line of output
    fn write_line(&mut self, text: &str);
}

/// Console fed from a fixed list of input lines
///
/// Everything prompted or printed is recorded in a transcript so tests can
/// assert on the dialogue. Reading past the script yields `ConsoleError::Eof`,
/// which aborts a workflow the same way a closed stdin would.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    inputs: VecDeque<String>,
    transcript: Vec<String>,
}

impl ScriptedConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: lines.into_iter().map(Into::into).collect(),
            transcript: Vec::new(),
        }
    }

    /// Every prompt and output line seen so far, in order
    pub fn transcript(&self) -> &[String] {
        &self.transcript
    }

    /// True if some prompt or output line contains `needle`
    pub fn saw(&self, needle: &str) -> bool {
        self.transcript.iter().any(|line| line.contains(needle))
    }
}

impl Console for ScriptedConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        self.transcript.push(prompt.to_string());
        self.inputs.pop_front().ok_or(ConsoleError::Eof)
    }

    fn write_line(&mut self, text: &str) {
        self.transcript.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_console_replays_lines_in_order() {
        let mut console = ScriptedConsole::new(["first", "second"]);
        assert_eq!(console.read_line("a: ").unwrap(), "first");
        assert_eq!(console.read_line("b: ").unwrap(), "second");
        assert!(matches!(
            console.read_line("c: "),
            Err(ConsoleError::Eof)
        ));
    }

    #[test]
    fn test_scripted_console_records_transcript() {
        let mut console = ScriptedConsole::new(["x"]);
        console.write_line("hello");
        let _ = console.read_line("name: ");
        assert_eq!(console.transcript(), &["hello", "name: "]);
        assert!(console.saw("name"));
        assert!(!console.saw("goodbye"));
    }
}
