use std::io::{self, BufRead, Write};

use garage_core::{Console, ConsoleError};

/// Console backed by stdin/stdout
pub struct StdinConsole;

impl StdinConsole {
    pub fn new() -> Self {
        Self
    }
}

impl Console for StdinConsole {
    fn read_line(&mut self, prompt: &str) -> Result<String, ConsoleError> {
        print!("{}", prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        let bytes = io::stdin().lock().read_line(&mut line)?;
        if bytes == 0 {
            return Err(ConsoleError::Eof);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn write_line(&mut self, text: &str) {
        println!("{}", text);
    }
}
