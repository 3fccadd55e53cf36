//! The interactive session context
//!
//! One `Session` exists per operator sitting at the console. It owns the
//! handles every workflow step needs - the store, the allocator, the console,
//! and the VIN policy - so no step reaches for process-wide state.

use crate::alloc::Allocator;
use crate::console::{Console, ConsoleError};
use crate::db::ShopStore;
use crate::validate::{FieldError, VinPolicy};

/// Context threaded through every workflow step
pub struct Session<'a> {
    pub store: &'a dyn ShopStore,
    pub alloc: &'a dyn Allocator,
    pub console: &'a mut dyn Console,
    pub vin: VinPolicy,
}

impl<'a> Session<'a> {
    pub fn new(
        store: &'a dyn ShopStore,
        alloc: &'a dyn Allocator,
        console: &'a mut dyn Console,
    ) -> Self {
        Self {
            store,
            alloc,
            console,
            vin: VinPolicy::default(),
        }
    }

    pub fn with_vin_policy(mut self, vin: VinPolicy) -> Self {
        self.vin = vin;
        self
    }

    /// Prompts until `validate` accepts the input
    ///
    /// Rejections print the field error and reprompt; only console failures
    /// (closed input stream) escape.
    pub fn prompt_until<T>(
        &mut self,
        prompt: &str,
        validate: impl Fn(&str) -> Result<T, FieldError>,
    ) -> Result<T, ConsoleError> {
        loop {
            let line = self.console.read_line(prompt)?;
            match validate(&line) {
                Ok(value) => return Ok(value),
                Err(e) => self.console.write_line(&format!("Invalid input: {}", e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::MaxIdAllocator;
    use crate::console::ScriptedConsole;
    use crate::db::SqliteStore;
    use crate::validate;

    #[test]
    fn test_prompt_until_reprompts_on_invalid_input() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new(["-3", "abc", "0"]);
        let mut session = Session::new(&store, &alloc, &mut console);

        let value = session
            .prompt_until("Odometer reading: ", validate::non_negative)
            .unwrap();
        assert_eq!(value, 0);
        assert!(console.saw("negative values are not allowed"));
        assert!(console.saw("expected a number"));
    }

    #[test]
    fn test_prompt_until_surfaces_console_eof() {
        let store = SqliteStore::open_in_memory().unwrap();
        let alloc = MaxIdAllocator::new(&store);
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let mut session = Session::new(&store, &alloc, &mut console);

        let result = session.prompt_until("Odometer reading: ", validate::non_negative);
        assert!(matches!(result, Err(ConsoleError::Eof)));
    }
}
