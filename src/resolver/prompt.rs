//! Terminal prompt for already-loaded files

use dialoguer::{Confirm, Input};

use super::{ConflictPrompt, ResolveError};
use crate::models::{LoadAction, PriorLoadInfo};

/// Asks on the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    pub fn new() -> Self {
        Self
    }
}

impl ConflictPrompt for TerminalPrompt {
    fn show_prior(&mut self, prior: &PriorLoadInfo) -> Result<(), ResolveError> {
        println!();
        println!("This file has already been loaded:");
        println!("{}", prior);
        println!();
        println!("  1) Skip     - keep the stored rows, load nothing");
        println!("  2) Replace  - delete the stored rows, then load");
        println!("  3) Append   - load again alongside the stored rows (duplicates)");
        Ok(())
    }

    fn ask_choice(&mut self, file_id: &str) -> Result<String, ResolveError> {
        Input::<String>::new()
            .with_prompt(format!("Choice for {} [1/2/3]", file_id))
            .interact_text()
            .map_err(|e| ResolveError::PromptFailed(e.to_string()))
    }

    fn reject(&mut self, input: &str) {
        eprintln!("'{}' is not a valid choice, enter 1, 2 or 3", input.trim());
    }

    fn confirm(&mut self, file_id: &str, action: LoadAction) -> Result<bool, ResolveError> {
        Confirm::new()
            .with_prompt(format!("Really {} {}?", action, file_id))
            .default(false)
            .interact()
            .map_err(|e| ResolveError::PromptFailed(e.to_string()))
    }
}
