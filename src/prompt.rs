//! Operator confirmations

use std::io::IsTerminal;

use inquire::{Confirm, InquireError};

use crate::error::Result;

/// Blocking yes/no question to the operator
pub trait Confirmer {
    fn confirm(&self, prompt: &str, default_yes: bool) -> Result<bool>;
}

/// Asks on the terminal
#[derive(Debug, Default)]
pub struct InteractiveConfirmer;

impl Confirmer for InteractiveConfirmer {
    fn confirm(&self, prompt: &str, default_yes: bool) -> Result<bool> {
        let help = if default_yes {
            "Press Enter to confirm, or 'n' to cancel"
        } else {
            "Press 'y' to confirm, or Enter to cancel"
        };

        match Confirm::new(prompt)
            .with_default(default_yes)
            .with_help_message(help)
            .prompt()
        {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled) => Ok(false),
            // The terminal is in raw mode, so Ctrl+C arrives here instead of
            // as a signal
            Err(InquireError::OperationInterrupted) => crate::interrupt::terminate(),
            Err(e) => Err(e.into()),
        }
    }
}

/// Answers every question with its default
#[derive(Debug, Default)]
pub struct DefaultAnswers;

impl Confirmer for DefaultAnswers {
    fn confirm(&self, prompt: &str, default_yes: bool) -> Result<bool> {
        tracing::debug!(
            "Non-interactive: answering {} to {prompt:?}",
            if default_yes { "yes" } else { "no" }
        );
        Ok(default_yes)
    }
}

/// The confirmer for this run: defaults with `--no-interaction` or when
/// stdin is not a terminal
pub fn confirmer(no_interaction: bool) -> Box<dyn Confirmer> {
    if no_interaction || !std::io::stdin().is_terminal() {
        Box::new(DefaultAnswers)
    } else {
        Box::new(InteractiveConfirmer)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_answers() {
        let confirmer = DefaultAnswers;
        assert!(confirmer.confirm("Continue?", true).unwrap());
        assert!(!confirmer.confirm("Recreate?", false).unwrap());
    }

    #[test]
    fn test_scripted_confirmer_records_prompts() {
        let confirmer = testing::ScriptedConfirmer::new(&[false]);
        assert!(!confirmer.confirm("First?", true).unwrap());
        assert!(confirmer.confirm("Second?", true).unwrap());
        assert_eq!(confirmer.asked(), vec!["First?", "Second?"]);
    }
}
