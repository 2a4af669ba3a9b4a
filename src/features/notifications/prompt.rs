//! # Terminal Prompt Sink
//!
//! Interactive Delete/Keep dialog on the controlling terminal.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use dialoguer::Select;
use log::warn;

use super::sink::{format_notification, Decision, NotificationSink};

const CHOICES: [&str; 2] = ["Delete", "Keep"];

#[derive(Debug, Clone, Copy, Default)]
pub struct PromptSink;

impl PromptSink {
    fn decision_for(index: Option<usize>) -> Decision {
        match index {
            Some(0) => Decision::Delete,
            _ => Decision::Keep,
        }
    }
}

impl NotificationSink for PromptSink {
    fn present(&self, location: &str, description: &str) -> Decision {
        println!("\n{}\n", format_notification(location, description));

        // Escape or a closed terminal keeps the record
        let choice = Select::new()
            .with_prompt("Reminder")
            .items(&CHOICES)
            .default(1)
            .interact_opt();

        match choice {
            Ok(index) => Self::decision_for(index),
            Err(e) => {
                warn!("Reminder prompt failed, keeping record: {e}");
                Decision::Keep
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_choice_mapping() {
        assert_eq!(PromptSink::decision_for(Some(0)), Decision::Delete);
        assert_eq!(PromptSink::decision_for(Some(1)), Decision::Keep);
        assert_eq!(PromptSink::decision_for(None), Decision::Keep);
    }
}
