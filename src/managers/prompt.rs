//! Terminal decision source for locked backups
//!
//! Presents the choice the panel cannot make for us: when the oldest
//! deletable backup turns out to be locked, does the operator want to evict
//! the next-oldest one instead, or leave this server alone?

use crate::panel::Backup;
use crate::rotation::{Decision, DecisionAction, DecisionSource};
use anyhow::{Context, Result};
use dialoguer::{Confirm, Select};

pub struct TerminalDecisionSource;

impl DecisionSource for TerminalDecisionSource {
    fn decide(&mut self, server: &str, backup: &Backup) -> Result<Decision> {
        println!();
        println!(
            "Backup '{}' ({}) on server {} cannot be deleted (locked).",
            backup.name, backup.id, server
        );

        let items = [
            "Delete the next-oldest backup instead",
            "Skip this server (no new backup)",
        ];

        let selection = Select::new()
            .with_prompt("How should this be handled?")
            .items(&items)
            .default(0)
            .interact()
            .context("Failed to read decision from terminal")?;

        let action = if selection == 0 {
            DecisionAction::Continue
        } else {
            DecisionAction::Abort
        };

        let remember = Confirm::new()
            .with_prompt("Remember this choice for future runs?")
            .default(false)
            .interact()
            .context("Failed to read confirmation from terminal")?;

        Ok(Decision { action, remember })
    }
}
