//! Rotation controller
//!
//! Decides, for a single server, whether a backup must be evicted to stay
//! within quota before a new one is created, and carries both steps out.
//! At most one delete and at most one create request are issued per
//! invocation. Locked backups are never targeted directly; what happens when
//! the oldest candidate is locked (or a delete is refused) is governed by the
//! operator's `RotationPolicy`, optionally via an interactive decision.

use crate::config::RotationPolicy;
use crate::panel::{Backup, CreatedBackup};
use anyhow::Result;
use chrono::{DateTime, Local};
use std::fmt;
use tracing::{info, warn};

/// Capability surface the controller needs from the panel
pub trait BackupRegistry {
    fn list_backups(&self, server: &str) -> Result<Vec<Backup>>;
    fn delete_backup(&self, server: &str, backup_id: &str) -> Result<()>;
    fn create_backup(&self, server: &str, name: &str) -> Result<CreatedBackup>;
}

/// Answer to a locked-candidate prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub action: DecisionAction,
    /// Persist the answer as the policy for future candidates and runs
    pub remember: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionAction {
    /// Move on to the next-oldest candidate
    Continue,
    /// Abort rotation for this server
    Abort,
}

/// Source of interactive decisions, consulted only under `AskEachTime`
pub trait DecisionSource {
    fn decide(&mut self, server: &str, backup: &Backup) -> Result<Decision>;
}

/// What happened while processing one server, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    BackupDeleted(String),
    NoDeletionNeeded,
    DeletionSkippedAllLocked,
    BackupCreated(String),
    CreationSkipped(String),
    Error(String),
}

impl RotationOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, RotationOutcome::Error(_))
    }
}

impl fmt::Display for RotationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationOutcome::BackupDeleted(id) => write!(f, "deleted backup {}", id),
            RotationOutcome::NoDeletionNeeded => write!(f, "no deletion needed"),
            RotationOutcome::DeletionSkippedAllLocked => {
                write!(f, "rotation skipped: no deletable backup")
            }
            RotationOutcome::BackupCreated(name) => write!(f, "created backup '{}'", name),
            RotationOutcome::CreationSkipped(reason) => {
                write!(f, "creation skipped: {}", reason)
            }
            RotationOutcome::Error(detail) => write!(f, "error: {}", detail),
        }
    }
}

/// Resolution for a single eviction candidate
enum CandidateOutcome {
    Deleted(String),
    TryNext,
    Abort,
}

/// Rotate backups for one server.
///
/// `backups` must be the complete current set for the server; the caller is
/// responsible for surfacing a registry read failure instead of passing an
/// empty list. A "remember my choice" decision rewrites `policy` in place;
/// persisting it is the caller's job.
pub fn rotate(
    server: &str,
    quota: u64,
    mut backups: Vec<Backup>,
    policy: &mut RotationPolicy,
    dry_run: bool,
    registry: &dyn BackupRegistry,
    decisions: &mut dyn DecisionSource,
) -> Vec<RotationOutcome> {
    let mut outcomes = Vec::new();

    if quota == 0 {
        info!("Skipping '{}': backups are disabled (quota 0)", server);
        outcomes.push(RotationOutcome::CreationSkipped(
            "backups disabled".to_string(),
        ));
        return outcomes;
    }

    if (backups.len() as u64) < quota {
        outcomes.push(RotationOutcome::NoDeletionNeeded);
    } else {
        // Oldest first; ties broken by id so repeated runs are deterministic
        backups.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut evicted = false;
        for backup in &backups {
            match consider_candidate(server, backup, policy, dry_run, registry, decisions) {
                CandidateOutcome::Deleted(id) => {
                    outcomes.push(RotationOutcome::BackupDeleted(id));
                    evicted = true;
                    break;
                }
                CandidateOutcome::TryNext => continue,
                CandidateOutcome::Abort => {
                    outcomes.push(RotationOutcome::DeletionSkippedAllLocked);
                    return outcomes;
                }
            }
        }

        if !evicted {
            info!("No deletable backup found for '{}'; skipping creation", server);
            outcomes.push(RotationOutcome::DeletionSkippedAllLocked);
            return outcomes;
        }
    }

    let name = backup_name(Local::now());
    if dry_run {
        info!("[dry-run] Would create backup '{}' for server {}", name, server);
        outcomes.push(RotationOutcome::BackupCreated(name));
        return outcomes;
    }

    match registry.create_backup(server, &name) {
        Ok(CreatedBackup { name }) => {
            info!("Created backup '{}' for server {}", name, server);
            outcomes.push(RotationOutcome::BackupCreated(name));
        }
        Err(e) => {
            outcomes.push(RotationOutcome::Error(format!(
                "backup creation failed: {:#}",
                e
            )));
        }
    }

    outcomes
}

/// Try to evict one candidate, falling back to the policy when it is locked
/// or the panel refuses the delete.
fn consider_candidate(
    server: &str,
    backup: &Backup,
    policy: &mut RotationPolicy,
    dry_run: bool,
    registry: &dyn BackupRegistry,
    decisions: &mut dyn DecisionSource,
) -> CandidateOutcome {
    if !backup.locked {
        if dry_run {
            info!(
                "[dry-run] Would delete backup {} for server {}",
                backup.id, server
            );
            return CandidateOutcome::Deleted(backup.id.clone());
        }

        match registry.delete_backup(server, &backup.id) {
            Ok(()) => {
                info!("Deleted oldest backup {} for server {}", backup.id, server);
                return CandidateOutcome::Deleted(backup.id.clone());
            }
            Err(e) => {
                // A refused delete is handled the same way as a locked backup
                warn!(
                    "Failed to delete backup {} for server {}: {:#}",
                    backup.id, server, e
                );
            }
        }
    }

    resolve_refusal(server, backup, policy, decisions)
}

/// Consult the policy for a candidate that could not be deleted
fn resolve_refusal(
    server: &str,
    backup: &Backup,
    policy: &mut RotationPolicy,
    decisions: &mut dyn DecisionSource,
) -> CandidateOutcome {
    match *policy {
        RotationPolicy::AutoDeleteNext => CandidateOutcome::TryNext,
        RotationPolicy::SkipCreation => CandidateOutcome::Abort,
        RotationPolicy::AskEachTime => match decisions.decide(server, backup) {
            Ok(decision) => {
                if decision.remember {
                    *policy = match decision.action {
                        DecisionAction::Continue => RotationPolicy::AutoDeleteNext,
                        DecisionAction::Abort => RotationPolicy::SkipCreation,
                    };
                    info!("Remembering locked-backup policy: {:?}", *policy);
                }
                match decision.action {
                    DecisionAction::Continue => CandidateOutcome::TryNext,
                    DecisionAction::Abort => CandidateOutcome::Abort,
                }
            }
            Err(e) => {
                warn!("No decision for server {}: {:#}; aborting rotation", server, e);
                CandidateOutcome::Abort
            }
        },
    }
}

/// Fixed-format timestamped backup label, second resolution
pub fn backup_name(now: DateTime<Local>) -> String {
    format!("AutoBackup-{}", now.format("%Y%m%d-%H%M%S"))
}
