//! Fleet driver - runs the rotation controller across all managed servers
//!
//! Servers are processed sequentially, in panel order. A failure on one
//! server is recorded and never aborts the pass. Policy updates made by an
//! interactive decision are persisted between server iterations so later
//! servers in the same pass observe them.

use crate::config::{PolicyStore, RotationConfig, RotationPolicy};
use crate::panel::{ManagedServer, ServerDetails};
use crate::rotation::{rotate, BackupRegistry, DecisionSource, RotationOutcome};
use crate::utils::locker::with_run_lock;
use anyhow::{Context, Result};
use tracing::{error, info, warn};

/// Server discovery contract the driver consumes
pub trait FleetDirectory {
    fn list_servers(&self) -> Result<Vec<ManagedServer>>;
    fn server_details(&self, server_id: u64) -> Result<ServerDetails>;
}

impl FleetDirectory for crate::panel::PanelClient {
    fn list_servers(&self) -> Result<Vec<ManagedServer>> {
        Ok(self.fetch_servers()?)
    }

    fn server_details(&self, server_id: u64) -> Result<ServerDetails> {
        Ok(self.fetch_server_details(server_id)?)
    }
}

pub struct RotationManager<C> {
    client: C,
    rotation: RotationConfig,
    policy_store: Box<dyn PolicyStore>,
    decisions: Box<dyn DecisionSource>,
}

impl<C> RotationManager<C>
where
    C: FleetDirectory + BackupRegistry,
{
    pub fn new(
        client: C,
        rotation: RotationConfig,
        policy_store: Box<dyn PolicyStore>,
        decisions: Box<dyn DecisionSource>,
    ) -> Self {
        Self {
            client,
            rotation,
            policy_store,
            decisions,
        }
    }

    /// Rotate backups for every managed server
    pub fn rotate_all(&mut self, dry_run_override: bool) -> Result<()> {
        with_run_lock("rotate", || self.run_pass(dry_run_override, None))
    }

    /// Rotate backups for a single server by its identifier
    pub fn rotate_server(&mut self, identifier: &str, dry_run_override: bool) -> Result<()> {
        with_run_lock("rotate", || self.run_pass(dry_run_override, Some(identifier)))
    }

    fn run_pass(&mut self, dry_run_override: bool, only: Option<&str>) -> Result<()> {
        let (mut policy, config_dry_run) = self
            .policy_store
            .load()
            .context("Failed to load rotation policy")?;
        let dry_run = dry_run_override || config_dry_run;

        if dry_run {
            info!("Dry-run mode: no backups will be deleted or created");
        }

        let servers = self
            .client
            .list_servers()
            .context("Failed to list managed servers")?;

        let servers: Vec<ManagedServer> = match only {
            Some(identifier) => {
                let found = servers
                    .into_iter()
                    .find(|s| s.identifier == identifier)
                    .with_context(|| format!("Server '{}' not found on the panel", identifier))?;
                vec![found]
            }
            None => servers,
        };

        if servers.is_empty() {
            warn!("No servers found");
            return Ok(());
        }

        let mut rotated = 0;
        let mut skipped = 0;
        let mut failed = 0;
        let mut errors = Vec::new();

        for server in &servers {
            if only.is_none() && self.rotation.skip_servers.contains(&server.identifier) {
                info!("Skipping '{}' (listed in skip_servers)", server.identifier);
                skipped += 1;
                continue;
            }

            let policy_before = policy;
            let outcomes = self.process_server(server, &mut policy, dry_run);

            for outcome in &outcomes {
                info!("[{}] {}", server.identifier, outcome);
            }

            match outcomes.last() {
                Some(RotationOutcome::BackupCreated(_)) => rotated += 1,
                Some(RotationOutcome::Error(detail)) => {
                    failed += 1;
                    error!("Failed to rotate '{}': {}", server.identifier, detail);
                    errors.push(format!("{}: {}", server.identifier, detail));
                }
                _ => skipped += 1,
            }

            // Persist between iterations so a crash mid-pass loses nothing
            if policy != policy_before {
                if let Err(e) = self.policy_store.save(policy) {
                    warn!("Failed to persist rotation policy: {}", e);
                }
            }
        }

        info!(
            "Rotation summary: {} rotated, {} skipped, {} failed",
            rotated, skipped, failed
        );

        if failed > 0 {
            anyhow::bail!(
                "{} server(s) failed to rotate:\n{}",
                failed,
                errors.join("\n")
            );
        }

        Ok(())
    }

    /// Process one server; all failures are captured as `Error` outcomes
    fn process_server(
        &mut self,
        server: &ManagedServer,
        policy: &mut RotationPolicy,
        dry_run: bool,
    ) -> Vec<RotationOutcome> {
        let details = match self.client.server_details(server.id) {
            Ok(details) => details,
            Err(e) => {
                return vec![RotationOutcome::Error(format!(
                    "failed to fetch server details: {:#}",
                    e
                ))]
            }
        };

        info!(
            "Server '{}' ({}) | backup quota: {}",
            details.name, server.identifier, details.backup_limit
        );

        // Never guess at the backup set: a read failure skips the server
        // instead of risking unbounded backup creation
        let backups = match self.client.list_backups(&server.identifier) {
            Ok(backups) => backups,
            Err(e) => {
                return vec![RotationOutcome::Error(format!(
                    "failed to fetch backups: {:#}",
                    e
                ))]
            }
        };

        info!("'{}' has {} backup(s)", details.name, backups.len());

        rotate(
            &server.identifier,
            details.backup_limit,
            backups,
            policy,
            dry_run,
            &self.client,
            self.decisions.as_mut(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panel::{Backup, CreatedBackup};
    use crate::rotation::{Decision, DecisionAction};
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    struct FakePanel {
        servers: Vec<ManagedServer>,
        details: HashMap<u64, ServerDetails>,
        backups: HashMap<String, Vec<Backup>>,
        fail_backups_for: Option<String>,
        deletes: RefCell<Vec<(String, String)>>,
        creates: RefCell<Vec<String>>,
    }

    impl FakePanel {
        fn new() -> Self {
            Self {
                servers: Vec::new(),
                details: HashMap::new(),
                backups: HashMap::new(),
                fail_backups_for: None,
                deletes: RefCell::new(Vec::new()),
                creates: RefCell::new(Vec::new()),
            }
        }

        fn with_server(mut self, id: u64, identifier: &str, quota: u64, backups: Vec<Backup>) -> Self {
            self.servers.push(ManagedServer {
                id,
                identifier: identifier.to_string(),
            });
            self.details.insert(
                id,
                ServerDetails {
                    name: format!("server-{}", id),
                    backup_limit: quota,
                },
            );
            self.backups.insert(identifier.to_string(), backups);
            self
        }
    }

    impl FleetDirectory for FakePanel {
        fn list_servers(&self) -> Result<Vec<ManagedServer>> {
            Ok(self.servers.clone())
        }

        fn server_details(&self, server_id: u64) -> Result<ServerDetails> {
            self.details
                .get(&server_id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("unknown server {}", server_id))
        }
    }

    impl BackupRegistry for FakePanel {
        fn list_backups(&self, server: &str) -> Result<Vec<Backup>> {
            if self.fail_backups_for.as_deref() == Some(server) {
                anyhow::bail!("panel returned 502: bad gateway");
            }
            Ok(self.backups.get(server).cloned().unwrap_or_default())
        }

        fn delete_backup(&self, server: &str, backup_id: &str) -> Result<()> {
            self.deletes
                .borrow_mut()
                .push((server.to_string(), backup_id.to_string()));
            Ok(())
        }

        fn create_backup(&self, server: &str, name: &str) -> Result<CreatedBackup> {
            self.creates.borrow_mut().push(server.to_string());
            Ok(CreatedBackup {
                name: name.to_string(),
            })
        }
    }

    /// Policy store that never touches disk
    struct MemoryStore {
        policy: Rc<RefCell<RotationPolicy>>,
        dry_run: bool,
        saves: Rc<RefCell<u32>>,
    }

    impl PolicyStore for MemoryStore {
        fn load(&self) -> crate::config::Result<(RotationPolicy, bool)> {
            Ok((*self.policy.borrow(), self.dry_run))
        }

        fn save(&mut self, policy: RotationPolicy) -> crate::config::Result<()> {
            *self.policy.borrow_mut() = policy;
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }

    struct ScriptedDecisions(Vec<Decision>);

    impl DecisionSource for ScriptedDecisions {
        fn decide(&mut self, _server: &str, _backup: &Backup) -> Result<Decision> {
            if self.0.is_empty() {
                anyhow::bail!("no decision scripted");
            }
            Ok(self.0.remove(0))
        }
    }

    fn backup(id: &str, ts: i64, locked: bool) -> Backup {
        Backup {
            id: id.to_string(),
            name: id.to_string(),
            created_at: Utc.timestamp_opt(ts, 0).unwrap(),
            locked,
        }
    }

    fn manager(
        panel: FakePanel,
        rotation: RotationConfig,
        policy: RotationPolicy,
        decisions: Vec<Decision>,
    ) -> (RotationManager<FakePanel>, Rc<RefCell<RotationPolicy>>, Rc<RefCell<u32>>) {
        let shared = Rc::new(RefCell::new(policy));
        let saves = Rc::new(RefCell::new(0));
        let store = MemoryStore {
            policy: Rc::clone(&shared),
            dry_run: false,
            saves: Rc::clone(&saves),
        };
        let manager = RotationManager::new(
            panel,
            rotation,
            Box::new(store),
            Box::new(ScriptedDecisions(decisions)),
        );
        (manager, shared, saves)
    }

    #[test]
    fn test_failure_on_one_server_does_not_abort_the_pass() {
        let mut panel = FakePanel::new()
            .with_server(1, "broken", 2, vec![])
            .with_server(2, "healthy", 2, vec![]);
        panel.fail_backups_for = Some("broken".to_string());

        let (mut manager, _, _) = manager(
            panel,
            RotationConfig::default(),
            RotationPolicy::AutoDeleteNext,
            vec![],
        );

        // The pass itself reports failure, but the healthy server was rotated
        let result = manager.run_pass(false, None);
        assert!(result.is_err());
        assert_eq!(*manager.client.creates.borrow(), vec!["healthy".to_string()]);
    }

    #[test]
    fn test_skip_servers_are_left_alone() {
        let panel = FakePanel::new()
            .with_server(1, "keep-out", 2, vec![])
            .with_server(2, "normal", 2, vec![]);

        let rotation = RotationConfig {
            skip_servers: vec!["keep-out".to_string()],
            ..Default::default()
        };

        let (mut manager, _, _) = manager(panel, rotation, RotationPolicy::AutoDeleteNext, vec![]);
        manager.run_pass(false, None).unwrap();

        assert_eq!(*manager.client.creates.borrow(), vec!["normal".to_string()]);
    }

    #[test]
    fn test_remembered_decision_applies_to_later_servers() {
        // Both servers are at quota with only locked backups. The operator
        // answers "abort, remember" on the first; the second must then be
        // skipped without another prompt.
        let panel = FakePanel::new()
            .with_server(1, "first", 1, vec![backup("a", 100, true)])
            .with_server(2, "second", 1, vec![backup("b", 100, true)]);

        let (mut manager, shared, saves) = manager(
            panel,
            RotationConfig::default(),
            RotationPolicy::AskEachTime,
            vec![Decision {
                action: DecisionAction::Abort,
                remember: true,
            }],
        );

        manager.run_pass(false, None).unwrap();

        assert_eq!(*shared.borrow(), RotationPolicy::SkipCreation);
        assert_eq!(*saves.borrow(), 1);
        assert!(manager.client.creates.borrow().is_empty());
        assert!(manager.client.deletes.borrow().is_empty());
    }

    #[test]
    fn test_single_server_pass_targets_only_that_server() {
        let panel = FakePanel::new()
            .with_server(1, "alpha", 2, vec![])
            .with_server(2, "beta", 2, vec![]);

        let (mut manager, _, _) = manager(
            panel,
            RotationConfig::default(),
            RotationPolicy::AutoDeleteNext,
            vec![],
        );

        manager.run_pass(false, Some("beta")).unwrap();
        assert_eq!(*manager.client.creates.borrow(), vec!["beta".to_string()]);
    }

    #[test]
    fn test_unknown_server_identifier_is_an_error() {
        let panel = FakePanel::new().with_server(1, "alpha", 2, vec![]);

        let (mut manager, _, _) = manager(
            panel,
            RotationConfig::default(),
            RotationPolicy::AutoDeleteNext,
            vec![],
        );

        assert!(manager.run_pass(false, Some("missing")).is_err());
    }
}
