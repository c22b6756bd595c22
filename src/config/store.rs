//! Persistence for the operator's locked-backup policy
//!
//! A "remember my choice" answer during an interactive rotation updates the
//! policy for the rest of the fleet pass and must survive into future runs.
//! The file-backed store rewrites the `[rotation]` section of the config file
//! in place.

use super::loader::{load_config, save_config, Result};
use super::types::RotationPolicy;
use std::path::PathBuf;
use tracing::info;

/// Capability to read and persist the rotation policy
pub trait PolicyStore {
    /// Current policy plus the dry-run flag
    fn load(&self) -> Result<(RotationPolicy, bool)>;

    /// Persist a new policy for future runs
    fn save(&mut self, policy: RotationPolicy) -> Result<()>;
}

/// Policy store backed by the TOML config file
pub struct FilePolicyStore {
    path: PathBuf,
}

impl FilePolicyStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PolicyStore for FilePolicyStore {
    fn load(&self) -> Result<(RotationPolicy, bool)> {
        let config = load_config(&self.path)?;
        Ok((config.rotation.on_locked, config.rotation.dry_run))
    }

    fn save(&mut self, policy: RotationPolicy) -> Result<()> {
        let mut config = load_config(&self.path)?;
        config.rotation.on_locked = policy;
        save_config(&self.path, &config)?;
        info!("Persisted rotation policy: {:?}", policy);
        Ok(())
    }
}
