//! Backup Rotator Library
//!
//! Automates backup rotation for game servers managed by a hosting panel:
//! evict the oldest deletable backup when a server is at its quota, then
//! create a fresh one.

pub mod config;
pub mod managers;
pub mod panel;
pub mod rotation;
pub mod utils;

// Re-export commonly used types
pub use config::{load_config, Config, FilePolicyStore, PolicyStore, RotationPolicy};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::rotation::{FleetDirectory, RotationManager};
pub use panel::{Backup, PanelClient};
pub use rotation::{rotate, BackupRegistry, DecisionSource, RotationOutcome};
