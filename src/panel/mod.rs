//! Panel API integration
//!
//! Wraps the hosting panel's HTTP API behind typed calls. The rotation core
//! only ever sees the `BackupRegistry` trait; everything HTTP-shaped stays in
//! this module.

mod client;
mod types;

pub use client::{PanelClient, PanelError};
pub use types::{Backup, CreatedBackup, ManagedServer, ServerDetails};
