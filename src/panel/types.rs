//! Panel API data types
//!
//! The panel wraps every resource in an `attributes` envelope; the wire
//! structs below mirror that and convert into the flat domain types the rest
//! of the crate works with.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One stored snapshot of a server, as seen by the rotation controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backup {
    /// Backup UUID assigned by the panel at creation
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Locked backups cannot be deleted by this tool
    pub locked: bool,
}

/// Result of a successful create request
#[derive(Debug, Clone)]
pub struct CreatedBackup {
    pub name: String,
}

/// A server known to the admin API
#[derive(Debug, Clone)]
pub struct ManagedServer {
    /// Internal numeric id (admin API)
    pub id: u64,
    /// Short identifier used by the client API
    pub identifier: String,
}

/// Per-server details relevant to rotation
#[derive(Debug, Clone)]
pub struct ServerDetails {
    pub name: String,
    /// Maximum number of backups the server may hold; 0 disables backups
    pub backup_limit: u64,
}

// Wire format

#[derive(Debug, Deserialize)]
pub(crate) struct PaginatedList<T> {
    pub data: Vec<AttributesEnvelope<T>>,
    pub meta: ListMeta,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BackupList {
    pub data: Vec<AttributesEnvelope<BackupAttributes>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttributesEnvelope<T> {
    pub attributes: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListMeta {
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerSummaryAttributes {
    pub id: u64,
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ServerDetailAttributes {
    pub name: String,
    #[serde(default)]
    pub feature_limits: FeatureLimits,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct FeatureLimits {
    #[serde(default)]
    pub backups: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BackupAttributes {
    pub uuid: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_locked: bool,
}

impl From<BackupAttributes> for Backup {
    fn from(attrs: BackupAttributes) -> Self {
        Self {
            id: attrs.uuid,
            name: attrs.name,
            created_at: attrs.created_at,
            locked: attrs.is_locked,
        }
    }
}

impl From<ServerSummaryAttributes> for ManagedServer {
    fn from(attrs: ServerSummaryAttributes) -> Self {
        Self {
            id: attrs.id,
            identifier: attrs.identifier,
        }
    }
}

impl From<ServerDetailAttributes> for ServerDetails {
    fn from(attrs: ServerDetailAttributes) -> Self {
        Self {
            name: attrs.name,
            backup_limit: attrs.feature_limits.backups,
        }
    }
}
