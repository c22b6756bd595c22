//! Blocking HTTP client for the panel API
//!
//! Two credentials are in play: the application ("admin") key for server
//! discovery and feature limits, and the client key for backup operations.
//! Every request carries a bearer token and a fixed timeout; retry/backoff is
//! deliberately out of scope.

use super::types::*;
use crate::config::PanelConfig;
use crate::rotation::BackupRegistry;
use anyhow::Result;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Panel returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

pub struct PanelClient {
    http: Client,
    base_url: String,
    admin_api_key: String,
    client_api_key: String,
}

impl PanelClient {
    /// Create a new client from panel settings
    pub fn new(config: &PanelConfig) -> std::result::Result<Self, PanelError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            admin_api_key: config.admin_api_key.clone(),
            client_api_key: config.client_api_key.clone(),
        })
    }

    fn admin(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.admin_api_key)
            .header("Accept", "application/json")
    }

    fn client(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.client_api_key)
            .header("Accept", "application/json")
    }

    /// Turn a non-success response into an `Api` error carrying the body
    fn check_status(response: Response) -> std::result::Result<Response, PanelError> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().unwrap_or_default();
            Err(PanelError::Api { status, message })
        }
    }

    /// List all managed servers via the admin API, following pagination
    pub fn fetch_servers(&self) -> std::result::Result<Vec<ManagedServer>, PanelError> {
        let mut servers = Vec::new();
        let mut page = 1;

        loop {
            let url = format!("{}/api/application/servers?page={}", self.base_url, page);
            debug!("Fetching server page {}", page);

            let response = Self::check_status(self.admin(self.http.get(&url)).send()?)?;
            let list: PaginatedList<ServerSummaryAttributes> = response.json()?;

            servers.extend(list.data.into_iter().map(|s| s.attributes.into()));

            if list.meta.pagination.current_page >= list.meta.pagination.total_pages {
                break;
            }
            page += 1;
        }

        info!("Found {} managed servers", servers.len());
        Ok(servers)
    }

    /// Fetch server name and backup quota via the admin API
    pub fn fetch_server_details(&self, server_id: u64) -> std::result::Result<ServerDetails, PanelError> {
        let url = format!("{}/api/application/servers/{}", self.base_url, server_id);

        let response = Self::check_status(self.admin(self.http.get(&url)).send()?)?;
        let envelope: AttributesEnvelope<ServerDetailAttributes> = response.json()?;

        Ok(envelope.attributes.into())
    }

    pub fn fetch_backups(&self, identifier: &str) -> std::result::Result<Vec<Backup>, PanelError> {
        let url = format!(
            "{}/api/client/servers/{}/backups",
            self.base_url, identifier
        );

        let response = Self::check_status(self.client(self.http.get(&url)).send()?)?;
        let list: BackupList = response.json()?;

        Ok(list.data.into_iter().map(|b| b.attributes.into()).collect())
    }

    fn request_delete(&self, identifier: &str, backup_id: &str) -> std::result::Result<(), PanelError> {
        let url = format!(
            "{}/api/client/servers/{}/backups/{}",
            self.base_url, identifier, backup_id
        );

        Self::check_status(self.client(self.http.delete(&url)).send()?)?;
        Ok(())
    }

    fn request_create(&self, identifier: &str, name: &str) -> std::result::Result<CreatedBackup, PanelError> {
        let url = format!(
            "{}/api/client/servers/{}/backups",
            self.base_url, identifier
        );

        let body = serde_json::json!({
            "name": name,
            "ignored": "",
            "is_locked": false,
        });

        let response = Self::check_status(self.client(self.http.post(&url)).json(&body).send()?)?;
        let envelope: AttributesEnvelope<BackupAttributes> = response.json()?;

        Ok(CreatedBackup {
            name: envelope.attributes.name,
        })
    }
}

impl BackupRegistry for PanelClient {
    fn list_backups(&self, server: &str) -> Result<Vec<Backup>> {
        Ok(self.fetch_backups(server)?)
    }

    fn delete_backup(&self, server: &str, backup_id: &str) -> Result<()> {
        Ok(self.request_delete(server, backup_id)?)
    }

    fn create_backup(&self, server: &str, name: &str) -> Result<CreatedBackup> {
        Ok(self.request_create(server, name)?)
    }
}
