//! Configuration module for backup-rotator
//!
//! Handles loading, validating, and persisting configuration from TOML files.
//! The `[rotation]` section doubles as the policy store: an interactive
//! "remember my choice" decision is written back here.

mod loader;
mod store;
mod types;

pub use loader::{load_config, save_config, ConfigError, Result};
pub use store::{FilePolicyStore, PolicyStore};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_expand_tilde() {
        let path = PathBuf::from("~/logs");
        let expanded = expand_tilde(&path);
        assert!(!expanded.starts_with("~"));

        let path = PathBuf::from("/absolute/path");
        let expanded = expand_tilde(&path);
        assert_eq!(expanded, path);
    }
}
