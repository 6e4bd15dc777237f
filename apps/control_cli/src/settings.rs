use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TOKEN_FILE: &str = ".control/local_storage.json";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub server_url: String,
    pub token_file: PathBuf,
}

/// Defaults, then `control.toml` (or `config_path`), then `CONTROL__*` env vars.
pub fn load_settings(config_path: Option<&Path>) -> Result<ClientSettings> {
    let file_source = match config_path {
        Some(path) => File::from(path).required(true),
        None => File::with_name("control").required(false),
    };

    Config::builder()
        .set_default("server_url", DEFAULT_SERVER_URL)?
        .set_default("token_file", DEFAULT_TOKEN_FILE)?
        .add_source(file_source)
        .add_source(Environment::with_prefix("CONTROL").separator("__"))
        .build()
        .context("failed to load control settings")?
        .try_deserialize()
        .context("invalid control settings")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("control.toml");
        std::fs::write(&path, "server_url = \"http://control.internal:8080\"\n")
            .expect("write settings");

        let settings = load_settings(Some(&path)).expect("settings");
        assert_eq!(settings.server_url, "http://control.internal:8080");
        assert_eq!(settings.token_file, PathBuf::from(DEFAULT_TOKEN_FILE));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_settings(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
