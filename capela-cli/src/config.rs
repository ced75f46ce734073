//! Configuration management for the Capela CLI.

use anyhow::{bail, Context, Result};
use capela::CapelaClient;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// CLI configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hosted application id.
    pub app_id: Option<String>,
    /// Backend base URL override.
    pub base_url: Option<String>,
    /// Authentication credentials.
    pub auth: Option<AuthConfig>,
}

/// Authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Access token.
    pub token: String,
}

/// Get the configuration file path.
pub fn config_path() -> Result<PathBuf> {
    let exe_path = env::current_exe().context("Could not determine executable path")?;
    let exe_dir = exe_path
        .parent()
        .context("Could not determine executable directory")?;

    Ok(exe_dir.join("capela.toml"))
}

/// Load configuration from file.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path).context("Failed to read config file")?;

    toml::from_str(&content).context("Failed to parse config file")
}

/// Save configuration to file.
pub fn save_config(config: &Config) -> Result<()> {
    let path = config_path()?;
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&path, content).context("Failed to write config file")?;
    Ok(())
}

fn resolved_app_id(config: &Config) -> Result<String> {
    if let Ok(app_id) = env::var("CAPELA_APP_ID") {
        return Ok(app_id);
    }
    match &config.app_id {
        Some(app_id) => Ok(app_id.clone()),
        None => bail!(
            "No app id configured. Run `capela auth set --app-id <APP_ID> <TOKEN>` \
             or set CAPELA_APP_ID."
        ),
    }
}

/// Build a client carrying the stored credentials.
pub fn build_authed_client() -> Result<CapelaClient> {
    let config = load_config()?;
    let app_id = resolved_app_id(&config)?;

    let token = match env::var("CAPELA_TOKEN") {
        Ok(token) => token,
        Err(_) => match &config.auth {
            Some(auth) => auth.token.clone(),
            None => bail!("Not signed in. Run `capela auth set <TOKEN>` first."),
        },
    };

    let mut builder = CapelaClient::builder().app_id(app_id).auth(token);
    if let Some(base_url) = &config.base_url {
        builder = builder.base_url(base_url.clone());
    }
    builder.build().context("Failed to build client")
}
