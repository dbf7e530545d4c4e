mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./vidshelf.toml",
        "./config.toml",
        "~/.config/vidshelf/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {:?}", path);
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.delivery.native_codec.trim().is_empty() {
        anyhow::bail!("delivery.native_codec cannot be empty");
    }

    if config.delivery.chunk_size == 0 {
        anyhow::bail!("delivery.chunk_size must be greater than 0");
    }

    if !config.transcode.args.iter().any(|a| a.contains("{input}")) {
        anyhow::bail!("transcode.args must reference the source file as {{input}}");
    }

    if config.library.extensions.is_empty() {
        tracing::warn!("library.extensions is empty; scans will find nothing");
    }

    for root in &config.library.roots {
        let expanded = shellexpand::tilde(&root.to_string_lossy()).to_string();
        if !Path::new(&expanded).exists() {
            tracing::warn!("Library root does not exist: {}", expanded);
        }
    }

    Ok(())
}
