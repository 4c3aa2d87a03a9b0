//! Application configuration loading for CLI defaults.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use fdroid_downloader::ClientConfig;
use serde::Deserialize;

use crate::cli::Args;

/// TOML-backed file configuration for downloader defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Repository base URL.
    pub base_url: Option<String>,
    /// Default output directory for downloads.
    pub output_dir: Option<PathBuf>,
    /// Default fuzzy search mode.
    pub search: Option<bool>,
    /// Accelerator program name or path.
    pub accelerator: Option<String>,
    /// `false` disables the accelerator entirely.
    pub use_accelerator: Option<bool>,
    /// Honor proxy environment variables.
    pub trust_env: Option<bool>,
    /// Search/detail page timeout in seconds.
    pub metadata_timeout_secs: Option<u64>,
    /// Body read idle timeout in seconds.
    pub download_timeout_secs: Option<u64>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Validates config values against runtime constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base_url {
            validate_base_url(base_url)?;
        }
        if let Some(accelerator) = &self.accelerator {
            if accelerator.trim().is_empty() {
                bail!("Invalid config value for `accelerator`: must not be empty");
            }
        }
        validate_timeout_secs("metadata_timeout_secs", self.metadata_timeout_secs)?;
        validate_timeout_secs("download_timeout_secs", self.download_timeout_secs)?;
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Rejects base URLs that are not absolute http(s) URLs.
pub fn validate_base_url(value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .with_context(|| format!("Invalid base URL '{value}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("Invalid base URL '{value}': expected an http or https URL");
    }
    Ok(())
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/fdroid-downloader/config.toml`
/// 2. `$HOME/.config/fdroid-downloader/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("fdroid-downloader")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("fdroid-downloader")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads the config file.
///
/// An explicit path must exist; the default path is optional.
pub fn load_file_config(explicit: Option<&Path>) -> Result<Option<FileConfig>> {
    if let Some(path) = explicit {
        return load_from_path(path).map(Some);
    }
    match resolve_default_config_path() {
        Some(path) if path.exists() => load_from_path(&path).map(Some),
        _ => Ok(None),
    }
}

fn load_from_path(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let config: FileConfig = toml::from_str(raw)?;
    config.validate()?;
    Ok(config)
}

/// Settings for one run after merging CLI flags over the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub client: ClientConfig,
    pub output_dir: PathBuf,
    pub search: bool,
}

/// Merges CLI arguments over file config over built-in defaults.
pub fn resolve_settings(args: &Args, file: Option<&FileConfig>) -> Result<RunSettings> {
    let defaults = FileConfig::default();
    let file = file.unwrap_or(&defaults);

    let mut client = ClientConfig::default();
    if let Some(base_url) = args.base_url.as_ref().or(file.base_url.as_ref()) {
        validate_base_url(base_url)?;
        client.base_url.clone_from(base_url);
    }
    if let Some(accelerator) = &file.accelerator {
        client.accelerator = Some(accelerator.clone());
    }
    if args.no_accelerator || file.use_accelerator == Some(false) {
        client.accelerator = None;
    }
    if let Some(trust_env) = file.trust_env {
        client.trust_env = trust_env;
    }
    if let Some(secs) = file.metadata_timeout_secs {
        client.metadata_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.download_timeout_secs {
        client.download_read_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = file.connect_timeout_secs {
        client.connect_timeout = Duration::from_secs(secs);
    }

    let output_dir = args
        .dir
        .clone()
        .or_else(|| file.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let search = args.search_override().or(file.search).unwrap_or(false);

    Ok(RunSettings {
        client,
        output_dir,
        search,
    })
}
