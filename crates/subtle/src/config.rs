//! Registry configuration.
//!
//! Settings are layered: a configuration file first, then environment variables prefixed with
//! `WCRYPT__` (nested keys separated by `__`). `WCRYPT__DISABLED` takes a comma-separated list.

use crate::error::{CryptoError, CryptoErrorExt};
use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONFIG_FILE: &str = "wcrypt";

/// Which built-in plugins the registry leaves out.
///
/// ```toml
/// disabled = ["SHA-1", "AES-CBC"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Algorithm names, matched case-insensitively.
    pub disabled: Vec<String>,
}

/// Loads a configuration from a file with environment overrides.
///
/// # Arguments
/// * `path`: The configuration file. Defaults to `wcrypt` (any supported extension) in the
///   current working directory.
///
/// # Errors
/// Returns [`CryptoError::Config`] if the file is missing or its content does not match `T`.
///
/// # Example
/// ```rust
/// use wcrypt_subtle::config::{RegistryConfig, load_config};
///
/// let config: RegistryConfig = load_config(Some("config/wcrypt")).unwrap_or_default();
/// assert!(config.disabled.is_empty());
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, CryptoError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(environment());

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

/// The `WCRYPT__` environment source. `WCRYPT__DISABLED` is split on commas.
pub(crate) fn environment() -> Environment {
    Environment::with_prefix("WCRYPT")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("disabled")
        .try_parsing(true)
}
