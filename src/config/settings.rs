//! Configuration settings management
//!
//! This module handles loading the YAML configuration file, applying
//! environment overrides, and validating connection parameters.

use crate::error::{BlobCliError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use zeroize::Zeroizing;

pub const DEFAULT_SAS_VALIDITY_MINUTES: u64 = 15;
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 3;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// One year
pub const MAX_SAS_VALIDITY_MINUTES: u64 = 365 * 24 * 60;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Optional tuning knobs of the storage section. Unset fields take the defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageOptions {
    /// SAS validity in minutes
    pub sas_validity_duration: Option<u64>,
    /// Pause between upload attempts in seconds
    pub retry_interval: Option<u64>,
    pub max_retries: Option<u32>,
    #[serde(rename = "skipTLSVerification")]
    pub skip_tls_verification: Option<bool>,
    /// Apply the upload retry policy to downloads as well
    pub retry_downloads: Option<bool>,
}

/// The `blobConfigs` section exactly as it appears in the file
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStorageConfig {
    pub url: Option<String>,
    pub account: Option<String>,
    pub key: Option<String>,
    #[serde(flatten)]
    pub options: StorageOptions,
}

impl fmt::Debug for RawStorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStorageConfig")
            .field("url", &self.url)
            .field("account", &self.account)
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("options", &self.options)
            .finish()
    }
}

/// Everything read from the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub blob_configs: RawStorageConfig,
    /// Manifest of file names driving batch downloads
    #[serde(default)]
    pub file_list: Option<Vec<String>>,
}

impl Settings {
    /// Validate the storage section into an immutable [`StorageConfig`]
    pub fn storage_config(&self) -> Result<StorageConfig> {
        let raw = &self.blob_configs;
        StorageConfig::new(
            raw.url.clone().unwrap_or_default(),
            raw.account.clone().unwrap_or_default(),
            raw.key.clone().unwrap_or_default(),
            Some(raw.options.clone()),
        )
    }

    pub fn manifest(&self) -> Option<&[String]> {
        self.file_list.as_deref()
    }
}

/// Validated connection and retry parameters.
///
/// Built once at startup and never mutated afterwards.
#[derive(Clone)]
pub struct StorageConfig {
    url: Url,
    account: String,
    account_key: Zeroizing<String>,
    sas_validity_minutes: u64,
    retry_interval: Duration,
    max_retries: u32,
    skip_tls_verification: bool,
    retry_downloads: bool,
}

impl StorageConfig {
    pub fn new(
        url: impl Into<String>,
        account: impl Into<String>,
        account_key: impl Into<String>,
        options: Option<StorageOptions>,
    ) -> Result<Self> {
        let url = url.into();
        let account = account.into();
        let account_key = Zeroizing::new(account_key.into());

        if url.trim().is_empty() {
            return Err(BlobCliError::config(
                "Need an azure storage URL for communication",
            ));
        }
        if account.trim().is_empty() {
            return Err(BlobCliError::config("Need an azure account to work with"));
        }
        if account_key.trim().is_empty() {
            return Err(BlobCliError::config(
                "Need an azure account key for authentication",
            ));
        }

        let url = Url::parse(url.trim())
            .map_err(|e| BlobCliError::config(format!("Invalid storage URL '{url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(BlobCliError::config(format!(
                "Storage URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        let options = options.unwrap_or_default();

        let sas_validity_minutes = options
            .sas_validity_duration
            .unwrap_or(DEFAULT_SAS_VALIDITY_MINUTES);
        if !(1..=MAX_SAS_VALIDITY_MINUTES).contains(&sas_validity_minutes) {
            return Err(BlobCliError::config(format!(
                "sasValidityDuration must be between 1 and {MAX_SAS_VALIDITY_MINUTES} minutes, got {sas_validity_minutes}"
            )));
        }

        Ok(Self {
            url,
            account: account.trim().to_string(),
            account_key,
            sas_validity_minutes,
            retry_interval: Duration::from_secs(
                options.retry_interval.unwrap_or(DEFAULT_RETRY_INTERVAL_SECS),
            ),
            max_retries: options.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            skip_tls_verification: options.skip_tls_verification.unwrap_or(false),
            retry_downloads: options.retry_downloads.unwrap_or(false),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn account_key(&self) -> &str {
        &self.account_key
    }

    pub fn sas_validity_minutes(&self) -> u64 {
        self.sas_validity_minutes
    }

    pub fn sas_validity(&self) -> Duration {
        Duration::from_secs(self.sas_validity_minutes * 60)
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// First attempt plus `max_retries` retries
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn skip_tls_verification(&self) -> bool {
        self.skip_tls_verification
    }

    pub fn retry_downloads(&self) -> bool {
        self.retry_downloads
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("url", &self.url.as_str())
            .field("account", &self.account)
            .field("account_key", &"<redacted>")
            .field("sas_validity_minutes", &self.sas_validity_minutes)
            .field("retry_interval", &self.retry_interval)
            .field("max_retries", &self.max_retries)
            .field("skip_tls_verification", &self.skip_tls_verification)
            .field("retry_downloads", &self.retry_downloads)
            .finish()
    }
}

/// Work out which configuration file to read.
///
/// Priority: explicit path > `./config.yaml` > platform config directory.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Ok(local);
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| BlobCliError::config("Unable to determine config directory"))?;
    Ok(config_dir.join("blobcli").join(CONFIG_FILE_NAME))
}

/// Load settings from the given file, then apply environment overrides.
///
/// A missing file is only an error when it was asked for explicitly; otherwise
/// the environment alone has to provide the connection parameters.
pub async fn load_settings(path: &Path, explicit: bool) -> Result<Settings> {
    let mut settings = if path.exists() {
        let contents = tokio::fs::read_to_string(path).await?;
        parse_settings(&contents)?
    } else if explicit {
        return Err(BlobCliError::config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    } else {
        tracing::debug!("No configuration file at {}, using environment", path.display());
        Settings::default()
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub fn parse_settings(contents: &str) -> Result<Settings> {
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    Ok(serde_yaml::from_str(contents)?)
}

/// Override file values with `AZURE_STORAGE_*` and `BLOBCLI_DEBUG`
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("BLOBCLI_DEBUG") {
        settings.debug = value.to_lowercase() == "true" || value == "1";
    }

    if let Some(value) = lookup("AZURE_STORAGE_URL") {
        settings.blob_configs.url = Some(value);
    }

    if let Some(value) = lookup("AZURE_STORAGE_ACCOUNT") {
        settings.blob_configs.account = Some(value);
    }

    if let Some(value) = lookup("AZURE_STORAGE_KEY") {
        settings.blob_configs.key = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
debug: true
blobConfigs:
  url: https://acct.blob.core.windows.net
  account: acct
  key: c2VjcmV0
  maxRetries: 5
  skipTLSVerification: true
fileList:
  - a.csv
  - b.csv
"#;

    #[test]
    fn test_parse_settings() {
        let settings = parse_settings(SAMPLE).unwrap();
        assert!(settings.debug);
        assert_eq!(settings.manifest().unwrap(), ["a.csv", "b.csv"]);

        let config = settings.storage_config().unwrap();
        assert_eq!(config.account(), "acct");
        assert_eq!(config.max_retries(), 5);
        assert_eq!(config.max_attempts(), 6);
        assert!(config.skip_tls_verification());
        assert_eq!(config.sas_validity_minutes(), DEFAULT_SAS_VALIDITY_MINUTES);
        assert_eq!(config.retry_interval(), Duration::from_secs(3));
        assert!(!config.retry_downloads());
    }

    #[test]
    fn test_missing_manifest_is_none() {
        let settings = parse_settings("blobConfigs:\n  account: acct\n").unwrap();
        assert!(settings.manifest().is_none());
        assert!(!settings.debug);
    }

    #[test]
    fn test_debug_output_redacts_key() {
        let settings = parse_settings(SAMPLE).unwrap();
        let config = settings.storage_config().unwrap();

        assert!(!format!("{config:?}").contains("c2VjcmV0"));
        assert!(!format!("{settings:?}").contains("c2VjcmV0"));
    }

    #[test]
    fn test_rejects_non_http_url() {
        let err = StorageConfig::new("ftp://acct", "acct", "key", None).unwrap_err();
        assert!(matches!(err, BlobCliError::ConfigError(_)));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("AZURE_STORAGE_URL", "http://127.0.0.1:10000/devstoreaccount1"),
            ("AZURE_STORAGE_ACCOUNT", "devstoreaccount1"),
            ("BLOBCLI_DEBUG", "1"),
        ]);

        let mut settings = parse_settings(SAMPLE).unwrap();
        settings.debug = false;
        apply_env_overrides(&mut settings, |k| env.get(k).map(|v| v.to_string()));

        assert!(settings.debug);
        let config = settings.storage_config().unwrap();
        assert_eq!(config.account(), "devstoreaccount1");
        assert_eq!(config.url().port(), Some(10000));
        assert_eq!(config.account_key(), "c2VjcmV0");
    }

    #[test]
    fn test_resolve_explicit_path() {
        let path = resolve_config_path(Some(PathBuf::from("/etc/blobcli.yaml"))).unwrap();
        assert_eq!(path, PathBuf::from("/etc/blobcli.yaml"));
    }
}
