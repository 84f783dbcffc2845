use std::{fs, path::PathBuf, time::Duration};

use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};
use toml_edit::{DocumentMut, Item};
use tracing::{debug, info};

use crate::{
    annotations::annotate_table,
    error::{ConfigError, Result},
    utils::{expand_path, parse_duration, xdg_config_home, xdg_data_home},
};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_PROVIDERS_URL: &str = "/p/%package%$%hash%.json";
pub const DEFAULT_METADATA_URL: &str = "/p2/%package%.json";
pub const DEFAULT_PROVIDER_INCLUDE: &str = "p/providers$%hash%.json";

/// Packyard server configuration
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Path to the SQLite database holding packages, versions and maintainers.
    /// Default: $XDG_DATA_HOME/packyard/packyard.db
    pub database_path: Option<String>,

    /// How long an assembled metadata graph stays cached per access scope.
    /// Accepts combinations of d, h, m and s, e.g. "1h" or "1d12h".
    /// Default: 1h
    pub cache_ttl: Option<String>,

    /// URL template of a single provider file in the v1 protocol.
    /// Must contain %package% and %hash%.
    pub providers_url: String,

    /// URL template of a package file in the v2 protocol.
    /// Must contain %package%.
    pub metadata_url: String,

    /// Path template of the provider index listed under provider-includes.
    /// Must contain %hash%.
    pub provider_include: String,

    /// Endpoint clients report installs to, advertised as notify-batch.
    pub notify_batch: Option<String>,

    /// If true, the root document lists every visible package name
    /// under available-packages.
    /// Default: false
    pub list_available_packages: Option<bool>,

    /// Outgoing mail settings used for update failure notifications.
    pub mail: Option<MailConfig>,
}

/// Update failure notification mail settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct MailConfig {
    /// Sender address of notification mails.
    pub from: String,

    /// Text put in front of every notification subject.
    pub subject_prefix: Option<String>,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            from: "packyard@localhost".to_string(),
            subject_prefix: Some("[packyard]".to_string()),
        }
    }
}

impl Config {
    pub fn default_config() -> Self {
        let database_path = xdg_data_home().join("packyard").join("packyard.db");

        Self {
            database_path: Some(database_path.to_string_lossy().into_owned()),
            cache_ttl: Some("1h".to_string()),
            providers_url: DEFAULT_PROVIDERS_URL.to_string(),
            metadata_url: DEFAULT_METADATA_URL.to_string(),
            provider_include: DEFAULT_PROVIDER_INCLUDE.to_string(),
            notify_batch: None,
            list_available_packages: Some(false),
            mail: Some(MailConfig::default()),
        }
    }

    /// Location of the configuration file: `$PACKYARD_CONFIG`, or
    /// `$XDG_CONFIG_HOME/packyard/config.toml`.
    pub fn default_path() -> PathBuf {
        match std::env::var("PACKYARD_CONFIG") {
            Ok(path) => expand_path(&path),
            Err(_) => xdg_config_home().join("packyard").join("config.toml"),
        }
    }

    /// Loads the configuration from [`Config::default_path`], falling back to
    /// the defaults when no file exists.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    pub fn load_from<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();

        let mut config = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;
        Ok(config)
    }

    /// Fills in defaults and validates templates and durations.
    pub fn resolve(&mut self) -> Result<()> {
        self.cache_ttl.get_or_insert_with(|| "1h".to_string());
        self.list_available_packages.get_or_insert(false);

        self.try_cache_ttl()?;

        if !self.providers_url.contains("%package%") {
            return Err(ConfigError::InvalidTemplate {
                field: "providers_url",
                placeholder: "%package%",
            });
        }
        if !self.providers_url.contains("%hash%") {
            return Err(ConfigError::InvalidTemplate {
                field: "providers_url",
                placeholder: "%hash%",
            });
        }
        if !self.metadata_url.contains("%package%") {
            return Err(ConfigError::InvalidTemplate {
                field: "metadata_url",
                placeholder: "%package%",
            });
        }
        if !self.provider_include.contains("%hash%") {
            return Err(ConfigError::InvalidTemplate {
                field: "provider_include",
                placeholder: "%hash%",
            });
        }

        if let Some(mail) = &self.mail {
            if mail.from.trim().is_empty() {
                return Err(ConfigError::EmptyMailFrom);
            }
        }

        Ok(())
    }

    fn try_cache_ttl(&self) -> Result<Duration> {
        match self.cache_ttl.as_deref() {
            None => Ok(DEFAULT_CACHE_TTL),
            Some(value) => {
                parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration(value.to_string()))
            }
        }
    }

    /// Lifetime of cached metadata graphs.
    pub fn cache_ttl(&self) -> Duration {
        self.try_cache_ttl().unwrap_or(DEFAULT_CACHE_TTL)
    }

    /// Database location, honoring the `PACKYARD_DB` override.
    pub fn database_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var("PACKYARD_DB") {
            return expand_path(&path);
        }
        match &self.database_path {
            Some(path) => expand_path(path),
            None => xdg_data_home().join("packyard").join("packyard.db"),
        }
    }

    pub fn lists_available_packages(&self) -> bool {
        self.list_available_packages.unwrap_or(false)
    }

    pub fn mail(&self) -> MailConfig {
        self.mail.clone().unwrap_or_default()
    }

    pub fn save_to<P: Into<PathBuf>>(&self, path: P) -> Result<()> {
        let path = path.into();
        let serialized = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, serialized)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Serializes the configuration with each field's docs as comments.
    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(Item::Table(mail)) = doc.get_mut("mail") {
            annotate_table::<MailConfig>(mail, false)?;
        }

        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::tempdir;

    use super::*;
    use crate::test_utils::with_env;

    #[test]
    fn test_default_config_resolves() {
        let mut config = Config::default_config();
        config.resolve().unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(3600));
        assert!(!config.lists_available_packages());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.providers_url, DEFAULT_PROVIDERS_URL);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
cache_ttl = "30m"
providers_url = "/mirror/p/%package%$%hash%.json"
metadata_url = "/mirror/p2/%package%.json"
provider_include = "mirror/providers$%hash%.json"
list_available_packages = true
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
        assert!(config.lists_available_packages());
        assert_eq!(config.mail, None);
        assert_eq!(config.mail().from, "packyard@localhost");
    }

    #[test]
    fn test_missing_hash_placeholder_rejected() {
        let mut config = Config::default_config();
        config.provider_include = "p/providers.json".to_string();

        let err = config.resolve().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidTemplate {
                field: "provider_include",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_ttl_rejected() {
        let mut config = Config::default_config();
        config.cache_ttl = Some("soon".to_string());
        assert!(matches!(
            config.resolve(),
            Err(ConfigError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_empty_mail_sender_rejected() {
        let mut config = Config::default_config();
        config.mail = Some(MailConfig {
            from: "  ".to_string(),
            subject_prefix: None,
        });
        assert!(matches!(config.resolve(), Err(ConfigError::EmptyMailFrom)));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default_config();
        config.notify_batch = Some("/downloads/".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    #[serial]
    fn test_database_path_env_override() {
        with_env(vec![("PACKYARD_DB", "/var/lib/packyard/test.db")], || {
            let config = Config::default_config();
            assert_eq!(
                config.database_path(),
                PathBuf::from("/var/lib/packyard/test.db")
            );
        });
    }

    #[test]
    #[serial]
    fn test_default_path_env_override() {
        with_env(vec![("PACKYARD_CONFIG", "/etc/packyard.toml")], || {
            assert_eq!(Config::default_path(), PathBuf::from("/etc/packyard.toml"));
        });
    }
}
