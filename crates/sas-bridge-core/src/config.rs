//! Connection profiles and process-wide configuration discovery.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "SAS_BRIDGE_CONFIG";

/// How the SAS engine is reached.
///
/// Only `Ssh` allows copying datasets from a remote host; every other mode
/// requires the engine to share the local filesystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConnectionMode {
    /// Local process over standard streams.
    #[default]
    Stdio,
    /// Remote process over SSH.
    Ssh,
    /// Integrated Object Model.
    Iom,
    /// REST interface.
    Http,
    /// Windows COM.
    Com,
}

/// One named connection profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Profile name.
    #[serde(default)]
    pub name: String,
    /// Connection mode.
    #[serde(default)]
    pub mode: ConnectionMode,
    /// Remote shell program, used to derive the secure-copy program.
    #[serde(default = "default_ssh")]
    pub ssh: String,
    /// Host running SAS.
    #[serde(default)]
    pub host: Option<String>,
    /// Login user on the SAS host.
    #[serde(default)]
    pub user: Option<String>,
    /// Identity file passed to `-i`.
    #[serde(default)]
    pub identity: Option<PathBuf>,
    /// SSH port passed to `-P`.
    #[serde(default)]
    pub port: Option<u16>,
}

fn default_ssh() -> String {
    "ssh".to_string()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: String::new(),
            mode: ConnectionMode::default(),
            ssh: default_ssh(),
            host: None,
            user: None,
            identity: None,
            port: None,
        }
    }
}

impl Profile {
    /// Whether datasets can be fetched from the SAS host with secure copy.
    #[must_use]
    pub fn allows_remote_copy(&self) -> bool {
        self.mode == ConnectionMode::Ssh
    }
}

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Name of the profile to use; the first one when absent.
    #[serde(default)]
    pub default: Option<String>,
    /// Known profiles, in declaration order.
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl BridgeConfig {
    /// Load a configuration file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The profile sessions should use.
    ///
    /// Falls back to the first profile, then to an empty default profile.
    #[must_use]
    pub fn active_profile(&self) -> Profile {
        self.default
            .as_deref()
            .and_then(|name| self.profiles.iter().find(|p| p.name == name))
            .or_else(|| self.profiles.first())
            .cloned()
            .unwrap_or_default()
    }
}

/// Location of the configuration file, if one can be named.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(explicit));
    }
    dirs::config_dir().map(|dir| dir.join("sas-bridge").join("config.json"))
}

/// Discover the active profile without caching.
///
/// A missing file selects the default profile; an unreadable or malformed
/// one is logged and also selects the default profile.
#[must_use]
pub fn discover() -> Profile {
    let Some(path) = config_path() else {
        tracing::info!("No configuration directory, using default SAS profile");
        return Profile::default();
    };
    if !path.is_file() {
        tracing::info!(path = %path.display(), "No SAS bridge configuration, using default profile");
        return Profile::default();
    }
    match BridgeConfig::load(&path) {
        Ok(config) => {
            let profile = config.active_profile();
            tracing::info!(
                path = %path.display(),
                profile = %profile.name,
                mode = ?profile.mode,
                "Loaded SAS bridge configuration"
            );
            profile
        }
        Err(err) => {
            tracing::warn!("{err}; using default SAS profile");
            Profile::default()
        }
    }
}

/// Process-wide active profile, discovered on first use.
pub fn shared_profile() -> Arc<Profile> {
    static PROFILE: OnceLock<Arc<Profile>> = OnceLock::new();
    Arc::clone(PROFILE.get_or_init(|| Arc::new(discover())))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_profile_defaults() {
        let profile: Profile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, Profile::default());
        assert_eq!(profile.ssh, "ssh");
        assert!(!profile.allows_remote_copy());
    }

    #[test]
    fn test_active_profile_prefers_named_default() {
        let config: BridgeConfig = serde_json::from_str(
            r#"{
                "default": "remote",
                "profiles": [
                    {"name": "local"},
                    {"name": "remote", "mode": "SSH", "host": "sas.example.org", "port": 2222}
                ]
            }"#,
        )
        .unwrap();
        let profile = config.active_profile();
        assert_eq!(profile.name, "remote");
        assert_eq!(profile.port, Some(2222));
        assert!(profile.allows_remote_copy());
    }

    #[test]
    fn test_active_profile_falls_back_to_first() {
        let config: BridgeConfig = serde_json::from_str(
            r#"{"default": "missing", "profiles": [{"name": "a", "mode": "IOM"}, {"name": "b"}]}"#,
        )
        .unwrap();
        assert_eq!(config.active_profile().name, "a");
        assert_eq!(BridgeConfig::default().active_profile(), Profile::default());
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = BridgeConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let err = BridgeConfig::load(Path::new("/nonexistent/sas-bridge.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_shared_profile_is_cached() {
        let first = shared_profile();
        let second = shared_profile();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
