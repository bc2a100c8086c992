use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::transport::TransportSettings;

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(s) = path.to_str() {
        if let Some(stripped) = s.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if s == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

/// Configuration for git-ls-remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LsRemoteConfig {
    /// Seconds to wait on the remote; negative or absent means no limit
    #[serde(default)]
    pub timeout: Option<i64>,
    /// upload-pack program for local and ssh remotes
    #[serde(default = "defaults::upload_pack")]
    pub upload_pack: String,
    /// ssh program, optionally followed by arguments
    #[serde(default = "defaults::ssh_command")]
    pub ssh_command: String,
}

impl Default for LsRemoteConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            upload_pack: defaults::upload_pack(),
            ssh_command: defaults::ssh_command(),
        }
    }
}

impl LsRemoteConfig {
    /// Load configuration from the config file (if any) and environment variables
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        tracing::debug!("loading git-ls-remote config from {:?}", config_path);
        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|name| env::var(name).ok())?;
        Ok(config)
    }

    /// Apply environment overrides, looked up through `var`
    pub fn apply_env<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(timeout) = var("GIT_LS_REMOTE_TIMEOUT") {
            self.timeout = Some(
                timeout
                    .trim()
                    .parse()
                    .context("Failed to parse GIT_LS_REMOTE_TIMEOUT as an integer")?,
            );
        }

        if let Some(upload_pack) = var("GIT_LS_REMOTE_UPLOAD_PACK") {
            self.upload_pack = upload_pack;
        }

        if let Some(ssh_command) = var("GIT_SSH_COMMAND") {
            self.ssh_command = ssh_command;
        }

        Ok(())
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: LsRemoteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Config file path, honouring GIT_LS_REMOTE_CONFIG
    pub fn config_file_path() -> Result<PathBuf> {
        if let Ok(path) = env::var("GIT_LS_REMOTE_CONFIG") {
            return Ok(expand_tilde(&PathBuf::from(path)));
        }
        dirs::home_dir()
            .map(|home| home.join(".config/git-ls-remote/config.yaml"))
            .context("Could not determine home directory for config file")
    }

    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            upload_pack: self.upload_pack.clone(),
            ssh_command: self.ssh_command.clone(),
        }
    }
}

mod defaults {
    pub(crate) fn upload_pack() -> String {
        "git-upload-pack".to_string()
    }

    pub(crate) fn ssh_command() -> String {
        "ssh".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(
            &config_path,
            "timeout: 30\nupload_pack: /opt/git/bin/git-upload-pack\n",
        )
        .unwrap();

        let loaded = LsRemoteConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded.timeout, Some(30));
        assert_eq!(loaded.upload_pack, "/opt/git/bin/git-upload-pack");
        assert_eq!(loaded.ssh_command, "ssh");
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "{}\n").unwrap();

        let loaded = LsRemoteConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, LsRemoteConfig::default());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        std::fs::write(&config_path, "timeout: 5\ncolour: blue\n").unwrap();

        assert!(LsRemoteConfig::load_from_file(&config_path).is_err());
    }

    #[test]
    fn test_env_override() {
        let vars: HashMap<&str, &str> = [
            ("GIT_LS_REMOTE_TIMEOUT", "-1"),
            ("GIT_SSH_COMMAND", "ssh -i ~/.ssh/deploy"),
        ]
        .into_iter()
        .collect();

        let mut config = LsRemoteConfig {
            timeout: Some(10),
            ..LsRemoteConfig::default()
        };
        config
            .apply_env(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.timeout, Some(-1));
        assert_eq!(config.ssh_command, "ssh -i ~/.ssh/deploy");
        assert_eq!(config.upload_pack, "git-upload-pack");
    }

    #[test]
    fn test_bad_env_timeout() {
        let mut config = LsRemoteConfig::default();
        let result = config.apply_env(|name| {
            (name == "GIT_LS_REMOTE_TIMEOUT").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_tilde_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde(Path::new("~/cfg.yaml")), home.join("cfg.yaml"));
            assert_eq!(expand_tilde(Path::new("~")), home);
        }
        assert_eq!(expand_tilde(Path::new("/etc/cfg.yaml")), PathBuf::from("/etc/cfg.yaml"));
    }
}
