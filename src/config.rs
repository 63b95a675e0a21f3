use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use crate::error::TransferError;

const LOCAL_OVERRIDE_FILE: &str = "playlist_config.local.toml";
const LOCAL_FILE: &str = "playlist_config.toml";
const DEFAULT_OUTDIR: &str = "./";

/// What to do when a playlist title matches more than one playlist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AmbiguityPolicy {
    /// Take the first match in server order.
    #[default]
    FirstMatch,
    /// Fail instead of guessing.
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outdir: Option<String>,

    #[serde(default)]
    pub ambiguity: AmbiguityPolicy,

    #[serde(default = "default_resolve_concurrency")]
    pub resolve_concurrency: usize,
}

fn default_resolve_concurrency() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            outdir: None,
            ambiguity: AmbiguityPolicy::default(),
            resolve_concurrency: default_resolve_concurrency(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .wrap_err(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Per-user config file location
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("plex-playlist-transfer").join("config.toml"))
    }

    /// First config file that applies, in lookup order: the explicit path, the
    /// local override, the local file, then the per-user file.
    ///
    /// An explicit path is returned even when it does not exist yet, since it
    /// may be the target of `--init-config`.
    pub fn find_path(explicit: Option<&Path>, working_dir: &Path) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(expand_path(&path.to_string_lossy()));
        }

        [
            Some(working_dir.join(LOCAL_OVERRIDE_FILE)),
            Some(working_dir.join(LOCAL_FILE)),
            Self::user_config_path(),
        ]
        .into_iter()
        .flatten()
        .find(|path| path.is_file())
    }

    /// Resolve and load the config. Missing files produce the defaults.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<Self> {
        match Self::find_path(explicit, working_dir) {
            Some(path) if path.is_file() => {
                log::debug!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            Some(path) => {
                log::warn!(
                    "Config file {} does not exist; using defaults",
                    path.display()
                );
                Ok(Self::default())
            }
            None => {
                log::debug!("No config file found; using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write a starter config holding the connection settings and return its path.
    pub fn init(
        explicit: Option<&Path>,
        url: Option<String>,
        token: Option<String>,
        outdir: Option<String>,
    ) -> Result<PathBuf> {
        let path = match explicit {
            Some(path) => expand_path(&path.to_string_lossy()),
            None => Self::user_config_path()
                .ok_or_else(|| color_eyre::eyre::eyre!("No default config directory found"))?,
        };

        let config = Config {
            url: Some(url.unwrap_or_default()),
            token: Some(token.unwrap_or_default()),
            outdir: Some(outdir.unwrap_or_else(|| DEFAULT_OUTDIR.to_string())),
            ..Config::default()
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).wrap_err(format!(
                    "Failed to create config directory: {}",
                    parent.display()
                ))?;
            }
        }

        let contents = toml::to_string_pretty(&config).wrap_err("Failed to serialize config")?;
        std::fs::write(&path, contents)
            .wrap_err(format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    /// Server URL and token, CLI values winning over the file.
    pub fn credentials(
        &self,
        url: Option<String>,
        token: Option<String>,
    ) -> std::result::Result<(String, String), TransferError> {
        let url = url
            .or_else(|| self.url.clone())
            .filter(|u| !u.trim().is_empty());
        let token = token
            .or_else(|| self.token.clone())
            .filter(|t| !t.trim().is_empty());

        match (url, token) {
            (Some(url), Some(token)) => Ok((url, token)),
            _ => Err(TransferError::MissingCredentials),
        }
    }

    /// Export directory, CLI value winning over the file.
    pub fn outdir_path(&self, cli: Option<&Path>) -> PathBuf {
        match cli {
            Some(path) => path.to_path_buf(),
            None => expand_path(self.outdir.as_deref().unwrap_or(DEFAULT_OUTDIR)),
        }
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            url = "http://plex.local:32400"
            token = "abc"
            outdir = "/tmp/exports"
            ambiguity = "error"
            resolve_concurrency = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.url.as_deref(), Some("http://plex.local:32400"));
        assert_eq!(config.ambiguity, AmbiguityPolicy::Error);
        assert_eq!(config.resolve_concurrency, 4);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.ambiguity, AmbiguityPolicy::FirstMatch);
        assert_eq!(config.resolve_concurrency, 1);
    }

    #[test]
    fn test_local_override_wins_over_local_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOCAL_FILE), "token = \"plain\"").unwrap();
        std::fs::write(dir.path().join(LOCAL_OVERRIDE_FILE), "token = \"override\"").unwrap();

        let config = Config::load(None, dir.path()).unwrap();
        assert_eq!(config.token.as_deref(), Some("override"));
    }

    #[test]
    fn test_explicit_missing_path_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");

        let config = Config::load(Some(&path), dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "url = [unterminated").unwrap();

        assert!(Config::load(Some(&path), dir.path()).is_err());
    }

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let written = Config::init(
            Some(&path),
            Some("http://plex:32400".into()),
            Some("tok".into()),
            None,
        )
        .unwrap();

        assert_eq!(written, path);
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.url.as_deref(), Some("http://plex:32400"));
        assert_eq!(config.token.as_deref(), Some("tok"));
        assert_eq!(config.outdir.as_deref(), Some("./"));
    }

    #[test]
    fn test_credentials_prefer_cli() {
        let config = Config {
            url: Some("http://file:32400".into()),
            token: Some("file-token".into()),
            ..Config::default()
        };

        let (url, token) = config
            .credentials(Some("http://cli:32400".into()), None)
            .unwrap();
        assert_eq!(url, "http://cli:32400");
        assert_eq!(token, "file-token");
    }

    #[test]
    fn test_credentials_missing_token() {
        let config = Config {
            url: Some("http://file:32400".into()),
            token: Some("".into()),
            ..Config::default()
        };

        assert_eq!(
            config.credentials(None, None),
            Err(TransferError::MissingCredentials)
        );
    }

    #[test]
    fn test_outdir_defaults_to_current_directory() {
        let config = Config::default();
        assert_eq!(config.outdir_path(None), PathBuf::from("./"));
        assert_eq!(
            config.outdir_path(Some(Path::new("/srv/exports"))),
            PathBuf::from("/srv/exports")
        );
    }
}
