//! Runtime configuration, loaded from a JSON file.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one subdirectory per database.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Address the server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("databases")
}

fn default_listen_addr() -> String {
    "127.0.0.1:8888".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            listen_addr: default_listen_addr(),
            log_filter: default_log_filter(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_fields_take_defaults() {
        let config = Config::from_json(r#"{"listen_addr": "0.0.0.0:9000"}"#).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.data_dir, PathBuf::from("databases"));
        assert_eq!(config.log_filter, "info");
        assert_eq!(Config::from_json("{}").unwrap(), Config::default());
    }

    #[test]
    fn loads_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("tabsql.json");
        std::fs::write(&path, r#"{"data_dir": "/srv/tabsql", "log_filter": "tabsql=debug"}"#).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/tabsql"));
        assert_eq!(config.log_filter, "tabsql=debug");
    }

    #[test]
    fn reports_bad_input() {
        assert!(matches!(Config::from_json("{"), Err(ConfigError::Json(_))));
        let missing = Config::from_file(Path::new("/nonexistent/tabsql.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
