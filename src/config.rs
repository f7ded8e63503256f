//==================================================
// File: config.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Host-side configuration for the native bridge
// Objective: Load embedder settings (user agent, plugin search paths) from TOML
//==================================================

//! Configuration handling for the bridge, including loading and defaults.
//!
//! Scripts never see these settings; only the embedder does. No request timeout
//! is configurable: requests use the transport default.

use anyhow::Context;
use serde::Deserialize;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file name inside the `solvra` config directory.
const CONFIG_FILE: &str = "bridge.toml";

/// Environment variable holding extra plugin search directories.
pub const PLUGIN_PATH_ENV: &str = "SOLVRA_PLUGIN_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub http: HttpConfig,
    pub plugins: PluginConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("solvra-bridge/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Directories searched when an import specifier is not an existing path.
    pub search_paths: Vec<PathBuf>,
    /// Hold a per-handle lock for the duration of each native call.
    pub serialize_calls: bool,
}

impl BridgeConfig {
    /// Default configuration location, `<config_dir>/solvra/bridge.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("solvra").join(CONFIG_FILE))
    }

    /// Load configuration from `path`, or the default location, falling back to
    /// defaults when the file is absent.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        let cfg: Self = toml::from_str(&data)
            .with_context(|| format!("parsing configuration {}", path.display()))?;
        Ok(cfg)
    }

    /// Append directories listed in `SOLVRA_PLUGIN_PATH`.
    pub fn apply_env(&mut self) {
        self.apply_plugin_path(env::var_os(PLUGIN_PATH_ENV));
    }

    pub(crate) fn apply_plugin_path(&mut self, value: Option<OsString>) {
        if let Some(value) = value {
            self.plugins
                .search_paths
                .extend(env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = BridgeConfig::load(Some(dir.path().join("absent.toml").as_path())).expect("load");
        assert_eq!(cfg, BridgeConfig::default());
        assert!(cfg.http.user_agent.starts_with("solvra-bridge/"));
        assert!(!cfg.plugins.serialize_calls);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[plugins]\nsearch_paths = [\"/opt/solvra/plugins\"]").expect("write");
        let cfg = BridgeConfig::load(Some(file.path())).expect("load");
        assert_eq!(
            cfg.plugins.search_paths,
            vec![PathBuf::from("/opt/solvra/plugins")]
        );
        assert_eq!(cfg.http, HttpConfig::default());
    }

    #[test]
    fn full_file_sets_every_field() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(
            file,
            "[http]\nuser_agent = \"embedder/1\"\n\n[plugins]\nsearch_paths = [\"/p\"]\nserialize_calls = true"
        )
        .expect("write");
        let cfg = BridgeConfig::load(Some(file.path())).expect("load");
        assert_eq!(cfg.http.user_agent, "embedder/1");
        assert_eq!(cfg.plugins.search_paths, vec![PathBuf::from("/p")]);
        assert!(cfg.plugins.serialize_calls);
    }

    #[test]
    fn malformed_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "[http\nuser_agent = 3").expect("write");
        let err = BridgeConfig::load(Some(file.path())).expect_err("should fail");
        assert!(format!("{err:#}").contains("parsing configuration"));
    }

    #[test]
    fn plugin_path_env_is_split() {
        let mut cfg = BridgeConfig::default();
        let joined = env::join_paths(["/a", "/b"]).expect("join");
        cfg.apply_plugin_path(Some(joined));
        assert_eq!(
            cfg.plugins.search_paths,
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }
}
