use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use assetry_pipeline::{AssetConfig, DEFAULT_MAX_FILE_SIZE, DEFAULT_THUMBNAIL_WIDTH};
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Environment variable overriding [`ServerConfig::files_root`].
pub const ENV_FILES_ROOT: &str = "ASSETRY_FILES_ROOT";
/// Environment variable overriding [`ServerConfig::max_file_size`].
pub const ENV_MAX_FILE_SIZE: &str = "ASSETRY_MAX_FILE_SIZE";
/// Environment variable overriding [`ServerConfig::bind_addr`].
pub const ENV_BIND_ADDR: &str = "ASSETRY_BIND_ADDR";

/// Room for multipart boundaries, headers and the small text fields on top
/// of the file itself.
const MULTIPART_OVERHEAD: u64 = 64 * 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub files_root: PathBuf,
    pub max_file_size: u64,
    pub thumbnail_width: u32,
    pub thumbnail_quality: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation_timeout_secs: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            files_root: PathBuf::from("files"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            thumbnail_width: DEFAULT_THUMBNAIL_WIDTH,
            thumbnail_quality: 80,
            derivation_timeout_secs: None,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load a TOML file.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Apply `ASSETRY_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> ServerResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> ServerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup(ENV_FILES_ROOT) {
            self.files_root = PathBuf::from(root);
        }
        if let Some(size) = lookup(ENV_MAX_FILE_SIZE) {
            self.max_file_size = size.trim().parse().map_err(|e| {
                ServerError::Config(format!("{ENV_MAX_FILE_SIZE}={size:?}: {e}"))
            })?;
        }
        if let Some(addr) = lookup(ENV_BIND_ADDR) {
            self.bind_addr = addr.trim().parse().map_err(|e| {
                ServerError::Config(format!("{ENV_BIND_ADDR}={addr:?}: {e}"))
            })?;
        }
        Ok(())
    }

    /// The asset core's view of this configuration.
    pub fn asset_config(&self) -> AssetConfig {
        AssetConfig {
            files_root: self.files_root.clone(),
            max_file_size: self.max_file_size,
            thumbnail_width: self.thumbnail_width,
            thumbnail_quality: self.thumbnail_quality,
            derivation_timeout: self.derivation_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Request body limit for upload routes.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_file_size.saturating_add(MULTIPART_OVERHEAD)).unwrap_or(usize::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_file_size, 16 * 1024 * 1024);
        assert_eq!(c.thumbnail_width, 720);
        assert!(c.derivation_timeout_secs.is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml_str(
            r#"
            files_root = "/srv/assets"
            max_file_size = 1024
            "#,
        )
        .unwrap();
        assert_eq!(c.files_root, PathBuf::from("/srv/assets"));
        assert_eq!(c.max_file_size, 1024);
        assert_eq!(c.thumbnail_width, 720);
    }

    #[test]
    fn toml_round_trip() {
        let c = ServerConfig {
            derivation_timeout_secs: Some(30),
            ..ServerConfig::default()
        };
        let text = c.to_toml().unwrap();
        assert_eq!(ServerConfig::from_toml_str(&text).unwrap(), c);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = ServerConfig::from_toml_str("max_file_size = \"lots\"").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn overrides_apply() {
        let env: HashMap<&str, &str> = [
            (ENV_FILES_ROOT, "/data/files"),
            (ENV_MAX_FILE_SIZE, "2048"),
            (ENV_BIND_ADDR, "0.0.0.0:9000"),
        ]
        .into_iter()
        .collect();
        let mut c = ServerConfig::default();
        c.apply_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(c.files_root, PathBuf::from("/data/files"));
        assert_eq!(c.max_file_size, 2048);
        assert_eq!(c.bind_addr.port(), 9000);
    }

    #[test]
    fn bad_override_is_rejected() {
        let mut c = ServerConfig::default();
        let err = c
            .apply_overrides(|k| (k == ENV_MAX_FILE_SIZE).then(|| "sixteen".to_string()))
            .unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn asset_config_mirrors_settings() {
        let c = ServerConfig {
            derivation_timeout_secs: Some(5),
            ..ServerConfig::default()
        };
        let a = c.asset_config();
        assert_eq!(a.max_file_size, c.max_file_size);
        assert_eq!(a.derivation_timeout, Some(Duration::from_secs(5)));
        assert!(c.body_limit() as u64 > c.max_file_size);
    }
}
