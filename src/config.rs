//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/bograph/bograph.toml`
//! 3. Local config: `--config <file>`, else `./bograph.toml` if present
//! 4. Environment variables: `BOGRAPH_*` prefix, `__` between sections
//!    (`BOGRAPH_SERVER__PORT=8080`)

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::RenderLimits;

/// Name of the local config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "bograph.toml";

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind, 0 picks a free port
    pub port: u16,
    /// Directory served for GET requests that match no route
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            static_dir: PathBuf::from("public"),
        }
    }
}

/// Upload handling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory for temporary upload files
    pub dir: PathBuf,
    /// Multipart field carrying the workbook
    pub field: String,
    /// Request body limit in bytes
    pub max_bytes: usize,
    /// Keep uploaded files instead of deleting them after parsing
    pub keep_files: bool,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            field: "excelFile".into(),
            max_bytes: 10 * 1024 * 1024,
            keep_files: false,
        }
    }
}

/// Limits on the rendered hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ForestConfig {
    /// Longest root-to-leaf path accepted, in nodes
    pub max_depth: usize,
    /// Most nodes in the rendered output; shared nodes count once per parent
    pub max_nodes: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        let limits = RenderLimits::default();
        Self {
            max_depth: limits.max_depth,
            max_nodes: limits.max_nodes,
        }
    }
}

impl ForestConfig {
    pub fn limits(&self) -> RenderLimits {
        RenderLimits {
            max_depth: self.max_depth,
            max_nodes: self.max_nodes,
        }
    }
}

/// Raw settings for intermediate parsing (every field optional to detect "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub server: RawServerConfig,
    pub upload: RawUploadConfig,
    pub forest: RawForestConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawForestConfig {
    pub max_depth: Option<usize>,
    pub max_nodes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawUploadConfig {
    pub dir: Option<PathBuf>,
    pub field: Option<String>,
    pub max_bytes: Option<usize>,
    pub keep_files: Option<bool>,
}

/// Unified configuration for bograph.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub forest: ForestConfig,
}

/// Get the XDG config directory for bograph.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "bograph").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("bograph.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}` in a path.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(raw.as_ref())
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

impl Settings {
    /// Socket address of `server.host:server.port`.
    pub fn bind_addr(&self) -> Result<SocketAddr, ApplicationError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| ApplicationError::Config {
                message: format!(
                    "invalid server address {}:{}: {}",
                    self.server.host, self.server.port, e
                ),
            })
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.server.static_dir = expand_path(&self.server.static_dir);
        self.upload.dir = expand_path(&self.upload.dir);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            server: ServerConfig {
                host: overlay
                    .server
                    .host
                    .clone()
                    .unwrap_or_else(|| self.server.host.clone()),
                port: overlay.server.port.unwrap_or(self.server.port),
                static_dir: overlay
                    .server
                    .static_dir
                    .clone()
                    .unwrap_or_else(|| self.server.static_dir.clone()),
            },
            upload: UploadConfig {
                dir: overlay
                    .upload
                    .dir
                    .clone()
                    .unwrap_or_else(|| self.upload.dir.clone()),
                field: overlay
                    .upload
                    .field
                    .clone()
                    .unwrap_or_else(|| self.upload.field.clone()),
                max_bytes: overlay.upload.max_bytes.unwrap_or(self.upload.max_bytes),
                keep_files: overlay.upload.keep_files.unwrap_or(self.upload.keep_files),
            },
            forest: ForestConfig {
                max_depth: overlay.forest.max_depth.unwrap_or(self.forest.max_depth),
                max_nodes: overlay.forest.max_nodes.unwrap_or(self.forest.max_nodes),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Explicit local config file. It must exist when given;
    ///   otherwise `./bograph.toml` is used if present.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        // 3. Local config
        match local {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                debug!("loading local config {}", path.display());
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                let path = Path::new(LOCAL_CONFIG_FILE);
                if path.exists() {
                    debug!("loading local config {}", path.display());
                    current = current.merge_with(&load_raw_settings(path)?);
                }
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current, env_source())?;

        current.expand_paths();
        current.validate()?;
        Ok(current)
    }

    /// Apply BOGRAPH_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self, env: Environment) -> Result<Self, ApplicationError> {
        // Use config crate just for env var parsing
        let config = Config::builder()
            .add_source(env)
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("server.host") {
            settings.server.host = val;
        }
        if let Ok(val) = config.get::<u16>("server.port") {
            settings.server.port = val;
        }
        if let Ok(val) = config.get_string("server.static_dir") {
            settings.server.static_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("upload.dir") {
            settings.upload.dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("upload.field") {
            settings.upload.field = val;
        }
        if let Ok(val) = config.get::<usize>("upload.max_bytes") {
            settings.upload.max_bytes = val;
        }
        if let Ok(val) = config.get_bool("upload.keep_files") {
            settings.upload.keep_files = val;
        }
        if let Ok(val) = config.get::<usize>("forest.max_depth") {
            settings.forest.max_depth = val;
        }
        if let Ok(val) = config.get::<usize>("forest.max_nodes") {
            settings.forest.max_nodes = val;
        }

        Ok(settings)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if self.upload.field.trim().is_empty() {
            return Err(ApplicationError::Config {
                message: "upload.field must not be empty".into(),
            });
        }
        if self.upload.max_bytes == 0 {
            return Err(ApplicationError::Config {
                message: "upload.max_bytes must be greater than 0".into(),
            });
        }
        if self.forest.max_depth == 0 || self.forest.max_nodes == 0 {
            return Err(ApplicationError::Config {
                message: "forest.max_depth and forest.max_nodes must be greater than 0".into(),
            });
        }
        self.bind_addr().map(|_| ())
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# bograph configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/bograph/bograph.toml
#   Local:  ./bograph.toml or --config <file>
#   Env:    BOGRAPH_* environment variables, e.g. BOGRAPH_SERVER__PORT=8080

[server]
# host = "127.0.0.1"
# port = 3000
# static_dir = "public"

[upload]
# dir = "uploads"
# field = "excelFile"
# max_bytes = 10485760
# keep_files = false

[forest]
# max_depth = 10000
# max_nodes = 1000000
"#
        .to_string()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("BOGRAPH")
        .prefix_separator("_")
        .separator("__")
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
