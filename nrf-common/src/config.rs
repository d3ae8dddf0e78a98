//! Configuration loading and resolution
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: defaults apply. A config file
//! that exists but cannot be parsed is.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::building_types::{
    default_building_types, BuildingTypeFields, BuildingTypeListItem, DEFAULT_NON_RESIDENTIAL_ID,
};
use crate::{Error, Result};

pub const ENV_HOST: &str = "NRF_QUOTE_HOST";
pub const ENV_PORT: &str = "NRF_QUOTE_PORT";
pub const ENV_LOG_LEVEL: &str = "NRF_QUOTE_LOG_LEVEL";
pub const ENV_SESSION_ENGINE: &str = "NRF_QUOTE_SESSION_ENGINE";

/// Where session state is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEngine {
    /// In-process map; state is lost on restart
    Memory,
    /// SQLite file via sqlx
    Sqlite,
}

impl FromStr for SessionEngine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(SessionEngine::Memory),
            "sqlite" => Ok(SessionEngine::Sqlite),
            other => Err(Error::Config(format!(
                "Unknown session engine '{}' (expected 'memory' or 'sqlite')",
                other
            ))),
        }
    }
}

/// `[session]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionToml {
    pub engine: Option<String>,
    pub database_path: Option<PathBuf>,
    pub cookie_name: Option<String>,
    pub ttl_hours: Option<u64>,
}

/// Contents of `config.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub session: SessionToml,
    pub building_types: Option<Vec<BuildingTypeListItem>>,
    pub non_residential_id: Option<String>,
}

/// Compiled defaults used when nothing else provides a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub session_engine: SessionEngine,
    pub session_database_path: PathBuf,
    pub cookie_name: String,
    pub ttl_hours: u64,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("nrf-quote"))
            .unwrap_or_else(|| PathBuf::from("./nrf_quote_data"));

        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            session_engine: SessionEngine::Memory,
            session_database_path: data_dir.join("sessions.db"),
            cookie_name: "nrf-quote-session".to_string(),
            ttl_hours: 24,
        }
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub session_engine: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub engine: SessionEngine,
    pub database_path: PathBuf,
    pub cookie_name: String,
    pub ttl_hours: u64,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub session: SessionConfig,
    pub building_types: Vec<BuildingTypeListItem>,
    pub non_residential_id: String,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Configuration built from compiled defaults only
    pub fn defaults() -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        Self {
            host: defaults.host,
            port: defaults.port,
            log_level: defaults.log_level,
            session: SessionConfig {
                engine: defaults.session_engine,
                database_path: defaults.session_database_path,
                cookie_name: defaults.cookie_name,
                ttl_hours: defaults.ttl_hours,
            },
            building_types: default_building_types(),
            non_residential_id: DEFAULT_NON_RESIDENTIAL_ID.to_string(),
        }
    }

    /// Building-count field descriptors for the configured list
    pub fn building_fields(&self) -> Result<BuildingTypeFields> {
        BuildingTypeFields::from_items(self.building_types.clone(), &self.non_residential_id)
    }
}

/// Default config file for the platform, if one exists
///
/// `<config_dir>/nrf-quote/config.toml`, then `/etc/nrf-quote/config.toml` on Linux.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("nrf-quote").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/nrf-quote/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Resolve configuration from CLI, environment, TOML file and defaults
pub fn resolve_config(cli: &CliOverrides) -> Result<ServiceConfig> {
    let toml_config = match &cli.config_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            info!("Loading config file {}", path.display());
            load_toml_config(path)?
        }
        None => match default_config_path() {
            Some(path) => {
                info!("Loading config file {}", path.display());
                load_toml_config(&path)?
            }
            None => {
                warn!("No config file found, using defaults");
                TomlConfig::default()
            }
        },
    };

    resolve_with(cli, toml_config)
}

/// Resolve against an already-loaded TOML config
pub fn resolve_with(cli: &CliOverrides, toml_config: TomlConfig) -> Result<ServiceConfig> {
    let defaults = CompiledDefaults::for_current_platform();
    let env = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

    let host = cli
        .host
        .clone()
        .or_else(|| env(ENV_HOST))
        .or(toml_config.host)
        .unwrap_or(defaults.host);

    let port = match (cli.port, env(ENV_PORT)) {
        (Some(port), _) => port,
        (None, Some(raw)) => raw
            .trim()
            .parse::<u16>()
            .map_err(|_| Error::Config(format!("{} is not a valid port: {}", ENV_PORT, raw)))?,
        (None, None) => toml_config.port.unwrap_or(defaults.port),
    };

    let log_level = env(ENV_LOG_LEVEL)
        .or(toml_config.log_level)
        .unwrap_or(defaults.log_level);

    let engine = match cli
        .session_engine
        .clone()
        .or_else(|| env(ENV_SESSION_ENGINE))
        .or(toml_config.session.engine)
    {
        Some(raw) => raw.parse::<SessionEngine>()?,
        None => defaults.session_engine,
    };

    let session = SessionConfig {
        engine,
        database_path: toml_config
            .session
            .database_path
            .unwrap_or(defaults.session_database_path),
        cookie_name: toml_config
            .session
            .cookie_name
            .unwrap_or(defaults.cookie_name),
        ttl_hours: toml_config.session.ttl_hours.unwrap_or(defaults.ttl_hours),
    };

    let config = ServiceConfig {
        host,
        port,
        log_level,
        session,
        building_types: toml_config
            .building_types
            .unwrap_or_else(default_building_types),
        non_residential_id: toml_config
            .non_residential_id
            .unwrap_or_else(|| DEFAULT_NON_RESIDENTIAL_ID.to_string()),
    };

    // Fail at startup rather than on the first building-count request
    config.building_fields()?;

    Ok(config)
}
