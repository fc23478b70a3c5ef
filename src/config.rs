//! Dialect configuration file.
//!
//! ```toml
//! flavor = "db2"
//! driver = "ibm_db"
//! default_url = "db2:///SAMPLE?UID=db2inst1"
//!
//! [flags]
//! max_identifier_length = 30
//!
//! [data_sources.SAMPLE]
//! database = "SAMPLE"
//! hostname = "db2.example.com"
//! port = 50001
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dialect::{DialectFlags, DriverVariant};
use crate::error::{DialectError, DialectResult};
use crate::reflection::ServerFlavor;
use crate::url::{self, ConnectArgs, DEFAULT_PORT};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Catalog flavor of the target server.
    #[serde(default)]
    pub flavor: ServerFlavor,

    /// Flag preset.
    #[serde(default)]
    pub driver: DriverVariant,

    /// Per-flag overrides applied on top of the preset.
    #[serde(default)]
    pub flags: FlagOverrides,

    /// URL used when none is given on the command line.
    pub default_url: Option<String>,

    /// Catalog aliases expanded into direct connection strings.
    #[serde(default)]
    pub data_sources: BTreeMap<String, DataSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlagOverrides {
    pub max_identifier_length: Option<usize>,
    pub supports_char_length: Option<bool>,
    pub supports_sane_rowcount: Option<bool>,
    pub supports_native_decimal: Option<bool>,
}

/// Where a catalogued database actually lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSource {
    pub database: String,
    pub hostname: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Shortest identifier limit that still leaves room for a truncated name's
/// hash suffix.
pub const MIN_IDENTIFIER_LENGTH: usize = 8;

impl Config {
    /// `<config dir>/db2-dialect/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("db2-dialect").join("config.toml"))
    }

    pub fn parse(content: &str) -> DialectResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| DialectError::Config(e.to_string()))?;
        match config.flags.max_identifier_length {
            Some(n) if n < MIN_IDENTIFIER_LENGTH => Err(DialectError::Config(format!(
                "max_identifier_length must be at least {}, got {}",
                MIN_IDENTIFIER_LENGTH, n
            ))),
            _ => Ok(config),
        }
    }

    pub fn load_from(path: &Path) -> DialectResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load from the default location; a missing file yields the defaults.
    pub fn load() -> DialectResult<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// The preset named by `driver` with the overrides applied.
    pub fn dialect_flags(&self) -> DialectFlags {
        self.flags_for(self.driver)
    }

    /// The preset for `driver` with the overrides applied.
    pub fn flags_for(&self, driver: DriverVariant) -> DialectFlags {
        let mut flags = driver.flags();
        let o = &self.flags;
        if let Some(n) = o.max_identifier_length {
            flags.max_identifier_length = n;
        }
        if let Some(b) = o.supports_char_length {
            flags.supports_char_length = b;
        }
        if let Some(b) = o.supports_sane_rowcount {
            flags.supports_sane_rowcount = b;
        }
        if let Some(b) = o.supports_native_decimal {
            flags.supports_native_decimal = b;
        }
        flags
    }

    /// Connect arguments for `url`, expanding a catalog alias found in
    /// `data_sources` into a direct connection string.
    pub fn resolve_connect_args(&self, url: &str) -> DialectResult<ConnectArgs> {
        let parsed = url::parse_url(url)?;
        let args = url::create_connect_args(&parsed)?;
        if !parsed.is_catalog_form() {
            return Ok(args);
        }
        match self.data_sources.get(&args.dsn) {
            Some(ds) => {
                tracing::debug!(alias = %args.dsn, host = %ds.hostname, "expanding data source");
                Ok(ConnectArgs {
                    dsn: url::direct_connection_string(
                        &ds.database,
                        &ds.hostname,
                        ds.port,
                        &args.uid,
                        &args.pwd,
                    ),
                    uid: args.uid,
                    pwd: String::new(),
                })
            }
            None => Ok(args),
        }
    }
}
