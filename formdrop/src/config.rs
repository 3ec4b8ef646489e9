//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `FORMDROP_CONFIG`
//! environment variable.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `FORMDROP_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `FORMDROP_STORAGE__ROOT=/srv/formdrop` sets the `storage.root` field.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use formdrop::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Server will bind to {}:{}", config.host, config.port);
//! # Ok(())
//! # }
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::errors::Error;
use crate::storage::is_plain_relative;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FORMDROP_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults, so an empty or missing YAML file yields a working server that
/// stores uploads under `./uploads`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Export traces via OTLP, configured through the standard `OTEL_*` environment variables
    pub enable_otel_export: bool,
    /// Where and how uploads are written
    pub storage: StorageConfig,
}

/// Upload storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Base directory. Every upload directory, default or request-supplied, lives beneath it.
    pub root: PathBuf,
    /// Directory (relative to `root`) used when the request does not name one
    pub default_dir: PathBuf,
    /// URL prefix for stored files; used in the confirmation page's `<img>` tag
    pub public_path: String,
    /// Capacity in bytes of the buffered writer used to stream uploads to disk
    pub write_buffer_size: usize,
    /// Serve `root` read-only under `public_path`
    pub serve_files: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_otel_export: false,
            storage: StorageConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            default_dir: PathBuf::from("uploads"),
            public_path: "/files".to_string(),
            write_buffer_size: 10_000,
            serve_files: true,
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency
    pub fn validate(&self) -> Result<(), Error> {
        let storage = &self.storage;

        if storage.write_buffer_size == 0 {
            return Err(Error::Internal {
                operation: "Config validation: storage.write_buffer_size must be greater than zero".to_string(),
            });
        }

        if !is_plain_relative(&storage.default_dir) {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: storage.default_dir ({}) must be a relative path without '..' segments",
                    storage.default_dir.display()
                ),
            });
        }

        if !storage.public_path.starts_with('/') {
            return Err(Error::Internal {
                operation: format!(
                    "Config validation: storage.public_path ({}) must start with '/'",
                    storage.public_path
                ),
            });
        }

        if storage.serve_files && storage.public_path.trim_end_matches('/').is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: storage.public_path cannot be '/' while serve_files is enabled".to_string(),
            });
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // FORMDROP_CONFIG names the file itself, it is not a config key
            .merge(Env::prefixed("FORMDROP_").ignore(&["CONFIG"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args("missing.yaml"))?;

            assert_eq!(config.port, 3000);
            assert_eq!(config.storage.root, PathBuf::from("."));
            assert_eq!(config.storage.default_dir, PathBuf::from("uploads"));
            assert_eq!(config.storage.public_path, "/files");
            assert_eq!(config.storage.write_buffer_size, 10_000);
            assert!(config.storage.serve_files);

            Ok(())
        });
    }

    #[test]
    fn test_yaml_storage_section() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 8081
storage:
  root: /srv/formdrop
  default_dir: images/incoming
  write_buffer_size: 4096
"#,
            )?;

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.port, 8081);
            assert_eq!(config.storage.root, PathBuf::from("/srv/formdrop"));
            assert_eq!(config.storage.default_dir, PathBuf::from("images/incoming"));
            assert_eq!(config.storage.write_buffer_size, 4096);
            // untouched fields keep their defaults
            assert_eq!(config.storage.public_path, "/files");

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "host: 0.0.0.0\n")?;

            jail.set_env("FORMDROP_HOST", "127.0.0.1");
            jail.set_env("FORMDROP_PORT", "8080");
            jail.set_env("FORMDROP_STORAGE__DEFAULT_DIR", "photos");
            jail.set_env("FORMDROP_CONFIG", "test.yaml");

            let config = Config::load(&args("test.yaml"))?;

            assert_eq!(config.host, "127.0.0.1");
            assert_eq!(config.port, 8080);
            assert_eq!(config.storage.default_dir, PathBuf::from("photos"));

            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "max_upload_size: 10\n")?;

            assert!(Config::load(&args("test.yaml")).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_validation_rejects_escaping_default_dir() {
        let mut config = Config::default();
        config.storage.default_dir = PathBuf::from("../outside");
        assert!(config.validate().is_err());

        config.storage.default_dir = PathBuf::from("/var/uploads");
        assert!(config.validate().is_err());

        config.storage.default_dir = PathBuf::from("nested/uploads");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_buffer() {
        let mut config = Config::default();
        config.storage.write_buffer_size = 0;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("write_buffer_size"));
    }

    #[test]
    fn test_validation_public_path() {
        let mut config = Config::default();
        config.storage.public_path = "files".to_string();
        assert!(config.validate().is_err());

        config.storage.public_path = "/".to_string();
        assert!(config.validate().is_err());

        config.storage.serve_files = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_error_surfaces_from_load() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
storage:
  default_dir: ../../etc
"#,
            )?;

            let err = Config::load(&args("test.yaml")).unwrap_err();
            assert!(err.to_string().contains("default_dir"));

            Ok(())
        });
    }
}
