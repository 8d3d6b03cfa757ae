//! Configuration for the products service.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PRODUCTS_HOME, PRODUCTS_DATABASE, PUBLIC_API_URL,
//!    PUBLIC_API_TIMEOUT_SECONDS, PRODUCTS_API_URL, PRODUCTS_UI_PAY_URL)
//! 2. Config file (.pay-products/config.yaml)
//! 3. Defaults (~/.pay-products)
//!
//! Config file discovery:
//! - Searches current directory and parents for .pay-products/config.yaml
//! - Relative paths in the config file resolve against the .pay-products/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".pay-products";
const DEFAULT_PUBLIC_API_URL: &str = "http://localhost:9100";
const DEFAULT_PUBLIC_API_TIMEOUT: u64 = 30;
const DEFAULT_PRODUCTS_API_URL: &str = "http://localhost:18000";
const DEFAULT_PRODUCTS_UI_PAY_URL: &str = "http://localhost:3000/pay";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub public_api: Option<PublicApiConfig>,
    #[serde(default)]
    pub links: Option<LinksConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file (relative to the config directory)
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicApiConfig {
    pub url: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinksConfig {
    pub products_api_url: Option<String>,
    pub products_ui_pay_url: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Service state directory
    pub home: PathBuf,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    /// Payments API settings
    pub public_api: PublicApiSettings,
    /// Base URLs for presentation links
    pub links: LinksSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicApiSettings {
    pub url: String,
    /// Request timeout; the orchestrator itself never times out
    pub timeout_seconds: u64,
}

impl Default for PublicApiSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_PUBLIC_API_URL.to_string(),
            timeout_seconds: DEFAULT_PUBLIC_API_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinksSettings {
    pub products_api_url: String,
    pub products_ui_pay_url: String,
}

impl Default for LinksSettings {
    fn default() -> Self {
        Self {
            products_api_url: DEFAULT_PRODUCTS_API_URL.to_string(),
            products_ui_pay_url: DEFAULT_PRODUCTS_UI_PAY_URL.to_string(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config directory
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Merge file settings, environment and defaults.
///
/// `env` looks up a variable by name so tests can supply their own.
fn resolve(
    file: Option<(&Path, &ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
    default_home: PathBuf,
) -> Result<ResolvedConfig> {
    let config_dir = file.and_then(|(path, _)| path.parent());
    let config = file.map(|(_, config)| config);

    let home = match (env("PRODUCTS_HOME"), config.and_then(|c| c.home.as_deref()), config_dir) {
        (Some(env_home), _, _) => PathBuf::from(env_home),
        (None, Some(home), Some(dir)) => resolve_path(dir, home),
        _ => default_home,
    };

    let database_path = match (
        env("PRODUCTS_DATABASE"),
        config.and_then(|c| c.database.path.as_deref()),
        config_dir,
    ) {
        (Some(env_db), _, _) => PathBuf::from(env_db),
        (None, Some(db), Some(dir)) => resolve_path(dir, db),
        _ => home.join("products.db"),
    };

    let file_api = config.and_then(|c| c.public_api.as_ref());
    let timeout_seconds = match env("PUBLIC_API_TIMEOUT_SECONDS") {
        Some(value) => value
            .parse::<u64>()
            .with_context(|| format!("Invalid PUBLIC_API_TIMEOUT_SECONDS: {}", value))?,
        None => file_api
            .and_then(|api| api.timeout_seconds)
            .unwrap_or(DEFAULT_PUBLIC_API_TIMEOUT),
    };
    let public_api = PublicApiSettings {
        url: env("PUBLIC_API_URL")
            .or_else(|| file_api.and_then(|api| api.url.clone()))
            .unwrap_or_else(|| DEFAULT_PUBLIC_API_URL.to_string()),
        timeout_seconds,
    };

    let file_links = config.and_then(|c| c.links.as_ref());
    let links = LinksSettings {
        products_api_url: env("PRODUCTS_API_URL")
            .or_else(|| file_links.and_then(|l| l.products_api_url.clone()))
            .unwrap_or_else(|| DEFAULT_PRODUCTS_API_URL.to_string()),
        products_ui_pay_url: env("PRODUCTS_UI_PAY_URL")
            .or_else(|| file_links.and_then(|l| l.products_ui_pay_url.clone()))
            .unwrap_or_else(|| DEFAULT_PRODUCTS_UI_PAY_URL.to_string()),
    };

    Ok(ResolvedConfig {
        home,
        database_path,
        config_file: file.map(|(path, _)| path.to_path_buf()),
        public_api,
        links,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_path = find_config_file();
    let config = match config_path.as_deref() {
        Some(path) => Some(load_config_file(path)?),
        None => None,
    };

    let file = config_path.as_deref().zip(config.as_ref());
    resolve(file, |key| std::env::var(key).ok(), default_home)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, no_env, PathBuf::from("/home/test/.pay-products")).unwrap();

        assert_eq!(config.home, PathBuf::from("/home/test/.pay-products"));
        assert_eq!(
            config.database_path,
            PathBuf::from("/home/test/.pay-products/products.db")
        );
        assert!(config.config_file.is_none());
        assert_eq!(config.public_api, PublicApiSettings::default());
        assert_eq!(config.links, LinksSettings::default());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_dir = temp.path().join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1.0"
database:
  path: data/products.db
public_api:
  url: https://publicapi.example
  timeout_seconds: 5
links:
  products_ui_pay_url: https://products.example/pay
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1.0");

        let config = resolve(Some((config_path.as_path(), &parsed)), no_env, PathBuf::from("/unused")).unwrap();
        assert_eq!(config.database_path, config_dir.join("data/products.db"));
        assert_eq!(config.public_api.url, "https://publicapi.example");
        assert_eq!(config.public_api.timeout_seconds, 5);
        assert_eq!(config.links.products_ui_pay_url, "https://products.example/pay");
        assert_eq!(config.links.products_api_url, DEFAULT_PRODUCTS_API_URL);
        assert_eq!(config.config_file, Some(config_path.clone()));
    }

    #[test]
    fn test_env_overrides_file() {
        let parsed: ConfigFile = serde_yaml::from_str(
            r#"
version: "1.0"
public_api:
  url: https://from-file.example
"#,
        )
        .unwrap();
        let env: HashMap<&str, &str> = [
            ("PUBLIC_API_URL", "https://from-env.example"),
            ("PRODUCTS_DATABASE", "/tmp/env.db"),
            ("PUBLIC_API_TIMEOUT_SECONDS", "7"),
        ]
        .into_iter()
        .collect();

        let path = PathBuf::from("/project/.pay-products/config.yaml");
        let config = resolve(
            Some((path.as_path(), &parsed)),
            |key| env.get(key).map(|v| v.to_string()),
            PathBuf::from("/home/test/.pay-products"),
        )
        .unwrap();

        assert_eq!(config.public_api.url, "https://from-env.example");
        assert_eq!(config.public_api.timeout_seconds, 7);
        assert_eq!(config.database_path, PathBuf::from("/tmp/env.db"));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let result = resolve(
            None,
            |key| (key == "PUBLIC_API_TIMEOUT_SECONDS").then(|| "soon".to_string()),
            PathBuf::from("/home/test/.pay-products"),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/project/.pay-products");

        assert_eq!(
            resolve_path(&base, "data/products.db"),
            PathBuf::from("/project/.pay-products/data/products.db")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/products.db"),
            PathBuf::from("/absolute/products.db")
        );
    }
}
