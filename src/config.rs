//! Configuration for shelf paths and catalog settings.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SHELF_HOME, SHELF_DATA, SHELF_NAME)
//! 2. Config file (.shelf/config.yaml)
//! 3. Defaults (~/.shelf, ~/.shelf/catalog.csv, "Library")
//!
//! Config file discovery:
//! - Searches current directory and parents for .shelf/config.yaml
//! - `paths.home` is relative to the .shelf/ directory
//! - `paths.data` is relative to the project root (the parent of .shelf/)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const ENV_HOME: &str = "SHELF_HOME";
pub const ENV_DATA: &str = "SHELF_DATA";
pub const ENV_NAME: &str = "SHELF_NAME";

const CONFIG_DIR: &str = ".shelf";
const CONFIG_FILE: &str = "config.yaml";
const DATA_FILE: &str = "catalog.csv";

/// Root category name when nothing else is configured
pub const DEFAULT_CATALOG_NAME: &str = "Library";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .shelf/)
    pub home: Option<String>,
    /// Catalog data file (relative to the project root)
    pub data: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogConfig {
    /// Root category name
    pub name: Option<String>,
    /// Write the data file back after mutating commands
    pub autosave: Option<bool>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the shelf home directory
    pub home: PathBuf,
    /// Catalog data file loaded on start
    pub data_file: PathBuf,
    /// Root category name
    pub catalog_name: String,
    pub autosave: bool,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

/// Find config file by searching `start` and its parents
fn find_config_file_from(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
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

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Combine config file, environment and defaults
fn resolve_config<F>(
    default_home: PathBuf,
    config_file: Option<PathBuf>,
    env: F,
) -> Result<ResolvedConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match config_file {
        Some(ref path) => Some(load_config_file(path)?),
        None => None,
    };
    let paths = file.as_ref().map(|f| f.paths.clone()).unwrap_or_default();
    let catalog = file.as_ref().map(|f| f.catalog.clone()).unwrap_or_default();

    // .shelf/ and the directory holding it
    let shelf_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));
    let base_dir = shelf_dir.parent().unwrap_or(Path::new("."));

    let home = if let Some(env_home) = env(ENV_HOME) {
        PathBuf::from(env_home)
    } else if let Some(ref home_path) = paths.home {
        resolve_path(shelf_dir, home_path)
    } else {
        default_home
    };

    let data_file = if let Some(env_data) = env(ENV_DATA) {
        PathBuf::from(env_data)
    } else if let Some(ref data_path) = paths.data {
        resolve_path(base_dir, data_path)
    } else {
        home.join(DATA_FILE)
    };

    let catalog_name = env(ENV_NAME)
        .or(catalog.name)
        .unwrap_or_else(|| DEFAULT_CATALOG_NAME.to_string());

    Ok(ResolvedConfig {
        home,
        data_file,
        catalog_name,
        autosave: catalog.autosave.unwrap_or(true),
        config_file,
    })
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_file = std::env::current_dir()
        .ok()
        .and_then(|cwd| find_config_file_from(&cwd));

    resolve_config(default_home, config_file, |key| std::env::var(key).ok())
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}
