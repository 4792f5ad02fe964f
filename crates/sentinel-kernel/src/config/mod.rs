//! Configuration loading.
//!
//! Multi-format loader built on the `config` crate. Supported formats are
//! YAML, TOML, JSON, INI, RON and JSON5; the format is picked from the file
//! extension. `${VAR}` and `$VAR` references in file content are replaced
//! with environment values before parsing.

use config::{Config as Cfg, ConfigBuilder, Environment, File, FileFormat};
use config::builder::DefaultState;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;

pub use config::{Environment as EnvSource, FileFormat as Format};

static BRACED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));
static BARE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("valid regex"));

/// Configuration loading error
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect configuration format from file extension
///
/// - YAML: `.yaml`, `.yml`
/// - TOML: `.toml`
/// - JSON: `.json`
/// - INI: `.ini`
/// - RON: `.ron`
/// - JSON5: `.json5`
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Substitute environment variables in a string
///
/// Supports both `${VAR_NAME}` and `$VAR_NAME`. Unset variables are left
/// verbatim.
///
/// ```rust,ignore
/// use sentinel_kernel::config::substitute_env_vars;
///
/// std::env::set_var("SENTINEL_PORT", "9000");
/// assert_eq!(substitute_env_vars("port: ${SENTINEL_PORT}"), "port: 9000");
/// ```
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });

    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

fn file_source(path: &str) -> ConfigResult<File<config::FileSourceString, FileFormat>> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    Ok(File::from_str(&substitute_env_vars(&content), format))
}

fn finish<T>(builder: ConfigBuilder<DefaultState>) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    builder
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Load configuration from a file, detecting the format from its extension.
pub fn load_config<T>(path: &str) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    finish(Cfg::builder().add_source(file_source(path)?))
}

/// Load configuration from a string with explicit format
///
/// ```rust,ignore
/// use sentinel_kernel::config::{from_str, Format};
///
/// #[derive(serde::Deserialize)]
/// struct Limits { default_limit: u32 }
///
/// let limits: Limits = from_str("default_limit = 100", Format::Toml)?;
/// ```
pub fn from_str<T>(content: &str, format: FileFormat) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    finish(Cfg::builder().add_source(File::from_str(&substitute_env_vars(content), format)))
}

/// Merge multiple configuration sources
///
/// Later sources override earlier ones.
pub fn merge_configs<T>(sources: &[(&str, FileFormat)]) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let builder = sources
        .iter()
        .fold(Cfg::builder(), |builder, (content, format)| {
            builder.add_source(File::from_str(&substitute_env_vars(content), *format))
        });
    finish(builder)
}

/// Load an optional file, then layer an environment source over it.
///
/// Fields missing from both fall back to the target type's serde defaults.
///
/// ```rust,ignore
/// use sentinel_kernel::config::{load_layered, EnvSource};
///
/// // SENTINEL_PORT=9000 overrides `port` from the file.
/// let settings: Settings = load_layered(
///     Some("sentinel.toml"),
///     EnvSource::with_prefix("SENTINEL").try_parsing(true),
/// )?;
/// ```
pub fn load_layered<T>(path: Option<&str>, env: Environment) -> ConfigResult<T>
where
    T: DeserializeOwned,
{
    let mut builder = Cfg::builder();
    if let Some(path) = path {
        builder = builder.add_source(file_source(path)?);
    }
    finish(builder.add_source(env))
}


#[cfg(test)]
mod tests;
