//! Configuration file handling for dotlens.
//!
//! Loads configuration from `~/.config/dotlens/config.toml` or a custom path.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration file structure for dotlens.
/// Loaded from ~/.config/dotlens/config.toml (or custom path via --config).
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct TranslateConfig {
    /// Report per-token diagnostics instead of folding failures into '?'.
    #[serde(default)]
    pub strict: bool,
    /// Split tokens on whitespace runs instead of single spaces.
    #[serde(default)]
    pub normalize: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct RecognitionConfig {
    /// Recognition service base URL. The DOTLENS_OCR_URL environment
    /// variable takes precedence over this value.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache directory override. Default: ~/.cache/dotlens/recognized/
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_cache_size_mb")]
    pub max_size_mb: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
            max_size_mb: default_cache_size_mb(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_size_mb() -> u64 {
    50
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        })
        .join("dotlens")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_when_file_missing() {
        let config = Config::load(Some(Path::new("/nonexistent/dotlens.toml"))).unwrap();
        assert!(!config.translate.strict);
        assert!(!config.translate.normalize);
        assert!(config.recognition.base_url.is_none());
        assert!(config.cache.enabled);
        assert_eq!(config.cache.max_size_mb, 50);
    }

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[translate]
strict = true
normalize = true

[recognition]
base_url = "http://localhost:5000"
timeout_secs = 10

[cache]
enabled = false
max_size_mb = 5
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.translate.strict);
        assert!(config.translate.normalize);
        assert_eq!(
            config.recognition.base_url.as_deref(),
            Some("http://localhost:5000")
        );
        assert_eq!(config.recognition.timeout_secs, Some(10));
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.max_size_mb, 5);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[translate]\nstrict = true\n").unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert!(config.translate.strict);
        assert!(!config.translate.normalize);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_load_malformed_file_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid toml [").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(format!("{}", err).contains("Failed to parse"));
    }

    #[test]
    fn test_default_path_ends_with_config_toml() {
        let path = default_path();
        assert!(path.ends_with("dotlens/config.toml"));
    }
}
