//! Configuration management for feedbind.
//!
//! Configuration is read from `~/.config/feedbind/config.toml` unless a path is
//! given explicitly. If the default file doesn't exist, one with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::domain::layout::{
    bundled_font, bundled_placeholder, DEFAULT_IMAGE_DIR, DEFAULT_ROOT, DEFAULT_TEMP_IMAGE_DIR,
};
use crate::domain::OutputLayout;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub assets: AssetsConfig,
    pub fetch: FetchConfig,
    pub epub: EpubConfig,
    pub pdf: PdfConfig,
}

/// Output directory layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub root: PathBuf,
    pub image_dir: PathBuf,
    pub temp_image_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            temp_image_dir: PathBuf::from(DEFAULT_TEMP_IMAGE_DIR),
        }
    }
}

/// Bundled resources. Defaults are the copies compiled into the binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub placeholder: PathBuf,
    pub font: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            placeholder: bundled_placeholder(),
            font: bundled_font(),
        }
    }
}

/// HTTP behaviour for feed and image downloads.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Treat non-2xx image responses as failures (default: true)
    pub reject_error_status: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: concat!("feedbind/", env!("CARGO_PKG_VERSION")).to_string(),
            reject_error_status: true,
        }
    }
}

/// EPUB package metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EpubConfig {
    pub language: String,
    pub author: String,
}

impl Default for EpubConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            author: "feedbind".to_string(),
        }
    }
}

/// Page setup for the built-in PDF renderer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    pub font_size_pt: f32,
    pub margin_mm: f32,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            font_size_pt: 11.0,
            margin_mm: 15.0,
        }
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    /// Get the default config file path: `~/.config/feedbind/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedbind").join("config.toml"))
    }

    /// The output layout described by `[output]` and `[assets]`.
    pub fn layout(&self) -> Result<OutputLayout, ConfigError> {
        Ok(OutputLayout::new(&self.output.root)
            .with_image_dirs(&self.output.image_dir, &self.output.temp_image_dir)?
            .with_assets(&self.assets.placeholder, &self.assets.font))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::info!(path = %path.display(), "Created default configuration");
        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# feedbind configuration

[output]
# Directory receiving out.html, out.pdf and out.epub
root = "out"
# Downloaded images, relative to root (kept between runs)
image_dir = "images"
# Scratch images for PDF rendering, relative to root (removed after each PDF)
temp_image_dir = "_temp_images"

# [assets]
# placeholder = "/path/to/placeholder.jpg"
# font = "/path/to/font.ttf"

[fetch]
# Request timeout in seconds
timeout_secs = 30
# Fail the conversion when an image URL answers with a non-2xx status
reject_error_status = true

[epub]
language = "en"
author = "feedbind"

[pdf]
font_size_pt = 11.0
margin_mm = 15.0
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid output layout: {0}")]
    InvalidLayout(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        assert_eq!(config.output.root, PathBuf::from("out"));
        assert_eq!(config.fetch.timeout_secs, 30);
        assert!(config.fetch.reject_error_status);
        assert_eq!(config.epub.language, "en");
        assert_eq!(config.assets.font, bundled_font());
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[output]
root = "feeds"

[fetch]
reject_error_status = false
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        assert_eq!(config.output.root, PathBuf::from("feeds"));
        assert_eq!(config.output.image_dir, PathBuf::from("images"));
        assert!(!config.fetch.reject_error_status);
        assert_eq!(config.fetch.timeout_secs, 30);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.epub.author, "feedbind");
        assert_eq!(config.pdf.font_size_pt, 11.0);
    }

    #[test]
    fn test_layout_from_config() {
        let config: Config = toml::from_str(
            r#"
[output]
root = "r"
image_dir = "img"
temp_image_dir = "tmp"
"#,
        )
        .unwrap();
        let layout = config.layout().unwrap();
        assert_eq!(layout.persistent_dir(), PathBuf::from("r/img"));
        assert_eq!(layout.transient_dir(), PathBuf::from("r/tmp"));
    }

    #[test]
    fn test_layout_rejects_root_as_temp_dir() {
        let config: Config = toml::from_str(
            r#"
[output]
root = "r"
temp_image_dir = ""
"#,
        )
        .unwrap();
        assert!(matches!(config.layout(), Err(ConfigError::InvalidLayout(_))));
    }

    #[test]
    fn test_layout_rejects_image_dir_outside_root() {
        let config: Config = toml::from_str(
            r#"
[output]
image_dir = "../shared"
"#,
        )
        .unwrap();
        assert!(matches!(config.layout(), Err(ConfigError::InvalidLayout(_))));
    }

    #[test]
    fn test_layout_rejects_shared_image_dirs() {
        let config: Config = toml::from_str(
            r#"
[output]
image_dir = "img"
temp_image_dir = "img"
"#,
        )
        .unwrap();
        assert!(matches!(config.layout(), Err(ConfigError::InvalidLayout(_))));
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Config::load_from(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_from_invalid_file_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "[output\nroot = ").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
