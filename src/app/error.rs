use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Cannot create directory {path}: {source}")]
    DirectoryCreation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to fetch asset {url}: {reason}")]
    AssetFetch { url: String, reason: String },

    #[error("Referenced asset not found on disk: {path}")]
    AssetNotFound { path: PathBuf },

    #[error("Error during PDF generation: {0}")]
    PdfRender(String),

    #[error("Error during EPUB generation: {0}")]
    EpubBuild(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("HTML rewriting error: {0}")]
    Html(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<lol_html::errors::RewritingError> for ConvertError {
    fn from(e: lol_html::errors::RewritingError) -> Self {
        ConvertError::Html(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;

impl From<crate::config::ConfigError> for ConvertError {
    fn from(e: crate::config::ConfigError) -> Self {
        ConvertError::Config(e.to_string())
    }
}
