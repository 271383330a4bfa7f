//! Local resolution of remote images.
//!
//! ```text
//! <img src="http://img/a.png">  →  fetch  →  root/images/a.png
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::app::{ConvertError, Result};
use crate::domain::layout::PLACEHOLDER_FILENAME;
use crate::domain::OutputLayout;
use crate::fetcher::Fetcher;

/// Downloads images into an output directory and hands back their local file names.
#[derive(Clone)]
pub struct AssetResolver {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    reject_error_status: bool,
}

impl AssetResolver {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>) -> Self {
        Self {
            fetcher,
            reject_error_status: true,
        }
    }

    /// When `false`, the body of a non-2xx response is written like any other.
    pub fn reject_error_status(mut self, reject: bool) -> Self {
        self.reject_error_status = reject;
        self
    }

    /// Download `url` into `target_dir` and return the file name it was stored under.
    ///
    /// An existing file of the same name is overwritten.
    pub async fn resolve(&self, url: &str, target_dir: &Path, layout: &OutputLayout) -> Result<String> {
        tracing::info!(url, "Starting image download");
        layout.ensure_dir(target_dir)?;

        let filename = local_filename(url)?;
        let result = self.fetcher.fetch(url).await.map_err(|e| match e {
            e @ ConvertError::AssetFetch { .. } => e,
            other => ConvertError::AssetFetch {
                url: url.to_string(),
                reason: other.to_string(),
            },
        })?;

        if !result.is_success() {
            if self.reject_error_status {
                return Err(ConvertError::AssetFetch {
                    url: url.to_string(),
                    reason: format!("HTTP status {}", result.status),
                });
            }
            tracing::warn!(url, status = result.status, "Keeping body of unsuccessful response");
        }

        let path = target_dir.join(&filename);
        std::fs::write(&path, &result.body)?;
        tracing::debug!(path = %path.display(), bytes = result.body.len(), "Stored image");

        Ok(filename)
    }

    /// Copy the bundled placeholder into the persistent image directory.
    pub fn copy_placeholder(&self, layout: &OutputLayout) -> Result<String> {
        let target_dir = layout.persistent_dir();
        layout.ensure_dir(&target_dir)?;

        let target = target_dir.join(PLACEHOLDER_FILENAME);
        std::fs::copy(&layout.placeholder, &target).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::AssetNotFound {
                    path: layout.placeholder.clone(),
                }
            } else {
                ConvertError::Io(e)
            }
        })?;
        tracing::debug!(path = %target.display(), "Copied placeholder image");

        Ok(PLACEHOLDER_FILENAME.to_string())
    }
}

/// File name for a downloaded image: the last non-empty path segment of `url`.
///
/// Query and fragment are ignored. Characters outside `[A-Za-z0-9._-]` become `_`.
pub fn local_filename(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|e| ConvertError::AssetFetch {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(|| ConvertError::AssetFetch {
            url: url.to_string(),
            reason: "no file name in URL path".into(),
        })?;

    let name: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.chars().all(|c| c == '.') {
        return Err(ConvertError::AssetFetch {
            url: url.to_string(),
            reason: "no file name in URL path".into(),
        });
    }

    Ok(name)
}
