//! Rewrites remote `<img>` sources in entry summaries into local files.
//!
//! Two addressing regimes exist because the consumers differ:
//!
//! - [`AddressingMode::Relative`]: `images/a.png`, resolved against the output
//!   root by a browser or an EPUB reader.
//! - [`AddressingMode::Absolute`]: `/abs/out/_temp_images/a.png`, for the PDF
//!   renderer which only reads files by full path.

use std::path::Path;

use crate::app::Result;
use crate::assets::AssetResolver;
use crate::domain::{AssetLifetime, AssetReference, Entry, OutputLayout};
use crate::markup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Relative,
    Absolute,
}

impl AddressingMode {
    /// Directory lifetime that downloads land in for this mode.
    pub fn lifetime(self) -> AssetLifetime {
        match self {
            AddressingMode::Relative => AssetLifetime::Persistent,
            AddressingMode::Absolute => AssetLifetime::Transient,
        }
    }
}

pub struct SummaryRewriter {
    resolver: AssetResolver,
    layout: OutputLayout,
}

impl SummaryRewriter {
    pub fn new(resolver: AssetResolver, layout: OutputLayout) -> Self {
        Self { resolver, layout }
    }

    /// Resolve every image of `entry.summary` and point its `src` at the local copy.
    ///
    /// Images are processed in document order, one download at a time. An image with
    /// an empty or missing `src` gets the placeholder and ends the pass: images after
    /// it keep their remote source.
    pub async fn rewrite(&self, mut entry: Entry, mode: AddressingMode) -> Result<Entry> {
        let sources = markup::image_sources(&entry.summary)?;
        if sources.is_empty() {
            return Ok(entry);
        }

        let mut replacements = Vec::with_capacity(sources.len());
        for src in sources {
            let (reference, last) = match src.filter(|s| !s.is_empty()) {
                Some(url) => (self.download(&url, mode).await?, false),
                None => {
                    tracing::debug!(title = %entry.title, "Image without source, using placeholder");
                    (self.placeholder(mode)?, true)
                }
            };
            tracing::debug!(src = %reference.src, lifetime = ?reference.lifetime, "Image rewritten");
            replacements.push(reference.src);
            if last {
                break;
            }
        }

        entry.summary = markup::replace_image_sources(&entry.summary, &replacements)?;
        Ok(entry)
    }

    /// Rewrite a batch of entries in order, stopping at the first failure.
    pub async fn rewrite_all(&self, entries: Vec<Entry>, mode: AddressingMode) -> Result<Vec<Entry>> {
        let mut rewritten = Vec::with_capacity(entries.len());
        for entry in entries {
            rewritten.push(self.rewrite(entry, mode).await?);
        }
        Ok(rewritten)
    }

    async fn download(&self, url: &str, mode: AddressingMode) -> Result<AssetReference> {
        let lifetime = mode.lifetime();
        let target_dir = self.layout.image_dir_for(lifetime);
        let filename = self.resolver.resolve(url, &target_dir, &self.layout).await?;

        let src = match mode {
            AddressingMode::Relative => relative_src(&self.layout.image_dir, &filename),
            AddressingMode::Absolute => OutputLayout::absolute(&target_dir.join(&filename))?
                .to_string_lossy()
                .into_owned(),
        };
        Ok(AssetReference { src, lifetime })
    }

    fn placeholder(&self, mode: AddressingMode) -> Result<AssetReference> {
        match mode {
            AddressingMode::Relative => {
                let filename = self.resolver.copy_placeholder(&self.layout)?;
                Ok(AssetReference {
                    src: relative_src(&self.layout.image_dir, &filename),
                    lifetime: AssetLifetime::Persistent,
                })
            }
            // the renderer reads the bundled file in place
            AddressingMode::Absolute => Ok(AssetReference {
                src: OutputLayout::absolute(&self.layout.placeholder)?
                    .to_string_lossy()
                    .into_owned(),
                lifetime: AssetLifetime::Transient,
            }),
        }
    }
}

/// `image_dir` and `filename` joined with `/` whatever the platform separator.
///
/// `image_dir` is a plain relative path; [`OutputLayout`] rejects anything else.
fn relative_src(image_dir: &Path, filename: &str) -> String {
    let mut parts: Vec<String> = image_dir
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.push(filename.to_string());
    parts.join("/")
}
