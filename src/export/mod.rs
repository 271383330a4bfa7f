//! Exporters: one per output format, each writing a single file under the output root.
//!
//! Every exporter rewrites its own clone of the feed's entries, so running one
//! format never changes what another sees.

pub mod epub;
pub mod html;
pub mod pdf;

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{Entry, Feed};
use crate::rewriter::{AddressingMode, SummaryRewriter};

pub use epub::EpubExporter;
pub use html::HtmlExporter;
pub use pdf::PdfExporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Format {
    Html,
    Pdf,
    Epub,
}

impl Format {
    /// File name of the format's output under the root.
    pub fn file_name(self) -> &'static str {
        match self {
            Format::Html => "out.html",
            Format::Pdf => "out.pdf",
            Format::Epub => "out.epub",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Html => "HTML",
            Format::Pdf => "PDF",
            Format::Epub => "EPUB",
        };
        f.write_str(name)
    }
}

#[async_trait]
pub trait Exporter: Send + Sync {
    fn format(&self) -> Format;

    /// Convert `feed` and return the path of the written file.
    async fn export(&self, feed: &Feed) -> Result<PathBuf>;
}

/// Clone the entries of `feed` and rewrite their images for `mode`.
async fn rewrite_copy(
    rewriter: &SummaryRewriter,
    feed: &Feed,
    mode: AddressingMode,
) -> Result<Vec<Entry>> {
    rewriter.rewrite_all(feed.entries.clone(), mode).await
}
