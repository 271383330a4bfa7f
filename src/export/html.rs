use std::path::PathBuf;

use async_trait::async_trait;

use super::{rewrite_copy, Exporter, Format};
use crate::app::Result;
use crate::assets::AssetResolver;
use crate::domain::{Feed, OutputLayout};
use crate::render::{DocumentRenderer, StyleMode};
use crate::rewriter::{AddressingMode, SummaryRewriter};

/// `out.html` with images downloaded next to it. Downloads are kept.
pub struct HtmlExporter {
    rewriter: SummaryRewriter,
    renderer: DocumentRenderer,
    layout: OutputLayout,
}

impl HtmlExporter {
    pub fn new(resolver: AssetResolver, layout: OutputLayout) -> Self {
        Self {
            rewriter: SummaryRewriter::new(resolver, layout.clone()),
            renderer: DocumentRenderer::new(&layout.font),
            layout,
        }
    }
}

#[async_trait]
impl Exporter for HtmlExporter {
    fn format(&self) -> Format {
        Format::Html
    }

    async fn export(&self, feed: &Feed) -> Result<PathBuf> {
        let path = self.layout.output_file(Format::Html.file_name());
        tracing::info!(entries = feed.entries.len(), path = %path.display(), "Exporting HTML");

        let entries = rewrite_copy(&self.rewriter, feed, AddressingMode::Relative).await?;
        let html = self.renderer.render(&feed.title, &entries, StyleMode::SCREEN);

        self.layout.ensure_dir(&self.layout.root)?;
        std::fs::write(&path, html)?;

        tracing::info!(path = %path.display(), "HTML written");
        Ok(path)
    }
}
