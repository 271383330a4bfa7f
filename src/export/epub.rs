use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::{rewrite_copy, Exporter, Format};
use crate::app::{ConvertError, Result};
use crate::assets::AssetResolver;
use crate::config::EpubConfig;
use crate::domain::{Feed, OutputLayout};
use crate::epub::{
    Chapter, EpubPackage, PackageIdSource, PackageWriter, Resource, SpineItem, TocEntry,
};
use crate::markup;
use crate::render::{DocumentRenderer, StyleMode};
use crate::rewriter::{AddressingMode, SummaryRewriter};

const CHAPTER_FILE: &str = "chap_01.xhtml";
const CHAPTER_TITLE: &str = "Intro";
const NAV_CSS: &str = "BODY {color: white;}";

/// `out.epub` with one chapter and every distinct local image embedded once.
pub struct EpubExporter {
    rewriter: SummaryRewriter,
    renderer: DocumentRenderer,
    writer: Box<dyn PackageWriter + Send + Sync>,
    ids: Arc<dyn PackageIdSource + Send + Sync>,
    metadata: EpubConfig,
    layout: OutputLayout,
}

impl EpubExporter {
    pub fn new(
        resolver: AssetResolver,
        layout: OutputLayout,
        writer: Box<dyn PackageWriter + Send + Sync>,
        ids: Arc<dyn PackageIdSource + Send + Sync>,
    ) -> Self {
        Self {
            rewriter: SummaryRewriter::new(resolver, layout.clone()),
            renderer: DocumentRenderer::new(&layout.font),
            writer,
            ids,
            metadata: EpubConfig::default(),
            layout,
        }
    }

    pub fn with_metadata(mut self, metadata: EpubConfig) -> Self {
        self.metadata = metadata;
        self
    }

    fn build(&self, title: &str, html: String) -> Result<EpubPackage> {
        let mut package = EpubPackage::new(
            self.ids.next_id(),
            title,
            &self.metadata.language,
            &self.metadata.author,
            Chapter {
                title: CHAPTER_TITLE.to_string(),
                file_name: CHAPTER_FILE.to_string(),
                content: html,
            },
        );

        self.embed_images(&mut package)?;
        package.add_stylesheet("style/nav.css", NAV_CSS);

        package.toc = vec![
            TocEntry::Link {
                href: CHAPTER_FILE.to_string(),
                title: "Introduction".to_string(),
                id: "intro".to_string(),
            },
            TocEntry::Section {
                title: title.to_string(),
                children: vec![TocEntry::Link {
                    href: CHAPTER_FILE.to_string(),
                    title: CHAPTER_TITLE.to_string(),
                    id: "chapter_0".to_string(),
                }],
            },
        ];
        package.spine = vec![SpineItem::Nav, SpineItem::Chapter];

        Ok(package)
    }

    /// Embed each distinct `src` of the chapter body from `root/<src>`; first occurrence wins.
    fn embed_images(&self, package: &mut EpubPackage) -> Result<()> {
        let sources = markup::image_sources(markup::body_inner(&package.chapter.content))?;

        for src in sources.into_iter().flatten().filter(|s| !s.is_empty()) {
            if package.has_image(&src) {
                tracing::debug!(src = %src, "Image already embedded");
                continue;
            }
            // images left remote after a placeholder are not files under the root
            if url::Url::parse(&src).is_ok() {
                tracing::warn!(src = %src, "Not embedding remote image");
                continue;
            }

            let path = self.layout.root.join(&src);
            let data = std::fs::read(&path).map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::AssetNotFound { path: path.clone() }
                } else {
                    ConvertError::Io(e)
                }
            })?;
            tracing::debug!(src = %src, bytes = data.len(), "Embedding image");
            package.add_image(Resource::new(src, data));
        }

        Ok(())
    }
}

#[async_trait]
impl Exporter for EpubExporter {
    fn format(&self) -> Format {
        Format::Epub
    }

    async fn export(&self, feed: &Feed) -> Result<PathBuf> {
        let path = self.layout.output_file(Format::Epub.file_name());
        tracing::info!(entries = feed.entries.len(), path = %path.display(), "Exporting EPUB");

        let entries = rewrite_copy(&self.rewriter, feed, AddressingMode::Relative).await?;
        let html = self.renderer.render(&feed.title, &entries, StyleMode::SCREEN);
        let package = self.build(&feed.title, html)?;

        self.layout.ensure_dir(&self.layout.root)?;
        self.writer.write(&package, &path)?;

        tracing::info!(
            path = %path.display(),
            images = package.images.len(),
            "EPUB written"
        );
        Ok(path)
    }
}
