use std::path::PathBuf;

use async_trait::async_trait;

use super::{rewrite_copy, Exporter, Format};
use crate::app::Result;
use crate::assets::AssetResolver;
use crate::domain::{Feed, OutputLayout};
use crate::pdf::{PdfRenderer, UTF_8};
use crate::render::{DocumentRenderer, StyleMode};
use crate::rewriter::{AddressingMode, SummaryRewriter};

/// `out.pdf`, rendered from absolute-path images that are discarded afterwards.
pub struct PdfExporter {
    rewriter: SummaryRewriter,
    renderer: DocumentRenderer,
    pdf: Box<dyn PdfRenderer + Send + Sync>,
    layout: OutputLayout,
}

impl PdfExporter {
    pub fn new(
        resolver: AssetResolver,
        layout: OutputLayout,
        pdf: Box<dyn PdfRenderer + Send + Sync>,
    ) -> Self {
        Self {
            rewriter: SummaryRewriter::new(resolver, layout.clone()),
            renderer: DocumentRenderer::new(&layout.font),
            pdf,
            layout,
        }
    }

    async fn render(&self, feed: &Feed) -> Result<Vec<u8>> {
        let entries = rewrite_copy(&self.rewriter, feed, AddressingMode::Absolute).await?;
        let html = self.renderer.render(&feed.title, &entries, StyleMode::PRINT);

        let mut bytes = Vec::new();
        self.pdf.render(&html, &self.layout.font, UTF_8, &mut bytes)?;
        Ok(bytes)
    }

    fn remove_transient_dir(&self) -> std::io::Result<()> {
        let dir = self.layout.transient_dir();
        if !dir.exists() {
            return Ok(());
        }
        tracing::info!(path = %dir.display(), "Cleaning up");
        std::fs::remove_dir_all(&dir)
    }
}

#[async_trait]
impl Exporter for PdfExporter {
    fn format(&self) -> Format {
        Format::Pdf
    }

    /// The transient image directory is removed whatever the outcome. `out.pdf` is
    /// only written once rendering succeeded; a failed run leaves none behind.
    async fn export(&self, feed: &Feed) -> Result<PathBuf> {
        // the transient directory is about to be deleted
        self.layout.validate()?;

        let path = self.layout.output_file(Format::Pdf.file_name());
        tracing::info!(entries = feed.entries.len(), path = %path.display(), "Exporting PDF");

        let rendered = self.render(feed).await;
        let cleanup = self.remove_transient_dir();

        match rendered {
            Ok(bytes) => {
                cleanup?;
                self.layout.ensure_dir(&self.layout.root)?;
                std::fs::write(&path, &bytes)?;
                tracing::info!(path = %path.display(), bytes = bytes.len(), "PDF written");
                Ok(path)
            }
            Err(e) => {
                if let Err(cleanup_err) = cleanup {
                    tracing::warn!(error = %cleanup_err, "Failed to remove transient images");
                }
                if path.exists() {
                    std::fs::remove_file(&path)?;
                }
                tracing::error!(error = %e, "PDF export failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use tempfile::tempdir;

    use super::*;
    use crate::app::ConvertError;
    use crate::domain::Entry;
    use crate::fetcher::testing::StubFetcher;
    use crate::fetcher::FetchResult;
    use crate::pdf::PrintPdfRenderer;

    /// Records the HTML it is given and optionally fails.
    #[derive(Clone, Default)]
    struct CapturingRenderer {
        html: Arc<Mutex<Option<String>>>,
        fail: bool,
    }

    impl PdfRenderer for CapturingRenderer {
        fn render(&self, html: &str, _font: &Path, encoding: &str, dest: &mut dyn Write) -> Result<()> {
            assert_eq!(encoding, UTF_8);
            *self.html.lock().unwrap() = Some(html.to_string());
            if self.fail {
                return Err(ConvertError::PdfRender("layout failed".into()));
            }
            dest.write_all(b"%PDF-stub")?;
            Ok(())
        }
    }

    fn exporter(root: &Path, renderer: CapturingRenderer) -> PdfExporter {
        PdfExporter::new(
            AssetResolver::new(Arc::new(StubFetcher::new())),
            OutputLayout::new(root),
            Box::new(renderer),
        )
    }

    fn feed(summary: &str) -> Feed {
        Feed::new("Tech News", vec![Entry::new("A", "2024-01-01", "http://x/1", summary)])
    }

    #[tokio::test]
    async fn test_absolute_sources_and_cleanup() {
        let dir = tempdir().unwrap();
        let renderer = CapturingRenderer::default();

        let path = exporter(dir.path(), renderer.clone())
            .export(&feed("<p><img src='http://img/a.png'></p>"))
            .await
            .unwrap();

        let html = renderer.html.lock().unwrap().clone().unwrap();
        let expected = std::path::absolute(dir.path().join("_temp_images/a.png")).unwrap();
        assert!(html.contains(&format!("src=\"{}\"", expected.display())));
        assert!(html.contains("@font-face"));

        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-stub");
        assert!(!dir.path().join("_temp_images").exists());
        assert!(!dir.path().join("images").exists());
    }

    #[tokio::test]
    async fn test_render_failure_cleans_up() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("out.pdf"), b"stale").unwrap();
        let renderer = CapturingRenderer {
            fail: true,
            ..Default::default()
        };

        let err = exporter(dir.path(), renderer)
            .export(&feed("<img src='http://img/a.png'>"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::PdfRender(_)));
        assert!(!dir.path().join("_temp_images").exists());
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[tokio::test]
    async fn test_download_failure_cleans_up() {
        let dir = tempdir().unwrap();
        let fetcher = StubFetcher::new().with(
            "http://img/b.png",
            FetchResult {
                status: 404,
                body: vec![],
            },
        );
        let exporter = PdfExporter::new(
            AssetResolver::new(Arc::new(fetcher)),
            OutputLayout::new(dir.path()),
            Box::new(CapturingRenderer::default()),
        );

        let err = exporter
            .export(&feed("<img src='http://img/a.png'><img src='http://img/b.png'>"))
            .await
            .unwrap_err();

        assert!(matches!(err, ConvertError::AssetFetch { .. }));
        assert!(!dir.path().join("_temp_images").exists());
    }

    #[tokio::test]
    async fn test_placeholder_referenced_in_place() {
        let dir = tempdir().unwrap();
        let renderer = CapturingRenderer::default();

        exporter(dir.path(), renderer.clone())
            .export(&feed("<img src=''>"))
            .await
            .unwrap();

        let html = renderer.html.lock().unwrap().clone().unwrap();
        let placeholder = std::path::absolute(crate::domain::layout::bundled_placeholder()).unwrap();
        assert!(html.contains(&format!("src=\"{}\"", placeholder.display())));
        assert!(!dir.path().join("_temp_images").exists());
        assert!(!dir.path().join("images").exists());
    }

    #[tokio::test]
    async fn test_root_as_transient_dir_is_refused() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("out.html"), b"<html></html>").unwrap();
        let mut layout = OutputLayout::new(dir.path());
        layout.temp_image_dir = PathBuf::new();

        let exporter = PdfExporter::new(
            AssetResolver::new(Arc::new(StubFetcher::new())),
            layout,
            Box::new(CapturingRenderer::default()),
        );
        let err = exporter.export(&Feed::new("Empty", vec![])).await.unwrap_err();

        assert!(matches!(err, ConvertError::Config(_)));
        assert!(dir.path().join("out.html").is_file());
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[tokio::test]
    async fn test_empty_feed_with_printpdf() {
        let dir = tempdir().unwrap();
        let exporter = PdfExporter::new(
            AssetResolver::new(Arc::new(StubFetcher::new())),
            OutputLayout::new(dir.path()),
            Box::new(PrintPdfRenderer::default()),
        );

        let path = exporter.export(&Feed::new("Empty", vec![])).await.unwrap();
        assert!(std::fs::read(path).unwrap().starts_with(b"%PDF"));
    }
}
