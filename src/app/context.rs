use std::sync::Arc;

use crate::app::Result;
use crate::assets::AssetResolver;
use crate::config::Config;
use crate::domain::OutputLayout;
use crate::epub::{RandomIds, ZipPackageWriter};
use crate::export::{EpubExporter, Exporter, Format, HtmlExporter, PdfExporter};
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::pdf::PrintPdfRenderer;

pub struct AppContext {
    pub config: Config,
    pub layout: OutputLayout,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub normalizer: Normalizer,
}

impl AppContext {
    /// Fails when the configured output layout is unusable.
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> =
            Arc::new(HttpFetcher::with_config(&config.fetch));
        Self::with_fetcher(config, fetcher)
    }

    pub fn with_fetcher(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        Ok(Self {
            layout: config.layout()?,
            config,
            fetcher,
            normalizer: Normalizer::new(),
        })
    }

    pub fn resolver(&self) -> AssetResolver {
        AssetResolver::new(self.fetcher.clone())
            .reject_error_status(self.config.fetch.reject_error_status)
    }

    /// Production exporter for `format`, writing under the configured layout.
    pub fn exporter(&self, format: Format) -> Box<dyn Exporter> {
        let layout = self.layout.clone();
        match format {
            Format::Html => Box::new(HtmlExporter::new(self.resolver(), layout)),
            Format::Pdf => Box::new(PdfExporter::new(
                self.resolver(),
                layout,
                Box::new(PrintPdfRenderer::new(&self.config.pdf)),
            )),
            Format::Epub => Box::new(
                EpubExporter::new(
                    self.resolver(),
                    layout,
                    Box::new(ZipPackageWriter),
                    Arc::new(RandomIds),
                )
                .with_metadata(self.config.epub.clone()),
            ),
        }
    }
}
