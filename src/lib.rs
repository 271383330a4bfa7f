//! # feedbind
//!
//! Converts an RSS/Atom feed into self-contained HTML, PDF and EPUB files.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → SummaryRewriter → DocumentRenderer → Exporter
//!                              ↓
//!                        AssetResolver (images on disk)
//! ```
//!
//! - [`rewriter`]: points `<img>` sources at local copies, relative for HTML/EPUB,
//!   absolute for PDF
//! - [`render`]: one HTML document for the whole feed
//! - [`export`]: `out.html`, `out.pdf`, `out.epub`
//!
//! ## Quick Start
//!
//! ```bash
//! # Print a feed
//! feedbind https://blog.rust-lang.org/feed.xml --limit 3
//!
//! # Convert it
//! feedbind https://blog.rust-lang.org/feed.xml --to-html --to-epub --output-path out
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together configuration,
/// fetcher, normalizer and the exporters.
pub mod app;

/// Image download into the output tree.
pub mod assets;

/// Command-line interface using clap.
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/feedbind/config.toml`: output layout, bundled assets,
/// HTTP timeout, EPUB metadata and PDF page setup.
pub mod config;

/// Core domain models.
///
/// - [`Feed`](domain::Feed) and [`Entry`](domain::Entry): the conversion input
/// - [`OutputLayout`](domain::OutputLayout): where files are written
pub mod domain;

/// EPUB package model and the zip container writer.
pub mod epub;

/// One exporter per output format.
pub mod export;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait, the seam tests fake
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Streaming HTML passes (image sources, text, layout blocks).
pub mod markup;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into a [`Feed`](domain::Feed).
pub mod normalizer;

/// HTML to PDF rendering with printpdf.
pub mod pdf;

/// Document templating.
pub mod render;

/// Image source rewriting for entry summaries.
pub mod rewriter;

/// Tag soup to well-formed XHTML, for EPUB chapters.
pub mod xhtml;
