pub mod commands;

use std::path::PathBuf;

use clap::Parser;

use crate::export::Format;

#[derive(Parser, Debug)]
#[command(name = "feedbind")]
#[command(version, about = "Read an RSS/Atom feed and convert it to HTML, PDF or EPUB", long_about = None)]
pub struct Cli {
    /// Feed URL, or path to a feed file on disk
    pub source: String,

    /// Keep only the first N entries
    #[arg(short, long, value_name = "N")]
    pub limit: Option<usize>,

    /// Print the feed as JSON
    #[arg(short, long)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Write out.html
    #[arg(long)]
    pub to_html: bool,

    /// Write out.pdf
    #[arg(long)]
    pub to_pdf: bool,

    /// Write out.epub
    #[arg(long)]
    pub to_epub: bool,

    /// Output directory (overrides the configured root)
    #[arg(long, value_name = "DIR")]
    pub output_path: Option<PathBuf>,

    /// Configuration file (default: ~/.config/feedbind/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Requested conversions, in the order they run.
    pub fn formats(&self) -> Vec<Format> {
        [
            (self.to_html, Format::Html),
            (self.to_pdf, Format::Pdf),
            (self.to_epub, Format::Epub),
        ]
        .into_iter()
        .filter_map(|(requested, format)| requested.then_some(format))
        .collect()
    }
}
