//! EPUB package model.
//!
//! An [`EpubPackage`] is built fresh for every export and handed to a
//! [`PackageWriter`], which turns it into a container on disk.

pub mod writer;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::app::Result;

pub use writer::ZipPackageWriter;

/// Serializes a package to `path`.
pub trait PackageWriter {
    fn write(&self, package: &EpubPackage, path: &Path) -> Result<()>;
}

/// Produces the unique identifier of each package.
pub trait PackageIdSource {
    fn next_id(&self) -> String;
}

/// `urn:uuid:` identifiers from random v4 UUIDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl PackageIdSource for RandomIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().urn().to_string()
    }
}

/// `<prefix>1`, `<prefix>2`, ... for reproducible packages.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl PackageIdSource for SequentialIds {
    fn next_id(&self) -> String {
        format!("{}{}", self.prefix, self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// The single content document of a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub file_name: String,
    /// A full HTML document; its `<body>` becomes the chapter body.
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Path inside the content directory, e.g. `images/a.png`.
    pub href: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl Resource {
    pub fn new(href: impl Into<String>, data: Vec<u8>) -> Self {
        let href = href.into();
        let media_type = media_type_for(&href).to_string();
        Self {
            href,
            media_type,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TocEntry {
    Link {
        href: String,
        title: String,
        id: String,
    },
    Section {
        title: String,
        children: Vec<TocEntry>,
    },
}

impl TocEntry {
    /// Target of the entry; a section points at its first child.
    pub fn href(&self) -> Option<&str> {
        match self {
            TocEntry::Link { href, .. } => Some(href),
            TocEntry::Section { children, .. } => children.iter().find_map(|c| c.href()),
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TocEntry::Link { title, .. } | TocEntry::Section { title, .. } => title,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpineItem {
    Nav,
    Chapter,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpubPackage {
    pub identifier: String,
    pub title: String,
    pub language: String,
    pub author: String,
    pub chapter: Chapter,
    /// Embedded images in insertion order, unique by `href`.
    pub images: Vec<Resource>,
    pub stylesheets: Vec<Resource>,
    pub toc: Vec<TocEntry>,
    pub spine: Vec<SpineItem>,
}

impl EpubPackage {
    pub fn new(
        identifier: impl Into<String>,
        title: impl Into<String>,
        language: impl Into<String>,
        author: impl Into<String>,
        chapter: Chapter,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            title: title.into(),
            language: language.into(),
            author: author.into(),
            chapter,
            images: Vec::new(),
            stylesheets: Vec::new(),
            toc: Vec::new(),
            spine: Vec::new(),
        }
    }

    pub fn has_image(&self, href: &str) -> bool {
        self.images.iter().any(|r| r.href == href)
    }

    /// Embed an image. Returns `false` and keeps the existing one if `href` is taken.
    pub fn add_image(&mut self, resource: Resource) -> bool {
        if self.has_image(&resource.href) {
            return false;
        }
        self.images.push(resource);
        true
    }

    pub fn add_stylesheet(&mut self, href: impl Into<String>, css: &str) {
        self.stylesheets.push(Resource {
            href: href.into(),
            media_type: "text/css".to_string(),
            data: css.as_bytes().to_vec(),
        });
    }
}

pub fn media_type_for(href: &str) -> &'static str {
    let extension = href
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "webp" => "image/webp",
        "css" => "text/css",
        "xhtml" => "application/xhtml+xml",
        _ => "application/octet-stream",
    }
}
