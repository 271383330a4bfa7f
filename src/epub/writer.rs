use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::Path;

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{EpubPackage, PackageWriter, SpineItem, TocEntry};
use crate::app::{ConvertError, Result};
use crate::xhtml;

const NAV_FILE: &str = "nav.xhtml";

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>
"#;

/// Writes an EPUB 3 container (with an NCX for older readers) through `zip`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipPackageWriter;

impl PackageWriter for ZipPackageWriter {
    fn write(&self, package: &EpubPackage, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(build_error)?;
        let mut writer = BufWriter::new(file);
        self.write_to(package, &mut writer)?;
        writer.flush().map_err(build_error)?;
        Ok(())
    }
}

impl ZipPackageWriter {
    /// Write the container to any seekable destination.
    pub fn write_to<W: Write + Seek>(&self, package: &EpubPackage, writer: W) -> Result<()> {
        let chapter = chapter_xhtml(package);

        let mut zip = ZipWriter::new(writer);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        // mimetype must come first and uncompressed
        add(&mut zip, "mimetype", b"application/epub+zip", stored)?;
        add(&mut zip, "META-INF/container.xml", CONTAINER_XML.as_bytes(), deflated)?;
        add(&mut zip, "OEBPS/content.opf", content_opf(package).as_bytes(), deflated)?;
        add(&mut zip, "OEBPS/toc.ncx", toc_ncx(package).as_bytes(), deflated)?;
        add(&mut zip, &format!("OEBPS/{}", NAV_FILE), nav_xhtml(package).as_bytes(), deflated)?;
        add(
            &mut zip,
            &format!("OEBPS/{}", package.chapter.file_name),
            chapter.as_bytes(),
            deflated,
        )?;
        for resource in package.stylesheets.iter().chain(&package.images) {
            add(&mut zip, &format!("OEBPS/{}", resource.href), &resource.data, deflated)?;
        }

        zip.finish().map_err(build_error)?;
        Ok(())
    }
}

fn add<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    name: &str,
    data: &[u8],
    options: SimpleFileOptions,
) -> Result<()> {
    zip.start_file(name, options).map_err(build_error)?;
    zip.write_all(data).map_err(build_error)?;
    Ok(())
}

fn build_error(e: impl Display) -> ConvertError {
    ConvertError::EpubBuild(e.to_string())
}

fn content_opf(package: &EpubPackage) -> String {
    let mut opf = String::new();

    opf.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="id">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
"#,
    );
    opf.push_str(&format!(
        "    <dc:identifier id=\"id\">{}</dc:identifier>\n",
        text(&package.identifier)
    ));
    opf.push_str(&format!("    <dc:title>{}</dc:title>\n", text(&package.title)));
    opf.push_str(&format!(
        "    <dc:language>{}</dc:language>\n",
        text(&package.language)
    ));
    opf.push_str(&format!(
        "    <dc:creator id=\"creator\">{}</dc:creator>\n",
        text(&package.author)
    ));
    opf.push_str(&format!(
        "    <meta property=\"dcterms:modified\">{}</meta>\n",
        chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ")
    ));
    opf.push_str("  </metadata>\n  <manifest>\n");

    opf.push_str("    <item id=\"ncx\" href=\"toc.ncx\" media-type=\"application/x-dtbncx+xml\"/>\n");
    opf.push_str(&format!(
        "    <item id=\"nav\" href=\"{}\" media-type=\"application/xhtml+xml\" properties=\"nav\"/>\n",
        NAV_FILE
    ));
    opf.push_str(&format!(
        "    <item id=\"chapter_0\" href=\"{}\" media-type=\"application/xhtml+xml\"/>\n",
        attr(&package.chapter.file_name)
    ));
    // ids are positional: distinct hrefs such as `a-b.png` and `a_b.png` must not collide
    let resources = package
        .stylesheets
        .iter()
        .enumerate()
        .map(|(i, r)| (format!("style_{}", i), r))
        .chain(package.images.iter().enumerate().map(|(i, r)| (format!("image_{}", i), r)));
    for (id, resource) in resources {
        opf.push_str(&format!(
            "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"/>\n",
            id,
            attr(&resource.href),
            attr(&resource.media_type)
        ));
    }

    opf.push_str("  </manifest>\n  <spine toc=\"ncx\">\n");
    for item in &package.spine {
        let idref = match item {
            SpineItem::Nav => "nav",
            SpineItem::Chapter => "chapter_0",
        };
        opf.push_str(&format!("    <itemref idref=\"{}\"/>\n", idref));
    }
    opf.push_str("  </spine>\n</package>\n");
    opf
}

fn toc_ncx(package: &EpubPackage) -> String {
    let mut ncx = String::new();

    ncx.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{}"/>
    <meta name="dtb:depth" content="{}"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{}</text>
  </docTitle>
  <navMap>
"#,
        attr(&package.identifier),
        toc_depth(&package.toc),
        text(&package.title)
    ));

    let mut play_order = 1;
    for entry in &package.toc {
        write_nav_point(&mut ncx, entry, &mut play_order, 2);
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn toc_depth(entries: &[TocEntry]) -> usize {
    entries
        .iter()
        .map(|entry| match entry {
            TocEntry::Link { .. } => 1,
            TocEntry::Section { children, .. } => 1 + toc_depth(children),
        })
        .max()
        .unwrap_or(1)
}

fn write_nav_point(ncx: &mut String, entry: &TocEntry, play_order: &mut usize, indent: usize) {
    let pad = "  ".repeat(indent);
    let id = match entry {
        TocEntry::Link { id, .. } => id.clone(),
        TocEntry::Section { .. } => format!("sep_{}", play_order),
    };

    ncx.push_str(&format!(
        "{pad}<navPoint id=\"{}\" playOrder=\"{}\">\n",
        attr(&id),
        play_order
    ));
    ncx.push_str(&format!(
        "{pad}  <navLabel>\n{pad}    <text>{}</text>\n{pad}  </navLabel>\n",
        text(entry.title())
    ));
    ncx.push_str(&format!(
        "{pad}  <content src=\"{}\"/>\n",
        attr(entry.href().unwrap_or_default())
    ));
    *play_order += 1;

    if let TocEntry::Section { children, .. } = entry {
        for child in children {
            write_nav_point(ncx, child, play_order, indent + 1);
        }
    }

    ncx.push_str(&format!("{pad}</navPoint>\n"));
}

fn nav_xhtml(package: &EpubPackage) -> String {
    let mut nav = String::new();

    nav.push_str(&format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
"#,
        lang = attr(&package.language),
        title = text(&package.title)
    ));
    for stylesheet in &package.stylesheets {
        nav.push_str(&format!(
            "  <link href=\"{}\" rel=\"stylesheet\" type=\"text/css\"/>\n",
            attr(&stylesheet.href)
        ));
    }
    nav.push_str(&format!(
        "</head>\n<body>\n<nav epub:type=\"toc\" id=\"id\" role=\"doc-toc\">\n<h2>{}</h2>\n",
        text(&package.title)
    ));
    write_nav_list(&mut nav, &package.toc);
    nav.push_str("</nav>\n</body>\n</html>\n");
    nav
}

fn write_nav_list(nav: &mut String, entries: &[TocEntry]) {
    nav.push_str("<ol>\n");
    for entry in entries {
        match entry {
            TocEntry::Link { href, title, .. } => {
                nav.push_str(&format!(
                    "<li><a href=\"{}\">{}</a></li>\n",
                    attr(href),
                    text(title)
                ));
            }
            TocEntry::Section { title, children } => {
                nav.push_str(&format!("<li><span>{}</span>\n", text(title)));
                write_nav_list(nav, children);
                nav.push_str("</li>\n");
            }
        }
    }
    nav.push_str("</ol>\n");
}

/// The chapter document: the rendered `<body>` re-serialized as XHTML.
fn chapter_xhtml(package: &EpubPackage) -> String {
    let body = xhtml::body_to_xhtml(&package.chapter.content);

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
</head>
<body>{body}</body>
</html>
"#,
        lang = attr(&package.language),
        title = text(&package.chapter.title),
        body = body
    )
}
