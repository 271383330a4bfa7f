//! Document assembly: feed title and entries into a single HTML page.

use std::fmt::Write as _;
use std::path::PathBuf;

use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::app::Result;
use crate::domain::Entry;
use crate::markup;
use crate::rewriter::AddressingMode;

const FONT_FAMILY: &str = "Feedbind";

/// Styling of a rendered document.
///
/// `addressing` only records how the summaries were rewritten upstream; the
/// renderer emits them as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleMode {
    pub use_embedded_font: bool,
    pub addressing: AddressingMode,
}

impl StyleMode {
    /// Browser and EPUB output.
    pub const SCREEN: StyleMode = StyleMode {
        use_embedded_font: false,
        addressing: AddressingMode::Relative,
    };

    /// Dense, font-embedded output for the PDF renderer.
    pub const PRINT: StyleMode = StyleMode {
        use_embedded_font: true,
        addressing: AddressingMode::Absolute,
    };

    fn margin(&self) -> &'static str {
        if self.use_embedded_font {
            "2px"
        } else {
            "20px"
        }
    }

    fn font_size(&self) -> &'static str {
        if self.use_embedded_font {
            "15px"
        } else {
            "18px"
        }
    }
}

pub struct DocumentRenderer {
    font_path: PathBuf,
}

impl DocumentRenderer {
    pub fn new(font_path: impl Into<PathBuf>) -> Self {
        Self {
            font_path: font_path.into(),
        }
    }

    /// Render a full document. Title, date and link are escaped; summaries are emitted verbatim.
    pub fn render(&self, title: &str, entries: &[Entry], style: StyleMode) -> String {
        let mut html = String::new();

        html.push_str("<html>\n<head>\n");
        html.push_str("<meta charset=\"utf-8\">\n");
        let _ = writeln!(html, "<title>{}</title>", encode_text(title));
        html.push_str("<style type=\"text/css\">\n");
        if style.use_embedded_font {
            let _ = writeln!(
                html,
                "@font-face {{ font-family: {}; src: url(\"{}\"); }}",
                FONT_FAMILY,
                self.font_path.display()
            );
        }
        let _ = writeln!(html, "body {{ font-family: {}; }}", FONT_FAMILY);
        let _ = writeln!(
            html,
            "div {{ margin: {}; font-size: {}; }}",
            style.margin(),
            style.font_size()
        );
        html.push_str("</style>\n</head>\n<body>\n");

        for entry in entries {
            render_entry(&mut html, entry);
        }

        html.push_str("</body>\n</html>\n");
        html
    }
}

fn render_entry(html: &mut String, entry: &Entry) {
    let _ = write!(
        html,
        "<div class='entry'>\n\
         <h2 class='title'>{title}</h2>\n\
         <p><span class='date'>{date}</span></p>\n\
         <p><a class='link' href=\"{href}\">{link}</a></p>\n\
         <div class='description'>{summary}</div>\n\
         </div>\n",
        title = encode_text(&entry.title),
        date = encode_text(&entry.published),
        href = encode_double_quoted_attribute(&entry.link),
        link = encode_text(&entry.link),
        summary = entry.summary,
    );
}

/// Summary reduced to plain text, for terminal output.
pub fn summary_text(summary: &str) -> Result<String> {
    markup::to_text(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> DocumentRenderer {
        DocumentRenderer::new("/fonts/DejaVuSans.ttf")
    }

    #[test]
    fn test_entries_in_order() {
        let entries = vec![
            Entry::new("First", "2024-01-01", "http://x/1", "<p>one</p>"),
            Entry::new("Second", "2024-01-02", "http://x/2", "<p>two</p>"),
        ];
        let html = renderer().render("Feed", &entries, StyleMode::SCREEN);

        let first = html.find("First").unwrap();
        let second = html.find("Second").unwrap();
        assert!(first < second);
        assert_eq!(html.matches("<div class='entry'>").count(), 2);
        assert!(html.contains("<div class='description'><p>one</p></div>"));
        assert!(html.contains("<span class='date'>2024-01-02</span>"));
        assert!(html.contains("<a class='link' href=\"http://x/2\">http://x/2</a>"));
    }

    #[test]
    fn test_screen_style() {
        let html = renderer().render("Feed", &[], StyleMode::SCREEN);
        assert!(html.contains("margin: 20px; font-size: 18px;"));
        assert!(!html.contains("@font-face"));
    }

    #[test]
    fn test_print_style_embeds_font() {
        let html = renderer().render("Feed", &[], StyleMode::PRINT);
        assert!(html.contains("margin: 2px; font-size: 15px;"));
        assert!(html.contains("src: url(\"/fonts/DejaVuSans.ttf\")"));
    }

    #[test]
    fn test_empty_feed_is_well_formed() {
        let html = renderer().render("Empty", &[], StyleMode::SCREEN);
        assert!(html.starts_with("<html>"));
        assert!(html.contains("<title>Empty</title>"));
        assert!(html.contains("<body>\n</body>"));
        assert!(!html.contains("class='entry'"));
    }

    #[test]
    fn test_escaping() {
        let entries = vec![Entry::new(
            "Fish & <Chips>",
            "today",
            "http://x/?a=1&b=\"2\"",
            "<b>raw &amp; kept</b>",
        )];
        let html = renderer().render("A & B", &entries, StyleMode::SCREEN);

        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<h2 class='title'>Fish &amp; &lt;Chips&gt;</h2>"));
        assert!(html.contains("href=\"http://x/?a=1&amp;b=&quot;2&quot;\""));
        assert!(html.contains("<b>raw &amp; kept</b>"));
    }

    #[test]
    fn test_summary_text() {
        assert_eq!(
            summary_text("<p>Привет <img src='a.png'>мир</p>").unwrap(),
            "Привет мир"
        );
    }
}
