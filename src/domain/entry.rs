use serde::{Deserialize, Serialize};

/// One feed item. The summary is an HTML fragment that may embed `<img>` elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub title: String,
    #[serde(rename = "date")]
    pub published: String,
    pub link: String,
    pub summary: String,
}

impl Entry {
    pub fn new(
        title: impl Into<String>,
        published: impl Into<String>,
        link: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            published: published.into(),
            link: link.into(),
            summary: summary.into(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}
