use serde::{Deserialize, Serialize};

use crate::domain::Entry;

/// A parsed feed: a title and its entries in publication order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    #[serde(rename = "feed")]
    pub title: String,
    pub entries: Vec<Entry>,
}

impl Feed {
    pub fn new(title: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            title: title.into(),
            entries,
        }
    }

    /// Keep only the first `limit` entries. `None` keeps everything.
    pub fn truncated(mut self, limit: Option<usize>) -> Self {
        if let Some(limit) = limit {
            self.entries.truncate(limit);
        }
        self
    }
}
