pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Body and status of a completed GET request (after redirects).
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResult {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Downloads remote resources: feed documents and embedded images.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult>;
}


#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;
    use crate::app::ConvertError;

    /// In-memory fetcher: answers from a fixed table and records every request.
    #[derive(Default)]
    pub struct StubFetcher {
        responses: HashMap<String, FetchResult>,
        requests: Mutex<Vec<String>>,
    }

    impl StubFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, result: FetchResult) -> Self {
            self.responses.insert(url.to_string(), result);
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchResult> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.responses.get(url) {
                Some(result) => Ok(result.clone()),
                // unknown image URLs still answer, with their own URL as the body
                None if url.starts_with("http") => Ok(FetchResult::ok(url.as_bytes())),
                None => Err(ConvertError::AssetFetch {
                    url: url.to_string(),
                    reason: "unreachable".into(),
                }),
            }
        }
    }
}
