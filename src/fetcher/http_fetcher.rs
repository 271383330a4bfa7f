use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::Result;
use crate::config::FetchConfig;
use crate::fetcher::{FetchResult, Fetcher};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::with_config(&FetchConfig::default())
    }

    pub fn with_config(config: &FetchConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()
            .expect("Failed to build HTTP client");

        Self { client }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// GET `url`, following redirects. Non-2xx statuses are returned, not raised;
    /// callers decide whether to accept them.
    async fn fetch(&self, url: &str) -> Result<FetchResult> {
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();

        let body = response.bytes().await?.to_vec();
        tracing::debug!(url, status, bytes = body.len(), "Fetched");

        Ok(FetchResult { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve the given raw responses, one per accepted connection, in order.
    async fn serve(responses: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::from_client(Client::builder().no_proxy().build().unwrap())
    }

    #[tokio::test]
    async fn test_fetch_ok_body() {
        let base = serve(vec![
            "HTTP/1.1 200 OK\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc",
        ])
        .await;

        let result = fetcher().fetch(&format!("{}/a.png", base)).await.unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(result.body, b"abc");
    }

    #[tokio::test]
    async fn test_fetch_returns_error_status_with_body() {
        let base = serve(vec![
            "HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found",
        ])
        .await;

        let result = fetcher().fetch(&format!("{}/missing.png", base)).await.unwrap();
        assert_eq!(result.status, 404);
        assert!(!result.is_success());
        assert_eq!(result.body, b"not found");
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let base = serve(vec![
            "HTTP/1.1 302 Found\r\nLocation: /b.png\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
        ])
        .await;

        let result = fetcher().fetch(&format!("{}/a.png", base)).await.unwrap();
        assert_eq!(result.status, 200);
        assert_eq!(result.body, b"ok");
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = fetcher().fetch(&format!("http://{}/a.png", addr)).await;
        assert!(result.is_err());
    }
}
