//! HTTP access to upstream feeds.

mod basic;
mod retry;

pub use basic::BasicClient;
pub use retry::RetryPolicy;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Request, Response};
use serde::de::DeserializeOwned;

/// Executes prepared requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}

/// GETs `url` and returns the body, failing on non-success status codes.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client
        .execute(req)
        .await
        .map_err(|e| anyhow!("Failed to send request to {}: {}", url, e))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("{} returned status {}: {}", url, status, body));
    }

    Ok(resp.bytes().await?.to_vec())
}

/// GETs `url` and decodes the body as JSON.
pub async fn fetch_json<C: HttpClient, T: DeserializeOwned>(client: &C, url: &str) -> Result<T> {
    let bytes = fetch_bytes(client, url).await?;
    serde_json::from_slice(&bytes).with_context(|| format!("Failed to parse response from {}", url))
}
