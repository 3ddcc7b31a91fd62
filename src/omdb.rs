use std::{num::NonZeroU32, sync::Arc};

use async_trait::async_trait;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::models::ExternalData;

pub const MOVIE_NOT_FOUND: &str = "Movie does not exist.";
pub const NO_API_KEY: &str = "No API key provided.";

/// Source of canonical movie metadata, looked up by title.
///
/// The error is a human-readable message meant to be shown to the caller.
#[async_trait]
pub trait MovieProvider: Send + Sync {
    async fn fetch_movie(&self, title: &str) -> Result<ExternalData, String>;
}

pub struct OmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl OmdbClient {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String, rps: u32) -> Self {
        if api_key.trim().is_empty() {
            warn!("no OMDB_API_KEY provided, movie lookups will fail");
        }

        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, api_key, base_url, limiter }
    }

    async fn request(&self, title: &str) -> reqwest::Result<Map<String, Value>> {
        let url = format!("{}/", self.base_url.trim_end_matches('/'));
        self.client
            .get(url)
            .query(&[("t", title), ("apikey", self.api_key.as_str())])
            .send()
            .await?
            .json()
            .await
    }
}

#[async_trait]
impl MovieProvider for OmdbClient {
    async fn fetch_movie(&self, title: &str) -> Result<ExternalData, String> {
        if self.api_key.trim().is_empty() {
            return Err(NO_API_KEY.to_string());
        }

        self.limiter.until_ready().await;

        debug!(title = %title, "querying OMDb");
        let body = self.request(title).await.map_err(|err| {
            warn!(title = %title, error = %err, "OMDb request failed");
            err.to_string()
        })?;

        interpret(body)
    }
}

/// OMDb answers with HTTP 200 even for misses; the body tells them apart.
fn interpret(body: Map<String, Value>) -> Result<ExternalData, String> {
    if let Some(error) = body.get("Error") {
        return Err(error.as_str().map(str::to_string).unwrap_or_else(|| error.to_string()));
    }
    if body.get("Response").and_then(Value::as_str) == Some("False") {
        return Err(MOVIE_NOT_FOUND.to_string());
    }
    Ok(ExternalData::new(body))
}
