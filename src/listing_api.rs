// Client for the remote listing search and model lookup services.

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::async_trait;
use cached::{Cached, TimedSizedCache};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::{
    config::Settings,
    error::SearchError,
    filters::SearchQuery,
    models::{Listing, ModelsResponse, SearchResponse},
};

const USER_AGENT: &str = concat!("motor_metrics/", env!("CARGO_PKG_VERSION"));

// Server-side search: make/model/location/radius filtering only
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>, SearchError>;
}

// Make -> model names, used by the filter input
#[async_trait]
pub trait ModelLookup: Send + Sync {
    async fn models_for_make(&self, make: &str) -> Result<Vec<String>, SearchError>;
}

// Shared client, built once after settings are loaded
pub fn build_client(settings: &Settings) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(settings.request_timeout());

    if let Some(proxy_url) = settings.proxy_url.as_deref().filter(|p| !p.is_empty()) {
        let proxy = reqwest::Proxy::all(proxy_url).context("Invalid proxy_url in configuration")?;
        builder = builder.proxy(proxy);
        tracing::info!("Routing listing service traffic through configured proxy.");
    }

    builder.build().context("Failed to build shared reqwest client")
}

pub struct ListingService {
    http_client: Arc<Client>,
    search_url: String,
    models_url: String,
    // Keyed by lowercased make, bounded since the make comes from the URL
    models_cache: Mutex<TimedSizedCache<String, Vec<String>>>,
}

impl ListingService {
    pub fn new(http_client: Arc<Client>, settings: &Settings) -> Self {
        ListingService {
            http_client,
            search_url: settings.search_url.clone(),
            models_url: settings.models_url.clone(),
            models_cache: Mutex::new(TimedSizedCache::with_size_and_lifespan(
                settings.models_cache_size.max(1),
                settings.models_cache_ttl_secs,
            )),
        }
    }

    async fn get_json<T, Q>(&self, url: &str, query: &Q) -> Result<T, SearchError>
    where
        T: DeserializeOwned,
        Q: serde::Serialize + ?Sized,
    {
        let response = self.http_client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = %status, "Listing service returned an error status");
            return Err(SearchError::Status { status });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!(
                url,
                error = %e,
                response_body = %String::from_utf8_lossy(&bytes),
                "Failed to decode listing service response"
            );
            SearchError::Decode(e)
        })
    }
}

#[async_trait]
impl ListingSource for ListingService {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Listing>, SearchError> {
        tracing::debug!(?query, url = %self.search_url, "Searching listings");
        let body: SearchResponse = self.get_json(&self.search_url, query).await?;
        tracing::info!(count = body.listings.len(), zip = %query.zip, "Listing search returned");
        Ok(body.listings)
    }
}

#[async_trait]
impl ModelLookup for ListingService {
    async fn models_for_make(&self, make: &str) -> Result<Vec<String>, SearchError> {
        let make = make.trim();
        if make.is_empty() {
            return Err(SearchError::EmptyMake);
        }
        let cache_key = make.to_lowercase();

        if let Some(models) = self.models_cache.lock().await.cache_get(&cache_key) {
            tracing::debug!(make, count = models.len(), "Using cached model list");
            return Ok(models.clone());
        }

        let body: ModelsResponse = self.get_json(&self.models_url, &[("make", make)]).await?;
        let models = normalize_models(body.models);
        tracing::info!(make, count = models.len(), "Fetched model list");

        self.models_cache
            .lock()
            .await
            .cache_set(cache_key, models.clone());
        Ok(models)
    }
}

// Trimmed, non-empty, unique, sorted
fn normalize_models(models: Vec<String>) -> Vec<String> {
    let mut models: Vec<String> = models
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect();
    models.sort();
    models.dedup();
    models
}

// Runs a search with an upper bound on how long it may take
pub async fn search_with_timeout(
    source: &dyn ListingSource,
    query: &SearchQuery,
    limit: Duration,
) -> Result<Vec<Listing>, SearchError> {
    match tokio::time::timeout(limit, source.search(query)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::warn!(zip = %query.zip, ?limit, "Listing search timed out");
            Err(SearchError::Timeout(limit))
        }
    }
}
