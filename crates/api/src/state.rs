//! Shared state for API handlers and constants

use std::{sync::Arc, time::Duration as StdDuration};

use api_types::ErrorResponse;
use axum::Json;
use clickhouse_lib::ClickhouseReader;
use moka::future::Cache;
use serde::Serialize;
use serde_json::Value;

/// Default maximum number of requests allowed during the rate limiting period.
pub const DEFAULT_MAX_REQUESTS: u64 = u64::MAX;
/// Default duration for the rate limiting window.
pub const DEFAULT_RATE_PERIOD: StdDuration = StdDuration::from_secs(1);
/// Default TTL for cached endpoint responses.
pub const DEFAULT_CACHE_TTL: StdDuration = StdDuration::from_secs(21_600);
/// Default capacity of the response cache. The key space is small (endpoint
/// x chain x timeframe x entity), this only bounds pathological entity churn.
pub const DEFAULT_CACHE_MAX_ENTRIES: u64 = 1024;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub(crate) client: ClickhouseReader,
    cache: Cache<String, Arc<Value>>,
    max_requests: u64,
    rate_period: StdDuration,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState").finish_non_exhaustive()
    }
}

impl ApiState {
    /// Create a new [`ApiState`] with default cache settings.
    pub fn new(client: ClickhouseReader, max_requests: u64, rate_period: StdDuration) -> Self {
        Self::with_cache(
            client,
            max_requests,
            rate_period,
            DEFAULT_CACHE_TTL,
            DEFAULT_CACHE_MAX_ENTRIES,
        )
    }

    /// Create a new [`ApiState`] with explicit response cache settings.
    pub fn with_cache(
        client: ClickhouseReader,
        max_requests: u64,
        rate_period: StdDuration,
        cache_ttl: StdDuration,
        cache_max_entries: u64,
    ) -> Self {
        let cache = Cache::builder()
            .max_capacity(cache_max_entries)
            .time_to_live(cache_ttl)
            .build();
        Self { client, cache, max_requests, rate_period }
    }

    /// Maximum number of requests allowed per [`rate_period`].
    pub const fn max_requests(&self) -> u64 {
        self.max_requests
    }

    /// Time window for rate limiting.
    pub const fn rate_period(&self) -> StdDuration {
        self.rate_period
    }

    /// Serve `key` from the response cache, or build the response, cache its
    /// JSON form and return it. Errors are never cached.
    pub(crate) async fn cached<F, Fut, T>(
        &self,
        key: String,
        build: F,
    ) -> Result<Json<Value>, ErrorResponse>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ErrorResponse>>,
        T: Serialize,
    {
        if let Some(hit) = self.cache.get(&key).await {
            tracing::debug!(key = %key, "response cache hit");
            return Ok(Json((*hit).clone()));
        }

        let resp = build().await?;
        let value = serde_json::to_value(&resp).map_err(|e| {
            tracing::error!(key = %key, error = %e, "Failed to serialize response");
            ErrorResponse::database_error()
        })?;
        self.cache.insert(key, Arc::new(value.clone())).await;
        Ok(Json(value))
    }
}
