//! Validation functions for API query parameters

use api_types::ErrorResponse;
use clickhouse_lib::{Chain, Granularity};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

/// Entity names are warehouse labels: short lowercase slugs. Reject anything
/// else before it reaches a query.
const MAX_ENTITY_LEN: usize = 64;

/// Default entity shown when none is requested.
const DEFAULT_ENTITY: &str = "pimlico";

/// Common query parameters shared by every analytics endpoint.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct CommonQuery {
    /// Chain to scope the response to; `all` aggregates every chain
    pub chain: Option<String>,
    /// Period granularity: `day`, `week` or `month`
    pub timeframe: Option<String>,
}

/// Query parameters for the `/entity` endpoint.
#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
pub struct EntityQuery {
    /// Common query parameters
    #[serde(flatten)]
    pub common: CommonQuery,
    /// Entity name to report on
    pub entity: Option<String>,
}

/// Resolve the `chain` parameter, defaulting to `all`.
pub fn resolve_chain(chain: Option<&String>) -> Result<Chain, ErrorResponse> {
    match chain {
        None => Ok(Chain::All),
        Some(raw) => Chain::parse(raw).ok_or_else(|| {
            tracing::warn!(chain = %raw, "Rejected unknown chain parameter");
            ErrorResponse::invalid_params(format!(
                "Unknown chain '{raw}'. Valid values: {}",
                Chain::VALUES.map(|c| c.as_str()).join(", ")
            ))
        }),
    }
}

/// Resolve the `timeframe` parameter, defaulting to `week`.
pub fn resolve_granularity(timeframe: Option<&String>) -> Result<Granularity, ErrorResponse> {
    match timeframe {
        None => Ok(Granularity::Week),
        Some(raw) => Granularity::parse(raw).ok_or_else(|| {
            tracing::warn!(timeframe = %raw, "Rejected unknown timeframe parameter");
            ErrorResponse::invalid_params(format!(
                "Unknown timeframe '{raw}'. Valid values: day, week, month"
            ))
        }),
    }
}

/// Resolve and validate the `entity` parameter.
pub fn resolve_entity(entity: Option<&String>) -> Result<String, ErrorResponse> {
    let raw = entity.map_or(DEFAULT_ENTITY, String::as_str);
    let valid = !raw.is_empty()
        && raw.len() <= MAX_ENTITY_LEN
        && raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(raw.to_owned())
    } else {
        tracing::warn!(entity = %raw, "Rejected malformed entity parameter");
        Err(ErrorResponse::invalid_params(
            "Entity must be a lowercase slug of at most 64 characters",
        ))
    }
}
