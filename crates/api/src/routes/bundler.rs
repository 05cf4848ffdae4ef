//! Bundler market endpoint.

use crate::{
    helpers::database_error,
    state::ApiState,
    validation::{CommonQuery, resolve_chain, resolve_granularity},
};
use api_types::{BundlerResponse, ErrorResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/bundler",
    params(CommonQuery),
    responses(
        (status = 200, description = "Bundler market stats", body = BundlerResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "bundlescope"
)]
/// Bundler leaderboard and per-bundler chart series.
pub async fn bundler(
    Query(params): Query<CommonQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ErrorResponse> {
    let chain = resolve_chain(params.chain.as_ref())?;
    let granularity = resolve_granularity(params.timeframe.as_ref())?;
    let key = format!("bundler:{}:{}", chain.as_str(), granularity.as_str());
    let client = state.client.clone();

    state
        .cached(key, move || async move {
            let leaderboard = client
                .get_bundler_leaderboard(chain)
                .await
                .map_err(|e| database_error("get bundler leaderboard", e))?;
            let userops_chart = client
                .get_bundler_userops_series(chain, granularity)
                .await
                .map_err(|e| database_error("get bundler userops series", e))?;
            let revenue_chart = client
                .get_bundler_revenue_by_name_series(chain, granularity)
                .await
                .map_err(|e| database_error("get bundler revenue series", e))?;
            let multi_userop_chart = client
                .get_multi_userop_share_series(chain, granularity)
                .await
                .map_err(|e| database_error("get multi-userop share series", e))?;
            let accounts_chart = client
                .get_bundler_accounts_series(chain, granularity)
                .await
                .map_err(|e| database_error("get bundler accounts series", e))?;

            Ok(BundlerResponse {
                leaderboard,
                userops_chart,
                revenue_chart,
                multi_userop_chart,
                accounts_chart,
            })
        })
        .await
}
