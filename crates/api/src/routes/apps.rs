//! App usage endpoint.

use crate::{
    helpers::database_error,
    state::ApiState,
    validation::{CommonQuery, resolve_chain, resolve_granularity},
};
use api_types::{AppsResponse, ErrorResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/apps",
    params(CommonQuery),
    responses(
        (status = 200, description = "App usage stats", body = AppsResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "bundlescope"
)]
/// App leaderboard and top-app chart series. Chart series keep the top five
/// apps per period and fold the rest into an `Other` bucket.
pub async fn apps(
    Query(params): Query<CommonQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ErrorResponse> {
    let chain = resolve_chain(params.chain.as_ref())?;
    let granularity = resolve_granularity(params.timeframe.as_ref())?;
    let key = format!("apps:{}:{}", chain.as_str(), granularity.as_str());
    let client = state.client.clone();

    state
        .cached(key, move || async move {
            let usage_chart = client
                .get_app_usage_series(chain, granularity)
                .await
                .map_err(|e| database_error("get app usage series", e))?;
            let leaderboard = client
                .get_app_leaderboard(chain)
                .await
                .map_err(|e| database_error("get app leaderboard", e))?;
            let ops_chart = client
                .get_app_ops_series(chain, granularity)
                .await
                .map_err(|e| database_error("get app ops series", e))?;
            let ops_paymaster_chart = client
                .get_app_paymaster_ops_series(chain, granularity)
                .await
                .map_err(|e| database_error("get app paymaster ops series", e))?;

            Ok(AppsResponse { usage_chart, leaderboard, ops_chart, ops_paymaster_chart })
        })
        .await
}
