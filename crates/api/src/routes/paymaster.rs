//! Paymaster market endpoint.

use crate::{
    helpers::database_error,
    state::ApiState,
    validation::{CommonQuery, resolve_chain, resolve_granularity},
};
use api_types::{ErrorResponse, PaymasterResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/paymaster",
    params(CommonQuery),
    responses(
        (status = 200, description = "Paymaster market stats", body = PaymasterResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "bundlescope"
)]
/// Paymaster leaderboard and per-paymaster chart series.
pub async fn paymaster(
    Query(params): Query<CommonQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ErrorResponse> {
    let chain = resolve_chain(params.chain.as_ref())?;
    let granularity = resolve_granularity(params.timeframe.as_ref())?;
    let key = format!("paymaster:{}:{}", chain.as_str(), granularity.as_str());
    let client = state.client.clone();

    state
        .cached(key, move || async move {
            let leaderboard = client
                .get_paymaster_leaderboard(chain)
                .await
                .map_err(|e| database_error("get paymaster leaderboard", e))?;
            let userops_chart = client
                .get_paymaster_userops_series(chain, granularity)
                .await
                .map_err(|e| database_error("get paymaster userops series", e))?;
            let spend_chart = client
                .get_paymaster_spend_by_name_series(chain, granularity)
                .await
                .map_err(|e| database_error("get paymaster spend series", e))?;
            let accounts_chart = client
                .get_paymaster_accounts_series(chain, granularity)
                .await
                .map_err(|e| database_error("get paymaster accounts series", e))?;
            let spend_type_chart = client
                .get_paymaster_spend_by_type_series(chain, granularity)
                .await
                .map_err(|e| database_error("get paymaster spend by type series", e))?;
            let userops_type_chart = client
                .get_paymaster_userops_by_type_series(chain, granularity)
                .await
                .map_err(|e| database_error("get paymaster userops by type series", e))?;

            Ok(PaymasterResponse {
                leaderboard,
                userops_chart,
                spend_chart,
                accounts_chart,
                spend_type_chart,
                userops_type_chart,
            })
        })
        .await
}
