//! Ecosystem-wide overview endpoint.

use crate::{
    helpers::{database_error, retention_matrix},
    state::ApiState,
    validation::{CommonQuery, resolve_chain, resolve_granularity},
};
use api_types::{ErrorResponse, OverviewResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/overview",
    params(CommonQuery),
    responses(
        (status = 200, description = "Ecosystem overview", body = OverviewResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "bundlescope"
)]
/// Headline totals, per-chain chart series and the account cohort retention
/// matrix for the whole ecosystem.
pub async fn overview(
    Query(params): Query<CommonQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ErrorResponse> {
    let chain = resolve_chain(params.chain.as_ref())?;
    let granularity = resolve_granularity(params.timeframe.as_ref())?;
    let key = format!("overview:{}:{}", chain.as_str(), granularity.as_str());
    let client = state.client.clone();

    state
        .cached(key, move || async move {
            let stats = client
                .get_summary_stats(chain)
                .await
                .map_err(|e| database_error("get summary stats", e))?;
            let active_accounts = client
                .get_active_accounts_series(chain, granularity)
                .await
                .map_err(|e| database_error("get active accounts series", e))?;
            let userops = client
                .get_userops_series(chain, granularity)
                .await
                .map_err(|e| database_error("get userops series", e))?;
            let paymaster_spend = client
                .get_paymaster_spend_series(chain, granularity)
                .await
                .map_err(|e| database_error("get paymaster spend series", e))?;
            let bundler_revenue = client
                .get_bundler_revenue_series(chain, granularity)
                .await
                .map_err(|e| database_error("get bundler revenue series", e))?;
            let activity = client
                .get_sender_activity(chain, granularity, granularity.default_lookback())
                .await
                .map_err(|e| database_error("get sender activity", e))?;
            let accounts_by_category = client
                .get_accounts_by_category(chain, granularity)
                .await
                .map_err(|e| database_error("get accounts by category", e))?;

            let retention =
                retention_matrix(activity.into_iter().map(Into::into), granularity, None);

            Ok(OverviewResponse {
                deployments: stats.num_deployments,
                userops: stats.num_userops,
                transactions: stats.num_txns,
                paymaster_spend_usd: stats.gas_spent_usd,
                monthly_active_accounts: active_accounts,
                monthly_userops: userops,
                monthly_paymaster_spend: paymaster_spend,
                monthly_bundler_revenue: bundler_revenue,
                retention,
                accounts_by_category,
            })
        })
        .await
}
