//! Account factory endpoint.

use crate::{
    helpers::database_error,
    state::ApiState,
    validation::{CommonQuery, resolve_chain, resolve_granularity},
};
use api_types::{AccountDeployerResponse, ErrorResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/account_deployer",
    params(CommonQuery),
    responses(
        (status = 200, description = "Account factory stats", body = AccountDeployerResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "bundlescope"
)]
/// Account factory leaderboard, deployment and active account series.
pub async fn account_deployer(
    Query(params): Query<CommonQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ErrorResponse> {
    let chain = resolve_chain(params.chain.as_ref())?;
    let granularity = resolve_granularity(params.timeframe.as_ref())?;
    let key = format!("account_deployer:{}:{}", chain.as_str(), granularity.as_str());
    let client = state.client.clone();

    state
        .cached(key, move || async move {
            let leaderboard = client
                .get_factory_leaderboard(chain)
                .await
                .map_err(|e| database_error("get factory leaderboard", e))?;
            let deployments_chart = client
                .get_factory_deployments_series(chain, granularity)
                .await
                .map_err(|e| database_error("get factory deployments series", e))?;
            let accounts_chart = client
                .get_factory_accounts_series(chain, granularity)
                .await
                .map_err(|e| database_error("get factory accounts series", e))?;

            Ok(AccountDeployerResponse { leaderboard, deployments_chart, accounts_chart })
        })
        .await
}
