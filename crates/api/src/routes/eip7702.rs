//! EIP-7702 overview endpoint.

use crate::{
    helpers::database_error,
    state::ApiState,
    validation::{CommonQuery, resolve_chain, resolve_granularity},
};
use api_types::{Eip7702OverviewResponse, ErrorResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/eip7702-overview",
    params(CommonQuery),
    responses(
        (status = 200, description = "EIP-7702 overview", body = Eip7702OverviewResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "bundlescope"
)]
/// Headline EIP-7702 totals and authorization chart series.
pub async fn eip7702_overview(
    Query(params): Query<CommonQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ErrorResponse> {
    let chain = resolve_chain(params.chain.as_ref())?;
    let granularity = resolve_granularity(params.timeframe.as_ref())?;
    let key = format!("eip7702-overview:{}:{}", chain.as_str(), granularity.as_str());
    let client = state.client.clone();

    state
        .cached(key, move || async move {
            let summary = client
                .get_eip7702_summary()
                .await
                .map_err(|e| database_error("get eip7702 summary", e))?;
            let authorizations_chart = client
                .get_eip7702_authorizations_series(chain, granularity)
                .await
                .map_err(|e| database_error("get eip7702 authorizations series", e))?;
            let set_code_chart = client
                .get_eip7702_set_code_series(chain, granularity)
                .await
                .map_err(|e| database_error("get eip7702 set code series", e))?;
            let live_smart_wallets_chart = client
                .get_eip7702_live_wallets_series(chain, granularity)
                .await
                .map_err(|e| database_error("get eip7702 live wallets series", e))?;
            let live_authorized_contracts_chart = client
                .get_eip7702_live_authorized_contracts_series(chain, granularity)
                .await
                .map_err(|e| database_error("get eip7702 live authorized contracts series", e))?;

            Ok(Eip7702OverviewResponse {
                live_smart_wallets: summary.live_smart_wallets,
                authorizations: summary.num_authorizations,
                set_code_txns: summary.num_set_code_txns,
                authorizations_chart,
                set_code_chart,
                live_smart_wallets_chart,
                live_authorized_contracts_chart,
            })
        })
        .await
}
