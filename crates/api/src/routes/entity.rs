//! Single-entity endpoint.

use crate::{
    helpers::database_error,
    state::ApiState,
    validation::{EntityQuery, resolve_chain, resolve_entity, resolve_granularity},
};
use api_types::{EntityResponse, ErrorResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use serde_json::Value;

#[utoipa::path(
    get,
    path = "/entity",
    params(EntityQuery),
    responses(
        (status = 200, description = "Entity stats", body = EntityResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 500, description = "Database error", body = ErrorResponse)
    ),
    tag = "bundlescope"
)]
/// Stats for one named entity, split by the roles it operates under. Series
/// for a role the entity does not hold come back empty rather than erroring.
pub async fn entity(
    Query(params): Query<EntityQuery>,
    State(state): State<ApiState>,
) -> Result<Json<Value>, ErrorResponse> {
    let chain = resolve_chain(params.common.chain.as_ref())?;
    let granularity = resolve_granularity(params.common.timeframe.as_ref())?;
    let entity = resolve_entity(params.entity.as_ref())?;
    let key = format!("entity:{}:{}:{entity}", chain.as_str(), granularity.as_str());
    let client = state.client.clone();

    state
        .cached(key, move || async move {
            let roles = client
                .get_entity_roles(&entity)
                .await
                .map_err(|e| database_error("get entity roles", e))?;

            let mut resp = EntityResponse {
                bundler_exists: roles.bundler_exists,
                bundler_userops_chart: Vec::new(),
                bundler_accounts_chart: Vec::new(),
                bundler_revenue_chart: Vec::new(),
                paymaster_exists: roles.paymaster_exists,
                paymaster_userops_chart: Vec::new(),
                paymaster_spend_chart: Vec::new(),
                paymaster_accounts_chart: Vec::new(),
            };

            if roles.bundler_exists {
                resp.bundler_userops_chart = client
                    .get_entity_bundler_userops_series(chain, granularity, &entity)
                    .await
                    .map_err(|e| database_error("get entity bundler userops series", e))?;
                resp.bundler_accounts_chart = client
                    .get_entity_bundler_accounts_series(chain, granularity, &entity)
                    .await
                    .map_err(|e| database_error("get entity bundler accounts series", e))?;
                resp.bundler_revenue_chart = client
                    .get_entity_bundler_revenue_series(chain, granularity, &entity)
                    .await
                    .map_err(|e| database_error("get entity bundler revenue series", e))?;
            }

            if roles.paymaster_exists {
                resp.paymaster_userops_chart = client
                    .get_entity_paymaster_userops_series(chain, granularity, &entity)
                    .await
                    .map_err(|e| database_error("get entity paymaster userops series", e))?;
                resp.paymaster_spend_chart = client
                    .get_entity_paymaster_spend_series(chain, granularity, &entity)
                    .await
                    .map_err(|e| database_error("get entity paymaster spend series", e))?;
                resp.paymaster_accounts_chart = client
                    .get_entity_paymaster_accounts_series(chain, granularity, &entity)
                    .await
                    .map_err(|e| database_error("get entity paymaster accounts series", e))?;
            }

            Ok(resp)
        })
        .await
}
