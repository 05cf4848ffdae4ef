//! Data types for the Bundlescope API.
//!
//! These structs define the JSON responses returned by the API server. They
//! are provided in a separate crate so that consumers such as the dashboard can
//! depend on them without pulling in the rest of the server implementation.

#![allow(missing_docs)]

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use clickhouse_lib::{
    AppLeaderboardRow, BundlerLeaderboardRow, DateAmountRow, DateCategoryCountRow,
    DateChainAmountRow, DateChainCountRow, DateCountRow, DateNameAmountRow, DateNameCountRow,
    DateShareRow, FactoryLeaderboardRow, PaymasterLeaderboardRow,
};
use serde::Serialize;
use utoipa::ToSchema;

/// Problem-details style error body returned by every endpoint on failure.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error identifier, e.g. `invalid-params`
    pub r#type: String,
    /// Short human-readable summary
    pub title: String,
    /// HTTP status code
    pub status: u16,
    /// Detailed description of this occurrence
    pub detail: String,
}

impl ErrorResponse {
    /// Create a new [`ErrorResponse`].
    pub fn new(
        r#type: impl Into<String>,
        title: impl Into<String>,
        status: StatusCode,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            r#type: r#type.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
        }
    }

    /// Generic 500 response for failed warehouse queries. The underlying
    /// error is logged server-side and never leaked to the client.
    pub fn database_error() -> Self {
        Self::new(
            "database-error",
            "Database error",
            StatusCode::INTERNAL_SERVER_ERROR,
            "The query could not be completed",
        )
    }

    /// 400 response for a caller contract violation.
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new("invalid-params", "Bad Request", StatusCode::BAD_REQUEST, detail)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut resp = Json(self).into_response();
        *resp.status_mut() = status;
        resp
    }
}

/// Body of the `/health` endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// One cell of the cohort retention matrix.
///
/// `period_offset == 0` always has `active_subjects == cohort_size`: every
/// subject is active in its own cohort period by construction.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RetentionCell {
    /// Start of the cohort's first-active period, `YYYY-MM-DD`
    #[schema(value_type = String, format = Date)]
    pub cohort_period: NaiveDate,
    /// Number of distinct subjects assigned to this cohort
    pub cohort_size: u64,
    /// Whole periods elapsed since the cohort period
    pub period_offset: u32,
    /// Distinct cohort members active at this offset
    pub active_subjects: u64,
    /// `active_subjects / cohort_size * 100`, rounded to 2 decimals
    pub percentage: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OverviewResponse {
    pub deployments: u64,
    pub userops: u64,
    pub transactions: u64,
    pub paymaster_spend_usd: f64,
    pub monthly_active_accounts: Vec<DateChainCountRow>,
    pub monthly_userops: Vec<DateChainCountRow>,
    pub monthly_paymaster_spend: Vec<DateChainAmountRow>,
    pub monthly_bundler_revenue: Vec<DateChainAmountRow>,
    pub retention: Vec<RetentionCell>,
    pub accounts_by_category: Vec<DateCategoryCountRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BundlerResponse {
    pub leaderboard: Vec<BundlerLeaderboardRow>,
    pub userops_chart: Vec<DateNameCountRow>,
    pub revenue_chart: Vec<DateNameAmountRow>,
    pub multi_userop_chart: Vec<DateShareRow>,
    pub accounts_chart: Vec<DateNameCountRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymasterResponse {
    pub leaderboard: Vec<PaymasterLeaderboardRow>,
    pub userops_chart: Vec<DateNameCountRow>,
    pub spend_chart: Vec<DateNameAmountRow>,
    pub accounts_chart: Vec<DateNameCountRow>,
    pub spend_type_chart: Vec<DateNameAmountRow>,
    pub userops_type_chart: Vec<DateNameCountRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountDeployerResponse {
    pub leaderboard: Vec<FactoryLeaderboardRow>,
    pub deployments_chart: Vec<DateNameCountRow>,
    pub accounts_chart: Vec<DateNameCountRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppsResponse {
    pub usage_chart: Vec<DateNameCountRow>,
    pub leaderboard: Vec<AppLeaderboardRow>,
    pub ops_chart: Vec<DateNameCountRow>,
    pub ops_paymaster_chart: Vec<DateNameCountRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EntityResponse {
    pub bundler_exists: bool,
    pub bundler_userops_chart: Vec<DateCountRow>,
    pub bundler_accounts_chart: Vec<DateCountRow>,
    pub bundler_revenue_chart: Vec<DateAmountRow>,
    pub paymaster_exists: bool,
    pub paymaster_userops_chart: Vec<DateCountRow>,
    pub paymaster_spend_chart: Vec<DateAmountRow>,
    pub paymaster_accounts_chart: Vec<DateCountRow>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Eip7702OverviewResponse {
    pub live_smart_wallets: u64,
    pub authorizations: u64,
    pub set_code_txns: u64,
    pub authorizations_chart: Vec<DateChainCountRow>,
    pub set_code_chart: Vec<DateChainCountRow>,
    pub live_smart_wallets_chart: Vec<DateCountRow>,
    pub live_authorized_contracts_chart: Vec<DateCountRow>,
}
