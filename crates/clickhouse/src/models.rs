//! Row types returned by the reader.
//!
//! Dates are selected as `YYYY-MM-DD` strings so rows serialize straight into
//! chart payloads without another conversion pass.

use clickhouse::Row;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Headline counters for the `/overview` endpoint.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct SummaryStatsRow {
    /// Total smart-account deployments
    pub num_deployments: u64,
    /// Total user operations
    pub num_userops: u64,
    /// Total entry point transactions
    pub num_txns: u64,
    /// Total sponsored gas, USD
    pub gas_spent_usd: f64,
}

/// Per-chain dated count, e.g. active accounts per period.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct DateChainCountRow {
    /// Period start, `YYYY-MM-DD`
    pub date: String,
    /// Chain name
    pub chain: String,
    /// Count for the period
    pub count: u64,
}

/// Per-chain dated USD amount.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DateChainAmountRow {
    /// Period start, `YYYY-MM-DD`
    pub date: String,
    /// Chain name
    pub chain: String,
    /// Amount for the period, USD
    pub amount_usd: f64,
}

/// Dated count keyed by a label (bundler, paymaster, factory or app name).
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct DateNameCountRow {
    /// Period start, `YYYY-MM-DD`
    pub date: String,
    /// Label the count is attributed to
    pub name: String,
    /// Count for the period
    pub count: u64,
}

/// Dated USD amount keyed by a label.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DateNameAmountRow {
    /// Period start, `YYYY-MM-DD`
    pub date: String,
    /// Label the amount is attributed to
    pub name: String,
    /// Amount for the period, USD
    pub amount_usd: f64,
}

/// Dated count for single-series charts.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct DateCountRow {
    /// Period start, `YYYY-MM-DD`
    pub date: String,
    /// Count for the period
    pub count: u64,
}

/// Dated USD amount for single-series charts.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DateAmountRow {
    /// Period start, `YYYY-MM-DD`
    pub date: String,
    /// Amount for the period, USD
    pub amount_usd: f64,
}

/// Dated percentage, e.g. share of bundles carrying more than one userop.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct DateShareRow {
    /// Period start, `YYYY-MM-DD`
    pub date: String,
    /// Percentage in `[0, 100]`
    pub pct: f64,
}

/// Accounts bucketed by how many userops they submitted in a period.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct DateCategoryCountRow {
    /// Period start, `YYYY-MM-DD`
    pub date: String,
    /// Usage bucket label
    pub category: String,
    /// Accounts in the bucket
    pub num_accounts: u64,
}

/// All-time bundler leaderboard entry.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BundlerLeaderboardRow {
    /// Bundler name
    pub name: String,
    /// User operations bundled
    pub num_userops: u64,
    /// Entry point transactions landed
    pub num_txns: u64,
    /// Revenue, USD
    pub revenue_usd: f64,
}

/// All-time paymaster leaderboard entry.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct PaymasterLeaderboardRow {
    /// Paymaster name
    pub name: String,
    /// User operations sponsored
    pub num_userops: u64,
    /// Gas sponsored, USD
    pub gas_spent_usd: f64,
}

/// All-time account factory leaderboard entry.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct FactoryLeaderboardRow {
    /// Factory name
    pub name: String,
    /// Accounts deployed
    pub num_accounts: u64,
}

/// All-time app leaderboard entry.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct AppLeaderboardRow {
    /// App name, or the called contract address when unlabeled
    pub project: String,
    /// Distinct senders that interacted with the app
    pub num_unique_senders: u64,
    /// User operations targeting the app
    pub num_ops: u64,
}

/// Which roles a named entity is known under.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct EntityRolesRow {
    /// Present in the bundler label set
    pub bundler_exists: bool,
    /// Present in the paymaster label set
    pub paymaster_exists: bool,
}

/// Headline counters for the `/eip7702-overview` endpoint.
#[derive(Debug, Row, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct Eip7702SummaryRow {
    /// Wallets currently delegated to some contract
    pub live_smart_wallets: u64,
    /// Total authorization tuples observed
    pub num_authorizations: u64,
    /// Total set-code transactions observed
    pub num_set_code_txns: u64,
}

/// One observed (subject, period) activity pair feeding the retention
/// calculator. `period_ts` is the Unix timestamp of the period start the
/// activity was truncated to.
#[derive(Debug, Clone, Row, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub struct ActivityRow {
    /// Smart account address
    pub sender: String,
    /// Unix timestamp of the truncated activity period
    pub period_ts: u32,
}
