//! Read-only warehouse client.
//!
//! One method per query the API serves. Table names and truncation
//! expressions come from constants and enums; the only free-form request
//! value (`entity`) is bound, never interpolated.

use clickhouse::{Client, Row};
use derive_more::Debug;
use eyre::Result;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, error};
use url::Url;

use crate::{
    granularity::{Chain, Granularity},
    models::{
        ActivityRow, AppLeaderboardRow, BundlerLeaderboardRow, DateAmountRow, DateCategoryCountRow,
        DateChainAmountRow, DateChainCountRow, DateCountRow, DateNameAmountRow, DateNameCountRow,
        DateShareRow, Eip7702SummaryRow, EntityRolesRow, FactoryLeaderboardRow,
        PaymasterLeaderboardRow, SummaryStatsRow,
    },
};

/// ERC-4337 user operations, one row per op.
const USEROPS: &str = "erc4337_userops";
/// Entry point transactions, one row per bundle landed on-chain.
const ENTRYPOINT_TXNS: &str = "erc4337_entrypoint_transactions";
/// Smart account deployments.
const DEPLOYMENTS: &str = "erc4337_account_deployments";
/// Pre-materialized daily paymaster spend per chain.
const PAYMASTER_SPEND_DAILY: &str = "erc4337_paymaster_spend_daily";
/// Pre-materialized daily bundler revenue per chain.
const BUNDLER_REVENUE_DAILY: &str = "erc4337_bundler_revenue_daily";
/// Contract address to app name labels.
const APP_LABELS: &str = "erc4337_app_labels";
/// Known bundler names.
const BUNDLER_LABELS: &str = "erc4337_bundler_labels";
/// Known paymaster names.
const PAYMASTER_LABELS: &str = "erc4337_paymaster_labels";
/// EIP-7702 authorization tuples.
const EIP7702_AUTHORIZATIONS: &str = "eip7702_authorizations";
/// EIP-7702 set-code transactions.
const EIP7702_SET_CODE_TXNS: &str = "eip7702_set_code_transactions";
/// Pre-materialized daily authority state (live delegations).
const EIP7702_AUTHORITY_STATE_DAILY: &str = "eip7702_authority_state_daily";
/// Pre-materialized EIP-7702 totals.
const EIP7702_SUMMARY: &str = "eip7702_summary";

/// Zero address; userops with this paymaster are unsponsored.
const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
/// Gas cost rows above this are treated as data errors, matching the
/// warehouse models upstream.
const MAX_SANE_GAS_COST_USD: u64 = 1_000_000_000;
/// Trailing window for dated chart series.
const CHART_WINDOW_MONTHS: u32 = 24;
/// Trailing window for app chart series.
const APP_CHART_WINDOW_MONTHS: u32 = 6;

/// `ClickHouse` reader client (read-only operations).
#[derive(Clone, Debug)]
pub struct ClickhouseReader {
    /// Base client
    #[debug(skip)]
    base: Client,
    /// Database name
    db_name: String,
}

impl ClickhouseReader {
    /// Create a new `ClickHouse` reader client.
    pub fn new(url: Url, db_name: String, username: String, password: String) -> Result<Self> {
        let client = Client::default()
            .with_url(url)
            .with_database(db_name.clone())
            .with_user(username)
            .with_password(password);

        Ok(Self { base: client, db_name })
    }

    async fn execute<R>(&self, query: &str) -> Result<Vec<R>>
    where
        R: Row + for<'b> Deserialize<'b>,
    {
        let client = self.base.clone();
        let start = Instant::now();

        let result = client.query(query).fetch_all::<R>().await;

        let duration_ms = start.elapsed().as_millis();
        match &result {
            Ok(rows) => {
                debug!(query = %query, duration_ms, rows = rows.len(), "ClickHouse query executed")
            }
            Err(e) => error!(query = %query, duration_ms, error = %e, "ClickHouse query failed"),
        }
        result.map_err(Into::into)
    }

    async fn execute_bound<R>(&self, query: &str, bind: &str) -> Result<Vec<R>>
    where
        R: Row + for<'b> Deserialize<'b>,
    {
        let client = self.base.clone();
        let start = Instant::now();

        let result = client.query(query).bind(bind).fetch_all::<R>().await;

        let duration_ms = start.elapsed().as_millis();
        match &result {
            Ok(rows) => {
                debug!(query = %query, duration_ms, rows = rows.len(), "ClickHouse query executed")
            }
            Err(e) => error!(query = %query, duration_ms, error = %e, "ClickHouse query failed"),
        }
        result.map_err(Into::into)
    }

    /// `date` select expression: period start of `col` as `YYYY-MM-DD`.
    fn date_expr(granularity: Granularity, col: &str) -> String {
        format!("toString(toDate({}))", granularity.trunc_expr(col))
    }

    /// Lower time bound for chart queries: `months` months back from the
    /// start of the current period.
    fn chart_window(granularity: Granularity, months: u32) -> String {
        format!("{} - INTERVAL {months} MONTH", granularity.trunc_expr("now()"))
    }

    /// Headline totals for `/overview`.
    pub async fn get_summary_stats(&self, chain: Chain) -> Result<SummaryStatsRow> {
        let db = &self.db_name;
        let filter = chain.where_filter();
        let spend_filter = chain.and_filter();
        let query = format!(
            "SELECT \
                (SELECT count() FROM {db}.{DEPLOYMENTS}{filter}) AS num_deployments, \
                (SELECT count() FROM {db}.{USEROPS}{filter}) AS num_userops, \
                (SELECT count() FROM {db}.{ENTRYPOINT_TXNS}{filter}) AS num_txns, \
                (SELECT round(sum(actual_gas_cost_usd)) FROM {db}.{USEROPS} \
                    WHERE paymaster != '{ZERO_ADDRESS}' \
                    AND isFinite(actual_gas_cost_usd) \
                    AND actual_gas_cost_usd < {MAX_SANE_GAS_COST_USD}{spend_filter} \
                ) AS gas_spent_usd"
        );
        let mut rows = self.execute::<SummaryStatsRow>(&query).await?;
        rows.pop().ok_or_else(|| eyre::eyre!("summary stats query returned no rows"))
    }

    /// Active accounts per period and chain.
    pub async fn get_active_accounts_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateChainCountRow>> {
        let query = format!(
            "SELECT {date} AS date, chain, uniqExact(sender) AS count \
             FROM {db}.{USEROPS} \
             WHERE block_time > {window}{chain_filter} \
             GROUP BY date, chain \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// User operations per period and chain.
    pub async fn get_userops_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateChainCountRow>> {
        let query = format!(
            "SELECT {date} AS date, chain, count() AS count \
             FROM {db}.{USEROPS} \
             WHERE block_time > {window}{chain_filter} \
             GROUP BY date, chain \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Paymaster gas spend per period and chain, from the daily rollup.
    pub async fn get_paymaster_spend_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateChainAmountRow>> {
        let query = format!(
            "SELECT {date} AS date, chain, sum(gas_spent_usd) AS amount_usd \
             FROM {db}.{PAYMASTER_SPEND_DAILY} \
             WHERE day > {window}{chain_filter} \
             GROUP BY date, chain \
             ORDER BY date",
            date = Self::date_expr(granularity, "day"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Bundler revenue per period and chain, from the daily rollup.
    pub async fn get_bundler_revenue_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateChainAmountRow>> {
        let query = format!(
            "SELECT {date} AS date, chain, sum(revenue_usd) AS amount_usd \
             FROM {db}.{BUNDLER_REVENUE_DAILY} \
             WHERE day > {window}{chain_filter} \
             GROUP BY date, chain \
             ORDER BY date",
            date = Self::date_expr(granularity, "day"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Distinct (sender, period) activity pairs feeding the retention
    /// calculator. Bounded to `lookback + 1` periods so the cohort window
    /// plus the current period is covered without pulling full history.
    pub async fn get_sender_activity(
        &self,
        chain: Chain,
        granularity: Granularity,
        lookback: u32,
    ) -> Result<Vec<ActivityRow>> {
        let query = format!(
            "SELECT sender, toUInt32(toUnixTimestamp({trunc})) AS period_ts \
             FROM {db}.{USEROPS} \
             WHERE block_time > {now_trunc} - INTERVAL {periods} {unit}{chain_filter} \
             GROUP BY sender, period_ts \
             ORDER BY sender, period_ts",
            trunc = granularity.trunc_expr("block_time"),
            db = self.db_name,
            now_trunc = granularity.trunc_expr("now()"),
            periods = lookback + 1,
            unit = granularity.interval_unit(),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Accounts bucketed by ops submitted per period.
    pub async fn get_accounts_by_category(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateCategoryCountRow>> {
        let query = format!(
            "SELECT date, category, count() AS num_accounts FROM ( \
                SELECT {date} AS date, sender, \
                    multiIf(count() = 1, '01 UserOp', \
                            count() <= 10, '02-10 UserOps', \
                            'More than 10 UserOps') AS category \
                FROM {db}.{USEROPS} \
                WHERE block_time > {window}{chain_filter} \
                GROUP BY date, sender \
             ) \
             GROUP BY date, category \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// All-time bundler leaderboard.
    pub async fn get_bundler_leaderboard(
        &self,
        chain: Chain,
    ) -> Result<Vec<BundlerLeaderboardRow>> {
        let db = &self.db_name;
        let query = format!(
            "SELECT t.name AS name, u.num_userops AS num_userops, \
                    t.num_txns AS num_txns, t.revenue_usd AS revenue_usd \
             FROM ( \
                SELECT bundler_name AS name, count() AS num_txns, \
                       sum(bundler_revenue_usd) AS revenue_usd \
                FROM {db}.{ENTRYPOINT_TXNS} \
                WHERE isFinite(bundler_revenue_usd) \
                AND bundler_revenue_usd < {MAX_SANE_GAS_COST_USD}{chain_filter} \
                GROUP BY name \
             ) t \
             INNER JOIN ( \
                SELECT bundler_name AS name, count() AS num_userops \
                FROM {db}.{USEROPS}{where_filter} \
                GROUP BY name \
             ) u ON u.name = t.name \
             ORDER BY num_userops DESC",
            chain_filter = chain.and_filter(),
            where_filter = chain.where_filter(),
        );
        self.execute(&query).await
    }

    /// User operations per period and bundler.
    pub async fn get_bundler_userops_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        self.name_count_series(USEROPS, "bundler_name", chain, granularity).await
    }

    /// Distinct accounts per period and bundler.
    pub async fn get_bundler_accounts_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        let query = format!(
            "SELECT {date} AS date, bundler_name AS name, uniqExact(sender) AS count \
             FROM {db}.{USEROPS} \
             WHERE block_time > {window}{chain_filter} \
             GROUP BY date, name \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Bundler revenue per period and bundler.
    pub async fn get_bundler_revenue_by_name_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameAmountRow>> {
        let query = format!(
            "SELECT {date} AS date, bundler_name AS name, \
                    sum(bundler_revenue_usd) AS amount_usd \
             FROM {db}.{ENTRYPOINT_TXNS} \
             WHERE isFinite(bundler_revenue_usd) \
             AND bundler_revenue_usd < {MAX_SANE_GAS_COST_USD} \
             AND block_time > {window}{chain_filter} \
             GROUP BY date, name \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Share of entry point transactions bundling more than one userop.
    pub async fn get_multi_userop_share_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateShareRow>> {
        let query = format!(
            "SELECT {date} AS date, \
                    round(100 * countIf(num_userops > 1) / count(), 2) AS pct \
             FROM {db}.{ENTRYPOINT_TXNS} \
             WHERE block_time > {window}{chain_filter} \
             GROUP BY date \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// All-time paymaster leaderboard.
    pub async fn get_paymaster_leaderboard(
        &self,
        chain: Chain,
    ) -> Result<Vec<PaymasterLeaderboardRow>> {
        let query = format!(
            "SELECT paymaster_name AS name, count() AS num_userops, \
                    sum(actual_gas_cost_usd) AS gas_spent_usd \
             FROM {db}.{USEROPS} \
             WHERE paymaster != '{ZERO_ADDRESS}' \
             AND isFinite(actual_gas_cost_usd) \
             AND actual_gas_cost_usd < {MAX_SANE_GAS_COST_USD}{chain_filter} \
             GROUP BY name \
             ORDER BY num_userops DESC",
            db = self.db_name,
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Sponsored userops per period and paymaster.
    pub async fn get_paymaster_userops_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        let query = format!(
            "SELECT {date} AS date, paymaster_name AS name, count() AS count \
             FROM {db}.{USEROPS} \
             WHERE paymaster != '{ZERO_ADDRESS}' \
             AND block_time > {window}{chain_filter} \
             GROUP BY date, name \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Paymaster gas spend per period and paymaster.
    pub async fn get_paymaster_spend_by_name_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameAmountRow>> {
        let query = format!(
            "SELECT {date} AS date, paymaster_name AS name, \
                    sum(actual_gas_cost_usd) AS amount_usd \
             FROM {db}.{USEROPS} \
             WHERE paymaster != '{ZERO_ADDRESS}' \
             AND isFinite(actual_gas_cost_usd) \
             AND actual_gas_cost_usd < {MAX_SANE_GAS_COST_USD} \
             AND block_time > {window}{chain_filter} \
             GROUP BY date, name \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Distinct sponsored accounts per period and paymaster.
    pub async fn get_paymaster_accounts_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        let query = format!(
            "SELECT {date} AS date, paymaster_name AS name, uniqExact(sender) AS count \
             FROM {db}.{USEROPS} \
             WHERE paymaster != '{ZERO_ADDRESS}' \
             AND block_time > {window}{chain_filter} \
             GROUP BY date, name \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Paymaster gas spend per period and paymaster type.
    pub async fn get_paymaster_spend_by_type_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameAmountRow>> {
        let query = format!(
            "SELECT {date} AS date, paymaster_type AS name, \
                    sum(actual_gas_cost_usd) AS amount_usd \
             FROM {db}.{USEROPS} \
             WHERE paymaster != '{ZERO_ADDRESS}' \
             AND isFinite(actual_gas_cost_usd) \
             AND actual_gas_cost_usd < {MAX_SANE_GAS_COST_USD} \
             AND block_time > {window}{chain_filter} \
             GROUP BY date, name \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Sponsored userops per period and paymaster type.
    pub async fn get_paymaster_userops_by_type_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        let query = format!(
            "SELECT {date} AS date, paymaster_type AS name, count() AS count \
             FROM {db}.{USEROPS} \
             WHERE paymaster != '{ZERO_ADDRESS}' \
             AND block_time > {window}{chain_filter} \
             GROUP BY date, name \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// All-time account factory leaderboard.
    pub async fn get_factory_leaderboard(
        &self,
        chain: Chain,
    ) -> Result<Vec<FactoryLeaderboardRow>> {
        let query = format!(
            "SELECT factory_name AS name, count() AS num_accounts \
             FROM {db}.{DEPLOYMENTS}{where_filter} \
             GROUP BY name \
             ORDER BY num_accounts DESC",
            db = self.db_name,
            where_filter = chain.where_filter(),
        );
        self.execute(&query).await
    }

    /// Account deployments per period and factory.
    pub async fn get_factory_deployments_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        self.name_count_series(DEPLOYMENTS, "factory_name", chain, granularity).await
    }

    /// Distinct active accounts per period and the factory that deployed them.
    pub async fn get_factory_accounts_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        let query = format!(
            "SELECT {date} AS date, d.factory_name AS name, uniqExact(u.sender) AS count \
             FROM {db}.{USEROPS} u \
             INNER JOIN {db}.{DEPLOYMENTS} d ON d.account = u.sender \
             WHERE u.block_time > {window}{chain_filter} \
             GROUP BY date, name \
             ORDER BY date",
            date = Self::date_expr(granularity, "u.block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter_aliased("u"),
        );
        self.execute(&query).await
    }

    /// Top-5-plus-other distinct senders per period and app.
    pub async fn get_app_usage_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        self.app_series(chain, granularity, "uniqExact(u.sender)", false).await
    }

    /// Top-5-plus-other userops per period and app.
    pub async fn get_app_ops_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        self.app_series(chain, granularity, "count()", false).await
    }

    /// Top-5-plus-other sponsored userops per period and app.
    pub async fn get_app_paymaster_ops_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        self.app_series(chain, granularity, "count()", true).await
    }

    /// All-time app leaderboard, top ten by distinct senders.
    pub async fn get_app_leaderboard(&self, chain: Chain) -> Result<Vec<AppLeaderboardRow>> {
        let query = format!(
            "SELECT coalesce(l.name, u.called_contract) AS project, \
                    uniqExact(u.sender) AS num_unique_senders, \
                    count() AS num_ops \
             FROM {db}.{USEROPS} u \
             LEFT JOIN {db}.{APP_LABELS} l ON u.called_contract = l.address \
             {where_filter} \
             GROUP BY project \
             ORDER BY num_unique_senders DESC \
             LIMIT 10",
            db = self.db_name,
            where_filter = chain.where_filter_aliased("u"),
        );
        self.execute(&query).await
    }

    /// Which label sets know `entity`. The name is bound, not interpolated.
    pub async fn get_entity_roles(&self, entity: &str) -> Result<EntityRolesRow> {
        let query = format!(
            "SELECT \
                (SELECT count() FROM {db}.{BUNDLER_LABELS} WHERE name = ?) > 0 \
                    AS bundler_exists, \
                (SELECT count() FROM {db}.{PAYMASTER_LABELS} WHERE name = ?) > 0 \
                    AS paymaster_exists",
            db = self.db_name,
        );
        let mut rows = self
            .base
            .query(&query)
            .bind(entity)
            .bind(entity)
            .fetch_all::<EntityRolesRow>()
            .await?;
        rows.pop().ok_or_else(|| eyre::eyre!("entity roles query returned no rows"))
    }

    /// Userops bundled per period by the named bundler.
    pub async fn get_entity_bundler_userops_series(
        &self,
        chain: Chain,
        granularity: Granularity,
        entity: &str,
    ) -> Result<Vec<DateCountRow>> {
        let query = format!(
            "SELECT {date} AS date, count() AS count \
             FROM {db}.{USEROPS} \
             WHERE bundler_name = ?{chain_filter} \
             GROUP BY date \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            chain_filter = chain.and_filter(),
        );
        self.execute_bound(&query, entity).await
    }

    /// Distinct accounts served per period by the named bundler.
    pub async fn get_entity_bundler_accounts_series(
        &self,
        chain: Chain,
        granularity: Granularity,
        entity: &str,
    ) -> Result<Vec<DateCountRow>> {
        let query = format!(
            "SELECT {date} AS date, uniqExact(sender) AS count \
             FROM {db}.{USEROPS} \
             WHERE bundler_name = ?{chain_filter} \
             GROUP BY date \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            chain_filter = chain.and_filter(),
        );
        self.execute_bound(&query, entity).await
    }

    /// Revenue per period for the named bundler.
    pub async fn get_entity_bundler_revenue_series(
        &self,
        chain: Chain,
        granularity: Granularity,
        entity: &str,
    ) -> Result<Vec<DateAmountRow>> {
        let query = format!(
            "SELECT {date} AS date, sum(bundler_revenue_usd) AS amount_usd \
             FROM {db}.{ENTRYPOINT_TXNS} \
             WHERE bundler_name = ? \
             AND isFinite(bundler_revenue_usd) \
             AND bundler_revenue_usd < {MAX_SANE_GAS_COST_USD}{chain_filter} \
             GROUP BY date \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            chain_filter = chain.and_filter(),
        );
        self.execute_bound(&query, entity).await
    }

    /// Userops sponsored per period by the named paymaster.
    pub async fn get_entity_paymaster_userops_series(
        &self,
        chain: Chain,
        granularity: Granularity,
        entity: &str,
    ) -> Result<Vec<DateCountRow>> {
        let query = format!(
            "SELECT {date} AS date, count() AS count \
             FROM {db}.{USEROPS} \
             WHERE paymaster_name = ?{chain_filter} \
             GROUP BY date \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            chain_filter = chain.and_filter(),
        );
        self.execute_bound(&query, entity).await
    }

    /// Gas spend per period for the named paymaster.
    pub async fn get_entity_paymaster_spend_series(
        &self,
        chain: Chain,
        granularity: Granularity,
        entity: &str,
    ) -> Result<Vec<DateAmountRow>> {
        let query = format!(
            "SELECT {date} AS date, sum(actual_gas_cost_usd) AS amount_usd \
             FROM {db}.{USEROPS} \
             WHERE paymaster_name = ? \
             AND isFinite(actual_gas_cost_usd) \
             AND actual_gas_cost_usd < {MAX_SANE_GAS_COST_USD}{chain_filter} \
             GROUP BY date \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            chain_filter = chain.and_filter(),
        );
        self.execute_bound(&query, entity).await
    }

    /// Distinct accounts sponsored per period by the named paymaster.
    pub async fn get_entity_paymaster_accounts_series(
        &self,
        chain: Chain,
        granularity: Granularity,
        entity: &str,
    ) -> Result<Vec<DateCountRow>> {
        let query = format!(
            "SELECT {date} AS date, uniqExact(sender) AS count \
             FROM {db}.{USEROPS} \
             WHERE paymaster_name = ?{chain_filter} \
             GROUP BY date \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            chain_filter = chain.and_filter(),
        );
        self.execute_bound(&query, entity).await
    }

    /// Headline totals for `/eip7702-overview`, from the summary rollup.
    pub async fn get_eip7702_summary(&self) -> Result<Eip7702SummaryRow> {
        let query = format!(
            "SELECT live_smart_wallets, num_authorizations, num_set_code_txns \
             FROM {db}.{EIP7702_SUMMARY} \
             ORDER BY updated_at DESC \
             LIMIT 1",
            db = self.db_name,
        );
        let mut rows = self.execute::<Eip7702SummaryRow>(&query).await?;
        rows.pop().ok_or_else(|| eyre::eyre!("eip7702 summary query returned no rows"))
    }

    /// EIP-7702 authorizations per period and chain.
    pub async fn get_eip7702_authorizations_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateChainCountRow>> {
        let query = format!(
            "SELECT {date} AS date, chain, count() AS count \
             FROM {db}.{EIP7702_AUTHORIZATIONS} \
             WHERE block_time > {window}{chain_filter} \
             GROUP BY date, chain \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// EIP-7702 set-code transactions per period and chain.
    pub async fn get_eip7702_set_code_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateChainCountRow>> {
        let query = format!(
            "SELECT {date} AS date, chain, count() AS count \
             FROM {db}.{EIP7702_SET_CODE_TXNS} \
             WHERE block_time > {window}{chain_filter} \
             GROUP BY date, chain \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Live delegated wallets per period, from the daily authority state.
    pub async fn get_eip7702_live_wallets_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateCountRow>> {
        let query = format!(
            "SELECT {date} AS date, sum(live_wallets) AS count \
             FROM {db}.{EIP7702_AUTHORITY_STATE_DAILY} \
             WHERE day > {window}{chain_filter} \
             GROUP BY date \
             ORDER BY date",
            date = Self::date_expr(granularity, "day"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Contracts holding at least one live delegation per period.
    pub async fn get_eip7702_live_authorized_contracts_series(
        &self,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateCountRow>> {
        let query = format!(
            "SELECT {date} AS date, sum(live_authorized_contracts) AS count \
             FROM {db}.{EIP7702_AUTHORITY_STATE_DAILY} \
             WHERE day > {window}{chain_filter} \
             GROUP BY date \
             ORDER BY date",
            date = Self::date_expr(granularity, "day"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Shared shape for `date, label, count()` chart queries.
    async fn name_count_series(
        &self,
        table: &str,
        name_col: &str,
        chain: Chain,
        granularity: Granularity,
    ) -> Result<Vec<DateNameCountRow>> {
        let query = format!(
            "SELECT {date} AS date, {name_col} AS name, count() AS count \
             FROM {db}.{table} \
             WHERE block_time > {window}{chain_filter} \
             GROUP BY date, name \
             ORDER BY date",
            date = Self::date_expr(granularity, "block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter(),
        );
        self.execute(&query).await
    }

    /// Shared shape for the app charts: rank labeled apps per period by the
    /// given aggregate, keep the top five and fold the rest into `Other`.
    async fn app_series(
        &self,
        chain: Chain,
        granularity: Granularity,
        aggregate: &str,
        sponsored_only: bool,
    ) -> Result<Vec<DateNameCountRow>> {
        let sponsored = if sponsored_only {
            format!(" AND u.paymaster != '{ZERO_ADDRESS}'")
        } else {
            String::new()
        };
        let query = format!(
            "SELECT date, name, sum(value) AS count FROM ( \
                SELECT date, \
                    if(rn <= 5, project, 'Other') AS name, \
                    value \
                FROM ( \
                    SELECT {date} AS date, \
                        coalesce(l.name, u.called_contract) AS project, \
                        {aggregate} AS value, \
                        row_number() OVER ( \
                            PARTITION BY date ORDER BY value DESC \
                        ) AS rn \
                    FROM {db}.{USEROPS} u \
                    LEFT JOIN {db}.{APP_LABELS} l ON u.called_contract = l.address \
                    WHERE u.block_time > {window}{sponsored}{chain_filter} \
                    GROUP BY date, project \
                ) \
             ) \
             GROUP BY date, name \
             ORDER BY date DESC, count DESC",
            date = Self::date_expr(granularity, "u.block_time"),
            db = self.db_name,
            window = Self::chart_window(granularity, APP_CHART_WINDOW_MONTHS),
            chain_filter = chain.and_filter_aliased("u"),
        );
        self.execute(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clickhouse::test::{Mock, handlers};

    fn reader(mock: &Mock) -> ClickhouseReader {
        let url = Url::parse(mock.url()).unwrap();
        ClickhouseReader::new(url, "db".to_owned(), "user".into(), "pass".into()).unwrap()
    }

    #[tokio::test]
    async fn summary_stats_returns_single_row() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![SummaryStatsRow {
            num_deployments: 5,
            num_userops: 10,
            num_txns: 8,
            gas_spent_usd: 1.5,
        }]));

        let stats = reader(&mock).get_summary_stats(Chain::All).await.unwrap();
        assert_eq!(stats.num_deployments, 5);
        assert_eq!(stats.num_userops, 10);
        assert_eq!(stats.gas_spent_usd, 1.5);
    }

    #[tokio::test]
    async fn summary_stats_errors_on_empty_result() {
        let mock = Mock::new();
        mock.add(handlers::provide(Vec::<SummaryStatsRow>::new()));
        assert!(reader(&mock).get_summary_stats(Chain::All).await.is_err());
    }

    #[tokio::test]
    async fn sender_activity_returns_expected_rows() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![
            ActivityRow { sender: "0xaa".to_owned(), period_ts: 1_704_067_200 },
            ActivityRow { sender: "0xaa".to_owned(), period_ts: 1_704_672_000 },
        ]));

        let rows =
            reader(&mock).get_sender_activity(Chain::Base, Granularity::Week, 12).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sender, "0xaa");
    }

    #[tokio::test]
    async fn entity_roles_decode_booleans() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![EntityRolesRow {
            bundler_exists: true,
            paymaster_exists: false,
        }]));

        let roles = reader(&mock).get_entity_roles("pimlico").await.unwrap();
        assert!(roles.bundler_exists);
        assert!(!roles.paymaster_exists);
    }

    #[tokio::test]
    async fn eip7702_summary_errors_on_empty_rollup() {
        let mock = Mock::new();
        mock.add(handlers::provide(Vec::<Eip7702SummaryRow>::new()));
        assert!(reader(&mock).get_eip7702_summary().await.is_err());
    }

    #[tokio::test]
    async fn series_rows_round_trip_through_mock() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![DateChainCountRow {
            date: "2024-01-01".to_owned(),
            chain: "base".to_owned(),
            count: 3,
        }]));

        let rows = reader(&mock)
            .get_active_accounts_series(Chain::Base, Granularity::Month)
            .await
            .unwrap();
        assert_eq!(
            rows,
            vec![DateChainCountRow {
                date: "2024-01-01".to_owned(),
                chain: "base".to_owned(),
                count: 3,
            }]
        );
    }
}
