//! Thin HTTP API for accessing `ClickHouse` data

pub mod helpers;
pub mod routes;
pub mod state;
pub mod validation;

pub use routes::router;
pub use state::{
    ApiState, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL, DEFAULT_MAX_REQUESTS,
    DEFAULT_RATE_PERIOD,
};

use utoipa::OpenApi;

/// `OpenAPI` documentation structure
#[derive(Debug, OpenApi)]
#[openapi(
    paths(
        routes::overview::overview,
        routes::bundler::bundler,
        routes::paymaster::paymaster,
        routes::account_deployer::account_deployer,
        routes::apps::apps,
        routes::entity::entity,
        routes::eip7702::eip7702_overview
    ),
    components(
        schemas(
            validation::CommonQuery,
            validation::EntityQuery,
            api_types::OverviewResponse,
            api_types::BundlerResponse,
            api_types::PaymasterResponse,
            api_types::AccountDeployerResponse,
            api_types::AppsResponse,
            api_types::EntityResponse,
            api_types::Eip7702OverviewResponse,
            api_types::RetentionCell,
            api_types::HealthResponse,
            api_types::ErrorResponse,
            clickhouse_lib::SummaryStatsRow,
            clickhouse_lib::DateChainCountRow,
            clickhouse_lib::DateChainAmountRow,
            clickhouse_lib::DateNameCountRow,
            clickhouse_lib::DateNameAmountRow,
            clickhouse_lib::DateCountRow,
            clickhouse_lib::DateAmountRow,
            clickhouse_lib::DateShareRow,
            clickhouse_lib::DateCategoryCountRow,
            clickhouse_lib::BundlerLeaderboardRow,
            clickhouse_lib::PaymasterLeaderboardRow,
            clickhouse_lib::FactoryLeaderboardRow,
            clickhouse_lib::AppLeaderboardRow
        )
    ),
    tags(
        (name = "bundlescope", description = "Bundlescope API endpoints")
    ),
    info(
        title = "Bundlescope API",
        description = "API for accessing account abstraction adoption metrics",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::{self, Body},
        http::{Request, StatusCode},
    };
    use clickhouse::test::{Mock, handlers};
    use clickhouse_lib::{
        ActivityRow, ClickhouseReader, DateAmountRow, DateCategoryCountRow, DateChainAmountRow,
        DateChainCountRow, DateCountRow, DateNameAmountRow, DateNameCountRow, DateShareRow,
        Eip7702SummaryRow, EntityRolesRow, SummaryStatsRow,
    };
    use serde_json::{Value, json};
    use tower::util::ServiceExt;
    use url::Url;

    fn build_app(mock_url: &str) -> Router {
        let url = Url::parse(mock_url).unwrap();
        let client =
            ClickhouseReader::new(url, "test-db".to_owned(), "user".into(), "pass".into()).unwrap();
        let state = ApiState::new(client, DEFAULT_MAX_REQUESTS, DEFAULT_RATE_PERIOD);
        router(state)
    }

    async fn send_request(app: Router, uri: &str) -> Value {
        let response =
            app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        assert!(response.status().is_success());
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send_error_request(app: Router, uri: &str) -> (StatusCode, Value) {
        let response =
            app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn chain_count(date: &str, chain: &str, count: u64) -> DateChainCountRow {
        DateChainCountRow { date: date.to_owned(), chain: chain.to_owned(), count }
    }

    /// Queue the seven result sets `/overview` reads, in call order.
    fn mock_overview(mock: &Mock, activity: Vec<ActivityRow>) {
        mock.add(handlers::provide(vec![SummaryStatsRow {
            num_deployments: 100,
            num_userops: 2_000,
            num_txns: 1_500,
            gas_spent_usd: 42.5,
        }]));
        mock.add(handlers::provide(vec![chain_count("2024-01-01", "base", 7)]));
        mock.add(handlers::provide(vec![chain_count("2024-01-01", "base", 9)]));
        mock.add(handlers::provide(vec![DateChainAmountRow {
            date: "2024-01-01".to_owned(),
            chain: "base".to_owned(),
            amount_usd: 1.25,
        }]));
        mock.add(handlers::provide(Vec::<DateChainAmountRow>::new()));
        mock.add(handlers::provide(activity));
        mock.add(handlers::provide(vec![DateCategoryCountRow {
            date: "2024-01-01".to_owned(),
            category: "01 UserOp".to_owned(),
            num_accounts: 3,
        }]));
    }

    #[tokio::test]
    async fn overview_endpoint() {
        let mock = Mock::new();
        mock_overview(&mock, Vec::new());
        let app = build_app(mock.url());
        let body = send_request(app, "/overview").await;

        assert_eq!(body["deployments"], 100);
        assert_eq!(body["userops"], 2000);
        assert_eq!(body["transactions"], 1500);
        assert_eq!(body["paymaster_spend_usd"], 42.5);
        assert_eq!(
            body["monthly_active_accounts"],
            json!([{ "date": "2024-01-01", "chain": "base", "count": 7 }])
        );
        assert_eq!(body["monthly_bundler_revenue"], json!([]));
        assert_eq!(body["retention"], json!([]));
        assert_eq!(
            body["accounts_by_category"],
            json!([{ "date": "2024-01-01", "category": "01 UserOp", "num_accounts": 3 }])
        );
    }

    #[tokio::test]
    async fn overview_computes_retention_from_activity() {
        // Two senders form a cohort two weeks back; one returns a week
        // later. The current period never defines a cohort, so no cohort
        // exists for this week itself.
        let now = chrono::Utc::now().timestamp();
        let week = 7 * 86_400;
        let activity = vec![
            ActivityRow { sender: "0xaa".to_owned(), period_ts: (now - 2 * week) as u32 },
            ActivityRow { sender: "0xbb".to_owned(), period_ts: (now - 2 * week) as u32 },
            ActivityRow { sender: "0xaa".to_owned(), period_ts: (now - week) as u32 },
        ];
        let mock = Mock::new();
        mock_overview(&mock, activity);
        let app = build_app(mock.url());
        let body = send_request(app, "/overview").await;

        let retention = body["retention"].as_array().unwrap();
        assert!(!retention.is_empty());
        let first = &retention[0];
        assert_eq!(first["period_offset"], 0);
        assert_eq!(first["cohort_size"], 2);
        assert_eq!(first["active_subjects"], 2);
        assert_eq!(first["percentage"], 100.0);
        let offset1 = retention.iter().find(|c| c["period_offset"] == 1).unwrap();
        assert_eq!(offset1["active_subjects"], 1);
        assert_eq!(offset1["percentage"], 50.0);
    }

    #[tokio::test]
    async fn overview_rejects_unknown_chain() {
        let mock = Mock::new();
        let app = build_app(mock.url());
        let (status, body) = send_error_request(app, "/overview?chain=near").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "invalid-params");
        assert!(body["detail"].as_str().unwrap().contains("near"));
    }

    #[tokio::test]
    async fn overview_rejects_unknown_timeframe() {
        let mock = Mock::new();
        let app = build_app(mock.url());
        let (status, body) = send_error_request(app, "/overview?timeframe=year").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "invalid-params");
    }

    #[tokio::test]
    async fn warehouse_failure_maps_to_database_error() {
        let mock = Mock::new();
        mock.add(handlers::failure(StatusCode::INTERNAL_SERVER_ERROR));
        let app = build_app(mock.url());
        let (status, body) = send_error_request(app, "/overview").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["type"], "database-error");
        // The warehouse error text stays in the logs; the client gets the
        // generic detail only.
        assert_eq!(body["detail"], "The query could not be completed");
    }

    #[tokio::test]
    async fn failed_responses_are_not_cached() {
        let mock = Mock::new();
        mock.add(handlers::failure(StatusCode::INTERNAL_SERVER_ERROR));
        mock_overview(&mock, Vec::new());
        let app = build_app(mock.url());

        let (status, _) = send_error_request(app.clone(), "/overview").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // The retry must reach the warehouse and succeed.
        let body = send_request(app, "/overview").await;
        assert_eq!(body["deployments"], 100);
    }

    #[tokio::test]
    async fn overview_responses_are_cached() {
        // Only one set of mock handlers is queued; the second request must be
        // served from the response cache or it would hit the mock again and
        // fail.
        let mock = Mock::new();
        mock_overview(&mock, Vec::new());
        let app = build_app(mock.url());
        let first = send_request(app.clone(), "/overview").await;
        let second = send_request(app, "/overview").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn bundler_endpoint() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![clickhouse_lib::BundlerLeaderboardRow {
            name: "pimlico".to_owned(),
            num_userops: 500,
            num_txns: 400,
            revenue_usd: 12.0,
        }]));
        mock.add(handlers::provide(vec![DateNameCountRow {
            date: "2024-01-01".to_owned(),
            name: "pimlico".to_owned(),
            count: 500,
        }]));
        mock.add(handlers::provide(Vec::<DateNameAmountRow>::new()));
        mock.add(handlers::provide(vec![DateShareRow {
            date: "2024-01-01".to_owned(),
            pct: 12.5,
        }]));
        mock.add(handlers::provide(Vec::<DateNameCountRow>::new()));

        let app = build_app(mock.url());
        let body = send_request(app, "/bundler?chain=base&timeframe=day").await;
        assert_eq!(
            body["leaderboard"],
            json!([{ "name": "pimlico", "num_userops": 500, "num_txns": 400, "revenue_usd": 12.0 }])
        );
        assert_eq!(body["multi_userop_chart"], json!([{ "date": "2024-01-01", "pct": 12.5 }]));
        assert_eq!(body["accounts_chart"], json!([]));
    }

    #[tokio::test]
    async fn paymaster_endpoint() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![clickhouse_lib::PaymasterLeaderboardRow {
            name: "pimlico".to_owned(),
            num_userops: 300,
            gas_spent_usd: 8.0,
        }]));
        for _ in 0..5 {
            mock.add(handlers::provide(Vec::<DateNameCountRow>::new()));
        }
        let app = build_app(mock.url());
        let body = send_request(app, "/paymaster").await;
        assert_eq!(body["leaderboard"][0]["name"], "pimlico");
        assert_eq!(body["spend_chart"], json!([]));
    }

    #[tokio::test]
    async fn account_deployer_endpoint() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![clickhouse_lib::FactoryLeaderboardRow {
            name: "kernel".to_owned(),
            num_accounts: 250,
        }]));
        mock.add(handlers::provide(Vec::<DateNameCountRow>::new()));
        mock.add(handlers::provide(Vec::<DateNameCountRow>::new()));
        let app = build_app(mock.url());
        let body = send_request(app, "/account_deployer").await;
        assert_eq!(body["leaderboard"], json!([{ "name": "kernel", "num_accounts": 250 }]));
    }

    #[tokio::test]
    async fn apps_endpoint() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![DateNameCountRow {
            date: "2024-01-01".to_owned(),
            name: "Other".to_owned(),
            count: 11,
        }]));
        mock.add(handlers::provide(vec![clickhouse_lib::AppLeaderboardRow {
            project: "friendtech".to_owned(),
            num_unique_senders: 40,
            num_ops: 90,
        }]));
        mock.add(handlers::provide(Vec::<DateNameCountRow>::new()));
        mock.add(handlers::provide(Vec::<DateNameCountRow>::new()));
        let app = build_app(mock.url());
        let body = send_request(app, "/apps").await;
        assert_eq!(body["usage_chart"], json!([{ "date": "2024-01-01", "name": "Other", "count": 11 }]));
        assert_eq!(body["leaderboard"][0]["project"], "friendtech");
    }

    #[tokio::test]
    async fn entity_endpoint_skips_missing_roles() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![EntityRolesRow {
            bundler_exists: true,
            paymaster_exists: false,
        }]));
        mock.add(handlers::provide(vec![DateCountRow {
            date: "2024-01-01".to_owned(),
            count: 5,
        }]));
        mock.add(handlers::provide(Vec::<DateCountRow>::new()));
        mock.add(handlers::provide(Vec::<DateAmountRow>::new()));

        let app = build_app(mock.url());
        let body = send_request(app, "/entity?entity=alchemy").await;
        assert_eq!(body["bundler_exists"], true);
        assert_eq!(body["paymaster_exists"], false);
        assert_eq!(body["bundler_userops_chart"], json!([{ "date": "2024-01-01", "count": 5 }]));
        assert_eq!(body["paymaster_userops_chart"], json!([]));
        assert_eq!(body["paymaster_spend_chart"], json!([]));
    }

    #[tokio::test]
    async fn entity_endpoint_rejects_malformed_entity() {
        let mock = Mock::new();
        let app = build_app(mock.url());
        let (status, body) = send_error_request(app, "/entity?entity=Robert%27%3B%20DROP").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "invalid-params");
    }

    #[tokio::test]
    async fn eip7702_overview_endpoint() {
        let mock = Mock::new();
        mock.add(handlers::provide(vec![Eip7702SummaryRow {
            live_smart_wallets: 10,
            num_authorizations: 20,
            num_set_code_txns: 15,
        }]));
        mock.add(handlers::provide(vec![chain_count("2024-01-01", "ethereum", 20)]));
        mock.add(handlers::provide(Vec::<DateChainCountRow>::new()));
        mock.add(handlers::provide(Vec::<DateCountRow>::new()));
        mock.add(handlers::provide(Vec::<DateCountRow>::new()));

        let app = build_app(mock.url());
        let body = send_request(app, "/eip7702-overview").await;
        assert_eq!(body["live_smart_wallets"], 10);
        assert_eq!(body["authorizations"], 20);
        assert_eq!(body["set_code_txns"], 15);
        assert_eq!(
            body["authorizations_chart"],
            json!([{ "date": "2024-01-01", "chain": "ethereum", "count": 20 }])
        );
    }

    #[tokio::test]
    async fn openapi_doc_is_served() {
        let mock = Mock::new();
        let app = build_app(mock.url());
        let body = send_request(app, "/api-doc/openapi.json").await;
        assert_eq!(body["info"]["title"], "Bundlescope API");
        assert!(body["paths"].get("/overview").is_some());
        assert!(body["paths"].get("/eip7702-overview").is_some());
    }
}
