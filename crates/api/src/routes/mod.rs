//! API route definitions

pub mod account_deployer;
pub mod apps;
pub mod bundler;
pub mod eip7702;
pub mod entity;
pub mod overview;
pub mod paymaster;

use crate::{ApiDoc, state::ApiState};
use axum::{Router, routing::get};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use account_deployer::*;
use apps::*;
use bundler::*;
use eip7702::*;
use entity::*;
use overview::*;
use paymaster::*;

/// Build the router with all API endpoints.
pub fn router(state: ApiState) -> Router {
    let api_routes = Router::new()
        .route("/overview", get(overview))
        .route("/bundler", get(bundler))
        .route("/paymaster", get(paymaster))
        .route("/account_deployer", get(account_deployer))
        .route("/apps", get(apps))
        .route("/entity", get(entity))
        .route("/eip7702-overview", get(eip7702_overview));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(api_routes)
        .with_state(state)
}
