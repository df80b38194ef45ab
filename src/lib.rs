//! StateSet Storefront Library
//!
//! Catalog browsing, product detail and contact intake for a clothing storefront,
//! plus the administrative catalog operations behind it.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod queries;
pub mod services;
pub mod tracing;

use axum::{extract::DefaultBodyLimit, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Storefront pages, contact form and health endpoints without any middleware.
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .merge(handlers::storefront::storefront_routes())
        .merge(handlers::contact::contact_routes())
        .nest("/health", health::health_routes())
}

/// Full application router with request ids, HTTP tracing, compression and Swagger UI.
/// CORS is left to the binary since it depends on deployment settings.
pub fn app_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_size;

    Router::<AppState>::new()
        .merge(storefront_routes())
        .merge(openapi::swagger_ui())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
