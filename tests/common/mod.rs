#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::Value;
use stateset_storefront::{
    config::AppConfig,
    db,
    entities::{product, Gender, ProductCategory},
    services::catalog_admin::CreateProductInput,
    AppState,
};
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper harness for spinning up the full router over an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _media_root: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let media_root = tempfile::tempdir().expect("create media dir");

        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps every query on the same in-memory database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.media_root = media_root.path().to_string_lossy().into_owned();
        customize(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = stateset_storefront::app_router(state.clone());

        Self {
            router,
            state,
            _media_root: media_root,
        }
    }

    pub fn db(&self) -> &sea_orm::DatabaseConnection {
        &self.state.db
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router call failed");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, headers, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("build request");
        let (status, _, body) = self.send(request).await;
        (status, body)
    }

    pub async fn get_with_headers(&self, uri: &str) -> (StatusCode, HeaderMap, Value) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .expect("build request");
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> (StatusCode, HeaderMap, Value) {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .expect("build request");
        self.send(request).await
    }

    /// Seeds a product through the admin service.
    pub async fn create_product(
        &self,
        sku: &str,
        customize: impl FnOnce(&mut CreateProductInput),
    ) -> product::Model {
        let mut input = product_input(sku);
        customize(&mut input);
        self.state
            .services
            .admin
            .create_product(input)
            .await
            .expect("create product")
    }

    pub async fn contact_message_count(&self) -> u64 {
        self.state
            .services
            .contact
            .count_messages()
            .await
            .expect("count contact messages")
    }
}

pub fn product_input(sku: &str) -> CreateProductInput {
    CreateProductInput {
        name: format!("Product {sku}"),
        description: "A test product".to_string(),
        price: Decimal::new(2500, 2),
        stock: 10,
        available_sizes: Vec::new(),
        available_colors: Vec::new(),
        category: ProductCategory::Casual,
        brand: "Acme".to_string(),
        material: "Cotton".to_string(),
        gender: Gender::Unisex,
        season: None,
        discount: Decimal::ZERO,
        sku: sku.to_string(),
        average_rating: 0.0,
        review_count: 0,
        tags: Vec::new(),
        is_featured: false,
        is_new: false,
        is_on_sale: false,
        is_best_seller: false,
        care_instructions: None,
        return_policy: None,
        shipping_info: None,
    }
}

/// A complete 1x1 RGBA PNG.
pub const PNG_BYTES: [u8; 68] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0B, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x60, 0x00, 0x02, 0x00,
    0x00, 0x05, 0x00, 0x01, 0x7A, 0x5E, 0xAB, 0x3F, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44,
    0xAE, 0x42, 0x60, 0x82,
];

pub fn json_ids(items: &Value) -> Vec<i64> {
    items
        .as_array()
        .map(|cards| {
            cards
                .iter()
                .filter_map(|card| card["product"]["id"].as_i64())
                .collect()
        })
        .unwrap_or_default()
}
