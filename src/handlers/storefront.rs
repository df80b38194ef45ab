use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::{
    errors::ServiceError,
    handlers::common::{parse_id, success_response},
    queries::ListParams,
    AppState,
};

/// Creates the router for the read-only catalog pages
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/products/", get(list_products))
        .route("/products/:id/", get(product_detail))
        .route("/about/", get(about))
}

/// Landing page: featured, new, best-selling and discounted products
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Home page context", body = crate::services::catalog::HomeContext),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Storefront"
)]
pub async fn home(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let context = state.services.catalog.home().await?;
    Ok(success_response(context))
}

/// Filtered, sorted and paginated product listing
#[utoipa::path(
    get,
    path = "/products/",
    params(ListParams),
    responses(
        (status = 200, description = "Product listing context", body = crate::services::catalog::ListContext),
        (status = 404, description = "Page out of range", body = crate::errors::ErrorResponse)
    ),
    tag = "Storefront"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ServiceError> {
    let context = state.services.catalog.list(&params).await?;
    Ok(success_response(context))
}

/// Product detail with media and related products
#[utoipa::path(
    get,
    path = "/products/{id}/",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product detail context", body = crate::services::catalog::DetailContext),
        (status = 404, description = "Product missing or archived", body = crate::errors::ErrorResponse)
    ),
    tag = "Storefront"
)]
pub async fn product_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServiceError> {
    let id = parse_id(&id, "Product")?;
    let context = state.services.catalog.detail(id).await?;
    Ok(success_response(context))
}

#[utoipa::path(
    get,
    path = "/about/",
    responses(
        (status = 200, description = "About page context", body = crate::services::catalog::AboutContext)
    ),
    tag = "Storefront"
)]
pub async fn about(State(state): State<AppState>) -> Result<impl IntoResponse, ServiceError> {
    let context = state.services.catalog.about().await?;
    Ok(success_response(context))
}
