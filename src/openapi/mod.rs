use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StateSet Storefront",
        version = "0.1.0",
        description = r#"
# StateSet Storefront

Read-only catalog pages and customer contact intake for a clothing storefront.
Every page is returned as a JSON display context.

## Listing parameters

`GET /products/` accepts independent, conjunctive filters:
- `category`, `brand`, `gender`: exact match; unknown values match nothing
- `min_price`, `max_price`: inclusive bounds; unparsable values are ignored
- `featured`, `new`, `sale`: any non-empty value applies the flag
- `sort`: one of `name`, `price`, `created_at`, `average_rating`, `review_count`,
  optionally prefixed with `-` for descending; anything else sorts newest first
- `page`: 1-based page number or `last`; 12 products per page

## Error Handling

Errors use a consistent body:

```json
{
  "error": "Not Found",
  "message": "Not found: Product 42 not found",
  "request_id": "req-abc123xyz",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Storefront", description = "Catalog pages"),
        (name = "Contact", description = "Contact form"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::storefront::home,
        crate::handlers::storefront::list_products,
        crate::handlers::storefront::product_detail,
        crate::handlers::storefront::about,
        crate::handlers::contact::contact_page,
        crate::handlers::contact::submit_contact,
        crate::health::health_check,
        crate::health::readiness_check,
        crate::health::version_info,
    ),
    components(
        schemas(
            crate::services::catalog::HomeContext,
            crate::services::catalog::ListContext,
            crate::services::catalog::DetailContext,
            crate::services::catalog::AboutContext,
            crate::services::catalog::ProductCard,
            crate::services::catalog::CatalogStats,
            crate::services::catalog::ActiveFilters,
            crate::services::catalog::FilterOptions,
            crate::services::catalog::PageInfo,
            crate::services::catalog::ChoiceOption,
            crate::services::contact::ContactForm,
            crate::services::contact::ContactPage,
            crate::handlers::contact::ContactSubmitted,
            crate::entities::ProductCategory,
            crate::entities::Gender,
            crate::entities::Season,
            crate::entities::Size,
            crate::entities::Color,
            crate::entities::ContactSubject,
            crate::health::ReadinessReport,
            crate::health::HealthStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct StorefrontApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", StorefrontApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_storefront_routes() {
        let openapi = StorefrontApiDoc::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("StateSet Storefront"));
        assert!(json.contains("/products/{id}/"));
        assert!(json.contains("/contact/"));
        assert!(json.contains("ErrorResponse"));
    }
}
