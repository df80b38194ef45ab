use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::ServiceError;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Parses a numeric path segment. Anything else cannot name a resource, so it is a 404.
pub fn parse_id(raw: &str, resource: &str) -> Result<i32, ServiceError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServiceError::NotFound(format!("{resource} {raw} not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("17", "Product").unwrap(), 17);
        assert!(parse_id("0", "Product").unwrap_err().is_not_found());
        assert!(parse_id("abc", "Product").unwrap_err().is_not_found());
        assert!(parse_id("-4", "Product").unwrap_err().is_not_found());
    }
}
