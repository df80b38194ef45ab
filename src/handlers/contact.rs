use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    errors::ServiceError,
    handlers::common::success_response,
    services::contact::{thank_you_message, ContactForm, ContactOutcome, ContactPage},
    AppState,
};

/// Where a successful submission is redirected
pub const CONTACT_SUCCESS_LOCATION: &str = "/contact/?submitted=1";

pub fn contact_routes() -> Router<AppState> {
    Router::new().route("/contact/", get(contact_page).post(submit_contact))
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContactPageParams {
    /// Set by the post-submission redirect
    pub submitted: Option<String>,
}

/// Body sent with the post-submission redirect
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContactSubmitted {
    pub id: i32,
    pub message: String,
    pub location: String,
}

/// Blank contact form, or the confirmation after a redirect
#[utoipa::path(
    get,
    path = "/contact/",
    params(ContactPageParams),
    responses(
        (status = 200, description = "Contact page context", body = ContactPage)
    ),
    tag = "Contact"
)]
pub async fn contact_page(Query(params): Query<ContactPageParams>) -> impl IntoResponse {
    let page = match params.submitted.as_deref() {
        Some(value) if !value.is_empty() => ContactPage::submitted(),
        _ => ContactPage::blank(),
    };
    success_response(page)
}

/// Submit a contact message
#[utoipa::path(
    post,
    path = "/contact/",
    request_body(content = ContactForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Message stored; redirect to the confirmation", body = ContactSubmitted),
        (status = 422, description = "Form re-rendered with field errors", body = ContactPage),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "Contact"
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    Form(form): Form<ContactForm>,
) -> Result<Response, ServiceError> {
    let echo = form.clone().normalized();
    match state.services.contact.submit(form).await? {
        ContactOutcome::Submitted(message) => {
            let body = ContactSubmitted {
                id: message.id,
                message: thank_you_message(&message),
                location: CONTACT_SUCCESS_LOCATION.to_string(),
            };
            Ok((
                StatusCode::SEE_OTHER,
                [(header::LOCATION, CONTACT_SUCCESS_LOCATION)],
                Json(body),
            )
                .into_response())
        }
        ContactOutcome::Invalid(errors) => Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ContactPage::rejected(echo, errors)),
        )
            .into_response()),
    }
}
