use std::{collections::BTreeMap, sync::Arc};

use metrics::counter;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Iterable,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    entities::{contact_message, ContactMessage, ContactSubject},
    errors::ServiceError,
    services::catalog::ChoiceOption,
};

pub const SUBMISSION_FAILED_MESSAGE: &str =
    "There was an error with your submission. Please check the form and try again.";
pub const SUBMISSION_RECEIVED_MESSAGE: &str =
    "Thank you! Your message has been sent successfully.";

/// Field name to the messages explaining why its value was rejected.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    match ContactSubject::from_form_value(subject) {
        Some(_) => Ok(()),
        None => {
            let mut err = ValidationError::new("invalid_choice");
            err.message = Some(
                format!("Select a valid choice. {subject} is not one of the available choices.")
                    .into(),
            );
            Err(err)
        }
    }
}

/// Contact form as submitted. Every field is optional on the wire so that missing
/// inputs surface as field errors instead of a rejected request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ContactForm {
    #[validate(required, length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub first_name: Option<String>,

    #[validate(required, length(max = 100, message = "Ensure this value has at most 100 characters."))]
    pub last_name: Option<String>,

    #[validate(required, email(message = "Enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(max = 20, message = "Ensure this value has at most 20 characters."))]
    pub phone: Option<String>,

    #[validate(required, custom = "validate_subject")]
    pub subject: Option<String>,

    #[validate(required)]
    pub message: Option<String>,

    /// Checkbox value; absent when unticked
    pub newsletter_signup: Option<String>,
}

impl ContactForm {
    /// Trims every text input; blank inputs count as not supplied.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            first_name: clean(self.first_name),
            last_name: clean(self.last_name),
            email: clean(self.email),
            phone: clean(self.phone),
            subject: clean(self.subject),
            message: clean(self.message),
            newsletter_signup: clean(self.newsletter_signup),
        }
    }

    pub fn newsletter_opt_in(&self) -> bool {
        match self.newsletter_signup.as_deref().map(str::trim) {
            None | Some("") => false,
            Some(value) => !matches!(
                value.to_ascii_lowercase().as_str(),
                "false" | "off" | "0" | "no"
            ),
        }
    }

    fn into_active_model(self) -> Result<contact_message::ActiveModel, ServiceError> {
        let newsletter_signup = self.newsletter_opt_in();
        let missing = |field: &str| ServiceError::InvalidInput(format!("{field} is required"));
        let subject = self
            .subject
            .as_deref()
            .and_then(ContactSubject::from_form_value)
            .ok_or_else(|| missing("subject"))?;

        Ok(contact_message::ActiveModel {
            first_name: Set(self.first_name.ok_or_else(|| missing("first_name"))?),
            last_name: Set(self.last_name.ok_or_else(|| missing("last_name"))?),
            email: Set(self.email.ok_or_else(|| missing("email"))?),
            phone: Set(self.phone),
            subject: Set(subject),
            message: Set(self.message.ok_or_else(|| missing("message"))?),
            newsletter_signup: Set(newsletter_signup),
            ..Default::default()
        })
    }
}

/// Flattens validator output into per-field display messages.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|err| match (&err.message, err.code.as_ref()) {
                    (Some(message), _) => message.to_string(),
                    (None, "required") => "This field is required.".to_string(),
                    (None, code) => format!("Invalid value ({code})."),
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Result of a contact submission.
#[derive(Clone, Debug, PartialEq)]
pub enum ContactOutcome {
    Submitted(contact_message::Model),
    Invalid(FieldErrors),
}

/// Everything the contact page needs to render, for both the blank form and a rejected
/// submission.
#[derive(Clone, Debug, Default, Serialize, ToSchema)]
pub struct ContactPage {
    pub form: ContactForm,
    pub errors: FieldErrors,
    pub subjects: Vec<ChoiceOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ContactPage {
    pub fn blank() -> Self {
        Self {
            subjects: ContactSubject::iter()
                .map(|subject| ChoiceOption::new(subject.to_value(), subject.label()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn submitted() -> Self {
        Self {
            success_message: Some(SUBMISSION_RECEIVED_MESSAGE.to_string()),
            ..Self::blank()
        }
    }

    pub fn rejected(form: ContactForm, errors: FieldErrors) -> Self {
        Self {
            form,
            errors,
            error_message: Some(SUBMISSION_FAILED_MESSAGE.to_string()),
            ..Self::blank()
        }
    }
}

/// Confirmation shown after a message is stored.
pub fn thank_you_message(message: &contact_message::Model) -> String {
    format!(
        "Thank you, {}! Your message has been sent successfully. We'll get back to you within 24 hours.",
        message.first_name
    )
}

/// Contact message intake plus the administrative resolution workflow.
#[derive(Clone)]
pub struct ContactService {
    db: Arc<DatabaseConnection>,
}

impl ContactService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Validates and stores a submission. Invalid input persists nothing.
    #[instrument(skip(self, form))]
    pub async fn submit(&self, form: ContactForm) -> Result<ContactOutcome, ServiceError> {
        let form = form.normalized();
        if let Err(errors) = form.validate() {
            let errors = field_errors(&errors);
            warn!(fields = ?errors.keys().collect::<Vec<_>>(), "contact submission rejected");
            counter!("storefront.contact.rejected", 1);
            return Ok(ContactOutcome::Invalid(errors));
        }

        let message = form.into_active_model()?.insert(&*self.db).await?;
        info!(message_id = message.id, subject = %message.subject.to_value(), "contact message received");
        counter!("storefront.contact.submitted", 1);
        Ok(ContactOutcome::Submitted(message))
    }

    /// Messages newest first, optionally restricted to unresolved ones.
    #[instrument(skip(self))]
    pub async fn list_messages(
        &self,
        unresolved_only: bool,
    ) -> Result<Vec<contact_message::Model>, ServiceError> {
        let mut query = ContactMessage::find();
        if unresolved_only {
            query = query.filter(contact_message::Column::IsResolved.eq(false));
        }
        Ok(query
            .order_by_desc(contact_message::Column::CreatedAt)
            .order_by_desc(contact_message::Column::Id)
            .all(&*self.db)
            .await?)
    }

    pub async fn count_messages(&self) -> Result<u64, ServiceError> {
        Ok(ContactMessage::find().count(&*self.db).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_message(&self, id: i32) -> Result<contact_message::Model, ServiceError> {
        ContactMessage::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Contact message {id} not found")))
    }

    #[instrument(skip(self))]
    pub async fn set_resolved(
        &self,
        id: i32,
        resolved: bool,
    ) -> Result<contact_message::Model, ServiceError> {
        let mut message: contact_message::ActiveModel = self.get_message(id).await?.into();
        message.is_resolved = Set(resolved);
        let message = message.update(&*self.db).await?;
        info!(message_id = id, resolved, "contact message resolution changed");
        Ok(message)
    }

    /// Replaces the admin notes; blank notes clear them.
    #[instrument(skip(self, notes))]
    pub async fn set_admin_notes(
        &self,
        id: i32,
        notes: Option<String>,
    ) -> Result<contact_message::Model, ServiceError> {
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        let mut message: contact_message::ActiveModel = self.get_message(id).await?.into();
        message.admin_notes = Set(notes);
        Ok(message.update(&*self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_form() -> ContactForm {
        ContactForm {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            phone: None,
            subject: Some("sizing_help".into()),
            message: Some("Does the M run small?".into()),
            newsletter_signup: None,
        }
    }

    #[test]
    fn valid_form_passes() {
        assert!(valid_form().normalized().validate().is_ok());
    }

    #[test]
    fn blank_fields_are_missing() {
        let form = ContactForm {
            email: Some("   ".into()),
            ..valid_form()
        }
        .normalized();
        let errors = field_errors(&form.validate().unwrap_err());
        assert_eq!(errors["email"], vec!["This field is required.".to_string()]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn bad_email_and_subject_are_reported() {
        let form = ContactForm {
            email: Some("not-an-email".into()),
            subject: Some("refund".into()),
            ..valid_form()
        };
        let errors = field_errors(&form.validate().unwrap_err());
        assert_eq!(errors["email"], vec!["Enter a valid email address.".to_string()]);
        assert!(errors["subject"][0].contains("refund"));
    }

    #[test]
    fn length_limits_apply() {
        let form = ContactForm {
            first_name: Some("x".repeat(101)),
            phone: Some("1".repeat(21)),
            ..valid_form()
        };
        let errors = field_errors(&form.validate().unwrap_err());
        assert!(errors.contains_key("first_name"));
        assert!(errors.contains_key("phone"));
    }

    #[test]
    fn checkbox_values() {
        let with = |value: &str| ContactForm {
            newsletter_signup: Some(value.into()),
            ..valid_form()
        };
        assert!(!valid_form().newsletter_opt_in());
        assert!(with("on").newsletter_opt_in());
        assert!(with("true").newsletter_opt_in());
        assert!(!with("off").newsletter_opt_in());
        assert!(!with("false").newsletter_opt_in());
        assert!(!with("").newsletter_opt_in());
    }

    #[test]
    fn blank_page_lists_every_subject() {
        let page = ContactPage::blank();
        assert_eq!(page.subjects.len(), 9);
        assert_eq!(page.subjects[0].value, "product_inquiry");
        assert!(page.errors.is_empty());
    }
}
