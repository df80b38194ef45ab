use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait, Iterable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Customer inquiry submitted through the contact form.
///
/// Only `is_resolved` and `admin_notes` change after creation.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contact_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: ContactSubject,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub newsletter_signup: bool,
    pub created_at: DateTime<Utc>,
    pub is_resolved: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub admin_notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if insert {
            active_model.created_at = Set(Utc::now());
            if let ActiveValue::NotSet = active_model.is_resolved {
                active_model.is_resolved = Set(false);
            }
        }
        Ok(active_model)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ContactSubject {
    #[sea_orm(string_value = "product_inquiry")]
    ProductInquiry,
    #[sea_orm(string_value = "order_status")]
    OrderStatus,
    #[sea_orm(string_value = "sizing_help")]
    SizingHelp,
    #[sea_orm(string_value = "styling_advice")]
    StylingAdvice,
    #[sea_orm(string_value = "return_exchange")]
    ReturnExchange,
    #[sea_orm(string_value = "complaint")]
    Complaint,
    #[sea_orm(string_value = "compliment")]
    Compliment,
    #[sea_orm(string_value = "wholesale")]
    Wholesale,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ContactSubject {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProductInquiry => "Product Inquiry",
            Self::OrderStatus => "Order Status",
            Self::SizingHelp => "Sizing Help",
            Self::StylingAdvice => "Styling Advice",
            Self::ReturnExchange => "Return/Exchange",
            Self::Complaint => "Complaint",
            Self::Compliment => "Compliment",
            Self::Wholesale => "Wholesale Inquiry",
            Self::Other => "Other",
        }
    }

    /// Parses the submitted form value
    pub fn from_form_value(value: &str) -> Option<Self> {
        Self::iter().find(|subject| subject.to_value() == value)
    }
}
