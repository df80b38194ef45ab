use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Catalog product. Archived rows stay in the table but are never returned by
/// storefront reads.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Product name must be between 1 and 255 characters"
    ))]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    #[validate(custom = "validate_price")]
    pub price: Decimal,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,

    /// Ordered, de-duplicated list of [`Size`] tags
    #[sea_orm(column_type = "Json")]
    pub available_sizes: Json,

    /// Ordered, de-duplicated list of [`Color`] tags
    #[sea_orm(column_type = "Json")]
    pub available_colors: Json,

    pub category: ProductCategory,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Brand must be between 1 and 100 characters"
    ))]
    pub brand: String,

    #[validate(length(
        min = 1,
        max = 100,
        message = "Material must be between 1 and 100 characters"
    ))]
    pub material: String,

    pub gender: Gender,
    pub season: Option<Season>,

    #[sea_orm(column_type = "Decimal(Some((5, 2)))")]
    #[validate(custom = "validate_discount")]
    pub discount: Decimal,

    #[sea_orm(unique)]
    #[validate(length(
        min = 1,
        max = 100,
        message = "SKU must be between 1 and 100 characters"
    ))]
    pub sku: String,

    #[sea_orm(column_type = "Double")]
    #[validate(range(min = 0.0, max = 5.0, message = "Rating must be between 0 and 5"))]
    pub average_rating: f64,

    #[validate(range(min = 0, message = "Review count cannot be negative"))]
    pub review_count: i32,

    /// Free-form string tags
    #[sea_orm(column_type = "Json")]
    pub tags: Json,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub is_featured: bool,
    pub is_new: bool,
    pub is_on_sale: bool,
    pub is_best_seller: bool,

    #[sea_orm(column_type = "Text", nullable)]
    pub care_instructions: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub return_policy: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub shipping_info: Option<String>,

    pub is_archived: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_image::Entity")]
    ProductImages,
    #[sea_orm(has_many = "super::product_video::Entity")]
    ProductVideos,
}

impl Related<super::product_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductImages.def()
    }
}

impl Related<super::product_video::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductVideos.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            if let ActiveValue::NotSet = active_model.is_archived {
                active_model.is_archived = Set(false);
            }
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(now);
            }
        }

        active_model.updated_at = Set(now);

        // Inserts and partial updates carry NotSet columns; their inputs are validated upstream
        if let Ok(model) = Model::try_from(active_model.clone()) {
            if let Err(err) = model.validate() {
                return Err(DbErr::Custom(format!("Validation error: {}", err)));
            }
        }

        Ok(active_model)
    }
}

impl Model {
    pub fn sizes(&self) -> Vec<Size> {
        serde_json::from_value(self.available_sizes.clone()).unwrap_or_default()
    }

    pub fn colors(&self) -> Vec<Color> {
        serde_json::from_value(self.available_colors.clone()).unwrap_or_default()
    }

    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_value(self.tags.clone()).unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        !self.is_archived
    }
}

pub(crate) fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        let mut err = ValidationError::new("price");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    if price.trunc() >= Decimal::from(100_000_000) {
        let mut err = ValidationError::new("price");
        err.message = Some("Price must fit 8 integer digits".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_discount(discount: &Decimal) -> Result<(), ValidationError> {
    if discount.is_sign_negative() || *discount > Decimal::from(100) {
        let mut err = ValidationError::new("discount");
        err.message = Some("Discount must be a percentage between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

/// Serializes an ordered tag list, dropping repeats while keeping first-seen order.
pub fn ordered_set<T>(items: impl IntoIterator<Item = T>) -> Json
where
    T: Serialize + PartialEq,
{
    let mut unique: Vec<T> = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    serde_json::to_value(unique).unwrap_or_else(|_| Json::Array(Vec::new()))
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(100))")]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    #[sea_orm(string_value = "men")]
    Men,
    #[sea_orm(string_value = "women")]
    Women,
    #[sea_orm(string_value = "kids")]
    Kids,
    #[sea_orm(string_value = "accessories")]
    Accessories,
    #[sea_orm(string_value = "footwear")]
    Footwear,
    #[sea_orm(string_value = "sportswear")]
    Sportswear,
    #[sea_orm(string_value = "formal")]
    Formal,
    #[sea_orm(string_value = "casual")]
    Casual,
    #[sea_orm(string_value = "ethnic")]
    Ethnic,
    #[sea_orm(string_value = "partywear")]
    Partywear,
    #[sea_orm(string_value = "winterwear")]
    Winterwear,
    #[sea_orm(string_value = "undergarments")]
    Undergarments,
    #[sea_orm(string_value = "sleepwear")]
    Sleepwear,
    #[sea_orm(string_value = "activewear")]
    Activewear,
    #[sea_orm(string_value = "swimwear")]
    Swimwear,
}

impl ProductCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Men => "Men",
            Self::Women => "Women",
            Self::Kids => "Kids",
            Self::Accessories => "Accessories",
            Self::Footwear => "Footwear",
            Self::Sportswear => "Sportswear",
            Self::Formal => "Formal",
            Self::Casual => "Casual",
            Self::Ethnic => "Ethnic",
            Self::Partywear => "Partywear",
            Self::Winterwear => "Winterwear",
            Self::Undergarments => "Undergarments",
            Self::Sleepwear => "Sleepwear",
            Self::Activewear => "Activewear",
            Self::Swimwear => "Swimwear",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[sea_orm(string_value = "male")]
    Male,
    #[sea_orm(string_value = "female")]
    Female,
    #[sea_orm(string_value = "unisex")]
    Unisex,
}

impl Gender {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Unisex => "Unisex",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(50))")]
#[serde(rename_all = "snake_case")]
pub enum Season {
    #[sea_orm(string_value = "spring")]
    Spring,
    #[sea_orm(string_value = "summer")]
    Summer,
    #[sea_orm(string_value = "autumn")]
    Autumn,
    #[sea_orm(string_value = "winter")]
    Winter,
    #[sea_orm(string_value = "rainy")]
    Rainy,
    #[sea_orm(string_value = "all_season")]
    AllSeason,
}

impl Season {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Spring => "Spring",
            Self::Summer => "Summer",
            Self::Autumn => "Autumn",
            Self::Winter => "Winter",
            Self::Rainy => "Rainy",
            Self::AllSeason => "All Season",
        }
    }
}

/// Garment size tag stored inside `available_sizes`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Size {
    #[serde(rename = "XS")]
    ExtraSmall,
    #[serde(rename = "S")]
    Small,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
    #[serde(rename = "XXL")]
    DoubleExtraLarge,
    #[serde(rename = "XXXL")]
    TripleExtraLarge,
}

impl Size {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ExtraSmall => "Extra Small",
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
            Self::ExtraLarge => "Extra Large",
            Self::DoubleExtraLarge => "Double Extra Large",
            Self::TripleExtraLarge => "Triple Extra Large",
        }
    }
}

/// Color tag stored inside `available_colors`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
    Green,
    Black,
    White,
    Yellow,
    Purple,
    Pink,
    Orange,
    Gray,
    Brown,
    Beige,
    Gold,
    Silver,
    Multicolor,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::ActiveEnum;

    #[test]
    fn ordered_set_keeps_first_occurrence_order() {
        let json = ordered_set(vec![Size::Large, Size::Small, Size::Large, Size::Medium]);
        assert_eq!(json, serde_json::json!(["L", "S", "M"]));
    }

    #[test]
    fn category_string_values_match_stored_form() {
        assert_eq!(ProductCategory::Partywear.to_value(), "partywear");
        assert_eq!(
            ProductCategory::try_from_value(&"swimwear".to_string()).unwrap(),
            ProductCategory::Swimwear
        );
        assert!(ProductCategory::try_from_value(&"spacewear".to_string()).is_err());
        assert_eq!(Season::AllSeason.to_value(), "all_season");
        assert_eq!(Season::AllSeason.label(), "All Season");
    }

    #[test]
    fn price_and_discount_bounds() {
        assert!(validate_price(&dec!(19.99)).is_ok());
        assert!(validate_price(&dec!(-0.01)).is_err());
        assert!(validate_price(&dec!(100000000)).is_err());
        assert!(validate_discount(&dec!(0)).is_ok());
        assert!(validate_discount(&dec!(100)).is_ok());
        assert!(validate_discount(&dec!(100.01)).is_err());
    }

    #[test]
    fn color_tags_serialize_lowercase() {
        let json = ordered_set(vec![Color::Multicolor, Color::Red]);
        assert_eq!(json, serde_json::json!(["multicolor", "red"]));
    }
}
