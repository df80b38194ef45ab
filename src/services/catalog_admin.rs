use std::sync::Arc;

use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use crate::{
    config::AppConfig,
    entities::{
        product::{self, ordered_set, validate_discount, validate_price},
        product_image, product_video, Color, Gender, Product, ProductCategory, ProductImage,
        ProductVideo, Season, Size,
    },
    errors::ServiceError,
    services::media::{sniff_image, sniff_video, MediaKind, MediaStore},
};

pub const MAX_IMAGES_PER_PRODUCT: u64 = 10;
pub const MAX_VIDEOS_PER_PRODUCT: u64 = 5;

/// Fields for a new catalog product.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1))]
    pub description: String,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub available_sizes: Vec<Size>,
    #[serde(default)]
    pub available_colors: Vec<Color>,
    pub category: ProductCategory,
    #[validate(length(min = 1, max = 100))]
    pub brand: String,
    #[validate(length(min = 1, max = 100))]
    pub material: String,
    pub gender: Gender,
    #[serde(default)]
    pub season: Option<Season>,
    #[validate(custom = "validate_discount")]
    #[serde(default)]
    pub discount: Decimal,
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    #[validate(range(min = 0.0, max = 5.0))]
    #[serde(default)]
    pub average_rating: f64,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub review_count: i32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_on_sale: bool,
    #[serde(default)]
    pub is_best_seller: bool,
    #[serde(default)]
    pub care_instructions: Option<String>,
    #[serde(default)]
    pub return_policy: Option<String>,
    #[serde(default)]
    pub shipping_info: Option<String>,
}

/// Partial product edit. `None` leaves the column unchanged; for nullable columns
/// `Some(None)` clears it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub available_sizes: Option<Vec<Size>>,
    pub available_colors: Option<Vec<Color>>,
    pub category: Option<ProductCategory>,
    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub material: Option<String>,
    pub gender: Option<Gender>,
    pub season: Option<Option<Season>>,
    #[validate(custom = "validate_discount")]
    pub discount: Option<Decimal>,
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    #[validate(range(min = 0.0, max = 5.0))]
    pub average_rating: Option<f64>,
    #[validate(range(min = 0))]
    pub review_count: Option<i32>,
    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_new: Option<bool>,
    pub is_on_sale: Option<bool>,
    pub is_best_seller: Option<bool>,
    pub care_instructions: Option<Option<String>>,
    pub return_policy: Option<Option<String>>,
    pub shipping_info: Option<Option<String>>,
}

fn money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Administrative catalog operations: product lifecycle and media management.
///
/// Unlike the storefront queries these see archived products too.
#[derive(Clone)]
pub struct CatalogAdminService {
    db: Arc<DatabaseConnection>,
    media: MediaStore,
    max_image_bytes: u64,
}

impl CatalogAdminService {
    pub fn new(db: Arc<DatabaseConnection>, media: MediaStore, max_image_bytes: u64) -> Self {
        Self {
            db,
            media,
            max_image_bytes,
        }
    }

    pub fn from_config(db: Arc<DatabaseConnection>, config: &AppConfig) -> Self {
        Self::new(
            db,
            MediaStore::new(config.media_root()),
            config.max_image_upload_bytes,
        )
    }

    pub fn media_store(&self) -> &MediaStore {
        &self.media
    }

    async fn ensure_unique_sku(&self, sku: &str, except: Option<i32>) -> Result<(), ServiceError> {
        let mut query = Product::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = except {
            query = query.filter(product::Column::Id.ne(id));
        }
        if query.count(&*self.db).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product with SKU {sku} already exists"
            )));
        }
        Ok(())
    }

    /// Any product by id, archived or not.
    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {id} not found")))
    }

    /// Every product including archived ones, newest first.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(Product::find()
            .order_by_desc(product::Column::CreatedAt)
            .order_by_desc(product::Column::Id)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self, input), fields(sku = %input.sku))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        self.ensure_unique_sku(&input.sku, None).await?;

        let model = product::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            price: Set(money(input.price)),
            stock: Set(input.stock),
            available_sizes: Set(ordered_set(input.available_sizes)),
            available_colors: Set(ordered_set(input.available_colors)),
            category: Set(input.category),
            brand: Set(input.brand),
            material: Set(input.material),
            gender: Set(input.gender),
            season: Set(input.season),
            discount: Set(money(input.discount)),
            sku: Set(input.sku),
            average_rating: Set(input.average_rating),
            review_count: Set(input.review_count),
            tags: Set(ordered_set(input.tags)),
            is_featured: Set(input.is_featured),
            is_new: Set(input.is_new),
            is_on_sale: Set(input.is_on_sale),
            is_best_seller: Set(input.is_best_seller),
            care_instructions: Set(input.care_instructions),
            return_policy: Set(input.return_policy),
            shipping_info: Set(input.shipping_info),
            ..Default::default()
        }
        .insert(&*self.db)
        .await?;

        info!(product_id = model.id, "product created");
        counter!("storefront.products.created", 1);
        Ok(model)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        id: i32,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;
        let existing = self.get_product(id).await?;
        if let Some(sku) = input.sku.as_deref().filter(|sku| *sku != existing.sku) {
            self.ensure_unique_sku(sku, Some(id)).await?;
        }

        let mut model: product::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(description);
        }
        if let Some(price) = input.price {
            model.price = Set(money(price));
        }
        if let Some(stock) = input.stock {
            model.stock = Set(stock);
        }
        if let Some(sizes) = input.available_sizes {
            model.available_sizes = Set(ordered_set(sizes));
        }
        if let Some(colors) = input.available_colors {
            model.available_colors = Set(ordered_set(colors));
        }
        if let Some(category) = input.category {
            model.category = Set(category);
        }
        if let Some(brand) = input.brand {
            model.brand = Set(brand);
        }
        if let Some(material) = input.material {
            model.material = Set(material);
        }
        if let Some(gender) = input.gender {
            model.gender = Set(gender);
        }
        if let Some(season) = input.season {
            model.season = Set(season);
        }
        if let Some(discount) = input.discount {
            model.discount = Set(money(discount));
        }
        if let Some(sku) = input.sku {
            model.sku = Set(sku);
        }
        if let Some(rating) = input.average_rating {
            model.average_rating = Set(rating);
        }
        if let Some(count) = input.review_count {
            model.review_count = Set(count);
        }
        if let Some(tags) = input.tags {
            model.tags = Set(ordered_set(tags));
        }
        if let Some(flag) = input.is_featured {
            model.is_featured = Set(flag);
        }
        if let Some(flag) = input.is_new {
            model.is_new = Set(flag);
        }
        if let Some(flag) = input.is_on_sale {
            model.is_on_sale = Set(flag);
        }
        if let Some(flag) = input.is_best_seller {
            model.is_best_seller = Set(flag);
        }
        if let Some(notes) = input.care_instructions {
            model.care_instructions = Set(notes);
        }
        if let Some(notes) = input.return_policy {
            model.return_policy = Set(notes);
        }
        if let Some(notes) = input.shipping_info {
            model.shipping_info = Set(notes);
        }

        let updated = model.update(&*self.db).await?;
        info!(product_id = id, "product updated");
        Ok(updated)
    }

    async fn set_archived(&self, id: i32, archived: bool) -> Result<product::Model, ServiceError> {
        let existing = self.get_product(id).await?;
        if existing.is_active() != archived {
            let state = if existing.is_active() { "active" } else { "archived" };
            return Err(ServiceError::InvalidInput(format!(
                "Product {id} is already {state}"
            )));
        }

        let mut model: product::ActiveModel = existing.into();
        model.is_archived = Set(archived);
        Ok(model.update(&*self.db).await?)
    }

    /// Active -> Archived. The row and its media stay in place.
    #[instrument(skip(self))]
    pub async fn archive_product(&self, id: i32) -> Result<product::Model, ServiceError> {
        let model = self.set_archived(id, true).await?;
        info!(product_id = id, "product archived");
        counter!("storefront.products.archived", 1);
        Ok(model)
    }

    /// Archived -> Active.
    #[instrument(skip(self))]
    pub async fn unarchive_product(&self, id: i32) -> Result<product::Model, ServiceError> {
        let model = self.set_archived(id, false).await?;
        info!(product_id = id, "product restored");
        counter!("storefront.products.unarchived", 1);
        Ok(model)
    }

    /// Validates, stores and attaches an uploaded image.
    #[instrument(skip(self, bytes, alt_text), fields(size = bytes.len()))]
    pub async fn attach_image(
        &self,
        product_id: i32,
        bytes: &[u8],
        alt_text: Option<String>,
        is_primary: bool,
    ) -> Result<product_image::Model, ServiceError> {
        let product = self.get_product(product_id).await?;

        if bytes.len() as u64 > self.max_image_bytes {
            counter!("storefront.media.rejected", 1);
            return Err(ServiceError::MediaError(format!(
                "Image file too large ({} bytes). Maximum size is {} bytes",
                bytes.len(),
                self.max_image_bytes
            )));
        }
        let sniffed = sniff_image(bytes)?;

        let existing = ProductImage::find()
            .filter(product_image::Column::ProductId.eq(product.id))
            .count(&*self.db)
            .await?;
        if existing >= MAX_IMAGES_PER_PRODUCT {
            return Err(ServiceError::MediaError(format!(
                "Product {} already has the maximum of {MAX_IMAGES_PER_PRODUCT} images",
                product.id
            )));
        }

        let path = self.media.save(MediaKind::Image, sniffed.extension, bytes).await?;
        let alt_text = alt_text.unwrap_or_default();
        let result = async {
            let txn = self.db.begin().await?;
            if is_primary {
                clear_primary_images(&txn, product.id).await?;
            }
            let image = product_image::ActiveModel {
                product_id: Set(product.id),
                image: Set(path.clone()),
                is_primary: Set(is_primary),
                alt_text: Set(alt_text),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            txn.commit().await?;
            Ok::<_, ServiceError>(image)
        }
        .await;

        match result {
            Ok(image) => {
                info!(product_id, image_id = image.id, mime = sniffed.mime_type, "image attached");
                Ok(image)
            }
            Err(err) => {
                error!(product_id, error = %err, "image row insert failed; removing stored file");
                if let Err(cleanup) = self.media.remove(&path).await {
                    warn!(path = %path, error = %cleanup, "orphaned media file");
                }
                Err(err)
            }
        }
    }

    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn attach_video(
        &self,
        product_id: i32,
        bytes: &[u8],
        is_primary: bool,
    ) -> Result<product_video::Model, ServiceError> {
        let product = self.get_product(product_id).await?;
        let sniffed = sniff_video(bytes)?;

        let existing = ProductVideo::find()
            .filter(product_video::Column::ProductId.eq(product.id))
            .count(&*self.db)
            .await?;
        if existing >= MAX_VIDEOS_PER_PRODUCT {
            return Err(ServiceError::MediaError(format!(
                "Product {} already has the maximum of {MAX_VIDEOS_PER_PRODUCT} videos",
                product.id
            )));
        }

        let path = self.media.save(MediaKind::Video, sniffed.extension, bytes).await?;
        let result = async {
            let txn = self.db.begin().await?;
            if is_primary {
                clear_primary_videos(&txn, product.id).await?;
            }
            let video = product_video::ActiveModel {
                product_id: Set(product.id),
                video: Set(path.clone()),
                is_primary: Set(is_primary),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            txn.commit().await?;
            Ok::<_, ServiceError>(video)
        }
        .await;

        match result {
            Ok(video) => {
                info!(product_id, video_id = video.id, "video attached");
                Ok(video)
            }
            Err(err) => {
                error!(product_id, error = %err, "video row insert failed; removing stored file");
                if let Err(cleanup) = self.media.remove(&path).await {
                    warn!(path = %path, error = %cleanup, "orphaned media file");
                }
                Err(err)
            }
        }
    }

    /// Flags one image as primary and clears the flag on the product's other images.
    #[instrument(skip(self))]
    pub async fn set_primary_image(
        &self,
        image_id: i32,
    ) -> Result<product_image::Model, ServiceError> {
        let image = ProductImage::find_by_id(image_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {image_id} not found")))?;

        let txn = self.db.begin().await?;
        clear_primary_images(&txn, image.product_id).await?;
        let mut model: product_image::ActiveModel = image.into();
        model.is_primary = Set(true);
        let image = model.update(&txn).await?;
        txn.commit().await?;
        Ok(image)
    }

    #[instrument(skip(self))]
    pub async fn set_primary_video(
        &self,
        video_id: i32,
    ) -> Result<product_video::Model, ServiceError> {
        let video = ProductVideo::find_by_id(video_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Video {video_id} not found")))?;

        let txn = self.db.begin().await?;
        clear_primary_videos(&txn, video.product_id).await?;
        let mut model: product_video::ActiveModel = video.into();
        model.is_primary = Set(true);
        let video = model.update(&txn).await?;
        txn.commit().await?;
        Ok(video)
    }

    /// Deletes the image row, then its file.
    #[instrument(skip(self))]
    pub async fn remove_image(&self, image_id: i32) -> Result<(), ServiceError> {
        let image = ProductImage::find_by_id(image_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Image {image_id} not found")))?;
        ProductImage::delete_by_id(image.id).exec(&*self.db).await?;
        self.media.remove(&image.image).await?;
        info!(image_id, product_id = image.product_id, "image removed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn remove_video(&self, video_id: i32) -> Result<(), ServiceError> {
        let video = ProductVideo::find_by_id(video_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Video {video_id} not found")))?;
        ProductVideo::delete_by_id(video.id).exec(&*self.db).await?;
        self.media.remove(&video.video).await?;
        info!(video_id, product_id = video.product_id, "video removed");
        Ok(())
    }
}

async fn clear_primary_images<C: ConnectionTrait>(db: &C, product_id: i32) -> Result<(), ServiceError> {
    ProductImage::update_many()
        .col_expr(product_image::Column::IsPrimary, Expr::value(false))
        .filter(product_image::Column::ProductId.eq(product_id))
        .filter(product_image::Column::IsPrimary.eq(true))
        .exec(db)
        .await?;
    Ok(())
}

async fn clear_primary_videos<C: ConnectionTrait>(db: &C, product_id: i32) -> Result<(), ServiceError> {
    ProductVideo::update_many()
        .col_expr(product_video::Column::IsPrimary, Expr::value(false))
        .filter(product_video::Column::ProductId.eq(product_id))
        .filter(product_video::Column::IsPrimary.eq(true))
        .exec(db)
        .await?;
    Ok(())
}
