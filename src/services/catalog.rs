use std::sync::Arc;

use sea_orm::{ActiveEnum, DatabaseConnection};
use serde::Serialize;
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    entities::{product, product_image, product_video, Color, Gender, ProductCategory, Size},
    errors::ServiceError,
    queries::{
        ListParams, MediaCounts, Page, PageRequest, ProductFilter, ProductQuery, ProductSubset,
        ProductWithMedia, SortKey, PAGE_SIZE,
    },
};

const HOME_FEATURED_LIMIT: u64 = 6;
const HOME_SECTION_LIMIT: u64 = 4;
const RELATED_PRODUCTS_LIMIT: u64 = 4;

/// A value/label pair for rendering a select control.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChoiceOption {
    pub value: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    fn category(category: ProductCategory) -> Self {
        Self::new(category.to_value(), category.label())
    }

    fn gender(gender: Gender) -> Self {
        Self::new(gender.to_value(), gender.label())
    }
}

/// Product summary used by every listing: the row plus its effective primary image.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ProductCard {
    #[schema(value_type = Object)]
    pub product: product::Model,
    #[schema(value_type = Option<Object>)]
    pub primary_image: Option<product_image::Model>,
    pub image_count: u64,
    pub video_count: u64,
    pub has_multiple_media: bool,
}

impl ProductCard {
    /// Builds a card from prefetched media, or queries the product's media when it
    /// was not prefetched.
    pub async fn build(
        db: &DatabaseConnection,
        item: ProductWithMedia,
    ) -> Result<Self, ServiceError> {
        let (product, set) = item.resolve_media(db).await?;
        let counts = set.counts();
        Ok(Self {
            primary_image: set.primary_image().cloned(),
            image_count: counts.images,
            video_count: counts.videos,
            has_multiple_media: counts.has_multiple_media(),
            product,
        })
    }
}

async fn cards(
    db: &DatabaseConnection,
    items: Vec<ProductWithMedia>,
) -> Result<Vec<ProductCard>, ServiceError> {
    let mut cards = Vec::with_capacity(items.len());
    for item in items {
        cards.push(ProductCard::build(db, item).await?);
    }
    Ok(cards)
}

/// Catalog-wide counts over non-archived products.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogStats {
    pub total_products: u64,
    pub featured_count: u64,
    pub new_arrivals_count: u64,
    pub on_sale_count: u64,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct HomeContext {
    pub featured_products: Vec<ProductCard>,
    pub new_arrivals: Vec<ProductCard>,
    pub best_sellers: Vec<ProductCard>,
    pub on_sale: Vec<ProductCard>,
    #[serde(flatten)]
    pub stats: CatalogStats,
}

/// Filter values echoed back so the listing controls re-render with the user's input.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ActiveFilters {
    pub current_category: String,
    pub current_brand: String,
    pub current_gender: String,
    pub current_min_price: String,
    pub current_max_price: String,
    pub featured: bool,
    pub new: bool,
    pub sale: bool,
    pub current_sort: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct FilterOptions {
    pub categories: Vec<ChoiceOption>,
    pub brands: Vec<String>,
    pub genders: Vec<ChoiceOption>,
    pub sort_options: Vec<String>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PageInfo {
    pub number: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> From<&Page<T>> for PageInfo {
    fn from(page: &Page<T>) -> Self {
        Self {
            number: page.number,
            page_size: page.page_size,
            total_items: page.total_items,
            total_pages: page.total_pages,
            has_next: page.has_next(),
            has_previous: page.has_previous(),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct ListContext {
    pub products: Vec<ProductCard>,
    pub page: PageInfo,
    #[serde(flatten)]
    pub filters: ActiveFilters,
    pub filter_options: FilterOptions,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct DetailContext {
    #[schema(value_type = Object)]
    pub product: product::Model,
    pub category_label: String,
    pub gender_label: String,
    pub season_label: Option<String>,
    pub sizes: Vec<Size>,
    pub colors: Vec<Color>,
    pub tags: Vec<String>,
    #[schema(value_type = Vec<Object>)]
    pub images: Vec<product_image::Model>,
    #[schema(value_type = Vec<Object>)]
    pub videos: Vec<product_video::Model>,
    #[schema(value_type = Option<Object>)]
    pub primary_image: Option<product_image::Model>,
    #[schema(value_type = Option<Object>)]
    pub primary_video: Option<product_video::Model>,
    pub image_count: u64,
    pub video_count: u64,
    pub has_multiple_images: bool,
    pub has_videos: bool,
    pub related_products: Vec<ProductCard>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct AboutContext {
    pub total_products: u64,
    pub total_categories: u64,
    pub featured_products_count: u64,
}

/// Assembles the read-only storefront pages from the query layer.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<CatalogStats, ServiceError> {
        let db = &*self.db;
        Ok(CatalogStats {
            total_products: ProductQuery::active().count(db).await?,
            featured_count: ProductQuery::active()
                .subset(ProductSubset::Featured)
                .count(db)
                .await?,
            new_arrivals_count: ProductQuery::active()
                .subset(ProductSubset::NewArrivals)
                .count(db)
                .await?,
            on_sale_count: ProductQuery::active()
                .subset(ProductSubset::OnSale)
                .count(db)
                .await?,
        })
    }

    #[instrument(skip(self))]
    pub async fn home(&self) -> Result<HomeContext, ServiceError> {
        let db = &*self.db;

        let featured = ProductQuery::featured()
            .sort(SortKey::CreatedAtDesc)
            .fetch_limit(db, HOME_FEATURED_LIMIT)
            .await?;
        let new_arrivals = ProductQuery::new_arrivals()
            .sort(SortKey::CreatedAtDesc)
            .fetch_limit(db, HOME_SECTION_LIMIT)
            .await?;
        let best_sellers = ProductQuery::best_sellers()
            .sort(SortKey::ReviewCountDesc)
            .fetch_limit(db, HOME_SECTION_LIMIT)
            .await?;
        let on_sale = ProductQuery::on_sale()
            .sort_by_discount()
            .fetch_limit(db, HOME_SECTION_LIMIT)
            .await?;

        Ok(HomeContext {
            featured_products: cards(db, featured).await?,
            new_arrivals: cards(db, new_arrivals).await?,
            best_sellers: cards(db, best_sellers).await?,
            on_sale: cards(db, on_sale).await?,
            stats: self.stats().await?,
        })
    }

    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &ListParams) -> Result<ListContext, ServiceError> {
        let db = &*self.db;
        let filter = ProductFilter::from_params(params);
        let sort = SortKey::from_param(params.sort.as_deref());
        let page_request = PageRequest::parse(params.page.as_deref())?;

        let page = ProductQuery::with_media()
            .filter(&filter)
            .sort(sort)
            .fetch_page(db, page_request, PAGE_SIZE)
            .await?;
        let page_info = PageInfo::from(&page);

        let scope = ProductQuery::active();
        let filter_options = FilterOptions {
            categories: scope
                .distinct_categories(db)
                .await?
                .into_iter()
                .map(ChoiceOption::category)
                .collect(),
            brands: scope.distinct_brands(db).await?,
            genders: scope
                .distinct_genders(db)
                .await?
                .into_iter()
                .map(ChoiceOption::gender)
                .collect(),
            sort_options: SortKey::ALL
                .iter()
                .map(|key| key.as_param().to_string())
                .collect(),
        };

        let echo = |value: &Option<String>| value.clone().unwrap_or_default();
        let flag = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        let filters = ActiveFilters {
            current_category: echo(&params.category),
            current_brand: echo(&params.brand),
            current_gender: echo(&params.gender),
            current_min_price: echo(&params.min_price),
            current_max_price: echo(&params.max_price),
            featured: flag(&params.featured),
            new: flag(&params.new),
            sale: flag(&params.sale),
            current_sort: sort.as_param().to_string(),
        };

        info!(
            matches = page_info.total_items,
            page = page_info.number,
            filtered = !filter.is_empty(),
            "product listing"
        );

        Ok(ListContext {
            products: cards(db, page.items).await?,
            page: page_info,
            filters,
            filter_options,
        })
    }

    #[instrument(skip(self))]
    pub async fn detail(&self, product_id: i32) -> Result<DetailContext, ServiceError> {
        let db = &*self.db;

        let item = ProductQuery::with_media()
            .find_by_id(db, product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let counts: MediaCounts = item.media_counts(db).await?;
        let (product, media) = item.resolve_media(db).await?;

        let related = ProductQuery::with_media()
            .in_category(product.category)
            .excluding(product.id)
            .sort(SortKey::CreatedAtDesc)
            .fetch_limit(db, RELATED_PRODUCTS_LIMIT)
            .await?;

        Ok(DetailContext {
            category_label: product.category.label().to_string(),
            gender_label: product.gender.label().to_string(),
            season_label: product.season.map(|season| season.label().to_string()),
            sizes: product.sizes(),
            colors: product.colors(),
            tags: product.tag_list(),
            primary_image: media.primary_image().cloned(),
            primary_video: media.primary_video().cloned(),
            images: media.images().to_vec(),
            videos: media.videos().to_vec(),
            image_count: counts.images,
            video_count: counts.videos,
            has_multiple_images: counts.has_multiple_images(),
            has_videos: counts.has_videos(),
            related_products: cards(db, related).await?,
            product,
        })
    }

    #[instrument(skip(self))]
    pub async fn about(&self) -> Result<AboutContext, ServiceError> {
        let db = &*self.db;
        let scope = ProductQuery::active();
        Ok(AboutContext {
            total_products: scope.count(db).await?,
            total_categories: scope.distinct_categories(db).await?.len() as u64,
            featured_products_count: scope
                .clone()
                .subset(ProductSubset::Featured)
                .count(db)
                .await?,
        })
    }
}
