use std::str::FromStr;

use rust_decimal::Decimal;
use sea_orm::{
    sea_query::IntoCondition,
    ActiveEnum, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::{IntoParams, ToSchema};

use super::media::{load_media, ProductMedia, ProductWithMedia};
use crate::{
    entities::{product, Gender, ProductCategory},
    errors::ServiceError,
};

/// Listing page size.
pub const PAGE_SIZE: u64 = 12;

/// Canned flag-based subsets of the catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProductSubset {
    Featured,
    NewArrivals,
    OnSale,
    BestSellers,
}

impl ProductSubset {
    fn column(self) -> product::Column {
        match self {
            ProductSubset::Featured => product::Column::IsFeatured,
            ProductSubset::NewArrivals => product::Column::IsNew,
            ProductSubset::OnSale => product::Column::IsOnSale,
            ProductSubset::BestSellers => product::Column::IsBestSeller,
        }
    }
}

/// Sort orders accepted by the listing. Anything else falls back to newest first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SortKey {
    #[serde(rename = "name")]
    NameAsc,
    #[serde(rename = "-name")]
    NameDesc,
    #[serde(rename = "price")]
    PriceAsc,
    #[serde(rename = "-price")]
    PriceDesc,
    #[serde(rename = "created_at")]
    CreatedAtAsc,
    #[default]
    #[serde(rename = "-created_at")]
    CreatedAtDesc,
    #[serde(rename = "average_rating")]
    RatingAsc,
    #[serde(rename = "-average_rating")]
    RatingDesc,
    #[serde(rename = "review_count")]
    ReviewCountAsc,
    #[serde(rename = "-review_count")]
    ReviewCountDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 10] = [
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::PriceAsc,
        SortKey::PriceDesc,
        SortKey::CreatedAtAsc,
        SortKey::CreatedAtDesc,
        SortKey::RatingAsc,
        SortKey::RatingDesc,
        SortKey::ReviewCountAsc,
        SortKey::ReviewCountDesc,
    ];

    /// Resolves a raw `sort` parameter. Missing or unknown values are not an error.
    pub fn from_param(raw: Option<&str>) -> Self {
        raw.and_then(|value| Self::ALL.into_iter().find(|key| key.as_param() == value))
            .unwrap_or_default()
    }

    pub fn as_param(self) -> &'static str {
        match self {
            SortKey::NameAsc => "name",
            SortKey::NameDesc => "-name",
            SortKey::PriceAsc => "price",
            SortKey::PriceDesc => "-price",
            SortKey::CreatedAtAsc => "created_at",
            SortKey::CreatedAtDesc => "-created_at",
            SortKey::RatingAsc => "average_rating",
            SortKey::RatingDesc => "-average_rating",
            SortKey::ReviewCountAsc => "review_count",
            SortKey::ReviewCountDesc => "-review_count",
        }
    }

    fn column_and_order(self) -> (product::Column, Order) {
        match self {
            SortKey::NameAsc => (product::Column::Name, Order::Asc),
            SortKey::NameDesc => (product::Column::Name, Order::Desc),
            SortKey::PriceAsc => (product::Column::Price, Order::Asc),
            SortKey::PriceDesc => (product::Column::Price, Order::Desc),
            SortKey::CreatedAtAsc => (product::Column::CreatedAt, Order::Asc),
            SortKey::CreatedAtDesc => (product::Column::CreatedAt, Order::Desc),
            SortKey::RatingAsc => (product::Column::AverageRating, Order::Asc),
            SortKey::RatingDesc => (product::Column::AverageRating, Order::Desc),
            SortKey::ReviewCountAsc => (product::Column::ReviewCount, Order::Asc),
            SortKey::ReviewCountDesc => (product::Column::ReviewCount, Order::Desc),
        }
    }
}

/// Raw listing query string, as submitted by the filter controls.
#[derive(Clone, Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub gender: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub featured: Option<String>,
    pub new: Option<String>,
    pub sale: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

fn supplied(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Independent, conjunctive listing criteria. `None`/`false` imposes no constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub brand: Option<String>,
    pub gender: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub featured: bool,
    pub new: bool,
    pub sale: bool,
}

impl ProductFilter {
    /// Empty parameters are treated as absent; prices that do not parse are ignored.
    pub fn from_params(params: &ListParams) -> Self {
        let price = |raw: &Option<String>| {
            supplied(raw).and_then(|value| Decimal::from_str(value.trim()).ok())
        };

        Self {
            category: supplied(&params.category).map(str::to_string),
            brand: supplied(&params.brand).map(str::to_string),
            gender: supplied(&params.gender).map(str::to_string),
            min_price: price(&params.min_price),
            max_price: price(&params.max_price),
            featured: supplied(&params.featured).is_some(),
            new: supplied(&params.new).is_some(),
            sale: supplied(&params.sale).is_some(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// AND of every supplied criterion.
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();
        if let Some(category) = &self.category {
            condition = condition.add(product::Column::Category.eq(category.as_str()));
        }
        if let Some(brand) = &self.brand {
            condition = condition.add(product::Column::Brand.eq(brand.as_str()));
        }
        if let Some(gender) = &self.gender {
            condition = condition.add(product::Column::Gender.eq(gender.as_str()));
        }
        if let Some(min) = self.min_price {
            condition = condition.add(product::Column::Price.gte(min));
        }
        if let Some(max) = self.max_price {
            condition = condition.add(product::Column::Price.lte(max));
        }
        if self.featured {
            condition = condition.add(product::Column::IsFeatured.eq(true));
        }
        if self.new {
            condition = condition.add(product::Column::IsNew.eq(true));
        }
        if self.sale {
            condition = condition.add(product::Column::IsOnSale.eq(true));
        }
        condition
    }
}

/// Requested page of a listing, 1-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageRequest {
    Number(u64),
    Last,
}

impl PageRequest {
    /// A missing page means the first one; anything that is not a positive number or
    /// `last` is rejected.
    pub fn parse(raw: Option<&str>) -> Result<Self, ServiceError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(PageRequest::Number(1)),
            Some("last") => Ok(PageRequest::Last),
            Some(value) => match value.parse::<u64>() {
                Ok(number) if number >= 1 => Ok(PageRequest::Number(number)),
                _ => Err(ServiceError::NotFound(format!("Invalid page ({value})"))),
            },
        }
    }
}

/// Number of pages for `total` items. An empty listing still has one (empty) page.
/// A zero page size is treated as one item per page.
pub fn page_count(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size.max(1)).max(1)
}

/// One page of a listing plus the numbers needed to render pager controls.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Composable product query. Every instance starts from the non-archived scope.
#[derive(Clone, Debug)]
pub struct ProductQuery {
    select: Select<product::Entity>,
    with_media: bool,
    sorted: bool,
}

impl ProductQuery {
    /// Default scope: non-archived products only.
    pub fn active() -> Self {
        Self {
            select: product::Entity::find().filter(product::Column::IsArchived.eq(false)),
            with_media: false,
            sorted: false,
        }
    }

    /// Default scope with images, videos and their counts attached to every row.
    pub fn with_media() -> Self {
        Self::active().prefetch_media()
    }

    pub fn featured() -> Self {
        Self::with_media().subset(ProductSubset::Featured)
    }

    pub fn new_arrivals() -> Self {
        Self::with_media().subset(ProductSubset::NewArrivals)
    }

    pub fn on_sale() -> Self {
        Self::with_media().subset(ProductSubset::OnSale)
    }

    pub fn best_sellers() -> Self {
        Self::with_media().subset(ProductSubset::BestSellers)
    }

    pub fn prefetch_media(mut self) -> Self {
        self.with_media = true;
        self
    }

    pub fn subset(self, subset: ProductSubset) -> Self {
        self.where_(subset.column().eq(true))
    }

    pub fn filter(self, filter: &ProductFilter) -> Self {
        self.where_(filter.condition())
    }

    pub fn in_category(self, category: ProductCategory) -> Self {
        self.where_(product::Column::Category.eq(category.to_value()))
    }

    pub fn price_between(self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.filter(&ProductFilter {
            min_price: min,
            max_price: max,
            ..Default::default()
        })
    }

    pub fn excluding(self, product_id: i32) -> Self {
        self.where_(product::Column::Id.ne(product_id))
    }

    fn where_(mut self, condition: impl IntoCondition) -> Self {
        self.select = self.select.filter(condition);
        self
    }

    /// Orders by `key`, breaking ties on id in the same direction.
    pub fn sort(mut self, key: SortKey) -> Self {
        let (column, order) = key.column_and_order();
        self.select = self
            .select
            .order_by(column, order.clone())
            .order_by(product::Column::Id, order);
        self.sorted = true;
        self
    }

    /// Highest discount first.
    pub fn sort_by_discount(mut self) -> Self {
        self.select = self
            .select
            .order_by_desc(product::Column::Discount)
            .order_by_desc(product::Column::Id);
        self.sorted = true;
        self
    }

    fn finish(self) -> (Select<product::Entity>, bool) {
        let query = if self.sorted {
            self
        } else {
            self.sort(SortKey::default())
        };
        (query.select, query.with_media)
    }

    #[instrument(skip(self, db))]
    pub async fn count(&self, db: &DatabaseConnection) -> Result<u64, ServiceError> {
        Ok(self.select.clone().count(db).await?)
    }

    pub async fn fetch(self, db: &DatabaseConnection) -> Result<Vec<ProductWithMedia>, ServiceError> {
        let (select, with_media) = self.finish();
        let products = select.all(db).await?;
        attach_media(db, products, with_media).await
    }

    pub async fn fetch_limit(
        self,
        db: &DatabaseConnection,
        limit: u64,
    ) -> Result<Vec<ProductWithMedia>, ServiceError> {
        let (select, with_media) = self.finish();
        let products = select.limit(limit).all(db).await?;
        attach_media(db, products, with_media).await
    }

    /// Fetches one page. Pages past the end are NotFound, except page 1 of an empty listing.
    #[instrument(skip(self, db))]
    pub async fn fetch_page(
        self,
        db: &DatabaseConnection,
        request: PageRequest,
        page_size: u64,
    ) -> Result<Page<ProductWithMedia>, ServiceError> {
        let page_size = page_size.max(1);
        let total_items = self.count(db).await?;
        let total_pages = page_count(total_items, page_size);
        let number = match request {
            PageRequest::Number(number) => number,
            PageRequest::Last => total_pages,
        };
        if number == 0 || number > total_pages {
            return Err(ServiceError::NotFound(format!(
                "Page {number} is out of range (1..={total_pages})"
            )));
        }

        let (select, with_media) = self.finish();
        let products = select
            .offset((number - 1) * page_size)
            .limit(page_size)
            .all(db)
            .await?;
        debug!(page = number, rows = products.len(), "fetched product page");

        Ok(Page {
            items: attach_media(db, products, with_media).await?,
            number,
            page_size,
            total_items,
            total_pages,
        })
    }

    pub async fn find_by_id(
        self,
        db: &DatabaseConnection,
        product_id: i32,
    ) -> Result<Option<ProductWithMedia>, ServiceError> {
        let with_media = self.with_media;
        let product = self
            .select
            .filter(product::Column::Id.eq(product_id))
            .one(db)
            .await?;
        Ok(attach_media(db, product.into_iter().collect(), with_media)
            .await?
            .pop())
    }

    /// Sorted distinct values of a classifier column within this scope.
    pub async fn distinct_values(
        &self,
        db: &DatabaseConnection,
        column: product::Column,
    ) -> Result<Vec<String>, ServiceError> {
        let mut values: Vec<String> = self
            .select
            .clone()
            .select_only()
            .column(column)
            .distinct()
            .into_tuple::<String>()
            .all(db)
            .await?;
        values.sort();
        Ok(values)
    }

    pub async fn distinct_categories(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Vec<ProductCategory>, ServiceError> {
        let values = self.distinct_values(db, product::Column::Category).await?;
        Ok(values
            .iter()
            .filter_map(|v| ProductCategory::try_from_value(v).ok())
            .collect())
    }

    pub async fn distinct_genders(
        &self,
        db: &DatabaseConnection,
    ) -> Result<Vec<Gender>, ServiceError> {
        let values = self.distinct_values(db, product::Column::Gender).await?;
        Ok(values
            .iter()
            .filter_map(|v| Gender::try_from_value(v).ok())
            .collect())
    }

    pub async fn distinct_brands(&self, db: &DatabaseConnection) -> Result<Vec<String>, ServiceError> {
        self.distinct_values(db, product::Column::Brand).await
    }

    #[cfg(test)]
    fn sql(&self) -> String {
        use sea_orm::{DbBackend, QueryTrait};
        self.select.build(DbBackend::Postgres).to_string()
    }
}

async fn attach_media(
    db: &DatabaseConnection,
    products: Vec<product::Model>,
    with_media: bool,
) -> Result<Vec<ProductWithMedia>, ServiceError> {
    if !with_media {
        return Ok(products.into_iter().map(ProductWithMedia::unloaded).collect());
    }

    let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
    let mut media = load_media(db, &ids).await?;
    Ok(products
        .into_iter()
        .map(|product| {
            let set = media.remove(&product.id).unwrap_or_default();
            ProductWithMedia {
                product,
                media: ProductMedia::Loaded(set),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sort_key_round_trips_through_allow_list() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::from_param(Some(key.as_param())), key);
        }
    }

    #[test]
    fn unknown_sort_falls_back_to_newest_first() {
        assert_eq!(SortKey::from_param(Some("stock")), SortKey::CreatedAtDesc);
        assert_eq!(SortKey::from_param(Some("")), SortKey::CreatedAtDesc);
        assert_eq!(SortKey::from_param(Some("Name")), SortKey::CreatedAtDesc);
        assert_eq!(SortKey::from_param(None), SortKey::CreatedAtDesc);
    }

    #[test]
    fn empty_and_unparsable_params_impose_nothing() {
        let params = ListParams {
            category: Some(String::new()),
            min_price: Some("cheap".into()),
            max_price: Some("".into()),
            featured: Some(String::new()),
            ..Default::default()
        };
        assert!(ProductFilter::from_params(&params).is_empty());
    }

    #[test]
    fn supplied_params_become_criteria() {
        let params = ListParams {
            category: Some("women".into()),
            brand: Some("Acme".into()),
            min_price: Some(" 10.50 ".into()),
            max_price: Some("99".into()),
            sale: Some("1".into()),
            ..Default::default()
        };
        let filter = ProductFilter::from_params(&params);
        assert_eq!(filter.category.as_deref(), Some("women"));
        assert_eq!(filter.brand.as_deref(), Some("Acme"));
        assert_eq!(filter.min_price, Some(dec!(10.50)));
        assert_eq!(filter.max_price, Some(dec!(99)));
        assert!(filter.sale);
        assert!(!filter.featured);
    }

    #[test]
    fn page_request_parsing() {
        assert_eq!(PageRequest::parse(None).unwrap(), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("3")).unwrap(), PageRequest::Number(3));
        assert_eq!(PageRequest::parse(Some("last")).unwrap(), PageRequest::Last);
        assert!(PageRequest::parse(Some("0")).unwrap_err().is_not_found());
        assert!(PageRequest::parse(Some("-2")).unwrap_err().is_not_found());
        assert!(PageRequest::parse(Some("two")).unwrap_err().is_not_found());
    }

    #[test]
    fn page_count_keeps_one_empty_page() {
        assert_eq!(page_count(0, PAGE_SIZE), 1);
        assert_eq!(page_count(12, PAGE_SIZE), 1);
        assert_eq!(page_count(13, PAGE_SIZE), 2);
        assert_eq!(page_count(30, PAGE_SIZE), 3);
        assert_eq!(page_count(5, 0), 5);
        assert_eq!(page_count(0, 0), 1);
    }

    #[test]
    fn every_query_carries_the_archived_predicate() {
        let queries = [
            ProductQuery::active(),
            ProductQuery::with_media(),
            ProductQuery::featured(),
            ProductQuery::new_arrivals(),
            ProductQuery::on_sale(),
            ProductQuery::best_sellers(),
            ProductQuery::active().filter(&ProductFilter {
                brand: Some("Acme".into()),
                ..Default::default()
            }),
        ];
        for query in queries {
            assert!(
                query.sql().contains(r#""is_archived" = FALSE"#),
                "missing archived predicate: {}",
                query.sql()
            );
        }
    }
}
