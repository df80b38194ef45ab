//! Read-side query layer for the storefront catalog.
//!
//! Every product query is built from [`ProductQuery::active`], which always applies the
//! non-archived predicate. Media prefetching is explicit: rows come back as
//! [`ProductMedia::Loaded`] or [`ProductMedia::Unloaded`].

pub mod media;
pub mod product_queries;

pub use media::{load_media, MediaCounts, MediaSet, ProductMedia, ProductWithMedia};
pub use product_queries::{
    page_count, ListParams, Page, PageRequest, ProductFilter, ProductQuery, ProductSubset,
    SortKey, PAGE_SIZE,
};
