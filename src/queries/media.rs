use std::collections::HashMap;

use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::entities::{product, product_image, product_video};

/// Images and videos attached to one product, already in display order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MediaSet {
    images: Vec<product_image::Model>,
    videos: Vec<product_video::Model>,
}

impl MediaSet {
    /// Builds a set from unordered rows. Primary items sort first, the rest by id.
    pub fn new(
        mut images: Vec<product_image::Model>,
        mut videos: Vec<product_video::Model>,
    ) -> Self {
        images.sort_by_key(|image| (!image.is_primary, image.id));
        videos.sort_by_key(|video| (!video.is_primary, video.id));
        Self { images, videos }
    }

    pub fn images(&self) -> &[product_image::Model] {
        &self.images
    }

    pub fn videos(&self) -> &[product_video::Model] {
        &self.videos
    }

    /// The flagged primary image, or the earliest inserted one when none is flagged.
    pub fn primary_image(&self) -> Option<&product_image::Model> {
        self.images.first()
    }

    pub fn primary_video(&self) -> Option<&product_video::Model> {
        self.videos.first()
    }

    pub fn counts(&self) -> MediaCounts {
        MediaCounts {
            images: self.images.len() as u64,
            videos: self.videos.len() as u64,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct MediaCounts {
    pub images: u64,
    pub videos: u64,
}

impl MediaCounts {
    pub fn has_multiple_images(&self) -> bool {
        self.images > 1
    }

    pub fn has_videos(&self) -> bool {
        self.videos > 0
    }

    pub fn has_multiple_media(&self) -> bool {
        self.images + self.videos > 1
    }
}

/// Whether a product's media was prefetched alongside it.
#[derive(Clone, Debug, PartialEq)]
pub enum ProductMedia {
    Loaded(MediaSet),
    Unloaded,
}

impl ProductMedia {
    pub fn as_loaded(&self) -> Option<&MediaSet> {
        match self {
            ProductMedia::Loaded(set) => Some(set),
            ProductMedia::Unloaded => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, ProductMedia::Loaded(_))
    }
}

/// A product row together with its media state.
#[derive(Clone, Debug, PartialEq)]
pub struct ProductWithMedia {
    pub product: product::Model,
    pub media: ProductMedia,
}

impl ProductWithMedia {
    pub fn unloaded(product: product::Model) -> Self {
        Self {
            product,
            media: ProductMedia::Unloaded,
        }
    }

    /// Counts from the prefetched set, or two COUNT queries when media was not loaded.
    pub async fn media_counts(&self, db: &DatabaseConnection) -> Result<MediaCounts, DbErr> {
        match &self.media {
            ProductMedia::Loaded(set) => Ok(set.counts()),
            ProductMedia::Unloaded => count_media(db, self.product.id).await,
        }
    }

    /// Returns the media set, fetching it for this one product if it was not prefetched.
    pub async fn resolve_media(self, db: &DatabaseConnection) -> Result<(product::Model, MediaSet), DbErr> {
        match self.media {
            ProductMedia::Loaded(set) => Ok((self.product, set)),
            ProductMedia::Unloaded => {
                let mut loaded = load_media(db, &[self.product.id]).await?;
                let set = loaded.remove(&self.product.id).unwrap_or_default();
                Ok((self.product, set))
            }
        }
    }
}

/// Loads media for every id in two queries, grouped per product.
#[instrument(skip(db, product_ids), fields(products = product_ids.len()))]
pub async fn load_media(
    db: &DatabaseConnection,
    product_ids: &[i32],
) -> Result<HashMap<i32, MediaSet>, DbErr> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let images = product_image::Entity::find()
        .filter(product_image::Column::ProductId.is_in(product_ids.iter().copied()))
        .order_by_desc(product_image::Column::IsPrimary)
        .order_by_asc(product_image::Column::Id)
        .all(db)
        .await?;

    let videos = product_video::Entity::find()
        .filter(product_video::Column::ProductId.is_in(product_ids.iter().copied()))
        .order_by_desc(product_video::Column::IsPrimary)
        .order_by_asc(product_video::Column::Id)
        .all(db)
        .await?;

    debug!(
        images = images.len(),
        videos = videos.len(),
        "prefetched product media"
    );

    let mut images_by_product: HashMap<i32, Vec<product_image::Model>> = HashMap::new();
    for image in images {
        images_by_product.entry(image.product_id).or_default().push(image);
    }
    let mut videos_by_product: HashMap<i32, Vec<product_video::Model>> = HashMap::new();
    for video in videos {
        videos_by_product.entry(video.product_id).or_default().push(video);
    }

    Ok(product_ids
        .iter()
        .map(|id| {
            let set = MediaSet::new(
                images_by_product.remove(id).unwrap_or_default(),
                videos_by_product.remove(id).unwrap_or_default(),
            );
            (*id, set)
        })
        .collect())
}

async fn count_media(db: &DatabaseConnection, product_id: i32) -> Result<MediaCounts, DbErr> {
    let images = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(product_id))
        .count(db)
        .await?;
    let videos = product_video::Entity::find()
        .filter(product_video::Column::ProductId.eq(product_id))
        .count(db)
        .await?;
    Ok(MediaCounts { images, videos })
}
