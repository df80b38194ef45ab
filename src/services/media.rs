use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, ImageReader};
use metrics::counter;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Kind of uploaded product asset. Each kind lives in its own directory under the media root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn directory(self) -> &'static str {
        match self {
            MediaKind::Image => "product_images",
            MediaKind::Video => "product_videos",
        }
    }
}

/// Raster formats accepted for product images
const ALLOWED_IMAGE_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Content type detected from the uploaded bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SniffedType {
    pub mime_type: &'static str,
    pub extension: &'static str,
}

/// Detects an image format from its magic bytes, then decodes the header so that
/// truncated or forged files are rejected. Declared file names are never trusted.
pub fn sniff_image(bytes: &[u8]) -> Result<SniffedType, ServiceError> {
    let sniffed = match infer::get(bytes) {
        Some(kind) if ALLOWED_IMAGE_TYPES.contains(&kind.mime_type()) => SniffedType {
            mime_type: kind.mime_type(),
            extension: kind.extension(),
        },
        Some(kind) => {
            counter!("storefront.media.rejected", 1);
            return Err(ServiceError::MediaError(format!(
                "Unsupported image format {}; expected JPEG, PNG, WebP or GIF",
                kind.mime_type()
            )));
        }
        None => {
            counter!("storefront.media.rejected", 1);
            return Err(ServiceError::MediaError(
                "Unrecognized image content; expected JPEG, PNG, WebP or GIF".to_string(),
            ));
        }
    };

    let dimensions = ImageFormat::from_mime_type(sniffed.mime_type)
        .ok_or_else(|| ServiceError::MediaError("Invalid image file".to_string()))
        .and_then(|format| {
            ImageReader::with_format(Cursor::new(bytes), format)
                .into_dimensions()
                .map_err(|err| {
                    debug!(error = %err, mime_type = sniffed.mime_type, "image header did not decode");
                    ServiceError::MediaError("Invalid image file".to_string())
                })
        });

    match dimensions {
        Ok((width, height)) => {
            debug!(width, height, mime_type = sniffed.mime_type, "image accepted");
            Ok(sniffed)
        }
        Err(err) => {
            counter!("storefront.media.rejected", 1);
            Err(err)
        }
    }
}

pub fn sniff_video(bytes: &[u8]) -> Result<SniffedType, ServiceError> {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Video => Ok(SniffedType {
            mime_type: kind.mime_type(),
            extension: kind.extension(),
        }),
        _ => {
            counter!("storefront.media.rejected", 1);
            Err(ServiceError::MediaError(
                "Unrecognized video content".to_string(),
            ))
        }
    }
}

/// Filesystem store for uploaded product media.
///
/// Stored paths are relative to the root, e.g. `product_images/<uuid>.jpg`, and are what
/// the media rows persist.
#[derive(Clone, Debug)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn absolute_path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Writes `bytes` under a generated name and returns the relative path.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(
        &self,
        kind: MediaKind,
        extension: &str,
        bytes: &[u8],
    ) -> Result<String, ServiceError> {
        let directory = self.root.join(kind.directory());
        tokio::fs::create_dir_all(&directory).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(directory.join(&file_name), bytes).await?;

        let relative = format!("{}/{}", kind.directory(), file_name);
        info!(path = %relative, "stored media file");
        Ok(relative)
    }

    /// Deletes a stored file. A file that is already gone is not an error.
    #[instrument(skip(self))]
    pub async fn remove(&self, relative: &str) -> Result<(), ServiceError> {
        if relative.is_empty() || Path::new(relative).is_absolute() || relative.contains("..") {
            warn!(path = %relative, "refusing to remove media outside the store");
            return Err(ServiceError::MediaError(format!(
                "Invalid media path {relative}"
            )));
        }

        match tokio::fs::remove_file(self.absolute_path(relative)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %relative, "media file already removed");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
