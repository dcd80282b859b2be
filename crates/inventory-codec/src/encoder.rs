//! Photo encoding
//!
//! Encoding is the only fallible step of the codec and its failures are
//! absorbed per photo: a photo that cannot be encoded is logged and dropped,
//! the rest of the room is still converted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use inventory_model::{EncodedImage, ImageRef};
use std::path::PathBuf;

/// Photo encoding failure
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    /// The referenced photo could not be read
    #[error("cannot read image {image}: {source}")]
    Io {
        image: String,
        #[source]
        source: std::io::Error,
    },

    /// Photo exceeds the configured size limit
    #[error("image {image} is {size} bytes (limit {limit})")]
    TooLarge { image: String, size: u64, limit: u64 },

    /// Reference scheme the encoder cannot resolve
    #[error("unsupported image reference: {0}")]
    Unsupported(String),
}

/// Turns a local photo reference into its text form
///
/// Implementations must be pure with respect to engine state; they are
/// called from blocking worker threads.
pub trait ImageEncoder: Send + Sync {
    /// Encode one photo
    ///
    /// # Errors
    /// Any `EncodingError`; callers drop the photo.
    fn encode(&self, image: &ImageRef) -> Result<EncodedImage, EncodingError>;
}

impl<F> ImageEncoder for F
where
    F: Fn(&ImageRef) -> Result<EncodedImage, EncodingError> + Send + Sync,
{
    fn encode(&self, image: &ImageRef) -> Result<EncodedImage, EncodingError> {
        self(image)
    }
}

/// Encode every picture, dropping (and logging) the ones that fail
#[must_use]
pub fn encode_pictures(pictures: &[ImageRef], encoder: &dyn ImageEncoder) -> Vec<EncodedImage> {
    pictures
        .iter()
        .filter_map(|image| match encoder.encode(image) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!(image = %image, error = %e, "dropping photo that failed to encode");
                None
            }
        })
        .collect()
}

/// Reads photos from the local filesystem and encodes them as standard base64
///
/// Accepts plain paths and `file://` URIs.
#[derive(Debug, Clone, Default)]
pub struct Base64FileEncoder {
    max_bytes: Option<u64>,
}

impl Base64FileEncoder {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject photos larger than `limit` bytes
    #[inline]
    #[must_use]
    pub fn with_max_bytes(mut self, limit: u64) -> Self {
        self.max_bytes = Some(limit);
        self
    }

    fn resolve(image: &ImageRef) -> Result<PathBuf, EncodingError> {
        let raw = image.as_str();
        if let Some(path) = raw.strip_prefix("file://") {
            return Ok(PathBuf::from(path));
        }
        if raw.is_empty() || raw.contains("://") {
            return Err(EncodingError::Unsupported(raw.to_string()));
        }
        Ok(PathBuf::from(raw))
    }
}

impl ImageEncoder for Base64FileEncoder {
    fn encode(&self, image: &ImageRef) -> Result<EncodedImage, EncodingError> {
        let path = Self::resolve(image)?;
        let io_err = |source| EncodingError::Io {
            image: image.to_string(),
            source,
        };

        if let Some(limit) = self.max_bytes {
            let size = std::fs::metadata(&path).map_err(io_err)?.len();
            if size > limit {
                return Err(EncodingError::TooLarge {
                    image: image.to_string(),
                    size,
                    limit,
                });
            }
        }

        let bytes = std::fs::read(&path).map_err(io_err)?;
        Ok(EncodedImage::new(STANDARD.encode(bytes)))
    }
}
