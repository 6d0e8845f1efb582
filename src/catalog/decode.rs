//! Image decoding seam.
//!
//! The catalog only needs three capabilities from an image file: its
//! full-resolution dimensions, a small preview, and (for the current image)
//! its full pixel data. [`ImageDecoder`] hides how that happens so tests and
//! front ends can substitute their own implementation.

use std::fmt;
use std::path::Path;

use crate::error::BoxmarkError;

/// Longest side of a catalog preview thumbnail, in pixels.
pub const PREVIEW_MAX_SIDE: u32 = 40;

/// Decoded RGBA8 pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Pixels {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA data, `width * height * 4` bytes.
    pub rgba: Vec<u8>,
}

impl fmt::Debug for Pixels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pixels")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Loads image metadata and pixels from disk.
pub trait ImageDecoder: Send + Sync {
    /// Full-resolution pixel dimensions `(width, height)`.
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), BoxmarkError>;

    /// A preview no larger than `max_side` on either axis.
    fn thumbnail(&self, path: &Path, max_side: u32) -> Result<Pixels, BoxmarkError>;

    /// Full-resolution RGBA pixels.
    fn decode(&self, path: &Path) -> Result<Pixels, BoxmarkError>;
}

/// Filesystem decoder: `imagesize` for headers, `image` for pixels.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsImageDecoder;

impl ImageDecoder for FsImageDecoder {
    fn dimensions(&self, path: &Path) -> Result<(u32, u32), BoxmarkError> {
        let size = imagesize::size(path).map_err(|source| BoxmarkError::ImageDimensionRead {
            path: path.to_path_buf(),
            source,
        })?;

        let width: u32 = size
            .width
            .try_into()
            .map_err(|_| BoxmarkError::DirectoryScan {
                path: path.to_path_buf(),
                message: format!("image width {} does not fit in u32", size.width),
            })?;

        let height: u32 = size
            .height
            .try_into()
            .map_err(|_| BoxmarkError::DirectoryScan {
                path: path.to_path_buf(),
                message: format!("image height {} does not fit in u32", size.height),
            })?;

        Ok((width, height))
    }

    fn thumbnail(&self, path: &Path, max_side: u32) -> Result<Pixels, BoxmarkError> {
        let rgba = open(path)?.thumbnail(max_side, max_side).to_rgba8();
        Ok(Pixels {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }

    fn decode(&self, path: &Path) -> Result<Pixels, BoxmarkError> {
        let rgba = open(path)?.to_rgba8();
        Ok(Pixels {
            width: rgba.width(),
            height: rgba.height(),
            rgba: rgba.into_raw(),
        })
    }
}

fn open(path: &Path) -> Result<image::DynamicImage, BoxmarkError> {
    image::open(path).map_err(|source| BoxmarkError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })
}
