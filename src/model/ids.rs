//! Newtype identifier for images tracked by a document.
//!
//! An image is identified by its filename (last path component). Wrapping it
//! keeps filenames and arbitrary label/description strings from being mixed up.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::path::Path;

/// The identity of an image: its filename, e.g. `img1.jpg`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Creates a new ImageId from a filename.
    #[inline]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self(file_name.into())
    }

    /// Derives the id from a path's final component.
    ///
    /// Returns `None` for paths without a UTF-8 file name.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|name| name.to_str())
            .map(Self::new)
    }

    /// Returns the underlying filename.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageId({:?})", self.0)
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ImageId {
    fn from(name: &str) -> Self {
        ImageId::new(name)
    }
}

impl From<String> for ImageId {
    fn from(name: String) -> Self {
        ImageId::new(name)
    }
}

impl Borrow<str> for ImageId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
