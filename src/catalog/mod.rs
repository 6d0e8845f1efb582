//! Image catalog: the images on disk next to a document.
//!
//! The catalog is a transient, disk-derived view. [`ImageCatalog::refresh`]
//! reconciles it (and the document's annotation store) with the files that
//! are actually present, and tracks which image is currently selected.
//!
//! Every operation that can change what the user looks at returns an
//! explicit [`CatalogEvent`]; nothing is recomputed behind the caller's back.
//!
//! # Reconciliation
//!
//! - Files on disk that the store does not know get an empty record.
//! - Records whose file disappeared are dropped, annotations included.
//! - Refresh is idempotent: cataloged files are neither re-decoded nor
//!   duplicated while their size and modification time stay the same. A
//!   file that changed on disk is decoded again. Entries are kept sorted by
//!   filename.

mod decode;
mod loader;
pub mod scan;

pub use decode::{FsImageDecoder, ImageDecoder, Pixels, PREVIEW_MAX_SIDE};
pub use loader::{CurrentImageLoader, LoadResult};

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::BoxmarkError;
use crate::model::{AnnotationStore, Document, ImageId};

/// Size and modification time of a file, used to notice replaced images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileStamp {
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl FileStamp {
    /// Reads the stamp of `path`; `None` if its metadata is unavailable.
    pub fn read(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Some(Self {
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

/// A cataloged image with decoded metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogImage {
    /// Filename; joins the entry to its annotation record.
    pub id: ImageId,
    pub path: PathBuf,
    /// Location relative to the catalog directory.
    pub description: String,
    /// Small preview, `None` if the file could not be decoded.
    pub preview: Option<Pixels>,
    /// File stamp taken before decoding.
    pub stamp: Option<FileStamp>,
    /// Full-resolution width; 0 if the file could not be decoded.
    pub pixel_width: u32,
    /// Full-resolution height; 0 if the file could not be decoded.
    pub pixel_height: u32,
}

impl CatalogImage {
    /// Decodes dimensions and preview for a file.
    ///
    /// Decode failures are not errors: the entry gets zero dimensions and no
    /// preview, and is reported as unusable.
    pub fn load(path: &Path, root: &Path, decoder: &dyn ImageDecoder) -> Option<Self> {
        let id = ImageId::from_path(path)?;
        let stamp = FileStamp::read(path);
        let decoded = decoder.dimensions(path).and_then(|(width, height)| {
            let preview = decoder.thumbnail(path, PREVIEW_MAX_SIDE)?;
            Ok((width, height, preview))
        });

        let (pixel_width, pixel_height, preview) = match decoded {
            Ok((width, height, preview)) => (width, height, Some(preview)),
            Err(err) => {
                log::warn!("Could not decode {}: {}", path.display(), err);
                (0, 0, None)
            }
        };

        Some(Self {
            id,
            path: path.to_path_buf(),
            description: scan::describe(root, path),
            preview,
            stamp,
            pixel_width,
            pixel_height,
        })
    }

    /// True if the file on disk no longer matches the stamp taken at load.
    pub fn is_stale(&self) -> bool {
        self.stamp.is_none() || FileStamp::read(&self.path) != self.stamp
    }

    /// True when the real dimensions are known, i.e. the image can be exported.
    pub fn usable(&self) -> bool {
        self.pixel_width > 0 && self.pixel_height > 0
    }
}

/// A change the catalog reports to its consumers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogEvent {
    /// New files were discovered and given empty records.
    ImagesAdded(Vec<ImageId>),
    /// Files disappeared and their records were dropped.
    ImagesRemoved(Vec<ImageId>),
    /// Cataloged files changed on disk and were decoded again.
    ImagesReloaded(Vec<ImageId>),
    /// The current image changed; the new current image should be loaded.
    SelectionChanged {
        index: Option<usize>,
        id: Option<ImageId>,
    },
}

/// Result of a [`ImageCatalog::refresh`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Ids that got a fresh record in the store.
    pub added: Vec<ImageId>,
    /// Ids whose record was removed from the store.
    pub removed: Vec<ImageId>,
    /// Ids that were already cataloged but changed on disk.
    pub reloaded: Vec<ImageId>,
    /// Events in the order they happened.
    pub events: Vec<CatalogEvent>,
}

impl RefreshOutcome {
    /// Returns true if neither the store nor the selection changed.
    pub fn is_unchanged(&self) -> bool {
        self.events.is_empty()
    }
}

/// Disk-derived list of images plus the current selection.
pub struct ImageCatalog {
    directory: PathBuf,
    images: Vec<CatalogImage>,
    selected: Option<usize>,
    decoder: Arc<dyn ImageDecoder>,
}

impl std::fmt::Debug for ImageCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCatalog")
            .field("directory", &self.directory)
            .field("images", &self.images.len())
            .field("selected", &self.selected)
            .finish()
    }
}

impl ImageCatalog {
    /// Creates an empty catalog over `directory`.
    pub fn new(directory: impl Into<PathBuf>, decoder: Arc<dyn ImageDecoder>) -> Self {
        Self {
            directory: directory.into(),
            images: Vec::new(),
            selected: None,
            decoder,
        }
    }

    /// Creates an empty catalog over the document's directory using the
    /// filesystem decoder.
    pub fn for_document(doc: &Document) -> Result<Self, BoxmarkError> {
        Ok(Self::new(doc.directory()?, Arc::new(FsImageDecoder)))
    }

    /// Reconciles the catalog and `store` with the files on disk.
    pub fn refresh(&mut self, store: &mut AnnotationStore) -> Result<RefreshOutcome, BoxmarkError> {
        let files = scan::list_image_files(&self.directory)?;
        let on_disk: BTreeMap<ImageId, PathBuf> = files
            .into_iter()
            .filter_map(|path| ImageId::from_path(&path).map(|id| (id, path)))
            .collect();

        let disk_ids: BTreeSet<ImageId> = on_disk.keys().cloned().collect();
        let known_ids = store.known_ids();
        let added: Vec<ImageId> = disk_ids.difference(&known_ids).cloned().collect();
        let removed: Vec<ImageId> = known_ids.difference(&disk_ids).cloned().collect();

        store.add_images_info(added.iter().cloned());
        store.del_images_info(&removed);

        let previous = self.current_image().map(|image| image.id.clone());

        let mut reloaded = Vec::new();
        self.images.retain(|image| {
            if !on_disk.contains_key(&image.id) {
                return false;
            }
            if image.is_stale() {
                log::debug!("{} changed on disk", image.path.display());
                reloaded.push(image.id.clone());
                return false;
            }
            true
        });
        let cataloged: BTreeSet<ImageId> = self.images.iter().map(|i| i.id.clone()).collect();
        for (id, path) in &on_disk {
            if cataloged.contains(id) {
                continue;
            }
            if let Some(image) = CatalogImage::load(path, &self.directory, self.decoder.as_ref()) {
                self.images.push(image);
            }
        }
        self.images.sort_by(|a, b| a.id.cmp(&b.id));

        self.selected = self.reclamp_selection(previous.as_ref());

        log::info!(
            "Refreshed catalog {}: {} image(s), {} added, {} removed, {} reloaded",
            self.directory.display(),
            self.images.len(),
            added.len(),
            removed.len(),
            reloaded.len()
        );

        let mut events = Vec::new();
        if !added.is_empty() {
            events.push(CatalogEvent::ImagesAdded(added.clone()));
        }
        if !removed.is_empty() {
            events.push(CatalogEvent::ImagesRemoved(removed.clone()));
        }
        if !reloaded.is_empty() {
            events.push(CatalogEvent::ImagesReloaded(reloaded.clone()));
        }
        let current = self.current_image().map(|image| image.id.clone());
        if current != previous {
            events.push(self.selection_event());
        }

        Ok(RefreshOutcome {
            added,
            removed,
            reloaded,
            events,
        })
    }

    fn reclamp_selection(&self, previous: Option<&ImageId>) -> Option<usize> {
        if self.images.is_empty() {
            return None;
        }
        if let Some(id) = previous {
            if let Some(index) = self.position(id.as_str()) {
                return Some(index);
            }
        }
        Some(self.selected.unwrap_or(0).min(self.images.len() - 1))
    }

    /// Moves to the next image, stopping at the last one.
    pub fn next(&mut self) -> Option<CatalogEvent> {
        let index = self.selected?;
        self.select_index(index.saturating_add(1).min(self.images.len().saturating_sub(1)))
    }

    /// Moves to the previous image, stopping at the first one.
    pub fn prev(&mut self) -> Option<CatalogEvent> {
        let index = self.selected?;
        self.select_index(index.saturating_sub(1))
    }

    /// Jumps to the image with the given id. No-op if absent or already current.
    pub fn select_by_id(&mut self, id: &str) -> Option<CatalogEvent> {
        let index = self.position(id)?;
        self.select_index(index)
    }

    fn select_index(&mut self, index: usize) -> Option<CatalogEvent> {
        if index >= self.images.len() || self.selected == Some(index) {
            return None;
        }
        self.selected = Some(index);
        Some(self.selection_event())
    }

    fn selection_event(&self) -> CatalogEvent {
        CatalogEvent::SelectionChanged {
            index: self.selected,
            id: self.current_image().map(|image| image.id.clone()),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.images.iter().position(|image| image.id.as_str() == id)
    }

    /// The selected image, computed from the entries and the selection index.
    pub fn current_image(&self) -> Option<&CatalogImage> {
        current_image(&self.images, self.selected)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Catalog entries in filename order.
    pub fn images(&self) -> &[CatalogImage] {
        &self.images
    }

    pub fn get(&self, id: &str) -> Option<&CatalogImage> {
        self.images.iter().find(|image| image.id.as_str() == id)
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Shared handle to the decoder, e.g. for a [`CurrentImageLoader`].
    pub fn decoder(&self) -> Arc<dyn ImageDecoder> {
        Arc::clone(&self.decoder)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// The entry at `selected`, if the index is in range.
pub fn current_image(images: &[CatalogImage], selected: Option<usize>) -> Option<&CatalogImage> {
    selected.and_then(|index| images.get(index))
}
