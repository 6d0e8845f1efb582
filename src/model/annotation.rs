//! Per-image bounding-box annotations.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::coord::Coordinates;
use super::ids::ImageId;
use super::label::{Color, Label};

/// Text shown in a label summary for an image without annotations.
pub const NO_LABELS: &str = "No labels";

/// A labelled bounding box drawn on one image.
///
/// Has no identity of its own: two annotations with the same label and
/// coordinates are interchangeable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectAnnotation {
    pub label: Label,
    pub coordinates: Coordinates,
}

impl ObjectAnnotation {
    /// Creates a new annotation.
    pub fn new(label: Label, coordinates: Coordinates) -> Self {
        Self { label, coordinates }
    }
}

/// Annotation record for a single image.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    #[serde(default)]
    pub annotations: Vec<ObjectAnnotation>,
}

impl ImageInfo {
    /// Appends an annotation. Identical boxes may coexist.
    pub fn add(&mut self, annotation: ObjectAnnotation) {
        self.annotations.push(annotation);
    }

    /// Removes the first annotation equal to `annotation`.
    ///
    /// Returns false if nothing matched.
    pub fn delete(&mut self, annotation: &ObjectAnnotation) -> bool {
        match self.annotations.iter().position(|a| a == annotation) {
            Some(index) => {
                self.annotations.remove(index);
                true
            }
            None => false,
        }
    }
}

/// Mapping of image filename to its annotation record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnnotationStore {
    images: BTreeMap<ImageId, ImageInfo>,
}

impl AnnotationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the annotations of an image (empty if unknown).
    pub fn annotations_for(&self, image_id: &str) -> &[ObjectAnnotation] {
        self.images
            .get(image_id)
            .map(|info| info.annotations.as_slice())
            .unwrap_or(&[])
    }

    /// Appends an annotation to a tracked image.
    ///
    /// Returns false if the image is not tracked; annotations are only
    /// recorded for images the document knows about.
    pub fn add(&mut self, image_id: &str, annotation: ObjectAnnotation) -> bool {
        match self.images.get_mut(image_id) {
            Some(info) => {
                info.add(annotation);
                true
            }
            None => false,
        }
    }

    /// Removes the first structurally equal annotation. No-op if absent.
    pub fn delete(&mut self, image_id: &str, annotation: &ObjectAnnotation) -> bool {
        self.images
            .get_mut(image_id)
            .is_some_and(|info| info.delete(annotation))
    }

    /// Distinct `(text, color)` pairs used on one image, sorted by text.
    ///
    /// An image without annotations yields an empty list; see
    /// [`AnnotationStore::label_summary`] for the display form.
    pub fn labels_present(&self, image_id: &str) -> Vec<(String, Color)> {
        let mut seen: BTreeMap<&str, Color> = BTreeMap::new();
        for annotation in self.annotations_for(image_id) {
            seen.insert(&annotation.label.text, annotation.label.color);
        }
        seen.into_iter()
            .map(|(text, color)| (text.to_string(), color))
            .collect()
    }

    /// Like [`labels_present`](Self::labels_present) but substitutes the
    /// `No labels` sentinel for an empty result.
    pub fn label_summary(&self, image_id: &str) -> Vec<(String, Color)> {
        let labels = self.labels_present(image_id);
        if labels.is_empty() {
            vec![(NO_LABELS.to_string(), Color::RED)]
        } else {
            labels
        }
    }

    /// Starts tracking images that are not yet known, with empty records.
    pub fn add_images_info<I, T>(&mut self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<ImageId>,
    {
        for id in ids {
            self.images.entry(id.into()).or_default();
        }
    }

    /// Stops tracking images, discarding their annotations.
    pub fn del_images_info<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a ImageId>,
    {
        for id in ids {
            self.images.remove(id);
        }
    }

    /// Inserts or replaces a full record.
    pub fn insert(&mut self, id: impl Into<ImageId>, info: ImageInfo) {
        self.images.insert(id.into(), info);
    }

    /// Returns the record of an image.
    pub fn get(&self, image_id: &str) -> Option<&ImageInfo> {
        self.images.get(image_id)
    }

    pub fn contains(&self, image_id: &str) -> bool {
        self.images.contains_key(image_id)
    }

    /// Set of tracked image ids.
    pub fn known_ids(&self) -> BTreeSet<ImageId> {
        self.images.keys().cloned().collect()
    }

    /// Iterates records in filename order.
    pub fn iter(&self) -> impl Iterator<Item = (&ImageId, &ImageInfo)> {
        self.images.iter()
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = &mut ImageInfo> {
        self.images.values_mut()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Total number of annotations across all images.
    pub fn annotation_count(&self) -> usize {
        self.images.values().map(|info| info.annotations.len()).sum()
    }
}
