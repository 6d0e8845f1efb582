//! The annotation document: label registry plus per-image records.

use std::path::{Path, PathBuf};

use super::annotation::{AnnotationStore, ObjectAnnotation};
use super::coord::Coordinates;
use super::label::{Color, LabelRegistry};
use crate::error::BoxmarkError;

/// An open annotation document.
///
/// Owns the label registry and the annotation store. The file path anchors
/// the image directory (the document's parent) and the export outputs.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub path: Option<PathBuf>,
    pub labels: LabelRegistry,
    pub store: AnnotationStore,
}

impl Document {
    /// Creates an empty, unsaved document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty document bound to a file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    /// The document's file path, required by scanning and exporting.
    pub fn require_path(&self) -> Result<&Path, BoxmarkError> {
        self.path.as_deref().ok_or(BoxmarkError::NoDocumentPath)
    }

    /// Directory that holds the document and its images.
    pub fn directory(&self) -> Result<PathBuf, BoxmarkError> {
        let path = self.require_path()?;
        Ok(match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        })
    }

    /// Records a box drawn with the currently selected label.
    ///
    /// Returns `Ok(None)` when no label is selected (the gesture is ignored).
    pub fn annotate_with_selected(
        &mut self,
        image_id: &str,
        coordinates: Coordinates,
    ) -> Result<Option<ObjectAnnotation>, BoxmarkError> {
        let Some(label) = self.labels.selected().cloned() else {
            return Ok(None);
        };
        self.annotate(image_id, &label.text, coordinates).map(Some)
    }

    /// Records a box with the named label on an image.
    pub fn annotate(
        &mut self,
        image_id: &str,
        label_text: &str,
        coordinates: Coordinates,
    ) -> Result<ObjectAnnotation, BoxmarkError> {
        let label = self
            .labels
            .get(label_text)
            .cloned()
            .ok_or_else(|| BoxmarkError::LabelNotFound(label_text.to_string()))?;
        let annotation = ObjectAnnotation::new(label, coordinates);
        if !self.store.add(image_id, annotation.clone()) {
            return Err(BoxmarkError::ImageNotFound(image_id.to_string()));
        }
        Ok(annotation)
    }

    /// Renames a label and every annotation that references it.
    pub fn rename_label(&mut self, old: &str, new: &str) -> Result<usize, BoxmarkError> {
        self.labels.rename(old, new)?;
        Ok(self.rewrite_annotations(old, |annotation| {
            annotation.label.text = new.to_string();
        }))
    }

    /// Recolors a label and every annotation that references it.
    pub fn recolor_label(&mut self, text: &str, color: Color) -> Result<usize, BoxmarkError> {
        self.labels.set_color(text, color)?;
        Ok(self.rewrite_annotations(text, |annotation| {
            annotation.label.color = color;
        }))
    }

    fn rewrite_annotations(
        &mut self,
        label_text: &str,
        mut rewrite: impl FnMut(&mut ObjectAnnotation),
    ) -> usize {
        let mut touched = 0;
        for info in self.store.values_mut() {
            for annotation in info
                .annotations
                .iter_mut()
                .filter(|a| a.label.text == label_text)
            {
                rewrite(annotation);
                touched += 1;
            }
        }
        touched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        let mut doc = Document::with_path("/data/project.json");
        doc.labels.add_text("cat");
        doc.labels.add_text("dog");
        doc.store.add_images_info(["a.jpg"]);
        doc
    }

    #[test]
    fn directory_is_document_parent() {
        let doc = doc();
        assert_eq!(doc.directory().expect("dir"), PathBuf::from("/data"));
        assert!(matches!(
            Document::new().directory(),
            Err(BoxmarkError::NoDocumentPath)
        ));
        assert_eq!(
            Document::with_path("doc.json").directory().expect("dir"),
            PathBuf::from(".")
        );
    }

    #[test]
    fn annotate_with_selected_requires_selection() {
        let mut doc = doc();
        let coords = Coordinates::new(5, 5, 2, 2);
        assert!(doc
            .annotate_with_selected("a.jpg", coords)
            .expect("ok")
            .is_none());

        doc.labels.select("dog");
        let ann = doc
            .annotate_with_selected("a.jpg", coords)
            .expect("ok")
            .expect("annotation");
        assert_eq!(ann.label.text, "dog");
        assert_eq!(doc.store.annotations_for("a.jpg").len(), 1);
    }

    #[test]
    fn annotate_rejects_unknown_label_and_image() {
        let mut doc = doc();
        let coords = Coordinates::new(5, 5, 2, 2);
        assert!(matches!(
            doc.annotate("a.jpg", "bird", coords),
            Err(BoxmarkError::LabelNotFound(_))
        ));
        assert!(matches!(
            doc.annotate("b.jpg", "cat", coords),
            Err(BoxmarkError::ImageNotFound(_))
        ));
    }

    #[test]
    fn rename_label_cascades_to_annotations() {
        let mut doc = doc();
        doc.annotate("a.jpg", "cat", Coordinates::new(1, 1, 1, 1))
            .expect("annotate");
        doc.annotate("a.jpg", "dog", Coordinates::new(2, 2, 2, 2))
            .expect("annotate");

        let touched = doc.rename_label("cat", "kitten").expect("rename");
        assert_eq!(touched, 1);
        let texts: Vec<&str> = doc
            .store
            .annotations_for("a.jpg")
            .iter()
            .map(|a| a.label.text.as_str())
            .collect();
        assert_eq!(texts, vec!["kitten", "dog"]);
    }

    #[test]
    fn recolor_label_cascades_to_annotations() {
        let mut doc = doc();
        doc.annotate("a.jpg", "cat", Coordinates::new(1, 1, 1, 1))
            .expect("annotate");
        doc.recolor_label("cat", Color::RED).expect("recolor");
        assert_eq!(doc.store.annotations_for("a.jpg")[0].label.color, Color::RED);
    }
}
