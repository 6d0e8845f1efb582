//! Annotation data model.
//!
//! A [`Document`] owns an ordered [`LabelRegistry`] and an
//! [`AnnotationStore`] mapping image filenames to their boxes. Boxes are kept
//! in pixel space ([`Coordinates`], centre-based); normalized values are only
//! produced at export time.
//!
//! # Example
//!
//! ```
//! use boxmark::model::{Coordinates, Document};
//!
//! let mut doc = Document::with_path("/data/project.json");
//! doc.labels.add_text("cat");
//! doc.store.add_images_info(["img1.jpg"]);
//! doc.annotate("img1.jpg", "cat", Coordinates::new(200, 150, 100, 60)).unwrap();
//!
//! let norm = doc.store.annotations_for("img1.jpg")[0]
//!     .coordinates
//!     .to_normalized(400, 300);
//! assert_eq!((norm.cx, norm.w), (0.5, 0.25));
//! ```

mod annotation;
mod coord;
mod document;
mod ids;
pub mod io_json;
mod label;

// Re-export core types for convenient access
pub use annotation::{AnnotationStore, ImageInfo, ObjectAnnotation, NO_LABELS};
pub use coord::{Coordinates, NormalizedBox};
pub use document::Document;
pub use ids::ImageId;
pub use label::{Color, Label, LabelRegistry};
