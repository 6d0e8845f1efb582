//! Document validation for boxmark.
//!
//! This module checks a document before export for:
//! - Label consistency (dangling references, empty names, stale colors)
//! - Image usability (decodable, present on disk)
//! - Box geometry (non-negative size, non-zero area, centre within the image)

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use crate::catalog::ImageCatalog;
use crate::model::{Document, ImageId};

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates a document and returns a report of all issues found.
///
/// When a catalog is given, image usability and box bounds are checked
/// against the decoded dimensions as well.
pub fn validate_document(
    doc: &Document,
    catalog: Option<&ImageCatalog>,
    _opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    validate_labels(doc, &mut report);

    if let Some(catalog) = catalog {
        validate_images(doc, catalog, &mut report);
    }

    validate_annotations(doc, catalog, &mut report);

    report
}

fn validate_labels(doc: &Document, report: &mut ValidationReport) {
    for label in doc.labels.iter() {
        if label.text.trim().is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptyLabelText,
                "Label text is empty",
                IssueContext::Label {
                    text: label.text.clone(),
                },
            ));
        }
    }
}

fn validate_images(doc: &Document, catalog: &ImageCatalog, report: &mut ValidationReport) {
    for image in catalog.images() {
        if !image.usable() {
            report.add(ValidationIssue::warning(
                IssueCode::UnusableImage,
                format!(
                    "Image could not be decoded ({}x{}); it will not be exported",
                    image.pixel_width, image.pixel_height
                ),
                IssueContext::Image {
                    id: image.id.to_string(),
                },
            ));
        }
    }

    for (id, _) in doc.store.iter() {
        if catalog.get(id.as_str()).is_none() {
            report.add(ValidationIssue::warning(
                IssueCode::MissingCatalogEntry,
                "No image file found for this record",
                IssueContext::Image { id: id.to_string() },
            ));
        }
    }
}

fn validate_annotations(
    doc: &Document,
    catalog: Option<&ImageCatalog>,
    report: &mut ValidationReport,
) {
    for (image_id, info) in doc.store.iter() {
        let dims = catalog
            .and_then(|catalog| catalog.get(image_id.as_str()))
            .filter(|image| image.usable())
            .map(|image| (image.pixel_width, image.pixel_height));

        for (index, annotation) in info.annotations.iter().enumerate() {
            let context = || annotation_context(image_id, index);
            let label = &annotation.label;

            match doc.labels.get(&label.text) {
                None => report.add(ValidationIssue::error(
                    IssueCode::DanglingLabelRef,
                    format!("References unregistered label '{}'", label.text),
                    context(),
                )),
                Some(registered) if registered.color != label.color => {
                    report.add(ValidationIssue::warning(
                        IssueCode::LabelColorMismatch,
                        format!(
                            "Label '{}' has color {} but the registry says {}",
                            label.text, label.color, registered.color
                        ),
                        context(),
                    ))
                }
                Some(_) => {}
            }

            let coords = &annotation.coordinates;
            if coords.width < 0 || coords.height < 0 {
                report.add(ValidationIssue::error(
                    IssueCode::NegativeBoxSize,
                    format!("Negative size {}x{}", coords.width, coords.height),
                    context(),
                ));
                continue;
            }

            if coords.area() == 0 {
                report.add(ValidationIssue::warning(
                    IssueCode::ZeroAreaBox,
                    format!("Zero area box {}x{}", coords.width, coords.height),
                    context(),
                ));
            }

            if let Some((width, height)) = dims {
                if !coords.center_within(width, height) {
                    report.add(ValidationIssue::warning(
                        IssueCode::BoxOutOfBounds,
                        format!(
                            "Box centre ({}, {}) lies outside image bounds (0, 0, {}, {})",
                            coords.x, coords.y, width, height
                        ),
                        context(),
                    ));
                }
            }
        }
    }
}

fn annotation_context(image_id: &ImageId, index: usize) -> IssueContext {
    IssueContext::Annotation {
        image: image_id.to_string(),
        index,
    }
}
