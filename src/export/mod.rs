//! YOLO-style export of a document.
//!
//! Produces two kinds of files:
//!
//! - a class list next to the document (`<doc>.yaml`) with a fixed dataset
//!   header and one `    {index}: {text}` line per label, in registry order;
//! - one `<image>.txt` per cataloged image, next to the image, with one
//!   `{index} {cx} {cy} {w} {h}` line per annotation. Values are normalized
//!   by the image's full-resolution size and printed with 6 decimals.
//!
//! Label indices are looked up in the registry at export time. Annotations
//! whose label has been removed are skipped and reported. Images without
//! known dimensions get no file. Write failures are collected, never fatal.

mod report;

pub use report::{ExportCounts, ExportIssue, ExportIssueCode, ExportReport, ExportSeverity};

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::catalog::{CatalogImage, ImageCatalog};
use crate::error::BoxmarkError;
use crate::model::{Document, ImageId, LabelRegistry, NormalizedBox, ObjectAnnotation};

/// Fixed header of the class-list file.
pub const CLASS_LIST_HEADER: &str = "train: DataSetFolder/images/train
val: DataSetFolder/images/val

# Classes
names:
";

/// Extension of per-image annotation files.
pub const ANNOTATION_EXTENSION: &str = "txt";

/// Extension of the class-list file.
pub const CLASS_LIST_EXTENSION: &str = "yaml";

/// Renders the class-list file for the registry's current order.
pub fn class_list_text(labels: &LabelRegistry) -> String {
    let mut text = String::from(CLASS_LIST_HEADER);
    for (index, label) in labels.iter().enumerate() {
        text.push_str(&format!("    {}: {}\n", index, label.text));
    }
    text
}

/// Formats one annotation line (without the trailing newline).
pub fn annotation_line(class_index: usize, bbox: &NormalizedBox) -> String {
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        class_index, bbox.cx, bbox.cy, bbox.w, bbox.h
    )
}

/// Rendered contents of one per-image annotation file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnnotationText {
    pub text: String,
    /// Number of annotation lines in `text`.
    pub lines: usize,
    /// Label texts of annotations that were skipped as dangling.
    pub dangling: Vec<String>,
}

/// Renders the annotation file for one image.
///
/// Returns `None` if the image has no usable dimensions.
pub fn annotations_text(
    image: &CatalogImage,
    annotations: &[ObjectAnnotation],
    labels: &LabelRegistry,
) -> Option<AnnotationText> {
    if !image.usable() {
        return None;
    }

    let mut out = AnnotationText::default();
    for annotation in annotations {
        let Some(class_index) = labels.index_of(&annotation.label.text) else {
            out.dangling.push(annotation.label.text.clone());
            continue;
        };
        let bbox = annotation
            .coordinates
            .to_normalized(image.pixel_width, image.pixel_height);
        out.text.push_str(&annotation_line(class_index, &bbox));
        out.text.push('\n');
        out.lines += 1;
    }
    Some(out)
}

/// Path of the class-list file for a document path.
pub fn class_list_path(document_path: &Path) -> PathBuf {
    document_path.with_extension(CLASS_LIST_EXTENSION)
}

/// Path of the annotation file for an image path.
pub fn annotation_path(image_path: &Path) -> PathBuf {
    image_path.with_extension(ANNOTATION_EXTENSION)
}

/// Writes the class list and one annotation file per cataloged image.
///
/// Existing files are overwritten, except the document itself: an output
/// path that resolves to the document is recorded as a failure and left
/// alone. When several images share a stem only the first one (in filename
/// order) gets the annotation file. Only a missing document path is an
/// error; everything else is recorded in the returned report.
pub fn export_all(doc: &Document, catalog: &ImageCatalog) -> Result<ExportReport, BoxmarkError> {
    let document_path = doc.require_path()?;
    let mut report = ExportReport::new();

    let class_list = class_list_path(document_path);
    if !clobbers_document(&class_list, document_path, &mut report) {
        write_file(&class_list, &class_list_text(&doc.labels), &mut report);
    }
    report.counts.labels = doc.labels.len();

    let mut owners: BTreeMap<PathBuf, &ImageId> = BTreeMap::new();
    for image in catalog.images() {
        let target = annotation_path(&image.path);
        let annotations = doc.store.annotations_for(image.id.as_str());

        let Some(rendered) = annotations_text(image, annotations, &doc.labels) else {
            log::warn!("Skipping {}: image dimensions unknown", image.path.display());
            report.add(ExportIssue::warning(
                ExportIssueCode::UnusableImage,
                &image.path,
                "image could not be decoded; no annotation file written",
            ));
            continue;
        };

        if let Some(owner) = owners.get(&target) {
            log::warn!(
                "Skipping {}: {} already belongs to {}",
                image.id,
                target.display(),
                owner
            );
            report.add(ExportIssue::warning(
                ExportIssueCode::SharedAnnotationFile,
                &target,
                format!(
                    "already written for {}; annotations of {} not exported",
                    owner, image.id
                ),
            ));
            continue;
        }
        owners.insert(target.clone(), &image.id);

        if clobbers_document(&target, document_path, &mut report) {
            continue;
        }

        for text in &rendered.dangling {
            log::warn!(
                "Skipping annotation on {}: label '{}' is not registered",
                image.id,
                text
            );
            report.add(ExportIssue::warning(
                ExportIssueCode::DanglingLabel,
                &target,
                format!("label '{}' is not registered; annotation skipped", text),
            ));
        }

        if write_file(&target, &rendered.text, &mut report) {
            report.counts.images += 1;
            report.counts.annotations += rendered.lines;
        }
    }

    log::info!(
        "Export finished: {} file(s) written, {} failure(s), {} warning(s)",
        report.written.len(),
        report.failure_count(),
        report.warning_count()
    );
    Ok(report)
}

/// Records a failure if `target` is the document file itself.
fn clobbers_document(target: &Path, document_path: &Path, report: &mut ExportReport) -> bool {
    let same = target == document_path
        || matches!(
            (fs::canonicalize(target), fs::canonicalize(document_path)),
            (Ok(a), Ok(b)) if a == b
        );
    if same {
        log::warn!("Refusing to overwrite document {}", document_path.display());
        report.add(ExportIssue::failure(
            ExportIssueCode::DocumentConflict,
            target,
            "output path is the document itself; rename the document (e.g. to .json)",
        ));
    }
    same
}

fn write_file(path: &Path, contents: &str, report: &mut ExportReport) -> bool {
    match fs::write(path, contents) {
        Ok(()) => {
            log::debug!("Wrote {}", path.display());
            report.written.push(path.to_path_buf());
            true
        }
        Err(err) => {
            log::warn!("Failed to write {}: {}", path.display(), err);
            report.add(ExportIssue::failure(
                ExportIssueCode::WriteFailed,
                path,
                err.to_string(),
            ));
            false
        }
    }
}

#[derive(Debug, Deserialize)]
struct ClassListFile {
    #[serde(default)]
    names: serde_yaml::Value,
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Parses label names from class-list text, in index order.
///
/// Accepts both the mapping form this module writes and a plain sequence.
/// Gaps in a mapping are filled with `class_{index}`; entries that are not
/// scalars are treated as gaps too.
pub fn parse_class_list(text: &str) -> Result<Vec<String>, serde_yaml::Error> {
    let parsed: ClassListFile = serde_yaml::from_str(text)?;

    let slots: Vec<Option<String>> = match &parsed.names {
        serde_yaml::Value::Sequence(items) => items.iter().map(scalar_text).collect(),
        serde_yaml::Value::Mapping(mapping) => {
            let entries: BTreeMap<usize, Option<String>> = mapping
                .iter()
                .filter_map(|(key, value)| {
                    let index = key.as_u64().and_then(|i| usize::try_from(i).ok())?;
                    Some((index, scalar_text(value)))
                })
                .collect();
            let Some(max_index) = entries.keys().max().copied() else {
                return Ok(Vec::new());
            };
            let mut slots = vec![None; max_index + 1];
            for (index, name) in entries {
                slots[index] = name;
            }
            slots
        }
        _ => Vec::new(),
    };

    Ok(slots
        .into_iter()
        .enumerate()
        .map(|(index, name)| match name {
            Some(name) if !name.trim().is_empty() => name,
            _ => format!("class_{}", index),
        })
        .collect())
}

/// Reads label names back from a class-list file.
pub fn read_class_list(path: &Path) -> Result<Vec<String>, BoxmarkError> {
    let data = fs::read_to_string(path).map_err(BoxmarkError::Io)?;
    parse_class_list(&data).map_err(|source| BoxmarkError::ClassListParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Fuzz-only entrypoint for class-list parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_class_list(input: &str) -> Result<(), serde_yaml::Error> {
    let _ = parse_class_list(input)?;
    Ok(())
}
