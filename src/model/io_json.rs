//! JSON persistence for annotation documents.
//!
//! The file stores the ordered label list and the per-image annotation
//! records. The document's own path is not stored; it is attached on read.
//! The selected label is session state and is not persisted either.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::annotation::{AnnotationStore, ImageInfo};
use super::document::Document;
use super::ids::ImageId;
use super::label::{Label, LabelRegistry};
use crate::error::BoxmarkError;

#[derive(Debug, Default, Serialize, Deserialize)]
struct DocumentFile {
    #[serde(default)]
    labels: Vec<Label>,
    #[serde(default)]
    images: BTreeMap<ImageId, ImageInfo>,
}

impl DocumentFile {
    fn from_document(doc: &Document) -> Self {
        Self {
            labels: doc.labels.labels().to_vec(),
            images: doc
                .store
                .iter()
                .map(|(id, info)| (id.clone(), info.clone()))
                .collect(),
        }
    }

    fn into_document(self) -> Document {
        let mut store = AnnotationStore::new();
        for (id, info) in self.images {
            store.insert(id, info);
        }
        Document {
            path: None,
            labels: LabelRegistry::from_labels(self.labels),
            store,
        }
    }
}

/// Reads a document from a JSON file and binds it to that path.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_document(path: &Path) -> Result<Document, BoxmarkError> {
    let file = File::open(path).map_err(BoxmarkError::Io)?;
    let reader = BufReader::new(file);

    let parsed: DocumentFile =
        serde_json::from_reader(reader).map_err(|source| BoxmarkError::DocumentParse {
            path: path.to_path_buf(),
            source,
        })?;

    let mut doc = parsed.into_document();
    doc.path = Some(path.to_path_buf());
    log::debug!(
        "Read document {}: {} label(s), {} image record(s)",
        path.display(),
        doc.labels.len(),
        doc.store.len()
    );
    Ok(doc)
}

/// Writes a document to its own file path.
///
/// # Errors
/// Returns an error if the document has no path or the file cannot be written.
pub fn write_document(doc: &Document) -> Result<(), BoxmarkError> {
    let path = doc.require_path()?;
    write_document_to(path, doc)
}

/// Writes a document to an explicit path.
pub fn write_document_to(path: &Path, doc: &Document) -> Result<(), BoxmarkError> {
    let file = File::create(path).map_err(BoxmarkError::Io)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, &DocumentFile::from_document(doc)).map_err(
        |source| BoxmarkError::DocumentWrite {
            path: path.to_path_buf(),
            source,
        },
    )?;
    writer.write_all(b"\n").map_err(BoxmarkError::Io)?;
    writer.flush().map_err(BoxmarkError::Io)
}

/// Reads a document from a JSON string. The result has no path.
///
/// Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<Document, serde_json::Error> {
    serde_json::from_str::<DocumentFile>(json).map(DocumentFile::into_document)
}

/// Writes a document to a JSON string.
///
/// Useful for testing without file I/O.
pub fn to_json_string(doc: &Document) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&DocumentFile::from_document(doc))
}

/// Fuzz-only entrypoint for document parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_document(input: &str) -> Result<(), serde_json::Error> {
    let _ = from_json_str(input)?;
    Ok(())
}
