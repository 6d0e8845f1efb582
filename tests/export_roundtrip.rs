//! Integration tests for scanning and exporting real image directories.

use std::fs;
use std::path::Path;

use boxmark::catalog::ImageCatalog;
use boxmark::export::{export_all, read_class_list, ExportIssueCode};
use boxmark::model::io_json::{read_document, write_document};
use boxmark::model::{Coordinates, Document};

mod common;
use common::{save_document, write_bmp, write_junk_image, write_png};

fn sample_document(root: &Path) -> (Document, ImageCatalog) {
    write_bmp(&root.join("img1.bmp"), 400, 300);
    write_bmp(&root.join("img2.bmp"), 64, 32);

    let mut doc = Document::with_path(root.join("project.json"));
    doc.labels.add_text("cat");
    doc.labels.add_text("dog");

    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");
    catalog.refresh(&mut doc.store).expect("refresh");
    (doc, catalog)
}

#[test]
fn export_writes_class_list_and_annotation_files() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut doc, catalog) = sample_document(temp.path());
    doc.annotate("img1.bmp", "cat", Coordinates::new(200, 150, 100, 60))
        .expect("annotate");

    let report = export_all(&doc, &catalog).expect("export");
    assert!(report.is_clean(), "unexpected issues: {:?}", report.issues);
    assert_eq!(report.counts.labels, 2);
    assert_eq!(report.counts.images, 2);
    assert_eq!(report.counts.annotations, 1);
    assert_eq!(report.written.len(), 3);

    let img1 = fs::read_to_string(temp.path().join("img1.txt")).expect("read img1.txt");
    assert_eq!(img1, "0 0.500000 0.500000 0.250000 0.200000\n");

    let img2 = fs::read_to_string(temp.path().join("img2.txt")).expect("read img2.txt");
    assert_eq!(img2, "");

    let class_list = fs::read_to_string(temp.path().join("project.yaml")).expect("read yaml");
    assert!(class_list.starts_with("train: DataSetFolder/images/train\n"));
    assert!(class_list.ends_with("names:\n    0: cat\n    1: dog\n"));
}

#[test]
fn class_list_reads_back_in_registry_order() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut doc, catalog) = sample_document(temp.path());
    doc.labels.move_label("dog", 0).expect("move");

    export_all(&doc, &catalog).expect("export");

    let names = read_class_list(&temp.path().join("project.yaml")).expect("read class list");
    assert_eq!(names, vec!["dog", "cat"]);
}

#[test]
fn reordering_labels_changes_exported_indices() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut doc, catalog) = sample_document(temp.path());
    doc.annotate("img2.bmp", "dog", Coordinates::new(32, 16, 32, 16))
        .expect("annotate");

    export_all(&doc, &catalog).expect("first export");
    let before = fs::read_to_string(temp.path().join("img2.txt")).expect("read");
    assert_eq!(before, "1 0.500000 0.500000 0.500000 0.500000\n");

    doc.labels.move_label("dog", 0).expect("move");
    export_all(&doc, &catalog).expect("second export");
    let after = fs::read_to_string(temp.path().join("img2.txt")).expect("read");
    assert_eq!(after, "0 0.500000 0.500000 0.500000 0.500000\n");
}

#[test]
fn export_is_deterministic() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut doc, catalog) = sample_document(temp.path());
    doc.annotate("img1.bmp", "dog", Coordinates::new(10, 20, 30, 40))
        .expect("annotate");
    doc.annotate("img1.bmp", "cat", Coordinates::new(300, 200, 50, 50))
        .expect("annotate");

    export_all(&doc, &catalog).expect("first export");
    let first = fs::read(temp.path().join("img1.txt")).expect("read");
    let first_yaml = fs::read(temp.path().join("project.yaml")).expect("read");

    export_all(&doc, &catalog).expect("second export");
    assert_eq!(fs::read(temp.path().join("img1.txt")).expect("read"), first);
    assert_eq!(
        fs::read(temp.path().join("project.yaml")).expect("read"),
        first_yaml
    );
}

#[test]
fn removed_label_is_skipped_and_reported() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut doc, catalog) = sample_document(temp.path());
    doc.annotate("img1.bmp", "cat", Coordinates::new(200, 150, 100, 60))
        .expect("annotate");
    doc.annotate("img1.bmp", "dog", Coordinates::new(200, 150, 40, 30))
        .expect("annotate");
    doc.labels.remove("cat");

    let report = export_all(&doc, &catalog).expect("export");
    assert!(report.is_ok());
    assert_eq!(report.warning_count(), 1);
    assert_eq!(report.issues[0].code, ExportIssueCode::DanglingLabel);

    let img1 = fs::read_to_string(temp.path().join("img1.txt")).expect("read");
    assert_eq!(img1, "0 0.500000 0.500000 0.100000 0.100000\n");
}

#[test]
fn undecodable_image_gets_no_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_junk_image(&temp.path().join("broken.jpg"));
    let (doc, catalog) = sample_document(temp.path());

    assert_eq!(catalog.len(), 3);
    let broken = catalog.get("broken.jpg").expect("cataloged");
    assert!(!broken.usable());
    assert!(broken.preview.is_none());

    let report = export_all(&doc, &catalog).expect("export");
    assert!(report.is_ok());
    assert_eq!(report.warning_count(), 1);
    assert_eq!(report.issues[0].code, ExportIssueCode::UnusableImage);
    assert!(!temp.path().join("broken.txt").exists());
    assert!(temp.path().join("img1.txt").exists());
}

#[test]
fn write_failure_does_not_stop_export() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (doc, catalog) = sample_document(temp.path());
    // A directory where the annotation file should go makes the write fail.
    fs::create_dir(temp.path().join("img1.txt")).expect("create blocking dir");

    let report = export_all(&doc, &catalog).expect("export");
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.issues[0].code, ExportIssueCode::WriteFailed);
    assert!(temp.path().join("img2.txt").is_file());
    assert!(temp.path().join("project.yaml").is_file());
}

#[test]
fn export_without_document_path_fails() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut doc, catalog) = sample_document(temp.path());
    doc.path = None;

    assert!(matches!(
        export_all(&doc, &catalog),
        Err(boxmark::BoxmarkError::NoDocumentPath)
    ));
}

#[test]
fn saved_document_exports_identically_after_reload() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let (mut doc, catalog) = sample_document(temp.path());
    doc.annotate("img1.bmp", "dog", Coordinates::new(100, 100, 20, 20))
        .expect("annotate");
    write_document(&doc).expect("save");

    export_all(&doc, &catalog).expect("export");
    let before = fs::read(temp.path().join("img1.txt")).expect("read");

    let reloaded = read_document(&temp.path().join("project.json")).expect("reload");
    assert_eq!(reloaded.labels.labels(), doc.labels.labels());
    assert_eq!(reloaded.store, doc.store);

    export_all(&reloaded, &catalog).expect("export reloaded");
    assert_eq!(fs::read(temp.path().join("img1.txt")).expect("read"), before);
}

#[test]
fn export_never_overwrites_the_document() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_bmp(&temp.path().join("img1.bmp"), 400, 300);
    let mut doc = Document::new();
    doc.labels.add_text("cat");
    let path = save_document(temp.path(), "project.yaml", doc);

    let mut doc = read_document(&path).expect("read");
    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");
    catalog.refresh(&mut doc.store).expect("refresh");
    doc.annotate("img1.bmp", "cat", Coordinates::new(200, 150, 100, 60))
        .expect("annotate");
    write_document(&doc).expect("save");

    let report = export_all(&doc, &catalog).expect("export");
    assert!(!report.is_ok());
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.issues[0].code, ExportIssueCode::DocumentConflict);
    assert!(temp.path().join("img1.txt").is_file());

    let reloaded = read_document(&path).expect("document survives export");
    assert_eq!(reloaded.store.annotations_for("img1.bmp").len(), 1);
}

#[test]
fn annotation_file_named_like_the_document_is_refused() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_bmp(&temp.path().join("project.bmp"), 10, 10);
    let path = save_document(temp.path(), "project.txt", Document::new());

    let mut doc = read_document(&path).expect("read");
    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");
    catalog.refresh(&mut doc.store).expect("refresh");

    let report = export_all(&doc, &catalog).expect("export");
    assert_eq!(report.failure_count(), 1);
    assert_eq!(report.issues[0].code, ExportIssueCode::DocumentConflict);
    assert_eq!(report.counts.images, 0);
    assert!(read_document(&path).is_ok());
}

#[test]
fn images_sharing_a_stem_are_reported() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_bmp(&temp.path().join("a.bmp"), 400, 300);
    write_png(&temp.path().join("a.png"), 10, 10);

    let mut doc = Document::with_path(temp.path().join("project.json"));
    doc.labels.add_text("cat");
    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");
    catalog.refresh(&mut doc.store).expect("refresh");
    doc.annotate("a.bmp", "cat", Coordinates::new(200, 150, 100, 60))
        .expect("annotate a.bmp");
    doc.annotate("a.png", "cat", Coordinates::new(5, 5, 2, 2))
        .expect("annotate a.png");

    let report = export_all(&doc, &catalog).expect("export");
    assert!(report.is_ok());
    assert_eq!(report.warning_count(), 1);
    assert_eq!(report.issues[0].code, ExportIssueCode::SharedAnnotationFile);
    assert!(report.issues[0].message.contains("a.png"));
    assert_eq!(report.counts.images, 1);

    let text = fs::read_to_string(temp.path().join("a.txt")).expect("read a.txt");
    assert_eq!(text, "0 0.500000 0.500000 0.250000 0.200000\n");
}
