//! Integration tests for catalog reconciliation against a real directory.

use std::fs;
use std::time::Duration;

use boxmark::catalog::{CatalogEvent, CurrentImageLoader, ImageCatalog, LoadResult, PREVIEW_MAX_SIDE};
use boxmark::export::export_all;
use boxmark::model::{Coordinates, Document, ImageId};

mod common;
use common::{write_bmp, write_junk_image};

fn ids(catalog: &ImageCatalog) -> Vec<&str> {
    catalog.images().iter().map(|image| image.id.as_str()).collect()
}

#[test]
fn refresh_follows_files_on_disk() {
    let temp = tempfile::tempdir().expect("create temp dir");
    for name in ["a.bmp", "b.bmp", "c.bmp"] {
        write_bmp(&temp.path().join(name), 8, 8);
    }
    fs::write(temp.path().join("notes.txt"), "not an image").expect("write notes");
    fs::create_dir(temp.path().join("nested")).expect("create nested dir");
    write_bmp(&temp.path().join("nested/deep.bmp"), 8, 8);

    let mut doc = Document::with_path(temp.path().join("doc.json"));
    doc.labels.add_text("cat");
    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");

    let outcome = catalog.refresh(&mut doc.store).expect("first refresh");
    assert_eq!(ids(&catalog), vec!["a.bmp", "b.bmp", "c.bmp"]);
    assert_eq!(outcome.added.len(), 3);
    assert_eq!(catalog.selected_index(), Some(0));
    doc.annotate("b.bmp", "cat", Coordinates::new(4, 4, 2, 2))
        .expect("annotate");

    fs::remove_file(temp.path().join("a.bmp")).expect("remove a");
    write_bmp(&temp.path().join("d.bmp"), 8, 8);

    let outcome = catalog.refresh(&mut doc.store).expect("second refresh");
    assert_eq!(outcome.added, vec![ImageId::from("d.bmp")]);
    assert_eq!(outcome.removed, vec![ImageId::from("a.bmp")]);
    assert_eq!(ids(&catalog), vec!["b.bmp", "c.bmp", "d.bmp"]);

    let store_ids: Vec<&str> = doc.store.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(store_ids, vec!["b.bmp", "c.bmp", "d.bmp"]);
    assert_eq!(doc.store.annotations_for("b.bmp").len(), 1);
    assert!(doc.store.annotations_for("d.bmp").is_empty());

    // The selected file disappeared, so selection is clamped to index 0.
    assert_eq!(catalog.selected_index(), Some(0));
    assert!(outcome
        .events
        .iter()
        .any(|event| matches!(event, CatalogEvent::SelectionChanged { .. })));
}

#[test]
fn replaced_image_is_measured_again() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_bmp(&temp.path().join("img1.bmp"), 400, 300);

    let mut doc = Document::with_path(temp.path().join("doc.json"));
    doc.labels.add_text("cat");
    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");
    catalog.refresh(&mut doc.store).expect("first refresh");

    write_bmp(&temp.path().join("img1.bmp"), 800, 600);
    let outcome = catalog.refresh(&mut doc.store).expect("second refresh");
    assert_eq!(outcome.reloaded, vec![ImageId::from("img1.bmp")]);

    let image = catalog.get("img1.bmp").expect("cataloged");
    assert_eq!((image.pixel_width, image.pixel_height), (800, 600));

    doc.annotate("img1.bmp", "cat", Coordinates::new(200, 150, 100, 60))
        .expect("annotate");
    export_all(&doc, &catalog).expect("export");
    let text = fs::read_to_string(temp.path().join("img1.txt")).expect("read img1.txt");
    assert_eq!(text, "0 0.250000 0.250000 0.125000 0.100000\n");
}

#[test]
fn repeated_refresh_is_unchanged() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_bmp(&temp.path().join("a.bmp"), 8, 8);

    let mut doc = Document::with_path(temp.path().join("doc.json"));
    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");
    catalog.refresh(&mut doc.store).expect("first refresh");

    let outcome = catalog.refresh(&mut doc.store).expect("second refresh");
    assert!(outcome.is_unchanged());
    assert_eq!(catalog.len(), 1);
    assert_eq!(doc.store.len(), 1);
}

#[test]
fn entries_carry_dimensions_and_previews() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_bmp(&temp.path().join("wide.bmp"), 400, 300);
    write_junk_image(&temp.path().join("junk.png"));

    let mut doc = Document::with_path(temp.path().join("doc.json"));
    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");
    catalog.refresh(&mut doc.store).expect("refresh");

    let wide = catalog.get("wide.bmp").expect("wide");
    assert_eq!((wide.pixel_width, wide.pixel_height), (400, 300));
    assert_eq!(wide.description, "wide.bmp");
    let preview = wide.preview.as_ref().expect("preview");
    assert!(preview.width <= PREVIEW_MAX_SIDE && preview.height <= PREVIEW_MAX_SIDE);
    assert_eq!(preview.rgba.len(), (preview.width * preview.height * 4) as usize);

    let junk = catalog.get("junk.png").expect("junk is still cataloged");
    assert!(!junk.usable());
    assert!(doc.store.contains("junk.png"));
}

#[test]
fn navigation_is_clamped() {
    let temp = tempfile::tempdir().expect("create temp dir");
    for name in ["a.bmp", "b.bmp"] {
        write_bmp(&temp.path().join(name), 4, 4);
    }

    let mut doc = Document::with_path(temp.path().join("doc.json"));
    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");
    catalog.refresh(&mut doc.store).expect("refresh");

    assert!(catalog.prev().is_none());
    assert!(catalog.next().is_some());
    assert_eq!(catalog.current_image().expect("current").id.as_str(), "b.bmp");
    assert!(catalog.next().is_none());
}

#[test]
fn loader_decodes_the_selected_image() {
    let temp = tempfile::tempdir().expect("create temp dir");
    write_bmp(&temp.path().join("a.bmp"), 12, 8);

    let mut doc = Document::with_path(temp.path().join("doc.json"));
    let mut catalog = ImageCatalog::for_document(&doc).expect("catalog");
    catalog.refresh(&mut doc.store).expect("refresh");

    let mut loader = CurrentImageLoader::spawn(catalog.decoder()).expect("spawn loader");
    loader.follow(&catalog);

    match loader.wait(Duration::from_secs(10)) {
        Some(LoadResult::Loaded { id, pixels }) => {
            assert_eq!(id.as_str(), "a.bmp");
            assert_eq!((pixels.width, pixels.height), (12, 8));
        }
        other => panic!("expected loaded image, got {:?}", other),
    }
}
