#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::PathBuf;

use boxmark::catalog::CatalogImage;
use boxmark::model::{Coordinates, ImageId, LabelRegistry, ObjectAnnotation};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Image dimensions large enough to exercise rounding, small enough that six
/// decimals still identify every pixel.
pub fn arb_image_dims() -> BoxedStrategy<(u32, u32)> {
    (1u32..=8192, 1u32..=8192).boxed()
}

/// A box whose centre lies inside the image and whose size fits it.
pub fn arb_box_within(width: u32, height: u32) -> BoxedStrategy<Coordinates> {
    let (w, h) = (i64::from(width), i64::from(height));
    (0..=w, 0..=h, 0..=w, 0..=h)
        .prop_map(|(x, y, bw, bh)| Coordinates::new(x, y, bw, bh))
        .boxed()
}

/// Between 1 and `max` distinct label texts, in generation order.
pub fn arb_label_texts(max: usize) -> BoxedStrategy<Vec<String>> {
    prop::collection::btree_set("[a-z]{1,6}[0-9]( [a-z]{1,6})?", 1..=max)
        .prop_map(|set: BTreeSet<String>| set.into_iter().collect())
        .prop_shuffle()
        .boxed()
}

pub fn registry_from(texts: &[String]) -> LabelRegistry {
    let mut registry = LabelRegistry::new();
    for text in texts {
        registry.add_text(text.clone());
    }
    registry
}

pub fn catalog_image(name: &str, width: u32, height: u32) -> CatalogImage {
    CatalogImage {
        id: ImageId::from(name),
        path: PathBuf::from(name),
        description: name.to_string(),
        preview: None,
        stamp: None,
        pixel_width: width,
        pixel_height: height,
    }
}

/// An image plus annotations whose labels are drawn from `texts`.
pub fn arb_annotated_image(
    texts: Vec<String>,
    max_annotations: usize,
) -> BoxedStrategy<(CatalogImage, Vec<ObjectAnnotation>)> {
    arb_image_dims()
        .prop_flat_map(move |(width, height)| {
            let registry = registry_from(&texts);
            let labels = registry.labels().to_vec();
            let annotation = (0..labels.len(), arb_box_within(width, height)).prop_map(
                move |(index, coords)| ObjectAnnotation::new(labels[index].clone(), coords),
            );
            (
                Just(catalog_image("img.jpg", width, height)),
                prop::collection::vec(annotation, 0..=max_annotations),
            )
        })
        .boxed()
}

/// Parses a `{index} {cx} {cy} {w} {h}` annotation line.
pub fn parse_annotation_line(line: &str) -> Result<(usize, [f64; 4]), String> {
    let parts: Vec<&str> = line.split(' ').collect();
    if parts.len() != 5 {
        return Err(format!("expected 5 fields, got {}: {:?}", parts.len(), line));
    }
    let index = parts[0]
        .parse::<usize>()
        .map_err(|e| format!("bad class index {:?}: {}", parts[0], e))?;
    let mut values = [0.0; 4];
    for (slot, raw) in values.iter_mut().zip(&parts[1..]) {
        *slot = raw
            .parse::<f64>()
            .map_err(|e| format!("bad value {:?}: {}", raw, e))?;
    }
    Ok((index, values))
}
