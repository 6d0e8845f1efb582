//! Boxmark: bounding-box image annotation with YOLO export.
//!
//! A document holds an ordered label registry and one annotation record per
//! image file in the document's directory. Boxes are stored in pixel space
//! (centre plus size) and normalized only when exporting.
//!
//! # Modules
//!
//! - [`model`]: Labels, coordinates, annotation store, and the document
//! - [`catalog`]: Directory scanning, reconciliation, and image decoding
//! - [`export`]: YOLO-style class list and per-image annotation files
//! - [`validation`]: Document validation and error reporting
//! - [`error`]: Error types for boxmark operations

pub mod catalog;
pub mod error;
pub mod export;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};

pub use error::BoxmarkError;

use catalog::ImageCatalog;
use model::io_json::{read_document, write_document};
use model::{AnnotationStore, Color, Coordinates, Document, Label};

/// The boxmark CLI application.
#[derive(Parser)]
#[command(name = "boxmark")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create an empty document file.
    Init(InitArgs),
    /// Reconcile the document with the images in its directory.
    Scan(DocumentArg),
    /// List or edit the label registry.
    Labels(LabelsArgs),
    /// Add a bounding box to an image.
    Annotate(AnnotateArgs),
    /// Remove a bounding box from an image.
    Unannotate(AnnotateArgs),
    /// Show cataloged images and their labels.
    Show(ShowArgs),
    /// Write the class list and per-image annotation files.
    Export(ExportArgs),
    /// Validate a document for errors and warnings.
    Validate(ValidateArgs),
}

/// Path of the document to operate on.
#[derive(clap::Args)]
struct DocumentArg {
    /// Document file (JSON).
    #[arg(env = "BOXMARK_DOCUMENT")]
    document: PathBuf,
}

#[derive(clap::Args)]
struct InitArgs {
    #[command(flatten)]
    doc: DocumentArg,

    /// Overwrite an existing document.
    #[arg(long)]
    force: bool,
}

#[derive(clap::Args)]
struct LabelsArgs {
    #[command(flatten)]
    doc: DocumentArg,

    #[command(subcommand)]
    action: Option<LabelAction>,
}

#[derive(Subcommand)]
enum LabelAction {
    /// List labels with their export index (default).
    List,
    /// Register a new label.
    Add {
        text: String,
        /// Display color as #rrggbb (defaults to the next palette color).
        #[arg(long)]
        color: Option<Color>,
    },
    /// Unregister a label. Existing annotations keep referencing it.
    Remove { text: String },
    /// Rename a label and every annotation that uses it.
    Rename { old: String, new: String },
    /// Change a label's color and every annotation that uses it.
    Recolor { text: String, color: Color },
    /// Move a label to a new position, changing its export index.
    Move { text: String, index: usize },
    /// Register every name from a class-list YAML file.
    Import { class_list: PathBuf },
}

#[derive(clap::Args)]
struct AnnotateArgs {
    #[command(flatten)]
    doc: DocumentArg,

    /// Image file name.
    image: String,

    /// Label text.
    #[arg(long)]
    label: String,

    /// Box centre x, in pixels.
    #[arg(long, allow_negative_numbers = true)]
    x: i64,

    /// Box centre y, in pixels.
    #[arg(long, allow_negative_numbers = true)]
    y: i64,

    /// Box width, in pixels.
    #[arg(long, allow_negative_numbers = true)]
    width: i64,

    /// Box height, in pixels.
    #[arg(long, allow_negative_numbers = true)]
    height: i64,
}

#[derive(clap::Args)]
struct ShowArgs {
    #[command(flatten)]
    doc: DocumentArg,

    /// Only show this image, with its annotations.
    image: Option<String>,
}

#[derive(clap::Args)]
struct ExportArgs {
    #[command(flatten)]
    doc: DocumentArg,

    /// Treat skipped annotations and images as failures.
    #[arg(long)]
    strict: bool,
}

#[derive(clap::Args)]
struct ValidateArgs {
    #[command(flatten)]
    doc: DocumentArg,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    output: ReportFormat,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

/// Run the boxmark CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), BoxmarkError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init(args)) => run_init(args),
        Some(Commands::Scan(args)) => run_scan(args),
        Some(Commands::Labels(args)) => run_labels(args),
        Some(Commands::Annotate(args)) => run_annotate(args),
        Some(Commands::Unannotate(args)) => run_unannotate(args),
        Some(Commands::Show(args)) => run_show(args),
        Some(Commands::Export(args)) => run_export(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("boxmark {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Bounding-box image annotation with YOLO export.");
            println!();
            println!("Run 'boxmark --help' for usage information.");
            Ok(())
        }
    }
}

fn run_init(args: InitArgs) -> Result<(), BoxmarkError> {
    let path = args.doc.document;
    if path.exists() && !args.force {
        return Err(BoxmarkError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("{} already exists (use --force to overwrite)", path.display()),
        )));
    }
    write_document(&Document::with_path(&path))?;
    println!("Created {}", path.display());
    Ok(())
}

/// Opens the document and reconciles it with its directory.
fn open_reconciled(path: &Path) -> Result<(Document, ImageCatalog), BoxmarkError> {
    let mut doc = read_document(path)?;
    let mut catalog = ImageCatalog::for_document(&doc)?;
    catalog.refresh(&mut doc.store)?;
    Ok((doc, catalog))
}

fn run_scan(args: DocumentArg) -> Result<(), BoxmarkError> {
    let mut doc = read_document(&args.document)?;
    let mut catalog = ImageCatalog::for_document(&doc)?;
    let outcome = catalog.refresh(&mut doc.store)?;
    write_document(&doc)?;

    for id in &outcome.added {
        println!("+ {}", id);
    }
    for id in &outcome.removed {
        println!("- {}", id);
    }
    println!(
        "{} image(s) cataloged ({} added, {} removed)",
        catalog.len(),
        outcome.added.len(),
        outcome.removed.len()
    );
    Ok(())
}

fn run_labels(args: LabelsArgs) -> Result<(), BoxmarkError> {
    let mut doc = read_document(&args.doc.document)?;

    match args.action.unwrap_or(LabelAction::List) {
        LabelAction::List => {
            if doc.labels.is_empty() {
                println!("{}", model::NO_LABELS);
            }
            for (index, label) in doc.labels.iter().enumerate() {
                println!("{:>3}  {}  {}", index, label.color, label.text);
            }
            return Ok(());
        }
        LabelAction::Add { text, color } => {
            let color = color.unwrap_or_else(|| doc.labels.next_color());
            if !doc.labels.add(Label::new(text.clone(), color)) {
                return Err(BoxmarkError::LabelExists(text));
            }
            println!("Added label '{}' ({})", text, color);
        }
        LabelAction::Remove { text } => {
            if doc.labels.remove(&text).is_none() {
                return Err(BoxmarkError::LabelNotFound(text));
            }
            println!("Removed label '{}'", text);
        }
        LabelAction::Rename { old, new } => {
            let updated = doc.rename_label(&old, &new)?;
            println!(
                "Renamed label '{}' to '{}' ({} annotation(s) updated)",
                old, new, updated
            );
        }
        LabelAction::Recolor { text, color } => {
            let updated = doc.recolor_label(&text, color)?;
            println!(
                "Recolored label '{}' to {} ({} annotation(s) updated)",
                text, color, updated
            );
        }
        LabelAction::Move { text, index } => {
            let placed = doc.labels.move_label(&text, index)?;
            println!("Moved label '{}' to index {}", text, placed);
        }
        LabelAction::Import { class_list } => {
            let names = export::read_class_list(&class_list)?;
            let mut added = 0;
            for name in names {
                if doc.labels.add_text(name) {
                    added += 1;
                }
            }
            println!(
                "Imported {} label(s) from {}",
                added,
                class_list.display()
            );
        }
    }

    write_document(&doc)
}

fn run_annotate(args: AnnotateArgs) -> Result<(), BoxmarkError> {
    let (mut doc, _catalog) = open_reconciled(&args.doc.document)?;
    let annotation = doc.annotate(
        &args.image,
        &args.label,
        Coordinates::new(args.x, args.y, args.width, args.height),
    )?;
    write_document(&doc)?;
    println!(
        "Annotated {} with '{}' at {:?}",
        args.image, annotation.label.text, annotation.coordinates
    );
    Ok(())
}

fn run_unannotate(args: AnnotateArgs) -> Result<(), BoxmarkError> {
    let mut doc = read_document(&args.doc.document)?;
    if !doc.store.contains(&args.image) {
        return Err(BoxmarkError::ImageNotFound(args.image));
    }

    // Label text and geometry only; the stored label color may be stale.
    let target = doc
        .store
        .annotations_for(&args.image)
        .iter()
        .find(|a| {
            a.label.text == args.label
                && a.coordinates == Coordinates::new(args.x, args.y, args.width, args.height)
        })
        .cloned();

    match target {
        Some(annotation) => {
            doc.store.delete(&args.image, &annotation);
            write_document(&doc)?;
            println!("Removed annotation '{}' from {}", args.label, args.image);
        }
        None => println!("No matching annotation on {}", args.image),
    }
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<(), BoxmarkError> {
    let (doc, catalog) = open_reconciled(&args.doc.document)?;

    let images: Vec<_> = match &args.image {
        Some(id) => vec![catalog
            .get(id)
            .ok_or_else(|| BoxmarkError::ImageNotFound(id.clone()))?],
        None => catalog.images().iter().collect(),
    };

    if images.is_empty() {
        println!("No images in {}", catalog.directory().display());
    }

    for image in images {
        let labels: Vec<String> = doc
            .store
            .label_summary(image.id.as_str())
            .into_iter()
            .map(|(text, _)| text)
            .collect();
        println!(
            "{} ({}x{}): {}",
            image.description,
            image.pixel_width,
            image.pixel_height,
            labels.join(", ")
        );

        if args.image.is_some() {
            for annotation in doc.store.annotations_for(image.id.as_str()) {
                let c = &annotation.coordinates;
                println!(
                    "  {} x={} y={} width={} height={}",
                    annotation.label.text, c.x, c.y, c.width, c.height
                );
            }
        }
    }
    Ok(())
}

fn run_export(args: ExportArgs) -> Result<(), BoxmarkError> {
    let (doc, catalog) = open_reconciled(&args.doc.document)?;
    write_document(&doc)?;

    let report = export::export_all(&doc, &catalog)?;
    print!("{}", report);

    if !report.is_ok() || (args.strict && !report.is_clean()) {
        Err(BoxmarkError::ExportFailed {
            failure_count: report.failure_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

/// Execute the validate subcommand.
fn run_validate(args: ValidateArgs) -> Result<(), BoxmarkError> {
    let doc = read_document(&args.doc.document)?;

    // Catalog against a scratch store so records without files stay visible.
    let mut catalog = ImageCatalog::for_document(&doc)?;
    catalog.refresh(&mut AnnotationStore::new())?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_document(&doc, Some(&catalog), &opts);

    match args.output {
        ReportFormat::Json => {
            let output = serde_json::json!({
                "error_count": report.error_count(),
                "warning_count": report.warning_count(),
                "issues": &report.issues,
            });
            let text = serde_json::to_string_pretty(&output).map_err(std::io::Error::from)?;
            println!("{}", text);
        }
        ReportFormat::Text => print!("{}", report),
    }

    // Determine exit status
    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (args.strict && has_warnings) {
        Err(BoxmarkError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
