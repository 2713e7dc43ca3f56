//! Grapeset: annotation normalizer for grape detection datasets.
//!
//! Grapeset turns the mixed annotation sources of a grape-cluster dataset
//! (normalized label files, hand-edited box tables, multi-channel instance
//! masks) into one consistent collection format, and derives deterministic
//! train/validation/test splits.
//!
//! # Modules
//!
//! - [`ir`]: data model, geometry conversion and per-file codecs
//! - [`mask`]: instance mask reduction
//! - [`assemble`]: collection assembly and per-image documents
//! - [`split`]: split allocation
//! - [`validation`]: collection validation and error reporting
//! - [`report`]: batch outcome summaries
//! - [`error`]: error types for grapeset operations

pub mod assemble;
pub mod error;
pub mod ir;
pub mod mask;
pub mod report;
pub mod split;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use error::GrapesetError;

use assemble::DatasetLayout;
use mask::ReducePolicy;

/// The grapeset CLI application.
#[derive(Parser)]
#[command(name = "grapeset")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Assemble COCO collections for dataset splits.
    Coco(CocoArgs),
    /// Convert normalized label files into absolute box CSV files.
    YoloToCsv(YoloToCsvArgs),
    /// Reduce multi-channel instance masks to grayscale PNG masks.
    Masks(MasksArgs),
    /// Derive train/val/test/all/train_val split lists.
    Splits(SplitsArgs),
    /// Write one annotation document per image.
    ImageJson(ImageJsonArgs),
    /// Attach berry counts to per-image documents.
    Berries(BerriesArgs),
    /// Write the labeling-tool label map.
    Labelmap(LabelmapArgs),
    /// Validate a collection document.
    Validate(ValidateArgs),
}

#[derive(clap::Args)]
struct CocoArgs {
    /// Dataset root containing the category directory.
    #[arg(long, env = "GRAPESET_ROOT", default_value = ".")]
    root: PathBuf,

    /// Category directory name under the root.
    #[arg(long, default_value = "grapes")]
    category: String,

    /// Splits to assemble (train, val, test, all, train_val).
    #[arg(long, num_args = 1.., value_delimiter = ',', default_values = ["train", "val", "test"])]
    splits: Vec<String>,

    /// Output directory [default: <root>/annotations].
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args)]
struct YoloToCsvArgs {
    /// Directory with images and their `<stem>.txt` label files.
    #[arg(long)]
    data: PathBuf,

    /// Canonical images directory, preferred for reading image size.
    #[arg(long)]
    images: PathBuf,

    /// Output directory for `<stem>.csv` files.
    #[arg(long)]
    csv: PathBuf,
}

#[derive(clap::Args)]
struct MasksArgs {
    /// Directory with `.npz`/`.npy` instance masks.
    #[arg(long)]
    input: PathBuf,

    /// Output directory for `<stem>.png` masks.
    #[arg(long)]
    out: PathBuf,

    /// Reduction policy ('merge', 'first', or 'max').
    #[arg(long, default_value = "merge")]
    policy: String,
}

#[derive(clap::Args)]
struct SplitsArgs {
    /// Images directory; every image stem is listed in `all.txt`.
    #[arg(long)]
    images: PathBuf,

    /// Declared training list.
    #[arg(long)]
    train: PathBuf,

    /// Declared test list.
    #[arg(long)]
    test: PathBuf,

    /// Output directory for the split lists.
    #[arg(long)]
    out: PathBuf,
}

#[derive(clap::Args)]
struct ImageJsonArgs {
    /// Directory with `.jpg` images and `<stem>.txt` labels.
    #[arg(long)]
    data: PathBuf,

    /// Output directory [default: the data directory].
    #[arg(long)]
    out: Option<PathBuf>,
}

#[derive(clap::Args)]
struct BerriesArgs {
    /// Directory with per-image `.json` documents.
    #[arg(long)]
    json: PathBuf,

    /// Directory with `<stem>-berries.txt` point files.
    #[arg(long)]
    berries: PathBuf,
}

#[derive(clap::Args)]
struct LabelmapArgs {
    /// Directory to write `labelmap.json` into.
    #[arg(long)]
    out: PathBuf,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// Collection document to validate.
    input: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the grapeset CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), GrapesetError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Coco(args)) => run_coco(args),
        Some(Commands::YoloToCsv(args)) => run_yolo_to_csv(args),
        Some(Commands::Masks(args)) => run_masks(args),
        Some(Commands::Splits(args)) => run_splits(args),
        Some(Commands::ImageJson(args)) => run_image_json(args),
        Some(Commands::Berries(args)) => run_berries(args),
        Some(Commands::Labelmap(args)) => run_labelmap(args),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("grapeset {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Annotation normalizer for grape detection datasets.");
            println!();
            println!("Run 'grapeset --help' for usage information.");
            Ok(())
        }
    }
}

fn run_coco(args: CocoArgs) -> Result<(), GrapesetError> {
    let splits = split::parse_split_names(&args.splits)?;
    let layout = DatasetLayout::new(&args.root, args.category);
    let out_dir = args.out.unwrap_or_else(|| args.root.join("annotations"));

    let report = assemble::write_split_collections(&layout, &splits, &out_dir)?;
    print!("{}", report);
    Ok(())
}

fn run_yolo_to_csv(args: YoloToCsvArgs) -> Result<(), GrapesetError> {
    let report = assemble::yolo_to_csv::convert_directory(&args.data, &args.images, &args.csv)?;
    print!("{}", report);
    Ok(())
}

fn run_masks(args: MasksArgs) -> Result<(), GrapesetError> {
    let policy: ReducePolicy = args.policy.parse()?;
    let report = mask::reduce_directory(&args.input, &args.out, policy)?;
    print!("{}", report);
    Ok(())
}

fn run_splits(args: SplitsArgs) -> Result<(), GrapesetError> {
    let assignment = split::build_split_lists(&args.images, &args.train, &args.test, &args.out)?;
    println!(
        "Wrote split lists to {}: {} train, {} val, {} test, {} total",
        args.out.display(),
        assignment.train.len(),
        assignment.val.len(),
        assignment.test.len(),
        assignment.all.len()
    );
    Ok(())
}

fn run_image_json(args: ImageJsonArgs) -> Result<(), GrapesetError> {
    let out_dir = args.out.unwrap_or_else(|| args.data.clone());
    let report = assemble::generate::generate_image_documents(&args.data, &out_dir)?;
    print!("{}", report);
    Ok(())
}

fn run_berries(args: BerriesArgs) -> Result<(), GrapesetError> {
    let report = assemble::enrich::add_berry_counts(&args.json, &args.berries)?;
    print!("{}", report);
    Ok(())
}

fn run_labelmap(args: LabelmapArgs) -> Result<(), GrapesetError> {
    let path = ir::io_labelmap::write_labelmap(&args.out)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), GrapesetError> {
    if !matches!(args.output.as_str(), "text" | "json") {
        return Err(GrapesetError::InvalidArgument(format!(
            "unknown report output '{}' (supported: text, json)",
            args.output
        )));
    }

    let collection = ir::io_coco_json::read_collection_json(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
    };
    let report = validation::validate_collection(&collection, &opts);

    if args.output == "json" {
        let json = serde_json::to_string_pretty(&report).map_err(GrapesetError::ReportSerialize)?;
        println!("{}", json);
    } else {
        print!("{}", report);
    }

    if report.fails(args.strict) {
        Err(GrapesetError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
