//! Training-data authoring for the cat face detector and shape predictor.
//!
//! Builds imglab dataset XML from plain-text annotation listings, validates
//! existing dataset files and prints the imglab command for hand-correcting
//! annotations. Model training itself runs in the external trainer against
//! the files this tool produces.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgGroup, Parser};
use log::info;

use catfd::{BoxStyle, Dataset, DatasetPaths, Error, Face, Result};

#[derive(Parser, Debug)]
#[command(name = "traindata")]
#[command(author, version, about = "Authors and checks cat face training datasets", long_about = None)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .multiple(true)
        .args(["build", "check", "imglab"]),
))]
struct Args {
    /// Build a dataset from an annotation listing: one face per line,
    /// `<image-path> 9 x1 y1 ... x9 y9`
    #[arg(short = 'b', long, value_name = "FILE")]
    build: Option<PathBuf>,

    /// Where to write the built dataset (default: the configured training XML)
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Export tight boxes instead of the squared training boxes
    #[arg(long)]
    tight_boxes: bool,

    /// Parse a dataset file and report its contents
    #[arg(long, value_name = "FILE")]
    check: Option<PathBuf>,

    /// Print the imglab command for the configured training data
    #[arg(long)]
    imglab: bool,

    /// Dataset paths configuration file (JSON)
    #[arg(short = 'C', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short = 'd', long)]
    debug: bool,
}

fn main() {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(level));

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let paths = match &args.config {
        Some(path) => DatasetPaths::from_file(path)?,
        None => DatasetPaths::default(),
    };

    if let Some(listing) = &args.build {
        let style = if args.tight_boxes {
            BoxStyle::Tight
        } else {
            BoxStyle::Square
        };
        let output = args
            .output
            .clone()
            .unwrap_or_else(|| paths.training_path());
        build_dataset(listing, &output, style)?;
    }

    if let Some(dataset_path) = &args.check {
        check_dataset(dataset_path)?;
    }

    if args.imglab {
        println!("{}", paths.imglab_command());
    }

    Ok(())
}

/// Parse every listing line into a face and write the grouped dataset.
fn build_dataset(listing: &Path, output: &Path, style: BoxStyle) -> Result<()> {
    let content = fs::read_to_string(listing)?;
    let mut faces = Vec::new();

    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (file, annotation) = line.split_once(char::is_whitespace).ok_or_else(|| {
            Error::MalformedAnnotation(format!("line {}: missing annotation", number + 1))
        })?;

        match Face::from_annotation(file, annotation) {
            Ok(face) => faces.push(face),
            Err(Error::MalformedAnnotation(msg)) => {
                return Err(Error::MalformedAnnotation(format!(
                    "line {}: {}",
                    number + 1,
                    msg
                )))
            }
            Err(e) => return Err(e),
        }
    }

    let dataset = Dataset::with_faces(faces);
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    dataset.save(output, style)?;

    info!(
        "wrote {} face(s) across {} image(s) to {}",
        dataset.face_count(),
        dataset.images.len(),
        output.display()
    );
    println!(
        "{}: {} image(s), {} face(s)",
        output.display(),
        dataset.images.len(),
        dataset.face_count()
    );
    Ok(())
}

/// Load a dataset file and report what it holds, flagging missing images.
fn check_dataset(path: &Path) -> Result<()> {
    let dataset = Dataset::load(path)?;

    println!("Dataset: {}", dataset.name);
    println!(
        "{} image(s), {} face(s)",
        dataset.images.len(),
        dataset.face_count()
    );

    let mut missing = 0;
    for entry in &dataset.images {
        if !Path::new(&entry.file).is_file() {
            missing += 1;
            println!("  missing image file: {}", entry.file);
        }
    }
    if missing > 0 {
        println!("{} referenced image(s) not found on disk", missing);
    }

    Ok(())
}
