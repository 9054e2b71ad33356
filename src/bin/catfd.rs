//! Cat face and facial landmark detection CLI.
//!
//! Usage:
//!   catfd -i photo.jpg -a -l            # annotate one image
//!   catfd -f photos/ --json             # batch a folder, JSON per image
//!   catfd -i photo.jpg -c -o chips/     # save a crop of each face

use std::path::PathBuf;

use clap::{ArgGroup, Parser};
use log::info;

use catfd::pipeline::{process_folder, process_image, DetectOptions, ImageReport};
use catfd::{face_summary, CascadePredictor, Detector, Error, FaceReport, Result, SeetaFaceLocator};

#[derive(Parser, Debug)]
#[command(name = "catfd")]
#[command(author, version, about = "Detects cat faces and facial landmarks", long_about = None)]
#[command(group(
    ArgGroup::new("input")
        .required(true)
        .multiple(true)
        .args(["input_image", "input_folder"]),
))]
struct Args {
    /// Input image
    #[arg(short = 'i', long, value_name = "FILE")]
    input_image: Option<PathBuf>,

    /// Input folder
    #[arg(short = 'f', long, value_name = "PATH")]
    input_folder: Option<PathBuf>,

    /// Output location
    #[arg(short = 'o', long, value_name = "PATH", default_value = ".")]
    output_path: PathBuf,

    /// Output face and landmark information as JSON
    #[arg(short = 'j', long)]
    json: bool,

    /// Save a cropped version of each detected cat face
    #[arg(short = 'c', long)]
    save_chip: bool,

    /// Draw a square around each detected cat face
    #[arg(short = 'a', long)]
    annotate_faces: bool,

    /// Draw lines between detected facial landmarks
    #[arg(short = 'l', long)]
    annotate_landmarks: bool,

    /// Face square color
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"], default_values_t = vec![25, 255, 100])]
    face_color: Vec<u8>,

    /// Facial landmark line color
    #[arg(long, num_args = 3, value_names = ["R", "G", "B"], default_values_t = vec![255, 50, 100])]
    landmark_color: Vec<u8>,

    /// Face detector model path
    #[arg(long, value_name = "FILE", default_value = "data/detector.bin")]
    detector: PathBuf,

    /// Landmark predictor model path
    #[arg(long, value_name = "FILE", default_value = "data/predictor.bin")]
    predictor: PathBuf,

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
    info!("loading face detector from {}", args.detector.display());
    let locator = SeetaFaceLocator::from_model(&args.detector)?;
    info!("loading landmark predictor from {}", args.predictor.display());
    let predictor = CascadePredictor::load(&args.predictor)?;
    let mut detector = Detector::new(locator, predictor);

    let options = DetectOptions {
        output_dir: args.output_path.clone(),
        save_chip: args.save_chip,
        annotate_faces: args.annotate_faces,
        annotate_landmarks: args.annotate_landmarks,
        face_color: rgb(&args.face_color),
        landmark_color: rgb(&args.landmark_color),
    };

    if let Some(image) = &args.input_image {
        let report = process_image(&mut detector, image, &options)?;
        emit(&report, args.json)?;
    }

    if let Some(folder) = &args.input_folder {
        let summary = process_folder(&mut detector, folder, &options)?;
        for report in &summary.reports {
            emit(report, args.json)?;
        }
        if !summary.failures.is_empty() {
            eprintln!("\n{} file(s) could not be processed:", summary.failures.len());
            for (file, err) in &summary.failures {
                eprintln!("  {}: {}", file.display(), err);
            }
        }
    }

    Ok(())
}

fn emit(report: &ImageReport, json: bool) -> Result<()> {
    if json {
        let faces: Vec<FaceReport> = report.faces.iter().map(FaceReport::from).collect();
        let rendered = serde_json::to_string_pretty(&faces)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        println!("{}", rendered);
    } else {
        println!("\nImage: {}", report.file.display());
        println!("Number of cat faces detected: {}", report.faces.len());
        for (i, face) in report.faces.iter().enumerate() {
            print!("{}", face_summary(i, face));
        }
    }
    Ok(())
}

fn rgb(values: &[u8]) -> [u8; 3] {
    [values[0], values[1], values[2]]
}
