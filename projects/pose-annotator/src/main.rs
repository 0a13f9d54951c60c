mod cli;
mod error;
mod logging;
mod pipeline;
mod run_report;

use anyhow::{Context, Result};
use cli::Args;
use pipeline::annotator::detect_sequence;
use pipeline::detection::{PoseDetector, UslsPoseDetector};
use pipeline::render::OpencvRenderer;
use pipeline::worker::detect_sequence_parallel;
use run_report::{write_report, RunReport};

fn main() -> Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let args = Args::parse_args();
    logging::init(&args.log_level)?;

    let options = args.annotate_options();
    let renderer = OpencvRenderer::default().with_min_visibility(args.min_confidence);

    let summary = if args.workers > 1 {
        let factory = || -> Result<Box<dyn PoseDetector>> {
            let detector =
                UslsPoseDetector::new(&args.model, args.min_confidence, args.min_keypoints)
                    .with_context(|| format!("Failed to load pose model: {}", args.model))?;
            Ok(Box::new(detector))
        };
        detect_sequence_parallel(&options, args.workers, &factory, &renderer, None)?
    } else {
        let mut detector =
            UslsPoseDetector::new(&args.model, args.min_confidence, args.min_keypoints)
                .with_context(|| format!("Failed to load pose model: {}", args.model))?;
        detect_sequence(&options, &mut detector, &renderer, None)?
    };

    if let Some(path) = &args.summary {
        write_report(path, &RunReport::new(&options, &summary))?;
    }

    println!("{:.6}", summary.ratio());
    Ok(())
}
