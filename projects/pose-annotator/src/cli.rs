use crate::pipeline::annotator::AnnotateOptions;
use crate::pipeline::types::{ColorPolicy, FrameRange};
use clap::Parser;
use std::path::PathBuf;

/// Detects human poses in a directory of image frames and writes annotated copies.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory holding the input image sequence
    #[arg(short, long, env = "POSE_ANNOTATOR_INPUT", default_value = "/tmp/input/")]
    pub input: PathBuf,

    /// Directory receiving the annotated image sequence
    #[arg(short, long, env = "POSE_ANNOTATOR_OUTPUT", default_value = "/tmp/output/")]
    pub output: PathBuf,

    /// Substring a file name must contain to be processed (case-sensitive)
    #[arg(short, long, env = "POSE_ANNOTATOR_EXTENSION", default_value = ".jpg")]
    pub extension: String,

    /// Position of the first image to process, in file name order
    #[arg(short, long, default_value_t = 0)]
    pub first: usize,

    /// Position of the last image to process (inclusive)
    #[arg(short, long, default_value_t = 120)]
    pub last: usize,

    /// Process every matching image, ignoring --first and --last
    #[arg(long)]
    pub all_frames: bool,

    /// Path to the YOLO pose ONNX model
    #[arg(short, long, env = "POSE_ANNOTATOR_MODEL")]
    pub model: String,

    /// Minimum keypoint confidence for a landmark to count as visible
    #[arg(long, default_value_t = 0.5)]
    pub min_confidence: f32,

    /// Minimum number of visible keypoints for a pose to count as found
    #[arg(long, default_value_t = 5)]
    pub min_keypoints: usize,

    /// Channel order handling when writing frames
    #[arg(long, value_enum, default_value_t = ColorPolicy::Preserve)]
    pub color_policy: ColorPolicy,

    /// Fail instead of creating a missing output directory
    #[arg(long)]
    pub no_create_output: bool,

    /// Number of annotation worker threads, each with its own model instance
    #[arg(long, default_value_t = 1)]
    pub workers: usize,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub summary: Option<PathBuf>,

    /// Log filter, e.g. "info" or "pose_annotator=debug"
    #[arg(long, env = "POSE_ANNOTATOR_LOG", default_value = "info")]
    pub log_level: String,

    /// Hide the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn frame_range(&self) -> FrameRange {
        if self.all_frames {
            FrameRange::All
        } else {
            FrameRange::Window {
                first: self.first,
                last: self.last,
            }
        }
    }

    pub fn annotate_options(&self) -> AnnotateOptions {
        AnnotateOptions {
            extension: self.extension.clone(),
            range: self.frame_range(),
            color_policy: self.color_policy,
            create_output_dir: !self.no_create_output,
            show_progress: !self.no_progress,
            ..AnnotateOptions::new(&self.input, &self.output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["pose-annotator", "-m", "yolo-pose.onnx"]).unwrap();
        assert_eq!(args.input, PathBuf::from("/tmp/input/"));
        assert_eq!(args.output, PathBuf::from("/tmp/output/"));
        assert_eq!(args.extension, ".jpg");
        assert_eq!(args.workers, 1);
        assert_eq!(args.frame_range(), FrameRange::Window { first: 0, last: 120 });

        let options = args.annotate_options();
        assert_eq!(options.color_policy, ColorPolicy::Preserve);
        assert!(options.create_output_dir);
        assert!(options.show_progress);
    }

    #[test]
    fn test_short_flags_and_policies() {
        let args = Args::try_parse_from([
            "pose-annotator",
            "-i",
            "frames",
            "-o",
            "annotated",
            "-e",
            ".png",
            "-f",
            "2",
            "-l",
            "4",
            "-m",
            "model.onnx",
            "--color-policy",
            "legacy",
            "--no-create-output",
        ])
        .unwrap();

        let options = args.annotate_options();
        assert_eq!(options.input_dir, PathBuf::from("frames"));
        assert_eq!(options.output_dir, PathBuf::from("annotated"));
        assert_eq!(options.extension, ".png");
        assert_eq!(options.range, FrameRange::Window { first: 2, last: 4 });
        assert_eq!(options.color_policy, ColorPolicy::Legacy);
        assert!(!options.create_output_dir);
    }

    #[test]
    fn test_all_frames_overrides_window() {
        let args = Args::try_parse_from([
            "pose-annotator",
            "-m",
            "model.onnx",
            "-f",
            "3",
            "--all-frames",
        ])
        .unwrap();
        assert_eq!(args.frame_range(), FrameRange::All);
    }
}
