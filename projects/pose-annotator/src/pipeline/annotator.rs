// Batch pose annotation: list frames, detect, draw, write, summarize.

use crate::error::{AnnotateError, AnnotateResult};
use crate::pipeline::codec::{read_frame, swap_channel_order, write_frame};
use crate::pipeline::detection::PoseDetector;
use crate::pipeline::frames::list_frames;
use crate::pipeline::render::LandmarkRenderer;
use crate::pipeline::topology::Topology;
use crate::pipeline::types::{ColorPolicy, FrameEntry, FrameOutcome, FrameRange, RunSummary};
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use opencv::core::Mat;
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Case-sensitive substring the file name must contain
    pub extension: String,
    pub range: FrameRange,
    pub color_policy: ColorPolicy,
    /// Create `output_dir` when missing instead of failing
    pub create_output_dir: bool,
    pub show_progress: bool,
}

impl AnnotateOptions {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            extension: ".jpg".to_string(),
            range: FrameRange::All,
            color_policy: ColorPolicy::Preserve,
            create_output_dir: true,
            show_progress: false,
        }
    }
}

/// A hook invoked with every frame after it has been written.
pub trait FrameSink {
    fn on_frame(&mut self, name: &str, frame: &Mat) -> Result<()>;
}

/// Blanket implementation so any closure with the right signature
/// automatically implements FrameSink.
impl<F> FrameSink for F
where
    F: FnMut(&str, &Mat) -> Result<()>,
{
    fn on_frame(&mut self, name: &str, frame: &Mat) -> Result<()> {
        self(name, frame)
    }
}

/// A processed frame: its outcome and, unless it was skipped, the image that was written.
pub struct AnnotatedFrame {
    pub outcome: FrameOutcome,
    pub frame: Option<Mat>,
}

/// Annotates every selected frame of `options.input_dir` into `options.output_dir`.
///
/// Frames are processed in file name order with a single detector instance.
/// Frames that fail to decode are logged and skipped. The returned summary's
/// `ratio()` is the fraction of written frames in which a pose was found.
pub fn detect_sequence(
    options: &AnnotateOptions,
    detector: &mut dyn PoseDetector,
    renderer: &dyn LandmarkRenderer,
    mut on_frame: Option<&mut dyn FrameSink>,
) -> AnnotateResult<RunSummary> {
    let span = tracing::info_span!(
        "detect_sequence",
        input = %options.input_dir.display(),
        output = %options.output_dir.display()
    );
    let _guard = span.enter();

    let entries = prepare_run(options)?;
    let topology = detector.topology();
    let pb = progress_bar(entries.len(), options.show_progress);

    let mut summary = RunSummary::default();
    for entry in &entries {
        let annotated = annotate_frame(entry, options, detector, renderer, topology)?;

        if let (Some(sink), Some(frame)) = (on_frame.as_mut(), annotated.frame.as_ref()) {
            sink.on_frame(&entry.name, frame).map_err(AnnotateError::Hook)?;
        }

        tally(&mut summary, &entry.name, annotated.outcome);
        pb.inc(1);
    }
    pb.finish_and_clear();

    finish_run(options, summary)
}

/// Validates the directories and lists the frames to process.
pub(crate) fn prepare_run(options: &AnnotateOptions) -> AnnotateResult<Vec<FrameEntry>> {
    let input_dir = &options.input_dir;
    let metadata = fs::metadata(input_dir).map_err(|source| AnnotateError::InputDirectory {
        path: input_dir.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(AnnotateError::InputDirectory {
            path: input_dir.clone(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        });
    }

    let output_dir = &options.output_dir;
    if options.create_output_dir {
        fs::create_dir_all(output_dir).map_err(|source| AnnotateError::OutputDirectory {
            path: output_dir.clone(),
            source,
        })?;
    } else {
        let metadata =
            fs::metadata(output_dir).map_err(|source| AnnotateError::OutputDirectory {
                path: output_dir.clone(),
                source,
            })?;
        if !metadata.is_dir() {
            return Err(AnnotateError::OutputDirectory {
                path: output_dir.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }
    }

    let listing = list_frames(input_dir, &options.extension, options.range).map_err(|e| {
        AnnotateError::InputDirectory {
            path: input_dir.clone(),
            source: e.into(),
        }
    })?;

    if listing.excluded() > 0 {
        tracing::warn!(
            "{} of {} frames matching '{}' fall outside {:?} and will not be processed",
            listing.excluded(),
            listing.matched,
            options.extension,
            options.range
        );
    }

    let entries = listing.entries;
    if entries.is_empty() {
        return Err(empty_input(options));
    }

    tracing::info!(
        "Processing {} frames matching '{}' ({:?})",
        entries.len(),
        options.extension,
        options.range
    );
    Ok(entries)
}

/// Logs the final tally and rejects runs where no frame could be processed.
pub(crate) fn finish_run(
    options: &AnnotateOptions,
    summary: RunSummary,
) -> AnnotateResult<RunSummary> {
    if summary.total_frames == 0 {
        return Err(empty_input(options));
    }

    tracing::info!(
        "found={} of {}, skipped={}, ratio={:.4}",
        summary.frames_with_pose,
        summary.total_frames,
        summary.skipped_frames,
        summary.ratio()
    );
    Ok(summary)
}

/// Adds a frame outcome to the summary.
pub(crate) fn tally(summary: &mut RunSummary, name: &str, outcome: FrameOutcome) {
    let found = matches!(outcome, FrameOutcome::PoseFound { .. });
    summary.record(name, outcome);
    if found {
        tracing::info!(
            "Pose found in {} (total {} poses found)",
            name,
            summary.frames_with_pose
        );
    }
}

fn empty_input(options: &AnnotateOptions) -> AnnotateError {
    AnnotateError::EmptyInput {
        dir: options.input_dir.clone(),
        extension: options.extension.clone(),
    }
}

/// Runs a single frame through decode, detection, overlay and write.
pub(crate) fn annotate_frame(
    entry: &FrameEntry,
    options: &AnnotateOptions,
    detector: &mut dyn PoseDetector,
    renderer: &dyn LandmarkRenderer,
    topology: Topology,
) -> AnnotateResult<AnnotatedFrame> {
    let image = match read_frame(&entry.path) {
        Ok(image) => image,
        Err(e) => {
            let err = AnnotateError::FrameDecode {
                path: entry.path.clone(),
                reason: format!("{:#}", e),
            };
            tracing::warn!("{}, skipping", err);
            return Ok(AnnotatedFrame {
                outcome: FrameOutcome::Skipped {
                    reason: format!("{:#}", e),
                },
                frame: None,
            });
        }
    };

    let pose = detector.detect(&image).map_err(AnnotateError::Detector)?;

    let (outcome, rendered) = match pose {
        Some(landmarks) => {
            let mut pose_img = image;
            renderer
                .draw(&mut pose_img, &landmarks, topology.connections())
                .map_err(AnnotateError::Render)?;
            if options.color_policy.swaps_found_frames() {
                pose_img = swap_channel_order(&pose_img).map_err(AnnotateError::Render)?;
            }
            (
                FrameOutcome::PoseFound {
                    landmarks: landmarks.landmarks.len(),
                },
                pose_img,
            )
        }
        None => {
            tracing::debug!("Pose not found in {} (position {})", entry.name, entry.index);
            (FrameOutcome::NoPose, image)
        }
    };

    let out_path = options.output_dir.join(&entry.name);
    write_frame(&out_path, &rendered).map_err(|e| AnnotateError::OutputWrite {
        path: out_path.clone(),
        reason: format!("{:#}", e),
    })?;

    Ok(AnnotatedFrame {
        outcome,
        frame: Some(rendered),
    })
}

pub(crate) fn progress_bar(len: usize, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec:.1.yellow} fps, {eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}
