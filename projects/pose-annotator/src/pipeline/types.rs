use serde::Serialize;
use std::path::PathBuf;

/// A single named keypoint in pixel coordinates of the frame it was detected in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Landmark {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
    /// Visibility / confidence in [0, 1]
    pub visibility: f32,
}

impl Landmark {
    pub fn new(index: usize, x: f32, y: f32, visibility: f32) -> Self {
        Self {
            index,
            name: None,
            x,
            y,
            z: None,
            visibility,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// The landmarks of one detected person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LandmarkSet {
    pub landmarks: Vec<Landmark>,
    /// Overall detection score, used to pick a person when several are found
    pub score: f32,
}

impl LandmarkSet {
    pub fn new(landmarks: Vec<Landmark>, score: f32) -> Self {
        Self { landmarks, score }
    }

    /// Looks up a landmark by its topology index.
    pub fn get(&self, index: usize) -> Option<&Landmark> {
        self.landmarks.iter().find(|l| l.index == index)
    }

    pub fn visible_count(&self, min_visibility: f32) -> usize {
        self.landmarks
            .iter()
            .filter(|l| l.visibility >= min_visibility)
            .count()
    }
}

/// An input file selected for processing.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameEntry {
    /// Position in the sorted listing, before the range is applied
    pub index: usize,
    pub name: String,
    pub path: PathBuf,
}

/// Which positions of the sorted frame listing get processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRange {
    /// Inclusive `first..=last`, clamped to the listing
    Window { first: usize, last: usize },
    /// Every matching file, regardless of position
    All,
}

impl FrameRange {
    pub fn contains(&self, index: usize) -> bool {
        match *self {
            FrameRange::Window { first, last } => index >= first && index <= last,
            FrameRange::All => true,
        }
    }
}

/// How channel order is handled when writing a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Every frame is written in its decoded channel order
    #[default]
    Preserve,
    /// Frames with a pose get their R and B channels swapped, the rest are untouched
    Legacy,
}

impl ColorPolicy {
    pub fn swaps_found_frames(&self) -> bool {
        matches!(self, ColorPolicy::Legacy)
    }
}

/// What happened to a single frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FrameOutcome {
    PoseFound { landmarks: usize },
    NoPose,
    Skipped { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub name: String,
    #[serde(flatten)]
    pub outcome: FrameOutcome,
}

/// Counters accumulated over a run, plus the per-frame trail.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub frames_with_pose: usize,
    /// Frames that were decoded and written; skipped frames are not counted
    pub total_frames: usize,
    pub skipped_frames: usize,
    pub frames: Vec<FrameRecord>,
}

impl RunSummary {
    pub fn record(&mut self, name: &str, outcome: FrameOutcome) {
        match outcome {
            FrameOutcome::PoseFound { .. } => {
                self.frames_with_pose += 1;
                self.total_frames += 1;
            }
            FrameOutcome::NoPose => self.total_frames += 1,
            FrameOutcome::Skipped { .. } => self.skipped_frames += 1,
        }
        self.frames.push(FrameRecord {
            name: name.to_string(),
            outcome,
        });
    }

    /// Fraction of processed frames with a pose. Zero when nothing was processed.
    pub fn ratio(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.frames_with_pose as f64 / self.total_frames as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_and_ratio() {
        let mut summary = RunSummary::default();
        summary.record(
            "a.jpg",
            FrameOutcome::PoseFound { landmarks: 12 },
        );
        summary.record("b.jpg", FrameOutcome::NoPose);
        summary.record(
            "c.jpg",
            FrameOutcome::Skipped {
                reason: "corrupt".to_string(),
            },
        );
        summary.record(
            "d.jpg",
            FrameOutcome::PoseFound { landmarks: 3 },
        );

        assert_eq!(summary.frames_with_pose, 2);
        assert_eq!(summary.total_frames, 3);
        assert_eq!(summary.skipped_frames, 1);
        assert_eq!(summary.frames.len(), 4);
        assert!((summary.ratio() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_of_empty_summary_is_zero() {
        assert_eq!(RunSummary::default().ratio(), 0.0);
    }

    #[test]
    fn test_frame_range_window_is_inclusive() {
        let range = FrameRange::Window { first: 2, last: 4 };
        let selected: Vec<usize> = (0..10).filter(|i| range.contains(*i)).collect();
        assert_eq!(selected, vec![2, 3, 4]);

        assert!((0..10).all(|i| FrameRange::All.contains(i)));

        // Inverted bounds select nothing
        let inverted = FrameRange::Window { first: 5, last: 1 };
        assert!((0..10).all(|i| !inverted.contains(i)));
    }

    #[test]
    fn test_landmark_set_lookup_and_visibility() {
        let set = LandmarkSet::new(
            vec![
                Landmark::new(0, 1.0, 2.0, 0.9).with_name("nose"),
                Landmark::new(5, 3.0, 4.0, 0.2),
            ],
            0.55,
        );
        assert_eq!(set.get(0).and_then(|l| l.name.as_deref()), Some("nose"));
        assert!(set.get(1).is_none());
        assert_eq!(set.visible_count(0.5), 1);
        assert_eq!(set.visible_count(0.1), 2);
    }

    #[test]
    fn test_frame_record_serializes_flat() {
        let record = FrameRecord {
            name: "x.jpg".to_string(),
            outcome: FrameOutcome::NoPose,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "x.jpg");
        assert_eq!(json["status"], "no_pose");
    }
}
