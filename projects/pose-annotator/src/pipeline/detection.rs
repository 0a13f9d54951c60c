use crate::pipeline::codec::mat_to_dynamic_image;
use crate::pipeline::topology::Topology;
use crate::pipeline::types::{Landmark, LandmarkSet};
use anyhow::Result;
use opencv::core::Mat;
use usls::models::YOLO;
use usls::{Config, Image};

/// A pose estimator run in single-image mode: no state is carried between calls.
pub trait PoseDetector {
    /// The landmark graph the returned landmarks index into.
    fn topology(&self) -> Topology;

    /// Detect the most prominent person in a BGR frame. `None` means no pose.
    fn detect(&mut self, frame: &Mat) -> Result<Option<LandmarkSet>>;
}

/// Builds one detector per worker thread.
pub type DetectorFactory<'a> = dyn Fn() -> Result<Box<dyn PoseDetector>> + Sync + 'a;

/// A wrapper around the USLS YOLO pose model (COCO 17 keypoints).
pub struct UslsPoseDetector {
    model: YOLO,
    min_confidence: f32,
    min_keypoints: usize,
}

impl UslsPoseDetector {
    /// Create a new detector with the given model path.
    pub fn new(model_path: &str, min_confidence: f32, min_keypoints: usize) -> Result<Self> {
        let config = Config::yolo_pose().with_model_file(model_path);

        #[cfg(target_os = "macos")]
        let config = config.with_model_device(usls::Device::CoreMl);

        let config = config.commit()?;
        let model = YOLO::new(config)?;
        tracing::info!("Loaded pose model from {}", model_path);

        Ok(Self {
            model,
            min_confidence,
            min_keypoints,
        })
    }
}

impl PoseDetector for UslsPoseDetector {
    fn topology(&self) -> Topology {
        Topology::Coco17
    }

    fn detect(&mut self, frame: &Mat) -> Result<Option<LandmarkSet>> {
        let image = Image::from(mat_to_dynamic_image(frame)?);
        let results = self.model.forward(std::slice::from_ref(&image))?;
        let Some(y) = results.into_iter().next() else {
            return Ok(None);
        };

        let topology = self.topology();
        let candidates = y
            .keypointss
            .iter()
            .map(|keypoints| {
                let points = keypoints.iter().map(|k| (k.x(), k.y(), k.confidence()));
                to_landmark_set(points, topology)
            })
            .collect();

        Ok(best_pose(candidates, self.min_confidence, self.min_keypoints))
    }
}

/// Builds one person's landmarks from `(x, y, confidence)` keypoints in
/// model order. A keypoint without a confidence counts as invisible.
fn to_landmark_set(
    points: impl IntoIterator<Item = (f32, f32, Option<f32>)>,
    topology: Topology,
) -> LandmarkSet {
    let landmarks: Vec<Landmark> = points
        .into_iter()
        .enumerate()
        .map(|(index, (x, y, confidence))| {
            let landmark = Landmark::new(index, x, y, confidence.unwrap_or(0.0));
            match topology.landmark_name(index) {
                Some(name) => landmark.with_name(name),
                None => landmark,
            }
        })
        .collect();
    let score = mean_visibility(&landmarks);
    LandmarkSet::new(landmarks, score)
}

fn mean_visibility(landmarks: &[Landmark]) -> f32 {
    if landmarks.is_empty() {
        return 0.0;
    }
    landmarks.iter().map(|l| l.visibility).sum::<f32>() / landmarks.len() as f32
}

/// Picks the highest-scoring person with at least `min_keypoints` landmarks
/// at or above `min_confidence`.
pub fn best_pose(
    candidates: Vec<LandmarkSet>,
    min_confidence: f32,
    min_keypoints: usize,
) -> Option<LandmarkSet> {
    candidates
        .into_iter()
        .filter(|set| set.visible_count(min_confidence) >= min_keypoints.max(1))
        .max_by(|a, b| a.score.total_cmp(&b.score))
}
