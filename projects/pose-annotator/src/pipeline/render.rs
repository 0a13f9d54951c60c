use crate::pipeline::types::{Landmark, LandmarkSet};
use anyhow::Result;
use opencv::core::{Mat, Point, Scalar};
use opencv::imgproc::{circle, line, FILLED, LINE_8};

/// Draws a skeletal landmark graph onto a frame in place.
pub trait LandmarkRenderer: Sync {
    fn draw(
        &self,
        frame: &mut Mat,
        landmarks: &LandmarkSet,
        connections: &[(usize, usize)],
    ) -> Result<()>;
}

/// OpenCV line/circle renderer. Colors are BGR.
#[derive(Debug, Clone)]
pub struct OpencvRenderer {
    pub landmark_color: Scalar,
    pub connection_color: Scalar,
    pub landmark_radius: i32,
    pub thickness: i32,
    /// Landmarks below this visibility are neither drawn nor connected
    pub min_visibility: f32,
}

impl Default for OpencvRenderer {
    fn default() -> Self {
        Self {
            landmark_color: Scalar::new(0.0, 0.0, 255.0, 0.0),       // Red
            connection_color: Scalar::new(224.0, 224.0, 224.0, 0.0), // Light gray
            landmark_radius: 2,
            thickness: 2,
            min_visibility: 0.5,
        }
    }
}

impl OpencvRenderer {
    pub fn with_min_visibility(mut self, min_visibility: f32) -> Self {
        self.min_visibility = min_visibility;
        self
    }

    fn visible<'a>(&self, landmark: Option<&'a Landmark>) -> Option<&'a Landmark> {
        landmark.filter(|l| l.visibility >= self.min_visibility)
    }
}

fn to_point(landmark: &Landmark) -> Point {
    Point::new(landmark.x.round() as i32, landmark.y.round() as i32)
}

impl LandmarkRenderer for OpencvRenderer {
    fn draw(
        &self,
        frame: &mut Mat,
        landmarks: &LandmarkSet,
        connections: &[(usize, usize)],
    ) -> Result<()> {
        // Connections first so the landmark dots stay on top
        for &(from, to) in connections {
            let a = self.visible(landmarks.get(from));
            let b = self.visible(landmarks.get(to));
            if let (Some(a), Some(b)) = (a, b) {
                line(
                    frame,
                    to_point(a),
                    to_point(b),
                    self.connection_color,
                    self.thickness,
                    LINE_8,
                    0,
                )?;
            }
        }

        for landmark in &landmarks.landmarks {
            if landmark.visibility < self.min_visibility {
                continue;
            }
            circle(
                frame,
                to_point(landmark),
                self.landmark_radius,
                self.landmark_color,
                FILLED,
                LINE_8,
                0,
            )?;
        }

        Ok(())
    }
}
