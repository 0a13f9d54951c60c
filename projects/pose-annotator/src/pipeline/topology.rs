// Skeletal topologies: landmark names and the connections drawn between them.

/// COCO keypoint names, as produced by YOLO pose models
pub const COCO_17_NAMES: [&str; 17] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

pub const COCO_17_CONNECTIONS: [(usize, usize); 19] = [
    // Legs
    (15, 13),
    (13, 11),
    (16, 14),
    (14, 12),
    // Torso
    (11, 12),
    (5, 11),
    (6, 12),
    (5, 6),
    // Arms
    (5, 7),
    (6, 8),
    (7, 9),
    (8, 10),
    // Head
    (1, 2),
    (0, 1),
    (0, 2),
    (1, 3),
    (2, 4),
    (3, 5),
    (4, 6),
];

/// The landmark graph a detector reports against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Coco17,
}

impl Topology {
    pub fn connections(&self) -> &'static [(usize, usize)] {
        match self {
            Topology::Coco17 => &COCO_17_CONNECTIONS,
        }
    }

    pub fn landmark_names(&self) -> &'static [&'static str] {
        match self {
            Topology::Coco17 => &COCO_17_NAMES,
        }
    }

    pub fn landmark_name(&self, index: usize) -> Option<&'static str> {
        self.landmark_names().get(index).copied()
    }
}
