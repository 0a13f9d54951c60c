// Pose annotation pipeline

pub mod annotator;
pub mod codec;
pub mod detection;
pub mod frames;
pub mod render;
pub mod topology;
pub mod types;
pub mod worker;
