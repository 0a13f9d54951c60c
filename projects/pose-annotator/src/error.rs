use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a batch annotation run.
///
/// Only `FrameDecode` is recoverable: the run logs it, skips the frame and
/// carries on. Every other variant aborts the run.
#[derive(Error, Debug)]
pub enum AnnotateError {
    #[error("Input directory {path:?} is not readable: {source}")]
    InputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Output directory {path:?} is not usable: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to decode frame {path:?}: {reason}")]
    FrameDecode { path: PathBuf, reason: String },

    #[error("No frames matching '{extension}' to process in {dir:?}")]
    EmptyInput { dir: PathBuf, extension: String },

    #[error("Failed to write frame {path:?}: {reason}")]
    OutputWrite { path: PathBuf, reason: String },

    #[error("Pose detector failed: {0:#}")]
    Detector(anyhow::Error),

    #[error("Landmark renderer failed: {0:#}")]
    Render(anyhow::Error),

    #[error("Frame hook failed: {0:#}")]
    Hook(anyhow::Error),

    #[error("Worker {worker_id} failed: {reason}")]
    Worker { worker_id: usize, reason: String },
}

pub type AnnotateResult<T> = Result<T, AnnotateError>;
