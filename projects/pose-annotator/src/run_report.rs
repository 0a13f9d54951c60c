// Run report persisted as JSON at a caller-chosen path.

use crate::pipeline::annotator::AnnotateOptions;
use crate::pipeline::types::{ColorPolicy, RunSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize, Debug, Clone)]
pub struct RunReport<'a> {
    pub created_at: DateTime<Utc>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub extension: String,
    pub color_policy: ColorPolicy,
    pub ratio: f64,
    pub summary: &'a RunSummary,
}

impl<'a> RunReport<'a> {
    pub fn new(options: &AnnotateOptions, summary: &'a RunSummary) -> Self {
        Self {
            created_at: Utc::now(),
            input_dir: options.input_dir.clone(),
            output_dir: options.output_dir.clone(),
            extension: options.extension.clone(),
            color_policy: options.color_policy,
            ratio: summary.ratio(),
            summary,
        }
    }
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory {:?}", parent))?;
    }
    let content = serde_json::to_string_pretty(report)?;
    fs::write(path, content).with_context(|| format!("Failed to write report {:?}", path))?;
    tracing::info!("Wrote run report to {:?}", path);
    Ok(())
}
