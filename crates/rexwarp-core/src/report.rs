use std::{fs, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::registry::TrackRegistry;

const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackSummary {
    pub name: String,
    pub bpm: f64,
    pub swing: f64,
    pub grid_error_sixteenths: f64,
    pub warp_marker_count: usize,
    pub clip_length_beats: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub global_bpm: f64,
    pub tracks: Vec<TrackSummary>,
}

#[must_use]
pub fn generate_analysis_report(
    registry: &TrackRegistry,
    bpm_override: Option<f64>,
) -> AnalysisReport {
    let tracks = registry
        .tracks()
        .iter()
        .map(|track| TrackSummary {
            name: track.name.clone(),
            bpm: track.grid.bpm,
            swing: track.grid.swing,
            grid_error_sixteenths: track.total_grid_error,
            warp_marker_count: track.warp_markers.len(),
            clip_length_beats: track.clip_length_beats,
        })
        .collect();

    AnalysisReport {
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at: Utc::now(),
        global_bpm: registry.global_bpm(bpm_override),
        tracks,
    }
}

#[instrument(skip(report), fields(path = %path.display(), tracks = report.tracks.len()))]
pub fn write_analysis_report(path: &Path, report: &AnalysisReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create report directory: {}", parent.display()))?;
    }

    let json = serde_json::to_vec_pretty(report).context("failed to encode analysis report")?;
    fs::write(path, json)
        .with_context(|| format!("failed to write analysis report: {}", path.display()))?;
    Ok(())
}

pub fn read_analysis_report(path: &Path) -> Result<AnalysisReport> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read analysis report: {}", path.display()))?;
    let report: AnalysisReport =
        serde_json::from_slice(&bytes).context("failed to parse analysis report json")?;
    Ok(report)
}
