use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BPM: f64 = 100.0;
pub const MIN_BPM: f64 = 60.0;
pub const MAX_BPM: f64 = 170.0;
pub const BPM_STEP: f64 = 0.1;
pub const KERNEL_SIGMA: f64 = 0.02;
pub const BPM_PERCENTILE: f64 = 98.0;
pub const CLUSTER_RADIUS_BPM: f64 = 4.0;
pub const DEFAULT_SNAP_TOLERANCE: f64 = 0.05;
pub const BASE_MIDI_KEY: u8 = 36;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GridModel {
    pub bpm: f64,
    pub swing: f64,
}

impl GridModel {
    #[must_use]
    pub fn new(bpm: f64, swing: f64) -> Self {
        Self {
            bpm,
            swing: swing.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WarpMarker {
    pub beat_position: f64,
    pub seconds: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AudioInfo {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub total_frames: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SliceTrack {
    pub name: String,
    pub source_path: PathBuf,
    pub grid: GridModel,
    pub warp_markers: Vec<WarpMarker>,
    pub first_onset_offset: f64,
    pub clip_length_beats: f64,
    pub total_grid_error: f64,
    pub audio: AudioInfo,
    pub track_id: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub snap_tolerance: f64,
    pub keep_sixteenths: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            keep_sixteenths: false,
        }
    }
}
