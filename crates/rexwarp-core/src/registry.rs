use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    grid::{self, GridFit},
    model::{AnalysisOptions, AudioInfo, GridModel, SliceTrack},
    tempo,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 100 }
    }
}

impl IdAllocator {
    pub fn allocate(&mut self) -> String {
        self.next += 1;
        format!("id{}", self.next)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackRegistry {
    tracks: Vec<SliceTrack>,
    ids: IdAllocator,
}

impl TrackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tracks(&self) -> &[SliceTrack] {
        &self.tracks
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn ids_mut(&mut self) -> &mut IdAllocator {
        &mut self.ids
    }

    pub fn split_mut(&mut self) -> (&[SliceTrack], &mut IdAllocator) {
        (&self.tracks, &mut self.ids)
    }

    #[instrument(skip(self, onsets, audio), fields(path = %source_path.display(), onsets = onsets.len()))]
    pub fn add_track(
        &mut self,
        source_path: &Path,
        onsets: &[f64],
        audio: AudioInfo,
        suggestion: Option<f64>,
        options: &AnalysisOptions,
    ) {
        let bpm = tempo::estimate_bpm(onsets, suggestion);
        let swing = tempo::estimate_swing(onsets, bpm);
        let grid = GridModel::new(bpm, swing);

        let GridFit {
            markers,
            clip_length_beats,
            first_onset_offset,
            total_grid_error,
        } = grid::reconcile(onsets, &grid, audio.duration_seconds, options);

        let name = source_path
            .file_name()
            .map_or_else(|| source_path.display().to_string(), |name| {
                name.to_string_lossy().into_owned()
            });

        info!(
            track = %name,
            bpm,
            swing,
            grid_error_sixteenths = total_grid_error,
            markers = markers.len(),
            "track analyzed"
        );

        let track = SliceTrack {
            name,
            source_path: source_path.to_path_buf(),
            grid,
            warp_markers: markers,
            first_onset_offset,
            clip_length_beats,
            total_grid_error,
            audio,
            track_id: self.ids.allocate(),
            channel_id: self.ids.allocate(),
        };

        self.tracks.push(track);
    }

    #[must_use]
    pub fn global_bpm(&self, bpm_override: Option<f64>) -> f64 {
        if let Some(bpm) = bpm_override {
            return bpm;
        }
        if self.tracks.is_empty() {
            return crate::model::DEFAULT_BPM;
        }
        self.tracks
            .iter()
            .map(|track| track.grid.bpm)
            .fold(f64::MIN, f64::max)
    }
}
