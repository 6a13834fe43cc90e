use tracing::debug;

use crate::{
    model::{AnalysisOptions, GridModel, WarpMarker},
    time::{beats_from_index, nearest_subdivision_index, subdivision_interval, swing_offset},
};

const CLIP_LENGTH_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct GridFit {
    pub markers: Vec<WarpMarker>,
    pub clip_length_beats: f64,
    pub first_onset_offset: f64,
    pub total_grid_error: f64,
}

#[must_use]
pub fn reconcile(
    onsets: &[f64],
    grid: &GridModel,
    duration_seconds: f64,
    options: &AnalysisOptions,
) -> GridFit {
    let interval = subdivision_interval(grid.bpm);
    let anchor = onsets.first().copied().unwrap_or(0.0);

    let end_subdivisions =
        ((duration_seconds - anchor) / interval - CLIP_LENGTH_EPSILON).ceil();
    let clip_length_beats = (end_subdivisions / 4.0).max(1.0);

    let mut markers = Vec::with_capacity(onsets.len() + 1);
    let mut total_grid_error = 0.0;

    for &onset in onsets {
        let index = nearest_subdivision_index(onset, anchor, interval);
        let warped_index = index as f64 + swing_offset(index, grid.swing);
        let theoretical = anchor + warped_index * interval;
        let time_error = (onset - theoretical).abs();
        total_grid_error += time_error / interval;

        if time_error > options.snap_tolerance {
            continue;
        }
        if index.rem_euclid(2) != 0 && !options.keep_sixteenths {
            continue;
        }
        markers.push(WarpMarker {
            beat_position: beats_from_index(index, grid.swing),
            seconds: onset,
        });
    }

    markers.push(WarpMarker {
        beat_position: clip_length_beats,
        seconds: duration_seconds,
    });

    debug!(
        markers = markers.len(),
        clip_length_beats, total_grid_error, "grid reconciled"
    );

    GridFit {
        markers,
        clip_length_beats,
        first_onset_offset: anchor,
        total_grid_error,
    }
}
