#[must_use]
pub fn subdivision_interval(bpm: f64) -> f64 {
    if bpm <= 0.0 {
        return 0.0;
    }
    15.0 / bpm
}

#[must_use]
pub fn nearest_subdivision_index(seconds: f64, anchor: f64, interval: f64) -> i64 {
    if interval <= 0.0 {
        return 0;
    }
    ((seconds - anchor) / interval).round() as i64
}

#[must_use]
pub fn swing_offset(index: i64, swing: f64) -> f64 {
    if index.rem_euclid(2) == 1 {
        swing * 0.5
    } else {
        0.0
    }
}

#[must_use]
pub fn beats_from_index(index: i64, swing: f64) -> f64 {
    (index as f64 + swing_offset(index, swing)) / 4.0
}

#[must_use]
pub fn grid_seconds(beat_position: f64, anchor: f64, bpm: f64) -> f64 {
    anchor + beat_position * 4.0 * subdivision_interval(bpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdivision_interval_is_a_sixteenth() {
        assert!((subdivision_interval(100.0) - 0.15).abs() < 1e-12);
        assert!((subdivision_interval(120.0) - 0.125).abs() < 1e-12);
    }

    #[test]
    fn nearest_index_rounds_instead_of_flooring() {
        let d = 0.15;
        assert_eq!(nearest_subdivision_index(0.44, 0.0, d), 3);
        assert_eq!(nearest_subdivision_index(0.46, 0.0, d), 3);
        assert_eq!(nearest_subdivision_index(0.38, 0.0, d), 3);
    }

    #[test]
    fn swing_shifts_only_odd_indices() {
        assert_eq!(swing_offset(2, 0.8), 0.0);
        assert!((swing_offset(3, 0.8) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn beat_index_round_trip_through_grid_time() {
        let bpm = 96.0;
        let anchor = 0.25;
        let beats = beats_from_index(6, 0.0);
        let seconds = grid_seconds(beats, anchor, bpm);
        let restored =
            nearest_subdivision_index(seconds, anchor, subdivision_interval(bpm));
        assert_eq!(restored, 6);
    }
}
