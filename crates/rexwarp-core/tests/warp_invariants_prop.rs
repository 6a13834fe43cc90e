use proptest::prelude::*;
use rexwarp_core::{AnalysisOptions, GridModel, MAX_BPM, MIN_BPM, estimate_bpm, reconcile};

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    #[test]
    fn warp_markers_never_regress(
        raw_onsets in prop::collection::vec(0.0f64..30.0, 0..64),
        bpm in 60.0f64..170.0,
        keep_sixteenths in any::<bool>(),
    ) {
        let mut onsets = raw_onsets;
        onsets.sort_by(f64::total_cmp);
        let duration = onsets.last().copied().unwrap_or(0.0) + 0.5;

        let grid = GridModel::new(bpm, 0.0);
        let options = AnalysisOptions {
            keep_sixteenths,
            ..AnalysisOptions::default()
        };
        let fit = reconcile(&onsets, &grid, duration, &options);

        prop_assert!(fit.clip_length_beats >= 1.0);
        prop_assert!(!fit.markers.is_empty());

        let last = fit.markers.last().unwrap();
        prop_assert_eq!(last.beat_position, fit.clip_length_beats);
        prop_assert_eq!(last.seconds, duration);

        for pair in fit.markers.windows(2) {
            prop_assert!(pair[1].beat_position >= pair[0].beat_position);
            prop_assert!(pair[1].seconds >= pair[0].seconds);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn estimated_tempo_stays_in_range(
        raw_onsets in prop::collection::vec(0.0f64..20.0, 0..48),
        suggestion in prop::option::of(10.0f64..400.0),
    ) {
        let mut onsets = raw_onsets;
        onsets.sort_by(f64::total_cmp);

        let bpm = estimate_bpm(&onsets, suggestion);
        prop_assert!(bpm >= MIN_BPM && bpm <= MAX_BPM, "bpm out of range: {bpm}");
    }
}
