use tracing::{debug, warn};

use crate::{
    model::{
        BPM_PERCENTILE, BPM_STEP, CLUSTER_RADIUS_BPM, DEFAULT_BPM, KERNEL_SIGMA, MAX_BPM, MIN_BPM,
    },
    time::{nearest_subdivision_index, subdivision_interval},
};

#[derive(Debug, Clone, Copy)]
struct TempoHypothesis {
    bpm: f64,
    score: f64,
}

#[must_use]
pub fn estimate_bpm(onsets: &[f64], suggestion: Option<f64>) -> f64 {
    if onsets.is_empty() {
        return clamp_bpm(suggestion.unwrap_or(DEFAULT_BPM));
    }

    let candidates = scan_candidates(onsets);
    let threshold = percentile(&candidates, BPM_PERCENTILE);
    let survivors: Vec<TempoHypothesis> = candidates
        .iter()
        .copied()
        .filter(|hypothesis| hypothesis.score >= threshold)
        .collect();

    if survivors.is_empty() {
        let fallback = suggestion.unwrap_or_else(|| best_hypothesis(&candidates).bpm);
        return clamp_bpm(round_bpm(fallback));
    }

    let peaks = cluster_peaks(&survivors);
    debug!(
        clusters = peaks.len(),
        peaks = ?peaks
            .iter()
            .map(|peak| (round_bpm(peak.bpm), (peak.score * 10_000.0).round() / 10_000.0))
            .collect::<Vec<_>>(),
        "tempo clusters"
    );

    let selected = match suggestion {
        Some(target) => peaks
            .iter()
            .copied()
            .min_by(|left, right| {
                (left.bpm - target)
                    .abs()
                    .total_cmp(&(right.bpm - target).abs())
            })
            .unwrap_or(peaks[0]),
        None => best_hypothesis(&peaks),
    };

    clamp_bpm(round_bpm(selected.bpm))
}

#[must_use]
pub fn estimate_swing(onsets: &[f64], bpm: f64) -> f64 {
    let Some(&anchor) = onsets.first() else {
        return 0.0;
    };
    let interval = subdivision_interval(bpm);
    if interval <= 0.0 {
        return 0.0;
    }

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    for &onset in onsets {
        let index = nearest_subdivision_index(onset, anchor, interval);
        let shift = if index.rem_euclid(2) == 1 {
            interval / 2.0
        } else {
            0.0
        };
        let residual = onset - (anchor + index as f64 * interval);
        sum_xy += shift * residual;
        sum_xx += shift * shift;
    }

    if sum_xx == 0.0 {
        return 0.0;
    }
    (sum_xy / sum_xx).clamp(0.0, 1.0)
}

fn scan_candidates(onsets: &[f64]) -> Vec<TempoHypothesis> {
    let steps = ((MAX_BPM - MIN_BPM) / BPM_STEP).round() as usize;
    let mut candidates = Vec::with_capacity(steps + 1);

    for step in 0..=steps {
        let bpm = MIN_BPM + step as f64 * BPM_STEP;
        let interval = subdivision_interval(bpm);
        let half = interval / 2.0;

        let mut total = 0.0;
        for &onset in onsets {
            let mut residual = onset % interval;
            if residual > half {
                residual -= interval;
            }
            total += (-(residual * residual) / (2.0 * KERNEL_SIGMA * KERNEL_SIGMA)).exp();
        }

        candidates.push(TempoHypothesis {
            bpm,
            score: total / onsets.len() as f64,
        });
    }

    candidates
}

fn percentile(candidates: &[TempoHypothesis], q: f64) -> f64 {
    let mut scores: Vec<f64> = candidates.iter().map(|hypothesis| hypothesis.score).collect();
    scores.sort_by(f64::total_cmp);

    let rank = (scores.len() - 1) as f64 * q / 100.0;
    let low = rank.floor() as usize;
    let high = rank.ceil() as usize;
    scores[low] + (scores[high] - scores[low]) * (rank - low as f64)
}

fn cluster_peaks(survivors: &[TempoHypothesis]) -> Vec<TempoHypothesis> {
    let mut peaks = Vec::new();
    let mut current = survivors[0];
    let mut previous_bpm = survivors[0].bpm;

    for &hypothesis in &survivors[1..] {
        if hypothesis.bpm - previous_bpm > CLUSTER_RADIUS_BPM {
            peaks.push(current);
            current = hypothesis;
        } else if hypothesis.score > current.score {
            current = hypothesis;
        }
        previous_bpm = hypothesis.bpm;
    }

    peaks.push(current);
    peaks
}

fn best_hypothesis(candidates: &[TempoHypothesis]) -> TempoHypothesis {
    let mut best = candidates[0];
    for &hypothesis in &candidates[1..] {
        if hypothesis.score > best.score {
            best = hypothesis;
        }
    }
    best
}

fn round_bpm(bpm: f64) -> f64 {
    (bpm * 100.0).round() / 100.0
}

fn clamp_bpm(bpm: f64) -> f64 {
    if bpm < MIN_BPM || bpm > MAX_BPM {
        let clamped = bpm.clamp(MIN_BPM, MAX_BPM);
        warn!(bpm, clamped, "tempo outside supported range, clamping");
        return clamped;
    }
    bpm
}
