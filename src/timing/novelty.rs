use serde::Deserialize;

use crate::audio::features::{AudioFeatures, FeatureCurve};

/// Timestamps closer than this collapse into one candidate
const DEDUP_EPSILON: f64 = 1e-3;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PeakPickParams {
    /// Samples before `n` that `n` must dominate
    pub pre_max: usize,
    /// Samples after `n` that `n` must dominate
    pub post_max: usize,
    pub pre_avg: usize,
    pub post_avg: usize,
    /// Minimum lead over the local mean
    pub delta: f32,
    /// Minimum samples between accepted peaks
    pub wait: usize,
}

impl Default for PeakPickParams {
    fn default() -> Self {
        Self {
            pre_max: 5,
            post_max: 5,
            pre_avg: 5,
            post_avg: 5,
            delta: 0.1,
            wait: 10,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoveltyConfig {
    pub onset_weight: f32,
    pub spectral_weight: f32,
    /// Percentile (0-100) a beat's local novelty must exceed to be kept
    pub beat_percentile: f32,
    pub peaks: PeakPickParams,
}

impl Default for NoveltyConfig {
    fn default() -> Self {
        Self {
            onset_weight: 0.6,
            spectral_weight: 0.4,
            beat_percentile: 70.0,
            peaks: PeakPickParams::default(),
        }
    }
}

/// Scale by the curve's own maximum. All-zero curves are returned as-is.
pub fn normalize(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return values.to_vec();
    }
    values.iter().map(|v| v / max).collect()
}

/// Pad the shorter curve with trailing zeros.
pub fn align(a: &[f32], b: &[f32]) -> (Vec<f32>, Vec<f32>) {
    let len = a.len().max(b.len());
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.resize(len, 0.0);
    b.resize(len, 0.0);
    (a, b)
}

/// Weighted sum of the normalized onset and spectral-change curves.
pub fn fuse(onset: &FeatureCurve, spectral: &FeatureCurve, config: &NoveltyConfig) -> FeatureCurve {
    let (onset_norm, spectral_norm) = align(&normalize(&onset.values), &normalize(&spectral.values));
    let values = onset_norm
        .iter()
        .zip(spectral_norm.iter())
        .map(|(o, s)| config.onset_weight * o + config.spectral_weight * s)
        .collect();
    FeatureCurve::new(values, onset.hop_seconds)
}

/// Indices of local maxima that clear the local mean by `delta` and are
/// spaced more than `wait` samples apart.
pub fn peak_pick(x: &[f32], params: &PeakPickParams) -> Vec<usize> {
    let n = x.len();
    let mut peaks: Vec<usize> = Vec::new();

    for i in 0..n {
        let max_lo = i.saturating_sub(params.pre_max);
        let max_hi = (i + params.post_max + 1).min(n);
        let local_max = x[max_lo..max_hi].iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if x[i] < local_max {
            continue;
        }

        let avg_lo = i.saturating_sub(params.pre_avg);
        let avg_hi = (i + params.post_avg + 1).min(n);
        let window = &x[avg_lo..avg_hi];
        let local_mean = window.iter().sum::<f32>() / window.len() as f32;
        if x[i] < local_mean + params.delta {
            continue;
        }

        if let Some(&last) = peaks.last() {
            if i - last <= params.wait {
                continue;
            }
        }
        peaks.push(i);
    }

    peaks
}

/// Percentile with linear interpolation between order statistics.
pub fn percentile(values: &[f32], pct: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = (pct.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f32;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Beats whose nearest novelty sample is above the given percentile.
pub fn strong_beats(novelty: &FeatureCurve, beat_times: &[f64], pct: f32) -> Vec<f64> {
    if novelty.is_empty() {
        return Vec::new();
    }
    let threshold = percentile(&novelty.values, pct);
    beat_times
        .iter()
        .copied()
        .filter(|&t| novelty.values[novelty.index_of(t)] > threshold)
        .collect()
}

/// Sorted, de-duplicated union of novelty peaks and strong beats within
/// `[0, duration]`.
pub fn candidates(features: &AudioFeatures, config: &NoveltyConfig) -> Vec<f64> {
    let novelty = fuse(&features.onset, &features.spectral_change, config);

    let peaks: Vec<f64> = peak_pick(&novelty.values, &config.peaks)
        .into_iter()
        .map(|i| novelty.time_of(i))
        .collect();
    let beats = strong_beats(&novelty, &features.beat_times, config.beat_percentile);

    log::info!(
        "Novelty: {} peaks, {}/{} beats above p{:.0}",
        peaks.len(),
        beats.len(),
        features.beat_times.len(),
        config.beat_percentile
    );

    let mut points: Vec<f64> = peaks
        .into_iter()
        .chain(beats)
        .filter(|&t| t >= 0.0 && t <= features.duration)
        .collect();
    sort_dedup(&mut points);
    points
}

/// Prepend 0.0 and append `duration` unless already present.
pub fn with_boundaries(mut points: Vec<f64>, duration: f64) -> Vec<f64> {
    points.retain(|&t| t >= 0.0 && t <= duration);
    points.push(0.0);
    points.push(duration);
    sort_dedup(&mut points);
    points
}

fn sort_dedup(points: &mut Vec<f64>) {
    points.sort_by(|a, b| a.total_cmp(b));
    points.dedup_by(|later, earlier| (*later - *earlier).abs() < DEDUP_EPSILON);
}
