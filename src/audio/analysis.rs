use rayon::prelude::*;
use rustfft::{num_complex::Complex, FftPlanner};

use super::decode::SampleTrack;
use super::features::{AudioFeatures, FeatureCurve};

pub const DEFAULT_FFT_SIZE: usize = 2048;
pub const DEFAULT_HOP_SIZE: usize = 512;
const DEFAULT_TEMPO: f32 = 120.0;

/// dB range kept below the loudest bin before flux is taken
const TOP_DB: f32 = 80.0;
/// Lower band edges (Hz) for spectral contrast; the last band runs to Nyquist
const CONTRAST_EDGES_HZ: [f32; 7] = [0.0, 200.0, 400.0, 800.0, 1600.0, 3200.0, 6400.0];
const CONTRAST_QUANTILE: f32 = 0.02;
const BEAT_TIGHTNESS: f64 = 100.0;
const EPS: f32 = 1e-10;

pub fn analyze(track: &SampleTrack, fft_size: usize, hop_size: usize) -> AudioFeatures {
    let fft_size = fft_size.max(2);
    let hop_size = hop_size.max(1);
    let sr = track.sample_rate();
    let hop_seconds = hop_size as f64 / sr as f64;

    log::info!("Pass 1: STFT (fft={}, hop={})...", fft_size, hop_size);
    let spectrogram = magnitude_spectrogram(track.samples(), fft_size, hop_size);

    log::info!("Pass 2: Onset strength & spectral contrast ({} frames)...", spectrogram.len());
    let onset = FeatureCurve::new(onset_strength(&spectrogram), hop_seconds);
    let contrast = mean_spectral_contrast(&spectrogram, sr, fft_size);
    let spectral_change = FeatureCurve::new(abs_diff(&contrast), hop_seconds);

    log::info!("Pass 3: Tempo & beat tracking...");
    let tempo_bpm = estimate_tempo(&onset.values, hop_seconds);
    let beat_times = track_beats(&onset.values, hop_seconds, tempo_bpm);

    log::info!(
        "Features: frames={}, onset_max={:.3}, beats={}, tempo={:.1} BPM",
        onset.len(),
        onset.max(),
        beat_times.len(),
        tempo_bpm
    );

    AudioFeatures {
        onset,
        spectral_change,
        beat_times,
        tempo_bpm,
        duration: track.duration(),
    }
}

/// Centered Hann-windowed STFT magnitudes, `1 + len / hop` frames of
/// `fft_size / 2 + 1` bins. Samples outside the track read as zero.
fn magnitude_spectrogram(samples: &[f32], fft_size: usize, hop_size: usize) -> Vec<Vec<f32>> {
    let n_frames = 1 + samples.len() / hop_size;
    let half = fft_size / 2;
    let hann = hann_window(fft_size);

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(fft_size);

    (0..n_frames)
        .into_par_iter()
        .map(|frame_idx| {
            let center = (frame_idx * hop_size) as isize;
            let mut buffer = vec![Complex::new(0.0f32, 0.0); fft_size];
            for (i, slot) in buffer.iter_mut().enumerate() {
                let pos = center + i as isize - half as isize;
                if pos >= 0 && (pos as usize) < samples.len() {
                    *slot = Complex::new(samples[pos as usize] * hann[i], 0.0);
                }
            }
            fft.process(&mut buffer);
            buffer[..=half].iter().map(|c| c.norm()).collect()
        })
        .collect()
}

fn onset_strength(spectrogram: &[Vec<f32>]) -> Vec<f32> {
    let db: Vec<Vec<f32>> = spectrogram
        .iter()
        .map(|frame| {
            frame
                .iter()
                .map(|m| 10.0 * (m * m).max(EPS).log10())
                .collect()
        })
        .collect();

    let top = db
        .iter()
        .flat_map(|f| f.iter().copied())
        .fold(f32::NEG_INFINITY, f32::max);
    let floor = top - TOP_DB;

    let mut onset = vec![0.0f32; db.len()];
    for i in 1..db.len() {
        let bins = db[i].len().max(1);
        let flux: f32 = db[i]
            .iter()
            .zip(db[i - 1].iter())
            .map(|(cur, prev)| (cur.max(floor) - prev.max(floor)).max(0.0))
            .sum();
        onset[i] = flux / bins as f32;
    }
    onset
}

fn mean_spectral_contrast(spectrogram: &[Vec<f32>], sample_rate: u32, fft_size: usize) -> Vec<f32> {
    let bin_of = |hz: f32| (hz * fft_size as f32 / sample_rate as f32) as usize;

    spectrogram
        .iter()
        .map(|frame| {
            let mut total = 0.0f32;
            let mut bands = 0usize;
            for (k, &lo_hz) in CONTRAST_EDGES_HZ.iter().enumerate() {
                let lo = bin_of(lo_hz).min(frame.len());
                let hi = CONTRAST_EDGES_HZ
                    .get(k + 1)
                    .map_or(frame.len(), |&hz| bin_of(hz).min(frame.len()));
                if lo >= hi {
                    continue;
                }
                total += band_contrast(&frame[lo..hi]);
                bands += 1;
            }
            if bands == 0 {
                0.0
            } else {
                total / bands as f32
            }
        })
        .collect()
}

/// log10(peak) - log10(valley), where peak and valley are the means of the
/// top and bottom quantile of the band's magnitudes.
fn band_contrast(band: &[f32]) -> f32 {
    let mut sorted = band.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = ((sorted.len() as f32 * CONTRAST_QUANTILE).round() as usize).clamp(1, sorted.len());
    let valley = sorted[..n].iter().sum::<f32>() / n as f32;
    let peak = sorted[sorted.len() - n..].iter().sum::<f32>() / n as f32;
    (peak + EPS).log10() - (valley + EPS).log10()
}

fn abs_diff(values: &[f32]) -> Vec<f32> {
    if values.len() < 2 {
        return vec![0.0];
    }
    values.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

/// Onset autocorrelation over 60-200 BPM lags, weighted toward 120 BPM.
fn estimate_tempo(onset: &[f32], hop_seconds: f64) -> f32 {
    if onset.len() < 2 || onset.iter().all(|&v| v <= 0.0) {
        return DEFAULT_TEMPO;
    }

    let min_lag = ((60.0 / 200.0) / hop_seconds).floor().max(1.0) as usize;
    let max_lag = ((60.0 / 60.0) / hop_seconds).ceil() as usize;
    let max_lag = max_lag.min(onset.len() - 1);
    if min_lag > max_lag {
        return DEFAULT_TEMPO;
    }

    let mut best: Option<(f64, usize)> = None;
    for lag in min_lag..=max_lag {
        let overlap = onset.len() - lag;
        let ac: f64 = onset[..overlap]
            .iter()
            .zip(&onset[lag..])
            .map(|(&a, &b)| a as f64 * b as f64)
            .sum::<f64>()
            / overlap as f64;
        let bpm = 60.0 / (lag as f64 * hop_seconds);
        let prior = (-0.5 * (bpm / DEFAULT_TEMPO as f64).log2().powi(2)).exp();
        let score = ac * prior;
        if best.map_or(true, |(s, _)| score > s) {
            best = Some((score, lag));
        }
    }

    match best {
        Some((score, lag)) if score > 0.0 => (60.0 / (lag as f64 * hop_seconds)) as f32,
        _ => DEFAULT_TEMPO,
    }
}

/// Dynamic-programming beat tracker: every frame links to the predecessor
/// maximizing its score minus a log-squared penalty for deviating from the
/// beat period; the chain is backtracked from the best frame of the last
/// period.
fn track_beats(onset: &[f32], hop_seconds: f64, tempo_bpm: f32) -> Vec<f64> {
    if onset.is_empty() || onset.iter().all(|&v| v <= 0.0) || tempo_bpm <= 0.0 {
        return Vec::new();
    }

    let period = 60.0 / tempo_bpm as f64 / hop_seconds;
    if !period.is_finite() || period < 1.0 {
        return Vec::new();
    }

    let mean = onset.iter().map(|&v| v as f64).sum::<f64>() / onset.len() as f64;
    let var = onset
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / onset.len() as f64;
    let std = var.sqrt().max(1e-12);
    let local: Vec<f64> = onset.iter().map(|&v| v as f64 / std).collect();

    let n = local.len();
    let min_gap = ((period / 2.0).round() as usize).max(1);
    let max_gap = ((period * 2.0).round() as usize).max(min_gap);

    let mut score = vec![0.0f64; n];
    let mut backlink: Vec<Option<usize>> = vec![None; n];

    for i in 0..n {
        let mut best: Option<(f64, usize)> = None;
        for gap in min_gap..=max_gap {
            if gap > i {
                break;
            }
            let prev = i - gap;
            let penalty = BEAT_TIGHTNESS * (gap as f64 / period).ln().powi(2);
            let candidate = score[prev] - penalty;
            if best.map_or(true, |(b, _)| candidate > b) {
                best = Some((candidate, prev));
            }
        }
        match best {
            Some((b, prev)) if b > 0.0 => {
                score[i] = local[i] + b;
                backlink[i] = Some(prev);
            }
            _ => score[i] = local[i],
        }
    }

    let tail_start = n.saturating_sub(period.ceil() as usize);
    let mut cursor = (tail_start..n)
        .max_by(|&a, &b| score[a].total_cmp(&score[b]))
        .unwrap_or(n - 1);

    let mut beats = vec![cursor];
    while let Some(prev) = backlink[cursor] {
        beats.push(prev);
        cursor = prev;
    }
    beats.reverse();

    beats
        .into_iter()
        .filter(|&i| onset[i] > 0.0)
        .map(|i| i as f64 * hop_seconds)
        .collect()
}

fn hann_window(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (size - 1) as f32).cos())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: u32 = 22050;

    /// Short noise-like bursts every `interval` seconds over silence.
    fn click_track(seconds: f64, interval: f64) -> SampleTrack {
        let len = (seconds * SR as f64) as usize;
        let mut samples = vec![0.0f32; len];
        let every = (interval * SR as f64) as usize;
        let mut pos = 0;
        while pos < len {
            for i in 0..400.min(len - pos) {
                // deterministic broadband burst
                let phase = (i as f32 * 1.7).sin() * (i as f32 * 0.31).cos();
                samples[pos + i] = phase * (1.0 - i as f32 / 400.0);
            }
            pos += every;
        }
        SampleTrack::new(samples, SR)
    }

    #[test]
    fn silence_yields_zero_curves_and_no_beats() {
        let track = SampleTrack::new(vec![0.0; SR as usize * 2], SR);
        let features = analyze(&track, DEFAULT_FFT_SIZE, DEFAULT_HOP_SIZE);
        assert!(!features.onset.is_empty());
        assert!(!features.spectral_change.is_empty());
        assert!(features.onset.values.iter().all(|&v| v == 0.0));
        assert!(features.spectral_change.values.iter().all(|&v| v == 0.0));
        assert!(features.beat_times.is_empty());
        assert_eq!(features.tempo_bpm, DEFAULT_TEMPO);
    }

    #[test]
    fn tiny_track_still_has_curves() {
        let track = SampleTrack::new(vec![0.1; 10], SR);
        let features = analyze(&track, DEFAULT_FFT_SIZE, DEFAULT_HOP_SIZE);
        assert_eq!(features.onset.len(), 1);
        assert_eq!(features.spectral_change.len(), 1);
    }

    #[test]
    fn empty_track_is_well_formed() {
        let track = SampleTrack::new(Vec::new(), SR);
        let features = analyze(&track, DEFAULT_FFT_SIZE, DEFAULT_HOP_SIZE);
        assert_eq!(features.onset.len(), 1);
        assert_eq!(features.duration, 0.0);
    }

    #[test]
    fn curve_lengths_follow_hop() {
        let track = SampleTrack::new(vec![0.0; 10_000], SR);
        let features = analyze(&track, 1024, 256);
        assert_eq!(features.onset.len(), 1 + 10_000 / 256);
        assert_eq!(features.spectral_change.len(), features.onset.len() - 1);
        assert!((features.onset.hop_seconds - 256.0 / SR as f64).abs() < 1e-12);
    }

    #[test]
    fn onsets_peak_at_clicks() {
        let track = click_track(4.0, 0.5);
        let features = analyze(&track, DEFAULT_FFT_SIZE, DEFAULT_HOP_SIZE);
        let onset = &features.onset;
        // the frame right after a click must dominate a quiet frame between clicks
        let at_click = onset.values[onset.index_of(0.95)..onset.index_of(1.1)]
            .iter()
            .copied()
            .fold(0.0f32, f32::max);
        let between = onset.values[onset.index_of(1.25)];
        assert!(at_click > between);
    }

    #[test]
    fn tempo_of_regular_clicks() {
        // 22 hops per click, about 117.5 BPM
        let interval = 22.0 * DEFAULT_HOP_SIZE as f64 / SR as f64;
        let track = click_track(8.0, interval);
        let features = analyze(&track, DEFAULT_FFT_SIZE, DEFAULT_HOP_SIZE);
        let expected = 60.0 / interval as f32;
        assert!(
            (features.tempo_bpm - expected).abs() < 3.0,
            "tempo {}",
            features.tempo_bpm
        );
        assert!(features.beat_times.len() >= 8);
        assert!(features.beat_times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn contrast_of_flat_band_is_zero() {
        assert!(band_contrast(&[1.0; 50]).abs() < 1e-6);
        assert!(band_contrast(&[0.0, 0.0, 10.0]) > 5.0);
    }

    #[test]
    fn abs_diff_handles_short_input() {
        assert_eq!(abs_diff(&[]), vec![0.0]);
        assert_eq!(abs_diff(&[3.0]), vec![0.0]);
        assert_eq!(abs_diff(&[1.0, 3.0, 2.0]), vec![2.0, 1.0]);
    }
}
