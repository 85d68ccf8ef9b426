/// A scalar signal sampled once per analysis hop.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureCurve {
    pub values: Vec<f32>,
    /// Seconds between consecutive samples
    pub hop_seconds: f64,
}

impl FeatureCurve {
    pub fn new(values: Vec<f32>, hop_seconds: f64) -> Self {
        Self { values, hop_seconds }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn max(&self) -> f32 {
        self.values.iter().copied().fold(0.0f32, f32::max)
    }

    /// Timestamp of sample `index`.
    pub fn time_of(&self, index: usize) -> f64 {
        index as f64 * self.hop_seconds
    }

    /// Nearest sample index for `time`, clamped to the curve.
    pub fn index_of(&self, time: f64) -> usize {
        if self.values.is_empty() || self.hop_seconds <= 0.0 {
            return 0;
        }
        let idx = (time / self.hop_seconds).round().max(0.0) as usize;
        idx.min(self.values.len() - 1)
    }
}

/// Everything the timing planner needs from one audio track.
#[derive(Clone, Debug)]
pub struct AudioFeatures {
    /// Onset strength (mean positive log-power flux)
    pub onset: FeatureCurve,
    /// Absolute first difference of mean spectral contrast
    pub spectral_change: FeatureCurve,
    /// Tracked beat positions in seconds, ascending
    pub beat_times: Vec<f64>,
    pub tempo_bpm: f32,
    pub duration: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_of_rounds_and_clamps() {
        let curve = FeatureCurve::new(vec![0.0; 4], 0.5);
        assert_eq!(curve.index_of(0.0), 0);
        assert_eq!(curve.index_of(0.74), 1);
        assert_eq!(curve.index_of(0.76), 2);
        assert_eq!(curve.index_of(100.0), 3);
        assert_eq!(curve.index_of(-3.0), 0);
    }
}
