use anyhow::{Context, Result};
use serde::{Serialize, Serializer};
use std::path::Path;

use crate::render::transitions::TransitionStyle;

/// One slide of the show: how long the image holds and how long the handoff
/// into the next slide (or the closing fade) lasts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlideSpec {
    #[serde(skip)]
    pub index: usize,
    #[serde(serialize_with = "serialize_seconds")]
    pub duration: f64,
    #[serde(serialize_with = "serialize_seconds")]
    pub transition: f64,
    #[serde(serialize_with = "serialize_style")]
    pub style: TransitionStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SlidePlan {
    pub slides: Vec<SlideSpec>,
    #[serde(serialize_with = "serialize_seconds")]
    pub total_duration: f64,
}

impl SlidePlan {
    pub fn new(slides: Vec<SlideSpec>, total_duration: f64) -> Self {
        Self {
            slides,
            total_duration,
        }
    }

    /// Plan without audio: every slide holds `display` seconds, the last one
    /// closes with `fade`.
    pub fn fixed(num_slides: usize, display: f64, transition: f64, fade: f64) -> Self {
        let slides: Vec<SlideSpec> = (0..num_slides)
            .map(|index| SlideSpec {
                index,
                duration: display,
                transition: if index + 1 == num_slides { fade } else { transition },
                style: TransitionStyle::Fade,
            })
            .collect();
        let total = slides.iter().map(|s| s.duration + s.transition).sum();
        Self::new(slides, total)
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    /// Σ(duration + transition) over all slides.
    pub fn scheduled_duration(&self) -> f64 {
        self.slides.iter().map(|s| s.duration + s.transition).sum()
    }

    pub fn is_consistent(&self, tolerance: f64) -> bool {
        (self.scheduled_duration() - self.total_duration).abs() <= tolerance
    }

    /// Cycle `styles` over the inter-slide transitions. The last slide keeps
    /// its closing fade.
    pub fn assign_styles(&mut self, styles: &[TransitionStyle]) {
        if styles.is_empty() {
            return;
        }
        let last = self.slides.len().saturating_sub(1);
        for slide in &mut self.slides {
            slide.style = if slide.index == last {
                TransitionStyle::Fade
            } else {
                styles[slide.index % styles.len()].clone()
            };
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize slide plan")
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write slide plan: {}", path.display()))?;
        log::info!("Slide plan written to {}", path.display());
        Ok(())
    }
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn serialize_seconds<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round3(*value))
}

fn serialize_style<S: Serializer>(style: &TransitionStyle, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(style.name())
}
