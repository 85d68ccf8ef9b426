use serde::Deserialize;
use std::path::PathBuf;

use crate::timing::allocate::AllocatorConfig;
use crate::timing::novelty::NoveltyConfig;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub novelty: NoveltyConfig,
    #[serde(default)]
    pub transitions: TransitionsConfig,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default)]
    pub bitrate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_hop_size")]
    pub hop_size: usize,
}

#[derive(Debug, Deserialize)]
pub struct TimingConfig {
    #[serde(default)]
    pub num_slides: Option<usize>,
    #[serde(default)]
    pub transition_time: Option<f64>,
    #[serde(default = "default_fade_out_time")]
    pub fade_out_time: f64,
    #[serde(default = "default_display_time")]
    pub display_time: f64,
    #[serde(flatten)]
    pub allocator: AllocatorConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransitionsConfig {
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub luma_map: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            crf: default_crf(),
            codec: default_codec(),
            bitrate: None,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            hop_size: default_hop_size(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            num_slides: None,
            transition_time: None,
            fade_out_time: default_fade_out_time(),
            display_time: default_display_time(),
            allocator: AllocatorConfig::default(),
        }
    }
}

fn default_width() -> u32 { 1920 }
fn default_height() -> u32 { 1080 }
fn default_fps() -> u32 { 30 }
fn default_crf() -> u32 { 18 }
fn default_codec() -> String { "libx264".into() }
fn default_fft_size() -> usize { crate::audio::analysis::DEFAULT_FFT_SIZE }
fn default_hop_size() -> usize { crate::audio::analysis::DEFAULT_HOP_SIZE }
fn default_fade_out_time() -> f64 { 3.0 }
fn default_display_time() -> f64 { 2.0 }

pub fn load_config(path: &PathBuf) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}
