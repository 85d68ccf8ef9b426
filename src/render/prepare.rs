use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use super::filters::gaussian_blur;
use super::frame::Frame;

/// Backdrops are blurred at this fraction of the output size
const BACKDROP_DOWNSCALE: u32 = 4;

/// Blur radius on the downscaled backdrop
const BACKDROP_BLUR: f32 = 10.0;

/// Load every image and fit it to `width x height`, in parallel.
pub fn prepare_frames(paths: &[PathBuf], width: u32, height: u32) -> Result<Vec<Frame>> {
    let frames = paths
        .par_iter()
        .map(|path| load_frame(path, width, height))
        .collect::<Result<Vec<_>>>()?;
    log::info!("Prepared {} images at {}x{}", frames.len(), width, height);
    Ok(frames)
}

pub fn load_frame(path: &Path, width: u32, height: u32) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("Failed to open image: {}", path.display()))?
        .to_rgb8();
    if image.width() == 0 || image.height() == 0 {
        anyhow::bail!("Image has no pixels: {}", path.display());
    }
    log::debug!(
        "{}: {}x{} -> {}x{}",
        path.display(),
        image.width(),
        image.height(),
        width,
        height
    );
    Ok(Frame::from(fit_with_backdrop(&image, width, height)))
}

/// Scale `image` to fit inside the canvas keeping its aspect ratio. Bars left
/// over are filled with a stretched, blurred copy of the same image.
pub fn fit_with_backdrop(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let scale = f64::min(
        width as f64 / image.width() as f64,
        height as f64 / image.height() as f64,
    );
    let fit_w = ((image.width() as f64 * scale).round() as u32).clamp(1, width.max(1));
    let fit_h = ((image.height() as f64 * scale).round() as u32).clamp(1, height.max(1));
    let fitted = imageops::resize(image, fit_w, fit_h, FilterType::Lanczos3);
    if fit_w == width && fit_h == height {
        return fitted;
    }

    let mut canvas = backdrop(image, width, height);
    let x = (width - fit_w) / 2;
    let y = (height - fit_h) / 2;
    imageops::overlay(&mut canvas, &fitted, x as i64, y as i64);
    canvas
}

fn backdrop(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let small_w = (width / BACKDROP_DOWNSCALE).max(1);
    let small_h = (height / BACKDROP_DOWNSCALE).max(1);
    let small = imageops::resize(image, small_w, small_h, FilterType::Triangle);
    let blurred = gaussian_blur(&Frame::from(small.clone()), BACKDROP_BLUR);
    let blurred = RgbImage::from_raw(small_w, small_h, blurred.into_raw()).unwrap_or(small);
    imageops::resize(&blurred, width, height, FilterType::Triangle)
}

/// Grayscale wipe map stretched to the output size.
pub fn load_luma_map(path: &Path, width: u32, height: u32) -> Result<Frame> {
    let map = image::open(path)
        .with_context(|| format!("Failed to open luma map: {}", path.display()))?
        .to_luma8();
    let map = imageops::resize(&map, width, height, FilterType::Triangle);
    log::info!("Luma map loaded from {}", path.display());
    Ok(Frame::from(map))
}
