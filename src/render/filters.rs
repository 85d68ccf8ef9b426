use rayon::prelude::*;

use super::frame::Frame;

/// Radii below this leave the frame untouched
const MIN_RADIUS: f32 = 0.5;

/// Separable gaussian blur. `radius` is the kernel half-width in pixels,
/// sigma is half of it.
pub fn gaussian_blur(frame: &Frame, radius: f32) -> Frame {
    if radius < MIN_RADIUS || frame.width() == 0 || frame.height() == 0 {
        return frame.clone();
    }
    let kernel = gaussian_kernel_q16(radius);
    let tmp = horizontal_pass(frame, &kernel);
    vertical_pass(&tmp, &kernel)
}

/// Horizontal-only blur used for whip pans.
pub fn motion_blur(frame: &Frame, radius: f32) -> Frame {
    if radius < MIN_RADIUS || frame.width() == 0 || frame.height() == 0 {
        return frame.clone();
    }
    horizontal_pass(frame, &gaussian_kernel_q16(radius))
}

/// Normalized weights in 16.16 fixed point summing to exactly 65536.
fn gaussian_kernel_q16(radius: f32) -> Vec<u32> {
    let r = radius.ceil() as i32;
    let sigma = (radius as f64 / 2.0).max(0.5);
    let denom = 2.0 * sigma * sigma;

    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| {
            let x = i as f64;
            (-x * x / denom).exp()
        })
        .collect();
    let sum: f64 = weights_f.iter().sum();

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|w| ((w / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    weights
}

fn horizontal_pass(src: &Frame, kernel: &[u32]) -> Frame {
    let radius = (kernel.len() / 2) as i64;
    let width = src.width() as i64;
    let channels = src.channels() as usize;
    let mut out = Frame::blank(src.width(), src.height(), src.channels());
    let stride = out.stride();

    out.data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            let src_row = src.row(y as u32);
            for x in 0..width {
                for c in 0..channels {
                    let mut acc = 0u64;
                    for (ki, &kw) in kernel.iter().enumerate() {
                        let sx = (x + ki as i64 - radius).clamp(0, width - 1) as usize;
                        acc += u64::from(kw) * u64::from(src_row[sx * channels + c]);
                    }
                    row[x as usize * channels + c] = q16_to_u8(acc);
                }
            }
        });
    out
}

fn vertical_pass(src: &Frame, kernel: &[u32]) -> Frame {
    let radius = (kernel.len() / 2) as i64;
    let height = src.height() as i64;
    let mut out = Frame::blank(src.width(), src.height(), src.channels());
    let stride = out.stride();

    out.data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for (i, value) in row.iter_mut().enumerate() {
                let mut acc = 0u64;
                for (ki, &kw) in kernel.iter().enumerate() {
                    let sy = (y as i64 + ki as i64 - radius).clamp(0, height - 1) as u32;
                    acc += u64::from(kw) * u64::from(src.row(sy)[i]);
                }
                *value = q16_to_u8(acc);
            }
        });
    out
}

fn q16_to_u8(acc: u64) -> u8 {
    ((acc + 32768) >> 16).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_radius_is_identity() {
        let frame = Frame::from_raw(2, 2, 1, vec![0, 255, 10, 20]).unwrap();
        assert_eq!(gaussian_blur(&frame, 0.0), frame);
        assert_eq!(motion_blur(&frame, 0.4), frame);
    }

    #[test]
    fn constant_frame_is_unchanged() {
        let frame = Frame::filled(6, 5, 3, 77);
        assert_eq!(gaussian_blur(&frame, 4.0), frame);
        assert_eq!(motion_blur(&frame, 9.0), frame);
    }

    #[test]
    fn kernel_sums_to_one() {
        for radius in [0.6, 1.0, 3.3, 20.0, 30.0] {
            let kernel = gaussian_kernel_q16(radius);
            assert_eq!(kernel.iter().map(|&w| u64::from(w)).sum::<u64>(), 65536);
            assert_eq!(kernel.len() % 2, 1);
        }
    }

    #[test]
    fn blur_spreads_single_pixel() {
        let mut frame = Frame::blank(7, 7, 1);
        frame.pixel_mut(3, 3)[0] = 255;
        let out = gaussian_blur(&frame, 2.0);
        assert!(out.data().iter().filter(|&&v| v > 0).count() > 1);
        assert!(out.pixel(3, 3)[0] < 255);
    }

    #[test]
    fn motion_blur_stays_on_its_row() {
        let mut frame = Frame::blank(9, 3, 1);
        frame.pixel_mut(4, 1)[0] = 255;
        let out = motion_blur(&frame, 3.0);
        assert!(out.row(0).iter().all(|&v| v == 0));
        assert!(out.row(2).iter().all(|&v| v == 0));
        assert!(out.row(1).iter().filter(|&&v| v > 0).count() > 1);
    }
}
