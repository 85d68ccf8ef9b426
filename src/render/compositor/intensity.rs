//! Per-pixel arithmetic styles whose effect peaks around the midpoint.

use super::{blend, compose};
use crate::render::filters::{gaussian_blur, motion_blur};
use crate::render::frame::Frame;

/// Peak motion blur radius of a whip pan, in pixels
const WHIP_RADIUS: f32 = 30.0;

pub fn crossfade(frame1: &Frame, frame2: &Frame, p: f32) -> Frame {
    compose(frame1, |x, y, px| {
        let a = frame1.pixel(x, y);
        let b = frame2.pixel(x, y);
        for (c, out) in px.iter_mut().enumerate() {
            *out = blend(a[c] as f32, b[c] as f32, p);
        }
    })
}

/// `1` at the midpoint, `0` at both ends.
fn midpoint_peak(p: f32) -> f32 {
    1.0 - (2.0 * p - 1.0).abs()
}

/// Both frames blurred by `radius * peak(p)`, then crossfaded.
pub fn blur(frame1: &Frame, frame2: &Frame, p: f32, radius: f32) -> Frame {
    let r = radius * midpoint_peak(p);
    let (blurred1, blurred2) = rayon::join(|| gaussian_blur(frame1, r), || gaussian_blur(frame2, r));
    crossfade(&blurred1, &blurred2, p)
}

/// Horizontal smear of frame1 that hands over to frame2 at the midpoint.
pub fn whip_pan(frame1: &Frame, frame2: &Frame, p: f32) -> Frame {
    let r = WHIP_RADIUS * midpoint_peak(p);
    if p < 0.5 {
        motion_blur(frame1, r)
    } else {
        motion_blur(frame2, r)
    }
}

/// White flash over `width` of the transition centred on the midpoint. The
/// flash ramps up over frame1 and back down over frame2. Widths above 1 are
/// treated as the whole transition. With `width <= 0` the frames crossfade
/// under a flash peaking at the midpoint.
pub fn flash(frame1: &Frame, frame2: &Frame, p: f32, intensity: f32, width: f32) -> Frame {
    let width = width.min(1.0);
    let (strength, alpha) = if width > 0.0 {
        let start = 0.5 - width / 2.0;
        let end = 0.5 + width / 2.0;
        if p < start {
            (0.0, 1.0)
        } else if p < 0.5 {
            let ramp = (p - start) / (0.5 - start);
            (ramp * intensity, 1.0 - ramp)
        } else if p < end {
            ((end - p) / (end - 0.5) * intensity, 0.0)
        } else {
            (0.0, 0.0)
        }
    } else {
        (midpoint_peak(p) * intensity, 1.0 - p)
    };

    if strength > 0.0 {
        let base = if alpha > 0.5 { frame1 } else { frame2 };
        return compose(base, |x, y, px| {
            for (out, &v) in px.iter_mut().zip(base.pixel(x, y)) {
                *out = (v as f32 * (1.0 - strength) + 255.0 * strength)
                    .round()
                    .clamp(0.0, 255.0) as u8;
            }
        });
    }
    if alpha >= 1.0 {
        frame1.clone()
    } else if alpha <= 0.0 {
        frame2.clone()
    } else {
        crossfade(frame1, frame2, 1.0 - alpha)
    }
}

/// Frame1 darkens and (on colour frames) shifts towards red while frame2
/// burns through wherever `field < p`.
pub fn burn(frame1: &Frame, frame2: &Frame, p: f32, field: &[f32]) -> Frame {
    let width = frame1.width() as usize;
    let colour = frame1.channels() == 3;
    let darken = 1.0 - 0.7 * p;

    compose(frame1, |x, y, px| {
        if field[y as usize * width + x as usize] < p {
            px.copy_from_slice(frame2.pixel(x, y));
            return;
        }
        for (c, (out, &v)) in px.iter_mut().zip(frame1.pixel(x, y)).enumerate() {
            let mut value = v as f32 * darken;
            if colour && c == 0 {
                value += 40.0 * p;
            } else if colour && c == 2 {
                value -= 50.0 * p;
            }
            *out = value.round().clamp(0.0, 255.0) as u8;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_frames::gradient;
    use super::*;

    #[test]
    fn crossfade_midpoint() {
        let a = Frame::filled(2, 2, 3, 100);
        let b = Frame::filled(2, 2, 3, 201);
        assert_eq!(crossfade(&a, &b, 0.5), Frame::filled(2, 2, 3, 151));
    }

    #[test]
    fn blur_peaks_in_the_middle() {
        let mut a = Frame::blank(15, 15, 1);
        a.pixel_mut(7, 7)[0] = 255;
        let b = a.clone();
        let mid = blur(&a, &b, 0.5, 4.0);
        assert!(mid.pixel(7, 7)[0] < 255);
        assert!(mid.pixel(8, 7)[0] > 0);
    }

    #[test]
    fn whip_pan_switches_frames_at_midpoint() {
        let a = Frame::filled(8, 2, 1, 10);
        let b = Frame::filled(8, 2, 1, 200);
        assert_eq!(whip_pan(&a, &b, 0.49), a);
        assert_eq!(whip_pan(&a, &b, 0.51), b);
    }

    #[test]
    fn flash_whitens_around_midpoint() {
        let a = gradient(8, 8, 0x10);
        let b = gradient(8, 8, 0x70);
        assert_eq!(flash(&a, &b, 0.3, 1.5, 0.2), a);
        assert_eq!(flash(&a, &b, 0.7, 1.5, 0.2), b);
        // peak: 1.5x intensity saturates to white
        let peak = flash(&a, &b, 0.5, 1.5, 0.2);
        assert!(peak.data().iter().all(|&v| v == 255));
        // half-way up the ramp, brighter than frame1
        let rising = flash(&a, &b, 0.45, 1.0, 0.2);
        let sum = |f: &Frame| f.data().iter().map(|&v| v as u32).sum::<u32>();
        assert!(sum(&rising) > sum(&a));
    }

    #[test]
    fn wide_flash_still_starts_and_ends_clean() {
        let a = gradient(8, 8, 0x10);
        let b = gradient(8, 8, 0x70);
        assert_eq!(flash(&a, &b, 0.0, 1.5, 3.0), a);
        assert_eq!(flash(&a, &b, 1.0, 1.5, 3.0), b);
        assert_eq!(flash(&a, &b, 0.3, 1.0, 3.0), flash(&a, &b, 0.3, 1.0, 1.0));
    }

    #[test]
    fn flash_without_width_crossfades() {
        let a = Frame::filled(2, 2, 1, 0);
        let b = Frame::filled(2, 2, 1, 100);
        assert_eq!(flash(&a, &b, 0.0, 1.5, 0.0), a);
        let mid = flash(&a, &b, 0.5, 0.0, 0.0);
        assert_eq!(mid, Frame::filled(2, 2, 1, 50));
    }

    #[test]
    fn burn_tints_colour_frames() {
        let a = Frame::filled(1, 1, 3, 100);
        let b = Frame::filled(1, 1, 3, 0);
        let field = [1.0];
        let out = burn(&a, &b, 0.5, &field);
        // 100 * 0.65 = 65, red +20, blue -25
        assert_eq!(out.pixel(0, 0), &[85, 65, 40]);

        let gray = Frame::filled(1, 1, 1, 100);
        assert_eq!(burn(&gray, &Frame::blank(1, 1, 1), 0.5, &field).pixel(0, 0), &[65]);
    }

    #[test]
    fn burn_reveals_below_threshold() {
        let a = Frame::filled(2, 1, 1, 100);
        let b = Frame::filled(2, 1, 1, 7);
        let out = burn(&a, &b, 0.5, &[0.2, 0.8]);
        assert_eq!(out.pixel(0, 0), &[7]);
        assert_ne!(out.pixel(1, 0), &[7]);
    }
}
