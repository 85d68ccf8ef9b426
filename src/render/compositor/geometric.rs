//! Styles that move, scale or distort pixels before compositing.

use std::f32::consts::TAU;

use super::{blend, center, compose};
use crate::render::frame::Frame;
use crate::render::transitions::Direction;

/// Scale below which a flipping frame is drawn as blank
const MIN_FLIP_SCALE: f32 = 0.01;

/// Ripple ramps in over the first tenth of the transition
const RIPPLE_ATTACK: f32 = 0.1;

/// Frame2 pushes frame1 out in `direction`, hard edge, offset `floor(extent * p)`.
pub fn shift(frame1: &Frame, frame2: &Frame, p: f32, direction: Direction) -> Frame {
    let w = frame1.width();
    let h = frame1.height();
    match direction {
        Direction::Left => {
            let off = ((w as f32 * p).floor() as u32).min(w);
            compose(frame1, |x, y, px| {
                let src = if x < w - off {
                    frame1.pixel(x + off, y)
                } else {
                    frame2.pixel(x - (w - off), y)
                };
                px.copy_from_slice(src);
            })
        }
        Direction::Right => {
            let off = ((w as f32 * p).floor() as u32).min(w);
            compose(frame1, |x, y, px| {
                let src = if x >= off {
                    frame1.pixel(x - off, y)
                } else {
                    frame2.pixel(x + w - off, y)
                };
                px.copy_from_slice(src);
            })
        }
        Direction::Up => {
            let off = ((h as f32 * p).floor() as u32).min(h);
            compose(frame1, |x, y, px| {
                let src = if y < h - off {
                    frame1.pixel(x, y + off)
                } else {
                    frame2.pixel(x, y - (h - off))
                };
                px.copy_from_slice(src);
            })
        }
        Direction::Down => {
            let off = ((h as f32 * p).floor() as u32).min(h);
            compose(frame1, |x, y, px| {
                let src = if y >= off {
                    frame1.pixel(x, y - off)
                } else {
                    frame2.pixel(x, y + h - off)
                };
                px.copy_from_slice(src);
            })
        }
    }
}

/// Frame1 magnified by `1 + p` and centre-cropped, blended into frame2.
pub fn zoom_in(frame1: &Frame, frame2: &Frame, p: f32) -> Frame {
    let zoom = 1.0 + p as f64;
    compose(frame1, |x, y, px| {
        let (sx, sy) = magnified_source(frame1, x, y, zoom);
        for (c, out) in px.iter_mut().enumerate() {
            let zoomed = frame1.sample_bilinear(sx, sy, c);
            *out = blend(zoomed, frame2.pixel(x, y)[c] as f32, p);
        }
    })
}

/// Frame2 magnified by `2 - p` and centre-cropped, blended over frame1.
pub fn zoom_out(frame1: &Frame, frame2: &Frame, p: f32) -> Frame {
    let zoom = 2.0 - p as f64;
    compose(frame1, |x, y, px| {
        let (sx, sy) = magnified_source(frame2, x, y, zoom);
        for (c, out) in px.iter_mut().enumerate() {
            let zoomed = frame2.sample_bilinear(sx, sy, c);
            *out = blend(frame1.pixel(x, y)[c] as f32, zoomed, p);
        }
    })
}

/// Where output pixel `(x, y)` lands in a frame magnified about its centre.
fn magnified_source(frame: &Frame, x: u32, y: u32, zoom: f64) -> (f64, f64) {
    let hw = frame.width() as f64 / 2.0;
    let hh = frame.height() as f64 / 2.0;
    let sx = (x as f64 + 0.5 - hw) / zoom + hw - 0.5;
    let sy = (y as f64 + 0.5 - hh) / zoom + hh - 0.5;
    (sx, sy)
}

/// Frame1 spun by `p * angle` degrees and shrunk by `1 - p / 2`, laid over
/// frame2 with opacity `sqrt(1 - p)`. Frame2 shows outside the spun rect.
pub fn rotate(frame1: &Frame, frame2: &Frame, p: f32, angle: f32) -> Frame {
    let theta = (p * angle).to_radians() as f64;
    let (sin, cos) = theta.sin_cos();
    let scale = 1.0 - 0.5 * p as f64;
    let opacity = (1.0 - p).max(0.0).sqrt();
    let hw = frame1.width() as f64 / 2.0;
    let hh = frame1.height() as f64 / 2.0;
    let max_x = frame1.width() as f64 - 0.5;
    let max_y = frame1.height() as f64 - 0.5;

    compose(frame1, |x, y, px| {
        let dx = (x as f64 + 0.5 - hw) / scale;
        let dy = (y as f64 + 0.5 - hh) / scale;
        // inverse rotation back into frame1
        let sx = cos * dx + sin * dy + hw - 0.5;
        let sy = -sin * dx + cos * dy + hh - 0.5;

        let under = frame2.pixel(x, y);
        if sx < -0.5 || sy < -0.5 || sx > max_x || sy > max_y {
            px.copy_from_slice(under);
            return;
        }
        for (c, out) in px.iter_mut().enumerate() {
            let top = frame1.sample_bilinear(sx, sy, c);
            *out = blend(under[c] as f32, top, opacity);
        }
    })
}

/// Card flip: frame1 folds away until the midpoint, then frame2 unfolds.
/// The visible frame is squeezed by `|cos θ|` about the centre line.
pub fn flip(frame1: &Frame, frame2: &Frame, p: f32, vertical_axis: bool) -> Frame {
    let (source, degrees) = if p < 0.5 {
        (frame1, p * 180.0)
    } else {
        (frame2, (1.0 - p) * 180.0)
    };
    let scale = degrees.to_radians().cos().abs();
    if scale < MIN_FLIP_SCALE {
        return Frame::blank(frame1.width(), frame1.height(), frame1.channels());
    }

    let extent = if vertical_axis { frame1.width() } else { frame1.height() };
    let squeezed = (extent as f32 * scale).floor() as u32;
    if squeezed == 0 {
        return Frame::blank(frame1.width(), frame1.height(), frame1.channels());
    }
    let offset = (extent - squeezed) / 2;
    let source_pos = move |pos: u32| -> Option<u32> {
        if pos < offset || pos >= offset + squeezed {
            return None;
        }
        Some((((pos - offset) as f32 / scale) as u32).min(extent - 1))
    };

    compose(frame1, |x, y, px| {
        let src = if vertical_axis {
            source_pos(x).map(|sx| source.pixel(sx, y))
        } else {
            source_pos(y).map(|sy| source.pixel(x, sy))
        };
        if let Some(src) = src {
            px.copy_from_slice(src);
        }
    })
}

/// `from_center`: frame1's halves squeeze toward the side edges, uncovering
/// frame2. Otherwise frame2's halves close in from the edges over frame1.
pub fn door_wipe(frame1: &Frame, frame2: &Frame, p: f32, from_center: bool) -> Frame {
    let w = frame1.width();
    let mid = w / 2;
    let right_half = w - mid;
    let (doors, behind, share) = if from_center {
        (frame1, frame2, 1.0 - p)
    } else {
        (frame2, frame1, p)
    };
    let left_w = (mid as f32 * share).floor() as u32;
    let right_w = (right_half as f32 * share).floor() as u32;

    compose(frame1, |x, y, px| {
        let src = if x < left_w {
            let sx = (x as u64 * mid as u64 / left_w as u64) as u32;
            doors.pixel(sx.min(mid.saturating_sub(1)), y)
        } else if x >= w - right_w {
            let local = x - (w - right_w);
            let sx = mid + (local as u64 * right_half as u64 / right_w as u64) as u32;
            doors.pixel(sx.min(w - 1), y)
        } else {
            behind.pixel(x, y)
        };
        px.copy_from_slice(src);
    })
}

/// Radial sine displacement of frame1's sampling coordinates, then the
/// crossfade. The envelope `amplitude (1 - p) min(1, p / 0.1)` keeps the
/// start of the transition on frame1.
pub fn ripple(frame1: &Frame, frame2: &Frame, p: f32, amplitude: f32, frequency: f32) -> Frame {
    let (cx, cy) = center(frame1);
    let w = frame1.width();
    let h = frame1.height();
    let max_dist = {
        let far_x = cx.max((w.max(1) - 1) as f32 - cx);
        let far_y = cy.max((h.max(1) - 1) as f32 - cy);
        let d = (far_x * far_x + far_y * far_y).sqrt();
        if d > 0.0 {
            d
        } else {
            1.0
        }
    };
    let envelope = amplitude * (1.0 - p) * (p / RIPPLE_ATTACK).min(1.0);
    let max_x = (w.max(1) - 1) as f32;
    let max_y = (h.max(1) - 1) as f32;

    compose(frame1, |x, y, px| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        let dist = (dx * dx + dy * dy).sqrt();
        let wave = ((dist / max_dist - p) * TAU * frequency).sin() * envelope;
        let sx = (x as f32 + wave * dx / (dist + 1.0)).clamp(0.0, max_x) as u32;
        let sy = (y as f32 + wave * dy / (dist + 1.0)).clamp(0.0, max_y) as u32;

        let rippled = frame1.pixel(sx, sy);
        let target = frame2.pixel(x, y);
        for (c, out) in px.iter_mut().enumerate() {
            *out = blend(rippled[c] as f32, target[c] as f32, p);
        }
    })
}
