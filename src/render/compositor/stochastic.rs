//! Seeded random fields and the styles built on them. Every field is drawn
//! once per transition instance so consecutive frames stay coherent.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::intensity::crossfade;
use super::masks::normalize_range;
use super::select;
use crate::render::frame::Frame;

/// Side of the square noise tile used by glitch noise blocks
const NOISE_TILE: usize = 64;

/// Glitch strength below which the style is a plain crossfade
const MIN_GLITCH_STRENGTH: f32 = 0.01;

/// Random reveal order: a shuffled `0..len`.
pub fn permutation(len: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut order: Vec<u32> = (0..len as u32).collect();
    order.shuffle(&mut rng);
    order
}

/// Uniform noise plus a top-to-bottom ramp, rescaled to `[0, 1]`. Low values
/// burn first.
pub fn burn_field(width: u32, height: u32, seed: u64) -> Vec<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let ramp_den = height.saturating_sub(1).max(1) as f32;
    let mut field = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        let ramp = y as f32 / ramp_den;
        for _ in 0..width {
            field.push(rng.gen::<f32>() + ramp);
        }
    }
    normalize_range(field)
}

/// Pixel `i` switches to frame2 once `order[i] / (w h) < p`.
pub fn pixel_dissolve(frame1: &Frame, frame2: &Frame, p: f32, order: &[u32]) -> Frame {
    let width = frame1.width() as usize;
    let total = order.len().max(1) as f64;
    let p = p as f64;
    select(frame1, frame2, |x, y| {
        (order[y as usize * width + x as usize] as f64 / total) < p
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum GlitchKind {
    /// A band of rows slides sideways
    RowShift,
    /// One colour channel slides sideways across the frame
    ChannelShift,
    /// A block copied from the other frame
    Block,
    /// A block mixed with noise
    Noise,
}

#[derive(Clone, Debug, PartialEq)]
struct Glitch {
    kind: GlitchKind,
    /// Unit draws for position, size, offset and mix
    u: [f32; 5],
}

/// Fixed glitch placement and noise tile for one transition. Positions are
/// stored as unit fractions so the layout scales to any frame size.
#[derive(Clone, Debug, PartialEq)]
pub struct GlitchLayout {
    glitches: Vec<Glitch>,
    noise: Vec<u8>,
}

impl GlitchLayout {
    pub fn generate(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let glitches: Vec<Glitch> = (0..count)
            .map(|_| {
                let kind = match rng.gen_range(0..4) {
                    0 => GlitchKind::RowShift,
                    1 => GlitchKind::ChannelShift,
                    2 => GlitchKind::Block,
                    _ => GlitchKind::Noise,
                };
                let mut u = [0.0f32; 5];
                for v in &mut u {
                    *v = rng.gen();
                }
                Glitch { kind, u }
            })
            .collect();
        let noise: Vec<u8> = (0..NOISE_TILE * NOISE_TILE * 3).map(|_| rng.gen()).collect();
        Self { glitches, noise }
    }

    fn noise_at(&self, x: u32, y: u32, c: usize) -> u8 {
        let tx = x as usize % NOISE_TILE;
        let ty = y as usize % NOISE_TILE;
        self.noise[(ty * NOISE_TILE + tx) * 3 + c]
    }
}

/// The current frame (frame1 before the midpoint, frame2 after) is corrupted
/// by the layout, scaled by a strength peaking at the midpoint, then faded
/// towards frame2.
pub fn glitch(frame1: &Frame, frame2: &Frame, p: f32, intensity: f32, layout: &GlitchLayout) -> Frame {
    let strength = intensity * (1.0 - (p - 0.5).abs() * 2.0);
    if strength < MIN_GLITCH_STRENGTH {
        return crossfade(frame1, frame2, p);
    }

    let (mut result, other) = if p < 0.5 {
        (frame1.clone(), frame2)
    } else {
        (frame2.clone(), frame1)
    };
    for g in &layout.glitches {
        apply_glitch(&mut result, other, g, strength, layout);
    }
    crossfade(&result, frame2, p)
}

fn apply_glitch(result: &mut Frame, other: &Frame, g: &Glitch, strength: f32, layout: &GlitchLayout) {
    let w = result.width();
    let h = result.height();
    if w == 0 || h == 0 {
        return;
    }
    let channels = result.channels() as usize;
    let u = g.u;

    match g.kind {
        GlitchKind::RowShift => {
            let y0 = ((u[0] * h as f32) as u32).min(h - 1);
            let rows = ((h as f32 * 0.01 * strength * u[1]) as u32).max(1);
            let offset = (w as f32 * strength * (2.0 * u[2] - 1.0)) as i64;
            for y in y0..(y0 + rows).min(h) {
                shift_row(result, y, offset, 0..channels);
            }
        }
        GlitchKind::ChannelShift => {
            if channels != 3 {
                return;
            }
            let channel = ((u[0] * 3.0) as usize).min(2);
            let offset = (w as f32 * strength * 0.1 * (2.0 * u[1] - 1.0)) as i64;
            for y in 0..h {
                shift_row(result, y, offset, channel..channel + 1);
            }
        }
        GlitchKind::Block | GlitchKind::Noise => {
            let bh = (h as f32 * 0.05 * u[0]) as u32;
            let bw = (w as f32 * 0.2 * u[1]) as u32;
            let y0 = (u[2] * (h - bh) as f32) as u32;
            let x0 = (u[3] * (w - bw) as f32) as u32;
            let alpha = 0.3 + 0.4 * u[4];
            for y in y0..(y0 + bh).min(h) {
                for x in x0..(x0 + bw).min(w) {
                    if g.kind == GlitchKind::Block {
                        let src = other.pixel(x, y).to_vec();
                        result.pixel_mut(x, y).copy_from_slice(&src);
                    } else {
                        for (c, v) in result.pixel_mut(x, y).iter_mut().enumerate() {
                            let noise = layout.noise_at(x, y, c) as f32;
                            *v = (*v as f32 * (1.0 - alpha) + noise * alpha).round().clamp(0.0, 255.0) as u8;
                        }
                    }
                }
            }
        }
    }
}

/// `new[x] = old[x - offset]` wherever the source lies inside the row.
fn shift_row(frame: &mut Frame, y: u32, offset: i64, channels: std::ops::Range<usize>) {
    if offset == 0 {
        return;
    }
    let w = frame.width() as i64;
    let step = frame.channels() as usize;
    let old = frame.row(y).to_vec();
    let start = y as usize * frame.stride();
    let row = &mut frame.data_mut()[start..start + old.len()];
    for x in 0..w {
        let sx = x - offset;
        if sx < 0 || sx >= w {
            continue;
        }
        for c in channels.clone() {
            row[x as usize * step + c] = old[sx as usize * step + c];
        }
    }
}
