//! Per-style frame synthesis for slide transitions.
//!
//! A [`TransitionContext`] is built once per transition instance and renders
//! any point of it from the outgoing and incoming frames. Random fields and
//! luma maps are materialized on first use and reused for every later frame
//! of the same instance, so a context can be shared across threads.

pub mod geometric;
pub mod intensity;
pub mod masks;
pub mod stochastic;

use rayon::prelude::*;
use std::sync::OnceLock;
use thiserror::Error;

use super::frame::Frame;
use super::transitions::{Direction, TransitionStyle};
use stochastic::GlitchLayout;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompositeError {
    #[error("frame shapes differ: {left:?} vs {right:?} (width, height, channels)")]
    ShapeMismatch {
        left: (u32, u32, u8),
        right: (u32, u32, u8),
    },

    #[error("luma map is {map_width}x{map_height} but frames are {width}x{height}")]
    LumaMapMismatch {
        map_width: u32,
        map_height: u32,
        width: u32,
        height: u32,
    },
}

/// One transition instance: style, length and the seed of its random fields.
#[derive(Debug)]
pub struct TransitionContext {
    style: TransitionStyle,
    duration: f64,
    seed: u64,
    aux_dims: OnceLock<(u32, u32)>,
    order: OnceLock<Vec<u32>>,
    field: OnceLock<Vec<f32>>,
    glitch: OnceLock<GlitchLayout>,
}

impl TransitionContext {
    pub fn new(style: TransitionStyle, duration: f64, seed: u64) -> Self {
        Self {
            style,
            duration,
            seed,
            aux_dims: OnceLock::new(),
            order: OnceLock::new(),
            field: OnceLock::new(),
            glitch: OnceLock::new(),
        }
    }

    pub fn style(&self) -> &TransitionStyle {
        &self.style
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Frame at `t` seconds into the transition. `t >= duration` yields
    /// `frame2` unchanged.
    pub fn render(&self, frame1: &Frame, frame2: &Frame, t: f64) -> Result<Frame, CompositeError> {
        if !frame1.same_shape(frame2) {
            return Err(CompositeError::ShapeMismatch {
                left: frame1.shape(),
                right: frame2.shape(),
            });
        }
        if self.duration <= 0.0 || t >= self.duration {
            return Ok(frame2.clone());
        }
        let p = (t.max(0.0) / self.duration) as f32;

        let out = match &self.style {
            TransitionStyle::Fade | TransitionStyle::Dissolve => intensity::crossfade(frame1, frame2, p),
            TransitionStyle::WipeLeft => masks::wipe(frame1, frame2, p, Direction::Left),
            TransitionStyle::WipeRight => masks::wipe(frame1, frame2, p, Direction::Right),
            TransitionStyle::WipeUp => masks::wipe(frame1, frame2, p, Direction::Up),
            TransitionStyle::WipeDown => masks::wipe(frame1, frame2, p, Direction::Down),
            TransitionStyle::SplitScreen { vertical } => masks::split_screen(frame1, frame2, p, *vertical),
            TransitionStyle::CircleWipe { from_center } => masks::circle_wipe(frame1, frame2, p, *from_center),
            TransitionStyle::DiamondWipe { from_center } => masks::diamond_wipe(frame1, frame2, p, *from_center),
            TransitionStyle::ClockWipe { clockwise } => masks::clock_wipe(frame1, frame2, p, *clockwise),
            TransitionStyle::VenetianBlinds { blinds, vertical } => {
                masks::venetian_blinds(frame1, frame2, p, *blinds, *vertical)
            }
            TransitionStyle::Checkerboard { squares } => masks::checkerboard(frame1, frame2, p, *squares),
            TransitionStyle::SlideLeft => geometric::shift(frame1, frame2, p, Direction::Left),
            TransitionStyle::SlideRight => geometric::shift(frame1, frame2, p, Direction::Right),
            TransitionStyle::Push { direction } => geometric::shift(frame1, frame2, p, *direction),
            TransitionStyle::ZoomIn => geometric::zoom_in(frame1, frame2, p),
            TransitionStyle::ZoomOut => geometric::zoom_out(frame1, frame2, p),
            TransitionStyle::Rotate { angle } => geometric::rotate(frame1, frame2, p, *angle),
            TransitionStyle::Flip { vertical_axis } => geometric::flip(frame1, frame2, p, *vertical_axis),
            TransitionStyle::DoorWipe { from_center } => geometric::door_wipe(frame1, frame2, p, *from_center),
            TransitionStyle::Ripple {
                amplitude,
                frequency,
            } => geometric::ripple(frame1, frame2, p, *amplitude, *frequency),
            TransitionStyle::Blur { radius } => intensity::blur(frame1, frame2, p, *radius),
            TransitionStyle::WhipPan => intensity::whip_pan(frame1, frame2, p),
            TransitionStyle::Flash { intensity, width } => {
                intensity::flash(frame1, frame2, p, *intensity, *width)
            }
            TransitionStyle::Burn => {
                self.check_aux_dims(frame1)?;
                let field = self
                    .field
                    .get_or_init(|| stochastic::burn_field(frame1.width(), frame1.height(), self.seed));
                intensity::burn(frame1, frame2, p, field)
            }
            TransitionStyle::PixelDissolve => {
                self.check_aux_dims(frame1)?;
                let order = self.order.get_or_init(|| {
                    stochastic::permutation(frame1.width() as usize * frame1.height() as usize, self.seed)
                });
                stochastic::pixel_dissolve(frame1, frame2, p, order)
            }
            TransitionStyle::Glitch { intensity, glitches } => {
                let layout = self
                    .glitch
                    .get_or_init(|| GlitchLayout::generate(*glitches as usize, self.seed));
                stochastic::glitch(frame1, frame2, p, *intensity, layout)
            }
            TransitionStyle::LumaWipe { map } => {
                if let Some(map) = map {
                    if (map.width(), map.height()) != (frame1.width(), frame1.height()) {
                        return Err(CompositeError::LumaMapMismatch {
                            map_width: map.width(),
                            map_height: map.height(),
                            width: frame1.width(),
                            height: frame1.height(),
                        });
                    }
                }
                self.check_aux_dims(frame1)?;
                let field = self
                    .field
                    .get_or_init(|| masks::luma_field(map.as_deref(), frame1.width(), frame1.height()));
                masks::luma_wipe(frame1, frame2, p, field)
            }
        };
        Ok(out)
    }

    /// Fields are sized for the first frame rendered; later frames must match.
    fn check_aux_dims(&self, frame: &Frame) -> Result<(), CompositeError> {
        let dims = *self.aux_dims.get_or_init(|| (frame.width(), frame.height()));
        if dims != (frame.width(), frame.height()) {
            return Err(CompositeError::ShapeMismatch {
                left: (dims.0, dims.1, frame.channels()),
                right: frame.shape(),
            });
        }
        Ok(())
    }
}

/// Build a frame shaped like `like`, filling each pixel with `fill(x, y, px)`.
/// Rows are produced in parallel.
pub(crate) fn compose<F>(like: &Frame, fill: F) -> Frame
where
    F: Fn(u32, u32, &mut [u8]) + Sync,
{
    let mut out = Frame::blank(like.width(), like.height(), like.channels());
    let stride = out.stride();
    if stride == 0 {
        return out;
    }
    let channels = like.channels() as usize;
    out.data_mut()
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(channels).enumerate() {
                fill(x as u32, y as u32, px);
            }
        });
    out
}

/// Per-pixel choice: `frame2` where `take_second(x, y)`, else `frame1`.
pub(crate) fn select<F>(frame1: &Frame, frame2: &Frame, take_second: F) -> Frame
where
    F: Fn(u32, u32) -> bool + Sync,
{
    compose(frame1, |x, y, px| {
        let src = if take_second(x, y) { frame2 } else { frame1 };
        px.copy_from_slice(src.pixel(x, y));
    })
}

/// `round(a (1 - p) + b p)` clipped to a byte.
pub(crate) fn blend(a: f32, b: f32, p: f32) -> u8 {
    (a * (1.0 - p) + b * p).round().clamp(0.0, 255.0) as u8
}

/// Integer frame centre, `(w / 2, h / 2)`.
pub(crate) fn center(frame: &Frame) -> (f32, f32) {
    ((frame.width() / 2) as f32, (frame.height() / 2) as f32)
}
