//! Boolean-mask styles: frame2 replaces frame1 wherever a progress-driven
//! threshold says so.

use std::f32::consts::TAU;

use super::{center, select};
use crate::render::frame::Frame;
use crate::render::transitions::Direction;

/// The edge travels in `direction`; frame2 fills in behind it.
pub fn wipe(frame1: &Frame, frame2: &Frame, p: f32, direction: Direction) -> Frame {
    let w = frame1.width() as f32;
    let h = frame1.height() as f32;
    match direction {
        Direction::Left => {
            let keep = (w * (1.0 - p)).floor() as u32;
            select(frame1, frame2, |x, _| x >= keep)
        }
        Direction::Right => {
            let edge = (w * p).floor() as u32;
            select(frame1, frame2, |x, _| x < edge)
        }
        Direction::Up => {
            let keep = (h * (1.0 - p)).floor() as u32;
            select(frame1, frame2, |_, y| y >= keep)
        }
        Direction::Down => {
            let edge = (h * p).floor() as u32;
            select(frame1, frame2, |_, y| y < edge)
        }
    }
}

pub fn split_screen(frame1: &Frame, frame2: &Frame, p: f32, vertical: bool) -> Frame {
    if vertical {
        let edge = (frame1.height() as f32 * p).floor() as u32;
        select(frame1, frame2, |_, y| y < edge)
    } else {
        let edge = (frame1.width() as f32 * p).floor() as u32;
        select(frame1, frame2, |x, _| x < edge)
    }
}

/// Euclidean distance from the centre against a growing (or shrinking) radius.
pub fn circle_wipe(frame1: &Frame, frame2: &Frame, p: f32, from_center: bool) -> Frame {
    let (cx, cy) = center(frame1);
    let max_dist = (cx * cx + cy * cy).sqrt();
    let dist = |x: u32, y: u32| {
        let dx = x as f32 - cx;
        let dy = y as f32 - cy;
        (dx * dx + dy * dy).sqrt()
    };
    if from_center {
        let radius = max_dist * p;
        select(frame1, frame2, |x, y| dist(x, y) < radius)
    } else {
        let radius = max_dist * (1.0 - p);
        select(frame1, frame2, |x, y| dist(x, y) > radius)
    }
}

/// Manhattan distance from the centre.
pub fn diamond_wipe(frame1: &Frame, frame2: &Frame, p: f32, from_center: bool) -> Frame {
    let (cx, cy) = center(frame1);
    let max_dist = cx + cy;
    let dist = |x: u32, y: u32| (x as f32 - cx).abs() + (y as f32 - cy).abs();
    if from_center {
        let bound = max_dist * p;
        select(frame1, frame2, |x, y| dist(x, y) < bound)
    } else {
        let bound = max_dist * (1.0 - p);
        select(frame1, frame2, |x, y| dist(x, y) > bound)
    }
}

/// Sweep around the centre starting at 3 o'clock.
pub fn clock_wipe(frame1: &Frame, frame2: &Frame, p: f32, clockwise: bool) -> Frame {
    let (cx, cy) = center(frame1);
    let sweep = p * TAU;
    let angle = |x: u32, y: u32| (y as f32 - cy).atan2(x as f32 - cx).rem_euclid(TAU);
    if clockwise {
        select(frame1, frame2, |x, y| angle(x, y) < sweep)
    } else {
        select(frame1, frame2, |x, y| angle(x, y) > TAU - sweep)
    }
}

/// Stripes of equal size, each revealing its leading `p` fraction. Leftover
/// rows (or columns) join the last stripe.
pub fn venetian_blinds(frame1: &Frame, frame2: &Frame, p: f32, blinds: u32, vertical: bool) -> Frame {
    let extent = if vertical { frame1.width() } else { frame1.height() };
    let blinds = blinds.clamp(1, extent.max(1));
    let size = (extent / blinds).max(1);

    let reveals = move |pos: u32| {
        let stripe = (pos / size).min(blinds - 1);
        let start = stripe * size;
        let len = if stripe == blinds - 1 { extent - start } else { size };
        ((pos - start) as f32) < p * len as f32
    };

    if vertical {
        select(frame1, frame2, |x, _| reveals(x))
    } else {
        select(frame1, frame2, |_, y| reveals(y))
    }
}

/// Fills `floor(p * rows * cols)` squares: even-parity squares in row-major
/// order first, then the odd ones.
pub fn checkerboard(frame1: &Frame, frame2: &Frame, p: f32, squares: u32) -> Frame {
    let squares = squares.max(1);
    let cell_w = (frame1.width() / squares).max(1);
    let cell_h = (frame1.height() / squares).max(1);
    let cols = frame1.width() / cell_w;
    let rows = frame1.height() / cell_h;
    let cells = (rows * cols) as usize;

    let fill = ((p * cells as f32).floor() as usize).min(cells);
    let mut revealed = vec![false; cells];
    let even = (0..cells).filter(|i| (i / cols as usize + i % cols as usize) % 2 == 0);
    let odd = (0..cells).filter(|i| (i / cols as usize + i % cols as usize) % 2 == 1);
    for i in even.chain(odd).take(fill) {
        revealed[i] = true;
    }

    select(frame1, frame2, |x, y| {
        let (r, c) = (y / cell_h, x / cell_w);
        r < rows && c < cols && revealed[(r * cols + c) as usize]
    })
}

/// Normalized map in `[0, 1]`, one value per pixel. Without a supplied map,
/// distance from the centre over its maximum.
pub fn luma_field(map: Option<&Frame>, width: u32, height: u32) -> Vec<f32> {
    let raw: Vec<f32> = match map {
        Some(map) => {
            let channels = map.channels() as usize;
            map.data()
                .chunks_exact(channels)
                .map(|px| px.iter().map(|&v| v as f32).sum::<f32>() / channels as f32)
                .collect()
        }
        None => {
            let (cx, cy) = ((width / 2) as f32, (height / 2) as f32);
            (0..height)
                .flat_map(|y| {
                    (0..width).map(move |x| {
                        let dx = x as f32 - cx;
                        let dy = y as f32 - cy;
                        (dx * dx + dy * dy).sqrt()
                    })
                })
                .collect()
        }
    };
    normalize_range(raw)
}

pub fn luma_wipe(frame1: &Frame, frame2: &Frame, p: f32, field: &[f32]) -> Frame {
    let width = frame1.width() as usize;
    select(frame1, frame2, |x, y| field[y as usize * width + x as usize] < p)
}

/// Min/max rescale to `[0, 1]`; a flat field becomes all zeros.
pub(crate) fn normalize_range(mut values: Vec<f32>) -> Vec<f32> {
    let min = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let span = max - min;
    for v in &mut values {
        *v = if span > 0.0 { (*v - min) / span } else { 0.0 };
    }
    values
}

#[cfg(test)]
mod tests {
    use super::super::test_frames::gradient;
    use super::*;

    fn source_map(out: &Frame, a: &Frame) -> Vec<Vec<bool>> {
        // true where the output pixel came from frame2
        (0..out.height())
            .map(|y| (0..out.width()).map(|x| out.pixel(x, y) != a.pixel(x, y)).collect())
            .collect()
    }

    #[test]
    fn wipes_move_in_their_direction() {
        let a = Frame::filled(8, 8, 3, 0);
        let b = Frame::filled(8, 8, 3, 255);

        let left = source_map(&wipe(&a, &b, 0.25, Direction::Left), &a);
        assert!(!left[0][5] && left[0][6]);

        let right = source_map(&wipe(&a, &b, 0.25, Direction::Right), &a);
        assert!(right[0][1] && !right[0][2]);

        let up = source_map(&wipe(&a, &b, 0.25, Direction::Up), &a);
        assert!(!up[5][0] && up[6][0]);

        let down = source_map(&wipe(&a, &b, 0.25, Direction::Down), &a);
        assert!(down[1][0] && !down[2][0]);
    }

    #[test]
    fn split_screen_follows_orientation() {
        let a = Frame::filled(10, 10, 1, 0);
        let b = Frame::filled(10, 10, 1, 255);
        let out = split_screen(&a, &b, 0.5, true);
        assert_eq!(out.row(4), &[255; 10]);
        assert_eq!(out.row(5), &[0; 10]);
    }

    #[test]
    fn circle_grows_from_center() {
        let a = Frame::filled(21, 21, 1, 0);
        let b = Frame::filled(21, 21, 1, 255);
        let out = circle_wipe(&a, &b, 0.2, true);
        assert_eq!(out.pixel(10, 10), &[255]);
        assert_eq!(out.pixel(0, 0), &[0]);

        let closing = circle_wipe(&a, &b, 0.2, false);
        assert_eq!(closing.pixel(10, 10), &[0]);
        assert_eq!(closing.pixel(0, 0), &[255]);
    }

    #[test]
    fn diamond_uses_manhattan_distance() {
        let a = Frame::filled(21, 21, 1, 0);
        let b = Frame::filled(21, 21, 1, 255);
        // bound = 20 * 0.5 = 10
        let out = diamond_wipe(&a, &b, 0.5, true);
        assert_eq!(out.pixel(15, 14), &[255]);
        assert_eq!(out.pixel(15, 15), &[0]);
    }

    #[test]
    fn clock_sweeps_quarter_turn() {
        let a = Frame::filled(21, 21, 1, 0);
        let b = Frame::filled(21, 21, 1, 255);
        let out = clock_wipe(&a, &b, 0.26, true);
        // just past 3 o'clock, then 6 o'clock (y grows downwards)
        assert_eq!(out.pixel(20, 11), &[255]);
        assert_eq!(out.pixel(10, 20), &[255]);
        assert_eq!(out.pixel(0, 10), &[0]);

        let ccw = clock_wipe(&a, &b, 0.26, false);
        assert_eq!(ccw.pixel(10, 0), &[255]);
        assert_eq!(ccw.pixel(10, 20), &[0]);
    }

    #[test]
    fn every_blind_reveals_its_leading_share() {
        let a = Frame::filled(4, 20, 1, 0);
        let b = Frame::filled(4, 20, 1, 255);
        let out = venetian_blinds(&a, &b, 0.5, 4, false);
        let rows: Vec<u8> = (0..20).map(|y| out.pixel(0, y)[0]).collect();
        let stripe = [255, 255, 255, 0, 0];
        assert_eq!(rows, stripe.repeat(4));
    }

    #[test]
    fn checkerboard_midpoint_is_one_parity() {
        let a = gradient(64, 48, 0x00);
        let b = gradient(64, 48, 0x5A);
        let out = checkerboard(&a, &b, 0.5, 8);
        for r in 0..8u32 {
            for c in 0..8u32 {
                let expected = if (r + c) % 2 == 0 { &b } else { &a };
                for y in r * 6..(r + 1) * 6 {
                    for x in c * 8..(c + 1) * 8 {
                        assert_eq!(out.pixel(x, y), expected.pixel(x, y), "cell {r},{c}");
                    }
                }
            }
        }
    }

    #[test]
    fn checkerboard_fills_odd_after_even() {
        let a = Frame::filled(4, 4, 1, 0);
        let b = Frame::filled(4, 4, 1, 255);
        // 16 cells of 1px, 8 even + first 2 odd
        let out = checkerboard(&a, &b, 10.0 / 16.0, 4);
        assert_eq!(out.row(0), &[255, 255, 255, 255]);
        assert_eq!(out.row(1), &[0, 255, 0, 255]);
    }

    #[test]
    fn luma_field_normalizes_supplied_map() {
        let map = Frame::from_raw(2, 2, 1, vec![50, 100, 150, 50]).unwrap();
        assert_eq!(luma_field(Some(&map), 2, 2), vec![0.0, 0.5, 1.0, 0.0]);

        let flat = Frame::filled(2, 1, 1, 9);
        assert_eq!(luma_field(Some(&flat), 2, 1), vec![0.0, 0.0]);
    }

    #[test]
    fn synthesized_luma_is_radial() {
        let field = luma_field(None, 5, 5);
        assert_eq!(field[2 * 5 + 2], 0.0);
        assert_eq!(field[0], 1.0);
        assert_eq!(field.iter().copied().fold(0.0, f32::max), 1.0);
    }
}
