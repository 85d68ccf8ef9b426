use serde::Deserialize;

use super::plan::{round3, SlidePlan, SlideSpec};
use crate::render::transitions::TransitionStyle;

/// Room below this (half a millisecond) counts as none
const ROOM_EPSILON: f64 = 5e-4;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct AllocatorConfig {
    /// Minimum visible duration of the last slide
    pub min_last_slide: f64,
    /// Non-last slides are not shortened below this while paying a shortage
    pub slide_floor: f64,
    /// Allowed |Σ(duration + transition) - total| before the last slide absorbs the residual
    pub tolerance: f64,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            min_last_slide: 2.0,
            slide_floor: 0.5,
            tolerance: 0.01,
        }
    }
}

/// Turn slide start points into a plan of exactly `num_slides` slides whose
/// durations and transitions add up to `total`.
pub fn allocate(
    points: &[f64],
    num_slides: usize,
    transition: f64,
    fade: f64,
    total: f64,
    config: &AllocatorConfig,
) -> SlidePlan {
    if num_slides == 0 {
        return SlidePlan::new(Vec::new(), total);
    }

    let starts = if points.len() < num_slides {
        log::warn!(
            "Only {} usable transition points for {} slides, spacing slides evenly",
            points.len(),
            num_slides
        );
        uniform_starts(num_slides, total - fade)
    } else if points.len() > num_slides {
        subsample(points, num_slides)
    } else {
        points.to_vec()
    };

    let mut durations: Vec<f64> = starts
        .windows(2)
        .map(|w| round3(w[1] - w[0] - transition).max(0.0))
        .collect();

    let mut last = total - starts[num_slides - 1] - fade;
    if last < config.min_last_slide {
        let shortage = config.min_last_slide - last;
        log::debug!(
            "Last slide only {:.3}s, taking {:.3}s from {} earlier slides",
            last,
            shortage,
            durations.len()
        );
        let unpaid = pay_shortage(&mut durations, shortage, config.slide_floor);
        if unpaid > ROOM_EPSILON && !durations.is_empty() {
            log::warn!(
                "Track too short for {} slides: {:.3}s of shortage pushes slides below {:.3}s",
                num_slides,
                unpaid,
                config.slide_floor
            );
        }
        last = config.min_last_slide;
    }
    durations.push(round3(last));

    let mut slides: Vec<SlideSpec> = durations
        .into_iter()
        .enumerate()
        .map(|(index, duration)| SlideSpec {
            index,
            duration,
            transition: if index + 1 == num_slides { fade } else { transition },
            style: TransitionStyle::Fade,
        })
        .collect();

    let scheduled: f64 = slides.iter().map(|s| s.duration + s.transition).sum();
    let residual = total - scheduled;
    if residual > config.tolerance {
        log::debug!("Extending last slide by {:.3}s to match {:.3}s", residual, total);
        if let Some(last) = slides.last_mut() {
            last.duration = round3(last.duration + residual);
        }
    } else if residual < -config.tolerance {
        trim_excess(&mut slides, -residual, config);
    }

    SlidePlan::new(slides, total)
}

/// Remove `excess` seconds from an overscheduled plan without writing a
/// negative value: first the last slide down to `min_last_slide`, then the
/// earlier holds down to zero, then all transitions and the closing fade
/// scaled by one factor. Only a track shorter than `min_last_slide` cuts into
/// the last slide beyond that.
fn trim_excess(slides: &mut [SlideSpec], excess: f64, config: &AllocatorConfig) {
    let Some((last, earlier)) = slides.split_last_mut() else {
        return;
    };
    let mut excess = excess;

    let give = (last.duration - config.min_last_slide).max(0.0).min(excess);
    last.duration = round3(last.duration - give);
    excess -= give;

    if excess > ROOM_EPSILON && !earlier.is_empty() {
        let mut holds: Vec<f64> = earlier.iter().map(|s| s.duration).collect();
        excess = pay_shortage(&mut holds, excess, 0.0);
        for (slide, hold) in earlier.iter_mut().zip(holds) {
            slide.duration = hold;
        }
    }
    if excess <= ROOM_EPSILON {
        return;
    }

    let transitions = last.transition + earlier.iter().map(|s| s.transition).sum::<f64>();
    let cut = excess.min(transitions);
    log::warn!(
        "Track too short for {} slides: shortening transitions by {:.3}s in total",
        earlier.len() + 1,
        cut
    );
    if transitions > 0.0 {
        let scale = (transitions - cut) / transitions;
        last.transition *= scale;
        for slide in earlier.iter_mut() {
            slide.transition *= scale;
        }
    }
    excess -= cut;
    if excess > ROOM_EPSILON {
        last.duration = round3((last.duration - excess).max(0.0));
    }
}

/// `num_slides` evenly spaced starts over `[0, span]`.
fn uniform_starts(num_slides: usize, span: f64) -> Vec<f64> {
    let interval = span.max(0.0) / num_slides as f64;
    (0..num_slides).map(|i| i as f64 * interval).collect()
}

/// Evenly spaced indices over the point list, first and last included.
fn subsample(points: &[f64], num_slides: usize) -> Vec<f64> {
    if num_slides == 1 {
        return vec![points[0]];
    }
    let last = points.len() - 1;
    (0..num_slides)
        .map(|i| points[i * last / (num_slides - 1)])
        .collect()
}

/// Take `shortage` seconds from the slides in equal 3-decimal shares without
/// pushing any below `floor`. Shares a slide cannot pay move to the others.
/// Returns what could not be paid.
fn pay_shortage(durations: &mut [f64], shortage: f64, floor: f64) -> f64 {
    let mut remaining = shortage;

    for _ in 0..=durations.len() {
        let payers: Vec<usize> = (0..durations.len())
            .filter(|&i| durations[i] - floor > ROOM_EPSILON)
            .collect();
        if remaining <= ROOM_EPSILON || payers.is_empty() {
            break;
        }

        let share = round3(remaining / payers.len() as f64);
        if share <= 0.0 {
            break;
        }
        for i in payers {
            let paid = share.min(durations[i] - floor);
            durations[i] = round3(durations[i] - paid);
            remaining -= paid;
        }
    }

    remaining.max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn uniform_fallback_without_candidates() {
        let plan = allocate(&[], 5, 1.0, 3.0, 30.0, &AllocatorConfig::default());
        assert_eq!(plan.len(), 5);
        // starts at 0, 5.4, 10.8, 16.2, 21.6
        for slide in &plan.slides[..4] {
            assert_close(slide.duration, 4.4);
            assert_close(slide.transition, 1.0);
        }
        assert_close(plan.slides[4].duration, 5.4);
        assert_close(plan.slides[4].transition, 3.0);
        assert!(plan.is_consistent(0.01));
    }

    #[test]
    fn uniform_starts_match_interval() {
        let starts = uniform_starts(5, 27.0);
        let expected = [0.0, 5.4, 10.8, 16.2, 21.6];
        for (s, e) in starts.iter().zip(expected) {
            assert_close(*s, e);
        }
    }

    #[test]
    fn shortage_is_shared_by_earlier_slides() {
        let points = [0.0, 6.0, 12.0, 18.0, 25.8];
        let plan = allocate(&points, 5, 1.0, 3.0, 30.0, &AllocatorConfig::default());
        // last slide would be 30 - 25.8 - 3 = 1.2, so 0.8 is split four ways
        let expected = [4.8, 4.8, 4.8, 6.6, 2.0];
        for (slide, want) in plan.slides.iter().zip(expected) {
            assert_close(slide.duration, want);
        }
        assert!(plan.is_consistent(0.01));
    }

    #[test]
    fn shortage_respects_floor_and_moves_to_others() {
        // slide 0 only has 0.2s of room above the 0.5s floor
        let points = [0.0, 1.7, 9.0, 16.5];
        let plan = allocate(&points, 4, 1.0, 3.0, 20.0, &AllocatorConfig::default());
        assert!(plan.slides[0].duration >= 0.5 - 1e-9);
        assert_close(plan.slides[3].duration, 2.0);
        assert!(plan.is_consistent(0.01));
    }

    #[test]
    fn infeasible_shortage_keeps_sum() {
        let points = [0.0, 1.2, 2.4, 3.6];
        let plan = allocate(&points, 4, 1.0, 3.0, 6.0, &AllocatorConfig::default());
        assert_eq!(plan.len(), 4);
        assert!(plan.is_consistent(0.01));
        // holds are spent, then transitions and fade shrink by 1/3
        for slide in &plan.slides[..3] {
            assert_close(slide.duration, 0.0);
            assert_close(slide.transition, 2.0 / 3.0);
        }
        assert_close(plan.slides[3].duration, 2.0);
        assert_close(plan.slides[3].transition, 2.0);
    }

    #[test]
    fn track_shorter_than_last_slide_floor() {
        let plan = allocate(&[], 2, 1.0, 3.0, 1.5, &AllocatorConfig::default());
        assert!(plan.is_consistent(0.01));
        assert!(plan.slides.iter().all(|s| s.transition == 0.0));
        assert_close(plan.slides[0].duration, 0.0);
        assert_close(plan.slides[1].duration, 1.5);
    }

    #[test]
    fn short_tracks_never_go_negative() {
        let config = AllocatorConfig::default();
        for total in [0.0, 0.4, 1.0, 2.5, 3.0, 4.9, 6.0, 7.5] {
            for n in 1..6 {
                let plan = allocate(&[], n, 1.0, 3.0, total, &config);
                assert!(plan.is_consistent(0.01), "sum mismatch for {n} slides over {total}s");
                for slide in &plan.slides {
                    assert!(slide.duration >= 0.0, "negative hold for {n} slides over {total}s");
                    assert!(slide.transition >= 0.0, "negative transition for {n} slides over {total}s");
                }
                let last = plan.slides[n - 1].duration;
                assert!(last >= f64::min(2.0, total) - 1e-9, "last slide {last} for {n} slides over {total}s");
            }
        }
    }

    #[test]
    fn extra_points_are_subsampled_by_index() {
        let points: Vec<f64> = (0..9).map(|i| i as f64 * 2.0).collect();
        assert_eq!(subsample(&points, 5), vec![0.0, 4.0, 8.0, 12.0, 16.0]);
        assert_eq!(subsample(&points, 1), vec![0.0]);
        assert_eq!(subsample(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0], 5), vec![0.0, 1.0, 2.0, 3.0, 5.0]);
    }

    #[test]
    fn last_slide_takes_remaining_time() {
        let points = [0.0, 5.0, 10.0];
        let plan = allocate(&points, 3, 1.0, 2.0, 24.0, &AllocatorConfig::default());
        assert_close(plan.slides[0].duration, 4.0);
        assert_close(plan.slides[1].duration, 4.0);
        assert_close(plan.slides[2].duration, 12.0);
        assert!(plan.is_consistent(0.01));
    }

    #[test]
    fn crowded_points_clamp_to_zero() {
        let plan = allocate(&[0.0, 0.1, 0.2], 3, 1.5, 3.0, 40.0, &AllocatorConfig::default());
        assert_eq!(plan.slides[0].duration, 0.0);
        assert_eq!(plan.slides[1].duration, 0.0);
        // 40 - 3 (fade) - 3 (transitions)
        assert_close(plan.slides[2].duration, 34.0);
    }

    #[test]
    fn single_slide_plan() {
        let plan = allocate(&[0.0], 1, 1.0, 3.0, 10.0, &AllocatorConfig::default());
        assert_eq!(plan.len(), 1);
        assert_close(plan.slides[0].duration, 7.0);
        assert_close(plan.slides[0].transition, 3.0);
    }

    #[test]
    fn zero_slides_is_empty() {
        let plan = allocate(&[0.0, 1.0], 0, 1.0, 3.0, 10.0, &AllocatorConfig::default());
        assert!(plan.is_empty());
    }

    #[test]
    fn invariants_hold_across_scenarios() {
        let config = AllocatorConfig::default();
        let scenarios: Vec<(Vec<f64>, usize, f64)> = vec![
            (vec![], 7, 45.0),
            (vec![0.0, 0.1, 0.2], 3, 40.0),
            (vec![0.0, 3.3, 7.9, 12.0, 19.5, 20.0, 33.0, 38.0], 5, 41.7),
            ((0..40).map(|i| i as f64 * 0.9).collect(), 12, 60.0),
            (vec![0.0, 14.0, 28.0, 29.5], 4, 31.0),
        ];
        for (points, n, total) in scenarios {
            let plan = allocate(&points, n, 1.5, 3.0, total, &config);
            assert_eq!(plan.len(), n);
            assert!(plan.is_consistent(0.01), "sum mismatch for {points:?}");
            assert!(plan.slides[n - 1].duration >= 2.0 - 1e-9, "last slide short for {points:?}");
            assert!(plan.slides.iter().all(|s| s.duration >= 0.0), "negative slide for {points:?}");
        }
    }
}
