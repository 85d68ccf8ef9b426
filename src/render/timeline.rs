use anyhow::Result;
use rayon::prelude::*;
use std::ops::Range;

use super::compositor::TransitionContext;
use super::frame::Frame;
use crate::timing::plan::SlidePlan;
use crate::render::transitions::TransitionStyle;

/// Where a point in time falls within the show.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Segment {
    Hold { slide: usize },
    Transition { slide: usize, offset: f64 },
    End,
}

/// The whole show laid out in time: slide `i` holds for its duration, then
/// transitions into slide `i + 1`. The last slide fades to black.
pub struct Timeline {
    plan: SlidePlan,
    frames: Vec<Frame>,
    contexts: Vec<TransitionContext>,
    black: Frame,
    fps: u32,
}

impl Timeline {
    /// Slides beyond the number of frames reuse images from the start.
    /// Transition `i` draws its random fields from `seed + i`.
    pub fn new(plan: SlidePlan, frames: Vec<Frame>, fps: u32, seed: u64) -> Result<Self> {
        let first = match frames.first() {
            Some(frame) => frame,
            None => anyhow::bail!("No images to show"),
        };
        if let Some(odd) = frames.iter().position(|f| !f.same_shape(first)) {
            anyhow::bail!(
                "Image {} is {:?}, expected {:?}",
                odd,
                frames[odd].shape(),
                first.shape()
            );
        }
        if fps == 0 {
            anyhow::bail!("Frame rate must be positive");
        }
        if plan.len() > frames.len() {
            log::warn!(
                "{} slides but only {} images, images will repeat",
                plan.len(),
                frames.len()
            );
        }

        let last = plan.len().saturating_sub(1);
        let contexts = plan
            .slides
            .iter()
            .map(|slide| {
                // the closing fade is always a plain fade to black
                let style = if slide.index == last {
                    TransitionStyle::Fade
                } else {
                    slide.style.clone()
                };
                TransitionContext::new(style, slide.transition, seed.wrapping_add(slide.index as u64))
            })
            .collect();
        let black = Frame::blank(first.width(), first.height(), first.channels());

        Ok(Self {
            plan,
            frames,
            contexts,
            black,
            fps,
        })
    }

    pub fn frame_count(&self) -> u64 {
        (self.plan.total_duration * self.fps as f64).round().max(0.0) as u64
    }

    pub fn frame_at(&self, time: f64) -> Result<Frame> {
        let frame = match self.locate(time) {
            Segment::Hold { slide } => self.image(slide).clone(),
            Segment::Transition { slide, offset } => {
                let next = if slide + 1 < self.plan.len() {
                    self.image(slide + 1)
                } else {
                    &self.black
                };
                self.contexts[slide].render(self.image(slide), next, offset)?
            }
            Segment::End => self.black.clone(),
        };
        Ok(frame)
    }

    /// Render output frames `range` in parallel, in order.
    pub fn render_range(&self, range: Range<u64>) -> Result<Vec<Frame>> {
        let fps = self.fps as f64;
        range
            .into_par_iter()
            .map(|index| self.frame_at(index as f64 / fps))
            .collect()
    }

    fn image(&self, slide: usize) -> &Frame {
        &self.frames[slide % self.frames.len()]
    }

    fn locate(&self, time: f64) -> Segment {
        let mut start = 0.0;
        for slide in &self.plan.slides {
            let hold_end = start + slide.duration;
            if time < hold_end {
                return Segment::Hold { slide: slide.index };
            }
            let end = hold_end + slide.transition;
            if time < end {
                return Segment::Transition {
                    slide: slide.index,
                    offset: time - hold_end,
                };
            }
            start = end;
        }
        Segment::End
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::compositor::intensity::crossfade;

    fn frames() -> Vec<Frame> {
        vec![Frame::filled(4, 4, 3, 100), Frame::filled(4, 4, 3, 200)]
    }

    /// 1.0s hold + 0.5s fade per slide, 3.0s in total.
    fn timeline() -> Timeline {
        Timeline::new(SlidePlan::fixed(2, 1.0, 0.5, 0.5), frames(), 10, 0).unwrap()
    }

    #[test]
    fn frame_count_follows_total_duration() {
        assert_eq!(timeline().frame_count(), 30);
    }

    #[test]
    fn holds_show_the_slide_image() {
        let tl = timeline();
        assert_eq!(tl.frame_at(0.0).unwrap(), frames()[0]);
        assert_eq!(tl.frame_at(0.9).unwrap(), frames()[0]);
        assert_eq!(tl.frame_at(1.6).unwrap(), frames()[1]);
    }

    #[test]
    fn transitions_blend_into_the_next_slide() {
        let tl = timeline();
        let f = frames();
        assert_eq!(tl.frame_at(1.25).unwrap(), crossfade(&f[0], &f[1], 0.5));
    }

    #[test]
    fn last_slide_fades_to_black() {
        let tl = timeline();
        let black = Frame::blank(4, 4, 3);
        assert_eq!(tl.frame_at(2.75).unwrap(), crossfade(&frames()[1], &black, 0.5));
        assert_eq!(tl.frame_at(3.0).unwrap(), black);
        assert_eq!(tl.frame_at(10.0).unwrap(), black);
    }

    #[test]
    fn range_renders_in_order() {
        let tl = timeline();
        let rendered = tl.render_range(8..12).unwrap();
        assert_eq!(rendered.len(), 4);
        assert_eq!(rendered[0], frames()[0]);
        assert_eq!(rendered[3], tl.frame_at(1.1).unwrap());
    }

    #[test]
    fn extra_slides_reuse_images() {
        let tl = Timeline::new(SlidePlan::fixed(3, 1.0, 0.0, 0.0), frames(), 10, 0).unwrap();
        assert_eq!(tl.frame_at(2.5).unwrap(), frames()[0]);
    }

    #[test]
    fn rejects_mixed_image_sizes() {
        let mixed = vec![Frame::blank(4, 4, 3), Frame::blank(5, 4, 3)];
        assert!(Timeline::new(SlidePlan::fixed(2, 1.0, 0.5, 0.5), mixed, 10, 0).is_err());
        assert!(Timeline::new(SlidePlan::fixed(2, 1.0, 0.5, 0.5), Vec::new(), 10, 0).is_err());
    }
}
