pub mod allocate;
pub mod novelty;
pub mod plan;
pub mod select;

use crate::audio::features::AudioFeatures;
use allocate::AllocatorConfig;
use novelty::NoveltyConfig;
use plan::SlidePlan;

/// Full audio-to-plan chain: candidates, boundaries, near-uniform selection
/// of `num_slides + 1` points, allocation.
pub fn plan_slides(
    features: &AudioFeatures,
    num_slides: usize,
    transition: f64,
    fade: f64,
    novelty: &NoveltyConfig,
    allocator: &AllocatorConfig,
) -> SlidePlan {
    let total = features.duration;
    let points = novelty::with_boundaries(novelty::candidates(features, novelty), total);
    let selected = select::select_points(&points, num_slides + 1, total);

    // a start inside the closing fade leaves no room for its slide
    let starts: Vec<f64> = selected.into_iter().filter(|&t| t < total - fade).collect();
    log::info!(
        "Selected {} slide starts from {} candidates",
        starts.len(),
        points.len()
    );

    let plan = allocate::allocate(&starts, num_slides, transition, fade, total, allocator);
    for slide in &plan.slides {
        log::debug!(
            "Slide {}: hold {:.3}s, transition {:.3}s",
            slide.index,
            slide.duration,
            slide.transition
        );
    }
    plan
}
