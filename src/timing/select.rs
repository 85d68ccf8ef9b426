/// Greedily pick `k` candidates whose consecutive gaps stay close to
/// `duration / k`.
///
/// With `k >= candidates.len()` the candidates are returned unchanged and the
/// allocator decides whether to fall back to uniform spacing. Otherwise the
/// search starts at the first candidate and repeatedly scans forward from the
/// last chosen index for the candidate with the best spacing score. Only
/// candidates that leave enough later points to fill the remaining slots are
/// eligible, so the result always has exactly `k` points. Ties go to the
/// earliest index.
pub fn select_points(candidates: &[f64], k: usize, duration: f64) -> Vec<f64> {
    if k >= candidates.len() {
        return candidates.to_vec();
    }
    if k == 0 {
        return Vec::new();
    }

    let ideal = duration / k as f64;
    let mut chosen_idx = 0usize;
    let mut chosen = Vec::with_capacity(k);
    chosen.push(candidates[0]);

    while chosen.len() < k {
        let remaining_after = k - chosen.len() - 1;
        let last_eligible = candidates.len() - 1 - remaining_after;

        let mut best: Option<(f64, usize)> = None;
        for j in chosen_idx + 1..=last_eligible {
            chosen.push(candidates[j]);
            let score = spacing_score(&chosen, ideal);
            chosen.pop();
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, j));
            }
        }

        // last_eligible >= chosen_idx + 1 always holds while slots remain
        let Some((_, j)) = best else { break };
        chosen.push(candidates[j]);
        chosen_idx = j;
    }

    chosen
}

/// Negative sum of squared deviations of consecutive gaps from `ideal`.
pub fn spacing_score(points: &[f64], ideal: f64) -> f64 {
    -points
        .windows(2)
        .map(|w| (w[1] - w[0] - ideal).powi(2))
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_when_not_enough_candidates() {
        let candidates = [0.0, 3.0, 9.0];
        assert_eq!(select_points(&candidates, 3, 10.0), candidates.to_vec());
        assert_eq!(select_points(&candidates, 6, 10.0), candidates.to_vec());
    }

    #[test]
    fn returns_exactly_k_ascending() {
        let candidates: Vec<f64> = (0..50).map(|i| i as f64 * 0.37).collect();
        for k in 1..20 {
            let picked = select_points(&candidates, k, 18.5);
            assert_eq!(picked.len(), k);
            assert!(picked.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(picked[0], candidates[0]);
        }
    }

    #[test]
    fn prefers_near_ideal_gaps() {
        // ideal gap is 12 / 4 = 3.0
        let candidates = [0.0, 1.0, 2.9, 4.0, 6.1, 7.0, 9.0, 12.0];
        assert_eq!(select_points(&candidates, 4, 12.0), vec![0.0, 2.9, 6.1, 9.0]);
    }

    #[test]
    fn keeps_room_for_remaining_slots() {
        // 3.0 fits the ideal gap best but would leave the last slot empty
        let candidates = [0.0, 0.5, 0.6, 3.0];
        let picked = select_points(&candidates, 3, 6.0);
        assert_eq!(picked, vec![0.0, 0.6, 3.0]);
    }

    #[test]
    fn ties_take_first_index() {
        // 2.0 and 4.0 deviate equally from the ideal gap 3.0
        let candidates = [0.0, 2.0, 4.0];
        assert_eq!(select_points(&candidates, 2, 6.0), vec![0.0, 2.0]);
    }

    #[test]
    fn score_is_zero_for_ideal_spacing() {
        assert_eq!(spacing_score(&[0.0, 2.0, 4.0], 2.0), 0.0);
        assert!((spacing_score(&[0.0, 3.0], 2.0) + 1.0).abs() < 1e-12);
    }
}
