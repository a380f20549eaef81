//! Lottery selection
//!
//! Uniform sampling without replacement over a waitlist snapshot. With a
//! seeded generator the draw is reproducible.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::config::LotteryConfig;
use crate::models::{EntrantStatus, ParticipantStatus};

/// Outcome of one draw; the input pool is left untouched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawResult {
    pub selected: Vec<EntrantStatus>,
    /// Eligible rows not selected, in pool order
    pub unselected: Vec<EntrantStatus>,
    /// How many winners were requested but could not be drawn
    pub shortfall: usize,
}

/// Draw up to `count` winners from the WAITLISTED rows of `pool`.
///
/// Rows in any other status are ignored. Candidates are put in pool order
/// before shuffling, so the result depends only on the set of rows and the
/// generator state.
pub fn draw_winners<R: Rng + ?Sized>(pool: &[EntrantStatus], count: usize, rng: &mut R) -> DrawResult {
    let mut candidates: Vec<EntrantStatus> = pool
        .iter()
        .filter(|row| row.status == ParticipantStatus::Waitlisted)
        .cloned()
        .collect();
    candidates.sort_by(EntrantStatus::pool_order);

    let take = count.min(candidates.len());
    let shortfall = count - take;

    let (chosen, _) = candidates.partial_shuffle(rng, take);
    let selected = chosen.to_vec();

    let mut unselected: Vec<EntrantStatus> = candidates
        .into_iter()
        .filter(|row| !selected.iter().any(|s| s.entrant_id == row.entrant_id))
        .collect();
    unselected.sort_by(EntrantStatus::pool_order);

    DrawResult { selected, unselected, shortfall }
}

/// Shared random source for draws
pub struct LotterySelector {
    rng: Mutex<StdRng>,
}

impl LotterySelector {
    pub fn seeded(seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: Mutex::new(StdRng::from_entropy()) }
    }

    pub fn from_config(config: &LotteryConfig) -> Self {
        match config.seed {
            Some(seed) => {
                debug!(seed = seed, "Using fixed lottery seed");
                Self::seeded(seed)
            }
            None => Self::from_entropy(),
        }
    }

    pub fn draw(&self, pool: &[EntrantStatus], count: usize) -> DrawResult {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        draw_winners(pool, count, &mut *rng)
    }

    /// One uniformly chosen waitlisted row
    pub fn pick_one(&self, pool: &[EntrantStatus]) -> Option<EntrantStatus> {
        self.draw(pool, 1).selected.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Timestamp;
    use std::collections::HashSet;

    fn pool(n: usize) -> Vec<EntrantStatus> {
        (0..n)
            .map(|i| EntrantStatus::waitlisted("evt", &format!("dev-{:02}", i), Timestamp(i as i64)))
            .collect()
    }

    #[test]
    fn test_draw_respects_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = draw_winners(&pool(5), 3, &mut rng);
        assert_eq!(result.selected.len(), 3);
        assert_eq!(result.unselected.len(), 2);
        assert_eq!(result.shortfall, 0);

        let ids: HashSet<_> = result.selected.iter().map(|r| r.entrant_id.clone()).collect();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_draw_reports_shortfall() {
        let mut rng = StdRng::seed_from_u64(7);
        let result = draw_winners(&pool(2), 5, &mut rng);
        assert_eq!(result.selected.len(), 2);
        assert!(result.unselected.is_empty());
        assert_eq!(result.shortfall, 3);
    }

    #[test]
    fn test_draw_ignores_non_waitlisted_rows() {
        let mut rows = pool(3);
        rows[0].status = ParticipantStatus::Invited;
        rows[1].status = ParticipantStatus::Enrolled;
        let mut rng = StdRng::seed_from_u64(1);
        let result = draw_winners(&rows, 3, &mut rng);
        assert_eq!(result.selected.len(), 1);
        assert_eq!(result.selected[0].entrant_id, "dev-02");
        assert_eq!(result.shortfall, 2);
    }

    #[test]
    fn test_same_seed_same_draw_regardless_of_input_order() {
        let forward = pool(10);
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = LotterySelector::seeded(42).draw(&forward, 4);
        let b = LotterySelector::seeded(42).draw(&reversed, 4);
        assert_eq!(a.selected, b.selected);
    }

    #[test]
    fn test_zero_count_selects_nothing() {
        let result = LotterySelector::seeded(3).draw(&pool(4), 0);
        assert!(result.selected.is_empty());
        assert_eq!(result.unselected.len(), 4);
    }

    #[test]
    fn test_pick_one_on_empty_pool() {
        assert!(LotterySelector::seeded(3).pick_one(&[]).is_none());
    }
}
