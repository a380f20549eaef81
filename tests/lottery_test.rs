//! Lottery draw properties and scenarios

mod helpers;

use std::collections::{HashMap, HashSet};

use assert_matches::assert_matches;
use helpers::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use EventLottery::models::{EntrantStatus, ParticipantStatus, Timestamp};
use EventLottery::services::draw_winners;
use EventLottery::LotteryError;

fn pool_of(count: usize) -> Vec<EntrantStatus> {
    entrant_ids(count)
        .iter()
        .enumerate()
        .map(|(i, id)| EntrantStatus::waitlisted("evt", id, Timestamp(i as i64 + 1)))
        .collect()
}

#[tokio::test]
async fn test_capacity_two_of_three() {
    let ctx = TestContext::new();
    let event = ctx.create_event(Some(2)).await;
    ctx.join_all(&event.id, &["A", "B", "C"]).await;

    let report = ctx.services.draws.run_draw(&event.id, 2).await.unwrap();

    assert_eq!(report.invited.len(), 2);
    assert_eq!(report.shortfall, 0);
    assert!(report.skipped.is_empty());
    assert_eq!(ctx.count_in(&event.id, ParticipantStatus::Invited).await, 2);
    assert_eq!(ctx.count_in(&event.id, ParticipantStatus::Waitlisted).await, 1);
    assert_eq!(report.notifications.notified, 2);
}

#[tokio::test]
async fn test_draw_capped_by_open_slots() {
    let ctx = TestContext::new();
    let event = ctx.create_event(Some(3)).await;
    ctx.join_all(&event.id, &entrant_ids(6)).await;

    let first = ctx.services.draws.run_draw(&event.id, 2).await.unwrap();
    assert_eq!(first.invited.len(), 2);

    // two invitations pending, one slot left
    let second = ctx.services.draws.run_draw(&event.id, 5).await.unwrap();
    assert_eq!(second.invited.len(), 1);
    assert_eq!(second.shortfall, 4);

    let third = ctx.services.draws.run_draw(&event.id, 1).await.unwrap();
    assert!(third.invited.is_empty());
    assert_eq!(third.shortfall, 1);
    assert_eq!(ctx.count_in(&event.id, ParticipantStatus::Invited).await, 3);
}

#[tokio::test]
async fn test_draw_larger_than_pool() {
    let ctx = TestContext::new();
    let event = ctx.create_event(None).await;
    ctx.join_all(&event.id, &entrant_ids(2)).await;

    let report = ctx.services.draws.run_draw(&event.id, 5).await.unwrap();
    assert_eq!(report.invited.len(), 2);
    assert_eq!(report.shortfall, 3);
}

#[tokio::test]
async fn test_draw_preconditions() {
    let ctx = TestContext::new();
    let event = ctx.create_event(None).await;

    assert_matches!(ctx.services.draws.run_draw(&event.id, 0).await, Err(LotteryError::InvalidInput(_)));
    assert_matches!(ctx.services.draws.run_draw("missing", 1).await, Err(LotteryError::EventNotFound { .. }));
    assert_matches!(ctx.services.draws.run_draw(&event.id, 1).await, Err(LotteryError::EmptyPool { .. }));
}

#[tokio::test]
async fn test_winners_not_notified_twice() {
    let ctx = TestContext::new();
    let event = ctx.create_event(None).await;
    ctx.join_all(&event.id, &entrant_ids(4)).await;

    let first = ctx.services.draws.run_draw(&event.id, 2).await.unwrap();
    let second = ctx.services.draws.run_draw(&event.id, 2).await.unwrap();

    let all: HashSet<_> = first.invited.iter().chain(second.invited.iter()).collect();
    assert_eq!(all.len(), 4);
    for id in entrant_ids(4) {
        assert_eq!(ctx.messenger.sent_to(&id).await, 1);
    }
}

#[test]
fn test_uniform_selection_one_of_ten() {
    let pool = pool_of(10);
    let mut rng = StdRng::seed_from_u64(2024);
    let mut wins: HashMap<String, usize> = HashMap::new();

    let draws = 10_000;
    for _ in 0..draws {
        let result = draw_winners(&pool, 1, &mut rng);
        *wins.entry(result.selected[0].entrant_id.clone()).or_default() += 1;
    }

    let expected = draws as f64 / 10.0;
    assert_eq!(wins.len(), 10);
    for (id, count) in wins {
        let deviation = (count as f64 - expected).abs() / expected;
        assert!(deviation < 0.10, "{} won {} times, expected about {}", id, count, expected);
    }
}

proptest! {
    #[test]
    fn prop_draw_selects_min_of_count_and_pool(size in 0usize..40, count in 0usize..50, seed in any::<u64>()) {
        let pool = pool_of(size);
        let mut rng = StdRng::seed_from_u64(seed);
        let result = draw_winners(&pool, count, &mut rng);

        prop_assert_eq!(result.selected.len(), count.min(size));
        prop_assert_eq!(result.shortfall, count.saturating_sub(size));
        prop_assert_eq!(result.selected.len() + result.unselected.len(), size);

        let selected: HashSet<_> = result.selected.iter().map(|r| r.entrant_id.clone()).collect();
        prop_assert_eq!(selected.len(), result.selected.len());
        prop_assert!(result.unselected.iter().all(|r| !selected.contains(&r.entrant_id)));
    }

    #[test]
    fn prop_draw_ignores_input_order(size in 1usize..30, count in 1usize..30, seed in any::<u64>()) {
        let pool = pool_of(size);
        let mut reversed = pool.clone();
        reversed.reverse();

        let a = draw_winners(&pool, count, &mut StdRng::seed_from_u64(seed));
        let b = draw_winners(&reversed, count, &mut StdRng::seed_from_u64(seed));
        prop_assert_eq!(a, b);
    }
}
