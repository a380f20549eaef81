//! End-to-end entrant lifecycle through the public services

mod helpers;

use assert_matches::assert_matches;
use helpers::*;
use EventLottery::database::NotificationLog;
use EventLottery::models::{InvitationResponse, NotificationCategory, ParticipantStatus, Timestamp};
use EventLottery::services::TransitionOutcome;
use EventLottery::LotteryError;

#[tokio::test]
async fn test_waitlisted_to_cancelled_path() {
    let ctx = TestContext::new();
    let event = ctx.create_event(None).await;
    ctx.join_all(&event.id, &["device-a"]).await;

    let report = ctx.services.draws.run_draw(&event.id, 1).await.unwrap();
    assert_eq!(report.invited, vec!["device-a".to_string()]);
    assert_eq!(ctx.status_of(&event.id, "device-a").await, Some(ParticipantStatus::Invited));

    let inbox = ctx.services.notifications.inbox("device-a").await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].category, NotificationCategory::Winner);
    assert_eq!(inbox[0].message, "Congratulations! You won. Proceed to signup.");

    ctx.clock.advance(100);
    let accepted = ctx
        .services
        .invitations
        .accept(&event.id, "device-a", Some(&inbox[0].id))
        .await
        .unwrap();
    assert!(accepted.is_applied());
    assert_eq!(accepted.row().status, ParticipantStatus::Enrolled);

    let entry = ctx.store.get(&inbox[0].id).await.unwrap().unwrap();
    assert!(entry.read);
    assert_eq!(entry.response, Some(InvitationResponse::Accepted));
    assert_eq!(entry.responded_at, Some(ctx.clock.now()));

    let cancelled = ctx.services.invitations.cancel_enrollment(&event.id, "device-a").await.unwrap();
    assert_eq!(cancelled.row().status, ParticipantStatus::Cancelled);
}

#[tokio::test]
async fn test_cancelled_cannot_return_to_waitlist() {
    let ctx = TestContext::new();
    let event = ctx.create_event(None).await;
    ctx.join_all(&event.id, &["device-a"]).await;
    ctx.services.draws.run_draw(&event.id, 1).await.unwrap();
    ctx.services.lifecycle.accept(&event.id, "device-a").await.unwrap();
    ctx.services.lifecycle.cancel(&event.id, "device-a").await.unwrap();

    assert_matches!(
        ctx.services.lifecycle.transition_to(&event.id, "device-a", ParticipantStatus::Waitlisted).await,
        Err(LotteryError::IllegalTransition { from: ParticipantStatus::Cancelled, to: ParticipantStatus::Waitlisted, .. })
    );
    assert_matches!(
        ctx.services.waitlist.join(&event.id, "device-a", ctx.clock.now()).await,
        Err(LotteryError::AlreadyJoined { status: ParticipantStatus::Cancelled, .. })
    );
    assert_eq!(ctx.status_of(&event.id, "device-a").await, Some(ParticipantStatus::Cancelled));
}

#[tokio::test]
async fn test_join_twice_leaves_one_row() {
    let ctx = TestContext::new();
    let event = ctx.create_event(None).await;
    ctx.join_all(&event.id, &["device-a", "device-a"]).await;

    assert_eq!(ctx.store.entrant_count(&event.id).await, 1);
    assert_eq!(ctx.services.waitlist.count(&event.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_decline_does_not_auto_replace() {
    let ctx = TestContext::new();
    let event = ctx.create_event(Some(1)).await;
    ctx.join_all(&event.id, &entrant_ids(3)).await;

    let report = ctx.services.draws.run_draw(&event.id, 1).await.unwrap();
    let winner = &report.invited[0];

    let declined = ctx.services.invitations.decline(&event.id, winner, None).await.unwrap();
    assert_eq!(declined.row().status, ParticipantStatus::Declined);
    assert_eq!(ctx.count_in(&event.id, ParticipantStatus::Invited).await, 0);
    assert_eq!(ctx.count_in(&event.id, ParticipantStatus::Waitlisted).await, 2);

    let again = ctx.services.invitations.decline(&event.id, winner, None).await.unwrap();
    assert_matches!(again, TransitionOutcome::Unchanged(_));
}

#[tokio::test]
async fn test_response_rejects_foreign_notification() {
    let ctx = TestContext::new();
    let event = ctx.create_event(None).await;
    ctx.join_all(&event.id, &["device-a", "device-b"]).await;
    ctx.services.draws.run_draw(&event.id, 2).await.unwrap();

    let inbox_a = ctx.services.notifications.inbox("device-a").await.unwrap();
    assert_matches!(
        ctx.services.invitations.accept(&event.id, "device-b", Some(&inbox_a[0].id)).await,
        Err(LotteryError::PermissionDenied(_))
    );
    assert_matches!(
        ctx.services.invitations.accept(&event.id, "device-b", Some("missing")).await,
        Err(LotteryError::NotificationNotFound { .. })
    );
    assert_eq!(ctx.status_of(&event.id, "device-b").await, Some(ParticipantStatus::Invited));
}

#[tokio::test]
async fn test_registration_window_enforced() {
    let ctx = TestContext::new();
    let event = ctx.create_event(None).await;

    let before = Timestamp(REGISTRATION_OPEN - 1);
    let after = Timestamp(REGISTRATION_CLOSE + 1);
    assert_matches!(
        ctx.services.waitlist.join(&event.id, "device-a", before).await,
        Err(LotteryError::RegistrationClosed { .. })
    );
    assert_matches!(
        ctx.services.waitlist.join(&event.id, "device-a", after).await,
        Err(LotteryError::RegistrationClosed { .. })
    );
    assert!(ctx.services.waitlist.join(&event.id, "device-a", Timestamp(REGISTRATION_CLOSE)).await.is_ok());
}

#[tokio::test]
async fn test_history_lists_every_event() {
    let ctx = TestContext::new();
    let first = ctx.create_event(None).await;
    let second = ctx.create_event(None).await;
    ctx.join_all(&first.id, &["device-a"]).await;
    ctx.join_all(&second.id, &["device-a"]).await;

    let history = ctx.services.waitlist.history("device-a").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].event_id, second.id);
}

#[tokio::test]
async fn test_accept_survives_response_log_failure() {
    let ctx = TestContext::new();
    let event = ctx.create_event(None).await;
    ctx.join_all(&event.id, &["device-a"]).await;
    ctx.services.draws.run_draw(&event.id, 1).await.unwrap();
    let inbox = ctx.services.notifications.inbox("device-a").await.unwrap();

    ctx.store.set_fail_on_response(true).await;
    let accepted = ctx
        .services
        .invitations
        .accept(&event.id, "device-a", Some(&inbox[0].id))
        .await
        .unwrap();

    assert!(accepted.is_applied());
    assert_eq!(ctx.status_of(&event.id, "device-a").await, Some(ParticipantStatus::Enrolled));
    let entry = ctx.store.get(&inbox[0].id).await.unwrap().unwrap();
    assert_eq!(entry.response, None);
}
