//! End-to-end behaviour of the verification workflow.

mod common;

use common::*;
use std::sync::atomic::Ordering;
use tally_core::{ArtifactIdentity, ReviewState, Trigger};
use tally_error::WorkflowErrorKind;
use tally_session::{codec, decode};
use tally_workflow::{IgnoreReason, NOTHING_PENDING, TransitionOutcome, TriggerOutcome};

async fn start(h: &Harness, context_id: &str) -> ArtifactIdentity {
    match h
        .workflow()
        .start_review(MODERATOR, GUILD, CHANNEL, context_id)
        .await
        .unwrap()
    {
        TransitionOutcome::Published { artifact, .. } => artifact,
        other => panic!("expected a published submission, got {other:?}"),
    }
}

#[tokio::test]
async fn approve_verifies_then_stray_trigger_is_a_no_op() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 1200));

    let artifact = start(&h, "E1").await;
    assert!(h.workflow().index().resolve(&artifact).await.is_some());
    assert_eq!(
        h.surface.button_ids(&artifact),
        vec!["score-verify-btn", "score-reject-btn"]
    );

    let outcome = h
        .dispatcher
        .handle_trigger(h.react(&artifact, "✔️"))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TriggerOutcome::Transitioned(TransitionOutcome::Applied {
            trigger: Trigger::Approve,
            from: ReviewState::UnderReview,
            to: ReviewState::Verified,
            artifact: artifact.clone(),
            cache_degraded: false,
        })
    );

    assert!(h.store.get("S1").unwrap().verified);
    assert!(h.workflow().index().resolve(&artifact).await.is_none());

    let rendering = h.surface.rendering(&artifact).unwrap();
    let (_, fields) = decode(&artifact, &rendering).unwrap();
    assert!(fields.verified());
    assert_eq!(fields.verified_by.as_deref(), Some("Moderator One"));
    assert_eq!(h.surface.button_ids(&artifact), vec!["score-next-btn"]);

    let stray = h
        .dispatcher
        .handle_trigger(h.click(&artifact, "score-reject-btn"))
        .await
        .unwrap();
    assert_eq!(
        stray,
        TriggerOutcome::Transitioned(TransitionOutcome::AlreadyTerminal {
            subject_id: "S1".into(),
            state: ReviewState::Verified,
        })
    );
    assert_eq!(h.store.mark_verified_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn approving_twice_marks_verified_once() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    let artifact = start(&h, "E1").await;
    let stale_click = h.click(&artifact, "score-verify-btn");

    h.dispatcher.handle_trigger(stale_click.clone()).await.unwrap();
    let second = h.dispatcher.handle_trigger(stale_click).await.unwrap();

    assert!(matches!(
        second,
        TriggerOutcome::Transitioned(TransitionOutcome::AlreadyTerminal { .. })
    ));
    assert_eq!(h.store.mark_verified_calls.load(Ordering::SeqCst), 1);
    assert!(h.surface.notified().is_empty());
}

#[tokio::test]
async fn reject_after_cache_loss_recovers_from_artifact() {
    let h = Harness::new();
    h.store.add(subject("S2", "E1", "user-2", 900));
    let artifact = start(&h, "E1").await;

    h.cache.clear();
    assert!(h.workflow().index().resolve(&artifact).await.is_none());

    let outcome = h
        .dispatcher
        .handle_trigger(h.react(&artifact, "❌"))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        TriggerOutcome::Transitioned(TransitionOutcome::Applied {
            to: ReviewState::Rejected,
            ..
        })
    ));
    assert_eq!(h.surface.fetch_calls.load(Ordering::SeqCst), 1);

    let rendering = h.surface.rendering(&artifact).unwrap();
    assert!(rendering.field("Instruction").is_some());
    assert!(
        rendering
            .field("Template")
            .unwrap()
            .contains("submission-id: S2")
    );
    assert_eq!(
        h.surface.button_ids(&artifact),
        vec!["score-next-btn", "score-remove-btn"]
    );

    // Rejected sessions stay resolvable.
    let resolved = h.workflow().index().resolve(&artifact).await.unwrap();
    assert_eq!(resolved.fields().state, ReviewState::Rejected);
    assert!(!h.store.get("S2").unwrap().verified);
}

#[tokio::test]
async fn actor_without_role_is_told_which_role_is_needed() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    let artifact = start(&h, "E1").await;

    h.store.require_role("verification", GUILD, MODERATOR_ROLE);
    h.directory.name_role(MODERATOR_ROLE, "Moderator");
    h.cache.clear();

    let event = h.click(&artifact, "score-verify-btn");
    let outcome = h.dispatcher.handle_trigger(event.clone()).await.unwrap();
    assert_eq!(
        outcome,
        TriggerOutcome::Denied {
            permission: "Moderator".into()
        }
    );
    assert_eq!(
        h.surface.notified(),
        vec![
            "Sorry, only users with the role 'Moderator' can perform the submission verification action"
        ]
    );
    assert!(!h.store.get("S1").unwrap().verified);

    // The permission lookup is cached.
    let lookups = h.store.permission_calls.load(Ordering::SeqCst);
    h.dispatcher.handle_trigger(event.clone()).await.unwrap();
    assert_eq!(h.store.permission_calls.load(Ordering::SeqCst), lookups);

    h.directory.grant(MODERATOR, MODERATOR_ROLE);
    let granted = h.dispatcher.handle_trigger(event).await.unwrap();
    assert!(matches!(
        granted,
        TriggerOutcome::Transitioned(TransitionOutcome::Applied { .. })
    ));
}

#[tokio::test]
async fn unnamed_role_is_reported_as_unknown() {
    let h = Harness::new();
    h.store.require_role("verification", GUILD, "role-gone");

    let err = h
        .workflow()
        .start_review(MODERATOR, GUILD, CHANNEL, "E1")
        .await
        .unwrap_err();
    assert_eq!(
        err.workflow_kind(),
        Some(&WorkflowErrorKind::NotAuthorized {
            permission: "Unknown Role".into(),
            action: "submission verification".into(),
        })
    );
}

#[tokio::test]
async fn reject_remove_advance_until_exhausted() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    h.store.add(subject("S2", "E1", "user-2", 20));
    let first = start(&h, "E1").await;

    h.dispatcher
        .handle_trigger(h.click(&first, "score-reject-btn"))
        .await
        .unwrap();
    let removed = h
        .dispatcher
        .handle_trigger(h.click(&first, "score-remove-btn"))
        .await
        .unwrap();
    assert!(matches!(
        removed,
        TriggerOutcome::Transitioned(TransitionOutcome::Applied {
            from: ReviewState::Rejected,
            to: ReviewState::Removed,
            ..
        })
    ));
    assert!(h.store.get("S1").is_none());
    assert!(h.workflow().index().resolve(&first).await.is_none());
    let (_, fields) = decode(&first, &h.surface.rendering(&first).unwrap()).unwrap();
    assert_eq!(fields.state, ReviewState::Removed);

    // Removing again does nothing.
    let again = h
        .dispatcher
        .handle_trigger(h.react(&first, "👎"))
        .await
        .unwrap();
    assert!(matches!(
        again,
        TriggerOutcome::Transitioned(TransitionOutcome::AlreadyTerminal { .. })
    ));
    assert_eq!(h.store.delete_calls.load(Ordering::SeqCst), 1);

    let next = h
        .dispatcher
        .handle_trigger(h.click(&first, "score-next-btn"))
        .await
        .unwrap();
    let second = match next {
        TriggerOutcome::Transitioned(TransitionOutcome::Published {
            artifact,
            subject_id,
            ..
        }) => {
            assert_eq!(subject_id, "S2");
            artifact
        }
        other => panic!("expected the next submission, got {other:?}"),
    };
    assert_ne!(second, first);
    let (handle, fields) = decode(&second, &h.surface.rendering(&second).unwrap()).unwrap();
    assert_eq!(handle.subject_id(), "S2");
    assert_eq!(fields.display_name, "bo");

    h.dispatcher
        .handle_trigger(h.click(&second, "score-verify-btn"))
        .await
        .unwrap();
    let last = h
        .dispatcher
        .handle_trigger(h.click(&second, "score-next-btn"))
        .await
        .unwrap();
    let notice = match last {
        TriggerOutcome::Transitioned(TransitionOutcome::Exhausted {
            context_id,
            artifact,
        }) => {
            assert_eq!(context_id, "E1");
            artifact
        }
        other => panic!("expected nothing pending, got {other:?}"),
    };
    let rendering = h.surface.rendering(&notice).unwrap();
    assert_eq!(rendering.description, NOTHING_PENDING);
    assert!(h.surface.button_ids(&notice).is_empty());

    // The notice is not a review session.
    let ignored = h
        .dispatcher
        .handle_trigger(h.click(&notice, "score-verify-btn"))
        .await
        .unwrap();
    assert_eq!(
        ignored,
        TriggerOutcome::Ignored(IgnoreReason::NotReviewable)
    );
}

#[tokio::test]
async fn rescored_rejection_can_be_approved() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    let artifact = start(&h, "E1").await;

    h.dispatcher
        .handle_trigger(h.click(&artifact, "score-reject-btn"))
        .await
        .unwrap();
    h.store.rescore("S1", 15);

    let outcome = h
        .dispatcher
        .handle_trigger(h.click(&artifact, "score-verify-btn"))
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        TriggerOutcome::Transitioned(TransitionOutcome::Applied {
            from: ReviewState::UnderReview,
            to: ReviewState::Verified,
            ..
        })
    ));
    let (_, fields) = decode(&artifact, &h.surface.rendering(&artifact).unwrap()).unwrap();
    assert_eq!(fields.score, 15);
}

#[tokio::test]
async fn skipping_an_undecided_submission_is_refused() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    let artifact = start(&h, "E1").await;

    let err = h
        .dispatcher
        .handle_trigger(h.react(&artifact, "👍"))
        .await
        .unwrap_err();
    assert!(matches!(
        err.workflow_kind(),
        Some(WorkflowErrorKind::InvalidTransition { .. })
    ));
    assert_eq!(
        h.surface.notified(),
        vec!["You can't advance a submission that is under review"]
    );
}

#[tokio::test]
async fn irrelevant_triggers_are_ignored() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    let artifact = start(&h, "E1").await;

    let unknown = h
        .dispatcher
        .handle_trigger(h.react(&artifact, "🍕"))
        .await
        .unwrap();
    assert_eq!(unknown, TriggerOutcome::Ignored(IgnoreReason::UnknownTrigger));

    let mut own = h.react(&artifact, "✔️");
    own.actor_id = BOT.into();
    let own = h.dispatcher.handle_trigger(own).await.unwrap();
    assert_eq!(own, TriggerOutcome::Ignored(IgnoreReason::OwnAction));

    let gone = ArtifactIdentity::new(GUILD, CHANNEL, "deleted");
    let gone = h
        .dispatcher
        .handle_trigger(h.react(&gone, "✔️"))
        .await
        .unwrap();
    assert_eq!(gone, TriggerOutcome::Ignored(IgnoreReason::ArtifactGone));

    assert!(!h.store.get("S1").unwrap().verified);
}

#[tokio::test]
async fn store_outage_is_reported_and_nothing_changes() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    let artifact = start(&h, "E1").await;
    let before = h.surface.rendering(&artifact).unwrap();

    h.store.unavailable.store(true, Ordering::SeqCst);
    let err = h
        .dispatcher
        .handle_trigger(h.click(&artifact, "score-verify-btn"))
        .await
        .unwrap_err();
    assert!(err.workflow_kind().is_none());
    assert_eq!(
        h.surface.notified(),
        vec!["Something went wrong, please try again later or contact bot maintainer for help!"]
    );
    assert_eq!(h.surface.rendering(&artifact).unwrap(), before);
    assert!(h.workflow().index().resolve(&artifact).await.is_some());
}

#[tokio::test]
async fn malformed_carried_rendering_asks_for_retry() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    let artifact = start(&h, "E1").await;
    h.cache.clear();

    let mut rendering = h.surface.rendering(&artifact).unwrap();
    rendering.fields.retain(|f| f.name != codec::FIELD_SUBMISSION_ID);
    let event = h.react(&artifact, "✔️").with_rendering(rendering);

    assert!(h.dispatcher.handle_trigger(event).await.is_err());
    assert_eq!(
        h.surface.notified(),
        vec!["Could not parse the state of this submission, please retry."]
    );
}

#[tokio::test]
async fn advancing_past_a_rejection_reaches_the_next_submission() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    h.store.add(subject("S2", "E1", "user-2", 20));
    let first = start(&h, "E1").await;

    h.dispatcher
        .handle_trigger(h.click(&first, "score-reject-btn"))
        .await
        .unwrap();
    assert!(h.store.is_rejected("S1"));

    let next = h
        .dispatcher
        .handle_trigger(h.click(&first, "score-next-btn"))
        .await
        .unwrap();
    let second = match next {
        TriggerOutcome::Transitioned(TransitionOutcome::Published {
            artifact,
            subject_id,
            ..
        }) => {
            assert_eq!(subject_id, "S2");
            artifact
        }
        other => panic!("expected the next submission, got {other:?}"),
    };

    h.dispatcher
        .handle_trigger(h.click(&second, "score-reject-btn"))
        .await
        .unwrap();
    let exhausted = h
        .dispatcher
        .handle_trigger(h.click(&second, "score-next-btn"))
        .await
        .unwrap();
    assert!(matches!(
        exhausted,
        TriggerOutcome::Transitioned(TransitionOutcome::Exhausted { .. })
    ));

    // A corrected score puts the submission back in the queue.
    h.store.rescore("S1", 12);
    let again = h
        .workflow()
        .start_review(MODERATOR, GUILD, CHANNEL, "E1")
        .await
        .unwrap();
    assert!(matches!(
        again,
        TransitionOutcome::Published { ref subject_id, .. } if subject_id == "S1"
    ));
}

#[tokio::test]
async fn lost_re_render_after_approve_is_repaired_on_retry() {
    let h = Harness::new();
    h.store.add(subject("S1", "E1", "user-1", 10));
    let artifact = start(&h, "E1").await;

    h.surface.fail_next_update.store(true, Ordering::SeqCst);
    let failed = h
        .dispatcher
        .handle_trigger(h.click(&artifact, "score-verify-btn"))
        .await;
    assert!(failed.is_err());
    assert!(h.store.get("S1").unwrap().verified);
    assert!(h.workflow().index().resolve(&artifact).await.is_none());
    let (_, stale) = decode(&artifact, &h.surface.rendering(&artifact).unwrap()).unwrap();
    assert_eq!(stale.state, ReviewState::UnderReview);

    let retry = h
        .dispatcher
        .handle_trigger(h.click(&artifact, "score-verify-btn"))
        .await
        .unwrap();
    assert_eq!(
        retry,
        TriggerOutcome::Transitioned(TransitionOutcome::AlreadyTerminal {
            subject_id: "S1".into(),
            state: ReviewState::Verified,
        })
    );
    assert_eq!(h.store.mark_verified_calls.load(Ordering::SeqCst), 1);
    assert!(h.workflow().index().resolve(&artifact).await.is_none());

    let (_, fields) = decode(&artifact, &h.surface.rendering(&artifact).unwrap()).unwrap();
    assert_eq!(fields.state, ReviewState::Verified);
    assert!(fields.verified_by.is_some());
    assert_eq!(h.surface.button_ids(&artifact), vec!["score-next-btn"]);
}
