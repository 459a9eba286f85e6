//! Store integration tests.
//!
//! Drives the repositories through racing tasks to check the guarantees the
//! approval workflow leans on: one pending request per student, one winner
//! per contested write, and all-or-nothing review commits.

use std::sync::Arc;

use tokio::sync::Barrier;
use tokio_test::assert_ok;

use uems_models::{
    Profile, ProfilePatch, ReviewRecord, ReviewerId, StudentId, TeacherId, UpdateRequest,
};
use uems_store::{
    MemoryProfileStore, MemoryRequestStore, MemoryStore, ProfileStore, RequestStore,
};

fn draft(student: u64, major: &str) -> UpdateRequest {
    let fields = ProfilePatch {
        major: Some(major.to_string()),
        ..Default::default()
    };
    UpdateRequest::new(StudentId(student), fields, Some(TeacherId(7)))
}

/// Many tasks submit for the same student at once; exactly one request may
/// land.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_elect_one_winner() {
    const TASKS: usize = 16;

    let repo = Arc::new(MemoryRequestStore::new(MemoryStore::new()));
    let barrier = Arc::new(Barrier::new(TASKS));

    let mut handles = Vec::with_capacity(TASKS);
    for i in 0..TASKS {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            let request = draft(42, &format!("Major {i}"));
            let id = request.id.clone();
            barrier.wait().await;
            (id, repo.create_pending(&request).await)
        }));
    }

    let mut winners = Vec::new();
    let mut rejected_submissions = 0;
    for handle in handles {
        let (id, outcome) = handle.await.expect("submission task panicked");
        match outcome {
            Ok(()) => winners.push(id),
            Err(e) => {
                assert!(e.is_already_exists(), "unexpected error: {e}");
                rejected_submissions += 1;
            }
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(rejected_submissions, TASKS - 1);

    let pending = repo
        .find_pending_by_student(StudentId(42))
        .await
        .expect("pending lookup failed")
        .expect("the winning request should be pending");
    assert_eq!(pending.data.id, winners[0]);

    let stored = repo
        .list_by_student(StudentId(42))
        .await
        .expect("list failed");
    assert_eq!(stored.len(), 1, "losing submissions must leave no trace");
}

/// Two reviewers race to finalize the same request with the version both
/// observed; one commits, the other's decision is rejected wholesale.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reviews_elect_one_winner() {
    let engine = MemoryStore::new();
    let requests = Arc::new(MemoryRequestStore::new(engine.clone()));
    let profiles = MemoryProfileStore::new(engine.clone());

    let request = draft(42, "Physics");
    requests
        .create_pending(&request)
        .await
        .expect("submission failed");
    let stored = requests
        .get(&request.id)
        .await
        .expect("read failed")
        .expect("request should exist");

    let barrier = Arc::new(Barrier::new(2));

    let approve = {
        let requests = Arc::clone(&requests);
        let barrier = Arc::clone(&barrier);
        let base = stored.data.clone();
        let version = stored.version;
        tokio::spawn(async move {
            let approved = base.approved(ReviewRecord::new(ReviewerId(7), "Approved"));
            let mut profile = Profile::new(approved.student_id);
            approved.fields.apply_to(&mut profile);
            barrier.wait().await;
            requests
                .finalize_review(&approved, Some(&profile), version)
                .await
        })
    };
    let reject = {
        let requests = Arc::clone(&requests);
        let barrier = Arc::clone(&barrier);
        let base = stored.data.clone();
        let version = stored.version;
        tokio::spawn(async move {
            let rejected = base.rejected(ReviewRecord::new(ReviewerId(9), "Incomplete"));
            barrier.wait().await;
            requests.finalize_review(&rejected, None, version).await
        })
    };

    let approve_outcome = approve.await.expect("approve task panicked");
    let reject_outcome = reject.await.expect("reject task panicked");

    assert!(
        approve_outcome.is_ok() ^ reject_outcome.is_ok(),
        "exactly one review may commit"
    );

    let terminal = requests
        .get(&request.id)
        .await
        .expect("read failed")
        .expect("request should exist");
    assert!(!terminal.data.is_pending());

    let profile = profiles
        .get_profile(StudentId(42))
        .await
        .expect("profile read failed");
    if approve_outcome.is_ok() {
        assert_eq!(terminal.data.state.as_str(), "approved");
        let profile = profile.expect("approval must persist the profile");
        assert_eq!(profile.major.as_deref(), Some("Physics"));
    } else {
        assert_eq!(terminal.data.state.as_str(), "rejected");
        assert!(profile.is_none(), "a rejected review must not touch the profile");
    }

    // Either way the pending slot is free again.
    assert!(requests
        .find_pending_by_student(StudentId(42))
        .await
        .expect("pending lookup failed")
        .is_none());
}

/// An amendment and a withdrawal race on the same observed version; the
/// request ends up either amended or gone, never half of each.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_amend_and_withdraw_single_winner() {
    let repo = Arc::new(MemoryRequestStore::new(MemoryStore::new()));

    let request = draft(42, "Physics");
    repo.create_pending(&request).await.expect("submission failed");
    let stored = repo
        .get(&request.id)
        .await
        .expect("read failed")
        .expect("request should exist");

    let barrier = Arc::new(Barrier::new(2));

    let amend = {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        let mut amended = stored.data.clone();
        amended.fields.major = Some("Mathematics".to_string());
        let version = stored.version;
        tokio::spawn(async move {
            barrier.wait().await;
            repo.update(&amended, version).await
        })
    };
    let withdraw = {
        let repo = Arc::clone(&repo);
        let barrier = Arc::clone(&barrier);
        let id = request.id.clone();
        let version = stored.version;
        tokio::spawn(async move {
            barrier.wait().await;
            repo.remove(&id, Some(version)).await
        })
    };

    let amend_outcome = amend.await.expect("amend task panicked");
    let withdraw_outcome = withdraw.await.expect("withdraw task panicked");

    assert!(
        amend_outcome.is_ok() ^ withdraw_outcome.is_ok(),
        "exactly one of amend/withdraw may commit"
    );

    let after = repo.get(&request.id).await.expect("read failed");
    if amend_outcome.is_ok() {
        let after = after.expect("amended request should remain");
        assert_eq!(after.data.fields.major.as_deref(), Some("Mathematics"));
        assert!(after.data.is_pending());
    } else {
        assert!(after.is_none(), "withdrawn request should be gone");
        assert!(repo
            .find_pending_by_student(StudentId(42))
            .await
            .expect("pending lookup failed")
            .is_none());
    }
}

/// Full request lifecycle across both repositories.
#[tokio::test]
async fn test_review_lifecycle_end_to_end() {
    let engine = MemoryStore::new();
    let requests = MemoryRequestStore::new(engine.clone());
    let profiles = MemoryProfileStore::new(engine.clone());

    // Submit
    let request = draft(42, "Physics");
    tokio_test::assert_ok!(requests.create_pending(&request).await);

    // Amend
    let stored = requests
        .get(&request.id)
        .await
        .expect("read failed")
        .expect("request should exist");
    let mut amended = stored.data.clone();
    amended.fields.graduation_year = Some(2025);
    requests
        .update(&amended, stored.version)
        .await
        .expect("amendment failed");

    // Approve
    let stored = requests
        .get(&request.id)
        .await
        .expect("read failed")
        .expect("request should exist");
    let approved = stored
        .data
        .clone()
        .approved(ReviewRecord::new(ReviewerId(7), "Approved"));
    let mut profile = Profile::new(StudentId(42));
    approved.fields.apply_to(&mut profile);
    requests
        .finalize_review(&approved, Some(&profile), stored.version)
        .await
        .expect("approval failed");

    // The amended fields made it into the canonical profile.
    let profile = profiles
        .get_profile(StudentId(42))
        .await
        .expect("profile read failed")
        .expect("profile should exist after approval");
    assert_eq!(profile.major.as_deref(), Some("Physics"));
    assert_eq!(profile.graduation_year, Some(2025));

    // The student may submit again, and withdrawing frees the slot once more.
    let second = draft(42, "Chemistry");
    tokio_test::assert_ok!(requests.create_pending(&second).await);
    let stored = requests
        .get(&second.id)
        .await
        .expect("read failed")
        .expect("request should exist");
    requests
        .remove(&second.id, Some(stored.version))
        .await
        .expect("withdrawal failed");

    let history = requests
        .list_by_student(StudentId(42))
        .await
        .expect("list failed");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, request.id);
}
