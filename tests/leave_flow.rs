//! End-to-end lifecycle scenarios for the leave service, run against the
//! in-memory store so no database is required. Covers creation gating
//! (overlap + quota), approval accounting, the encrypted soft-delete /
//! restore pair, and pagination.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::NaiveDate;

use leavedesk::error::LeaveError;
use leavedesk::model::LeaveDecision;
use leavedesk::service::{AttachmentUpload, CreateLeaveRequest, LeaveService};
use leavedesk::store::{LeaveStore, MemoryLeaveStore};
use leavedesk::utils::codec::{DELETED_SENTINEL, RedactionCodec};
use leavedesk::utils::files::DiskFileStore;

struct TestEnv {
    store: Arc<MemoryLeaveStore>,
    service: LeaveService,
    dir: tempfile::TempDir,
}

fn env() -> TestEnv {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryLeaveStore::new());
    let service = LeaveService::new(
        store.clone(),
        Arc::new(DiskFileStore::new(dir.path())),
        RedactionCodec::new([7u8; 32]),
    );
    TestEnv {
        store,
        service,
        dir,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn payload(start: NaiveDate, end: NaiveDate) -> CreateLeaveRequest {
    CreateLeaveRequest {
        start_date: start,
        end_date: end,
        reason: "needs at least ten characters".to_string(),
        attachment: None,
    }
}

/// Flips one byte inside the base64 token so AEAD verification must fail.
fn tamper(token: &str) -> String {
    let mut raw = STANDARD.decode(token).unwrap();
    let mid = raw.len() / 2;
    raw[mid] ^= 0x01;
    STANDARD.encode(raw)
}

#[tokio::test]
async fn create_starts_pending_and_active() {
    let env = env();

    let request = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();

    assert_eq!(request.status, "pending");
    assert_eq!(request.user_id, 1);
    assert!(request.deleted_at.is_none());
}

#[tokio::test]
async fn endpoint_sharing_range_conflicts_with_approved_request() {
    let env = env();

    let first = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();
    env.service
        .update_status(first.id, LeaveDecision::Approved)
        .await
        .unwrap();

    // Shares 2026-03-03 with the approved range.
    let result = env
        .service
        .create_request(1, payload(date(2026, 3, 3), date(2026, 3, 5)))
        .await;

    assert!(matches!(result, Err(LeaveError::Overlap)));
}

#[tokio::test]
async fn pending_and_rejected_requests_do_not_block() {
    let env = env();

    // Pending request over the same range does not conflict.
    env.service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();
    env.service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();

    // Nor does a rejected one.
    let rejected = env
        .service
        .create_request(1, payload(date(2026, 6, 1), date(2026, 6, 2)))
        .await
        .unwrap();
    env.service
        .update_status(rejected.id, LeaveDecision::Rejected)
        .await
        .unwrap();

    let result = env
        .service
        .create_request(1, payload(date(2026, 6, 1), date(2026, 6, 2)))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn overlap_ignores_other_users() {
    let env = env();

    let first = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();
    env.service
        .update_status(first.id, LeaveDecision::Approved)
        .await
        .unwrap();

    let result = env
        .service
        .create_request(2, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await;
    assert!(result.is_ok());
}

/// The overlap test only checks whether a candidate endpoint falls inside
/// an approved range. A candidate strictly containing an approved range is
/// accepted; that is the long-standing behaviour.
#[tokio::test]
async fn range_containing_an_approved_range_is_not_flagged() {
    let env = env();

    let inner = env
        .service
        .create_request(1, payload(date(2026, 3, 10), date(2026, 3, 12)))
        .await
        .unwrap();
    env.service
        .update_status(inner.id, LeaveDecision::Approved)
        .await
        .unwrap();

    let result = env
        .service
        .create_request(1, payload(date(2026, 3, 9), date(2026, 3, 13)))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn thirteen_days_without_quota_row_is_refused() {
    let env = env();

    let result = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 13)))
        .await;

    assert!(matches!(result, Err(LeaveError::InsufficientQuota)));
}

#[tokio::test]
async fn twelve_days_without_quota_row_is_accepted_and_creates_no_row() {
    let env = env();

    env.service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 12)))
        .await
        .unwrap();

    // The quota row only appears once something is approved.
    assert!(env.service.ledger().get(1, 2026).await.unwrap().is_none());
}

#[tokio::test]
async fn approval_books_the_inclusive_day_count() {
    let env = env();

    let request = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();
    env.service
        .update_status(request.id, LeaveDecision::Approved)
        .await
        .unwrap();

    let quota = env.service.ledger().get(1, 2026).await.unwrap().unwrap();
    assert_eq!(quota.quota_used, 3);
    assert_eq!(quota.quota_total, 12);
    assert_eq!(quota.remaining(), 9);
}

#[tokio::test]
async fn each_approval_call_books_the_span_again() {
    let env = env();

    let request = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();
    env.service
        .update_status(request.id, LeaveDecision::Approved)
        .await
        .unwrap();
    env.service
        .update_status(request.id, LeaveDecision::Approved)
        .await
        .unwrap();

    // Re-approval is not guarded against and double-books.
    let quota = env.service.ledger().get(1, 2026).await.unwrap().unwrap();
    assert_eq!(quota.quota_used, 6);
}

#[tokio::test]
async fn rejection_after_approval_does_not_refund() {
    let env = env();

    let request = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();
    env.service
        .update_status(request.id, LeaveDecision::Approved)
        .await
        .unwrap();
    let updated = env
        .service
        .update_status(request.id, LeaveDecision::Rejected)
        .await
        .unwrap();

    assert_eq!(updated.status, "rejected");
    let quota = env.service.ledger().get(1, 2026).await.unwrap().unwrap();
    assert_eq!(quota.quota_used, 3);
}

#[tokio::test]
async fn quota_checks_apply_per_calendar_year() {
    let env = env();

    // Exhaust 2026 exactly.
    let request = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 12)))
        .await
        .unwrap();
    env.service
        .update_status(request.id, LeaveDecision::Approved)
        .await
        .unwrap();

    let refused = env
        .service
        .create_request(1, payload(date(2026, 7, 1), date(2026, 7, 1)))
        .await;
    assert!(matches!(refused, Err(LeaveError::InsufficientQuota)));

    // A new year starts from a clean ledger.
    let next_year = env
        .service
        .create_request(1, payload(date(2027, 1, 5), date(2027, 1, 7)))
        .await;
    assert!(next_year.is_ok());
}

#[tokio::test]
async fn update_status_on_unknown_id_is_not_found() {
    let env = env();

    let result = env.service.update_status(999, LeaveDecision::Approved).await;
    assert!(matches!(result, Err(LeaveError::NotFound)));
}

/// The status lookup is not scoped to active rows, so a soft-deleted
/// request can still be transitioned. Preserved as observed.
#[tokio::test]
async fn update_status_reaches_soft_deleted_rows() {
    let env = env();

    let request = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();
    env.service.soft_delete(request.id).await.unwrap();

    let updated = env
        .service
        .update_status(request.id, LeaveDecision::Approved)
        .await
        .unwrap();
    assert_eq!(updated.status, "approved");
}

#[tokio::test]
async fn soft_delete_redacts_reason_and_restore_recovers_everything() {
    let env = env();

    let original = env
        .service
        .create_request(
            1,
            CreateLeaveRequest {
                start_date: date(2026, 3, 1),
                end_date: date(2026, 3, 3),
                reason: "attending a family wedding".to_string(),
                attachment: None,
            },
        )
        .await
        .unwrap();

    env.service.soft_delete(original.id).await.unwrap();

    let trashed = env.store.find_trashed(original.id).await.unwrap().unwrap();
    assert!(trashed.reason.starts_with(DELETED_SENTINEL));
    assert!(!trashed.reason.contains("wedding"));
    assert!(trashed.deleted_at.is_some());

    // An active-scoped read no longer sees it.
    assert!(matches!(
        env.service.get_request(original.id).await,
        Err(LeaveError::NotFound)
    ));

    let restored = env.service.restore(original.id).await.unwrap();
    assert_eq!(restored.start_date, original.start_date);
    assert_eq!(restored.end_date, original.end_date);
    assert_eq!(restored.reason, "attending a family wedding");
    assert_eq!(restored.attachment, original.attachment);
    assert_eq!(restored.status, original.status);
    assert!(restored.deleted_at.is_none());
}

#[tokio::test]
async fn soft_delete_requires_an_active_row() {
    let env = env();

    let request = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();
    env.service.soft_delete(request.id).await.unwrap();

    assert!(matches!(
        env.service.soft_delete(request.id).await,
        Err(LeaveError::NotFound)
    ));
}

#[tokio::test]
async fn restore_requires_a_soft_deleted_row() {
    let env = env();

    let request = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();

    assert!(matches!(
        env.service.restore(request.id).await,
        Err(LeaveError::NotFound)
    ));
}

#[tokio::test]
async fn tampered_token_fails_restore_and_row_stays_deleted() {
    let env = env();

    let request = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 3)))
        .await
        .unwrap();
    env.service.soft_delete(request.id).await.unwrap();

    let trashed = env.store.find_trashed(request.id).await.unwrap().unwrap();
    let token = trashed.reason.strip_prefix(DELETED_SENTINEL).unwrap();
    let corrupted = format!("{DELETED_SENTINEL}{}", tamper(token));
    env.store.mark_deleted(request.id, &corrupted).await.unwrap();

    let result = env.service.restore(request.id).await;
    assert!(matches!(result, Err(LeaveError::DecryptionFailed)));

    // No partial mutation: still soft-deleted, payload untouched.
    let still_trashed = env.store.find_trashed(request.id).await.unwrap().unwrap();
    assert_eq!(still_trashed.reason, corrupted);
    assert!(still_trashed.deleted_at.is_some());
}

#[tokio::test]
async fn attachment_is_stored_under_a_generated_name() {
    let env = env();

    let request = env
        .service
        .create_request(
            1,
            CreateLeaveRequest {
                start_date: date(2026, 3, 1),
                end_date: date(2026, 3, 1),
                reason: "medical appointment follow-up".to_string(),
                attachment: Some(AttachmentUpload {
                    file_name: "doctor-note.pdf".to_string(),
                    bytes: b"%PDF-1.4 fake".to_vec(),
                }),
            },
        )
        .await
        .unwrap();

    let stored = request.attachment.unwrap();
    assert!(stored.starts_with("leave_attachments/"));
    assert!(stored.ends_with(".pdf"));
    assert_ne!(stored, "leave_attachments/doctor-note.pdf");

    let on_disk = tokio::fs::read(env.dir.path().join(&stored)).await.unwrap();
    assert_eq!(on_disk, b"%PDF-1.4 fake");
}

#[tokio::test]
async fn quota_endpoint_lazily_creates_the_year_row() {
    let env = env();

    assert!(env.service.ledger().get(9, 2026).await.unwrap().is_none());

    let quota = env.service.ledger().ensure(9, 2026).await.unwrap();
    assert_eq!(quota.quota_total, 12);
    assert_eq!(quota.quota_used, 0);

    // Second call returns the same row instead of creating another.
    let again = env.service.ledger().ensure(9, 2026).await.unwrap();
    assert_eq!(again.id, quota.id);
}

#[tokio::test]
async fn listing_paginates_25_rows_into_3_pages() {
    let env = env();

    let start = date(2026, 1, 1);
    for i in 0..25 {
        let day = start + chrono::Duration::days(i);
        env.service
            .create_request(1, payload(day, day))
            .await
            .unwrap();
    }

    let first = env.service.list_active(None, 1, 10).await.unwrap();
    assert_eq!(first.total, 25);
    assert_eq!(first.pages, 3);
    assert_eq!(first.data.len(), 10);

    let last = env.service.list_active(None, 3, 10).await.unwrap();
    assert_eq!(last.data.len(), 5);

    let beyond = env.service.list_active(None, 4, 10).await.unwrap();
    assert!(beyond.data.is_empty());
}

#[tokio::test]
async fn listing_filters_by_owner_and_skips_deleted_rows() {
    let env = env();

    let mine = env
        .service
        .create_request(1, payload(date(2026, 3, 1), date(2026, 3, 1)))
        .await
        .unwrap();
    env.service
        .create_request(2, payload(date(2026, 3, 2), date(2026, 3, 2)))
        .await
        .unwrap();
    let gone = env
        .service
        .create_request(1, payload(date(2026, 4, 1), date(2026, 4, 1)))
        .await
        .unwrap();
    env.service.soft_delete(gone.id).await.unwrap();

    let listed = env.service.list_active(Some(1), 1, 10).await.unwrap();
    assert_eq!(listed.total, 1);
    assert_eq!(listed.data[0].id, mine.id);

    let deleted = env.service.list_deleted(1, 10).await.unwrap();
    assert_eq!(deleted.total, 1);
    assert_eq!(deleted.data[0].id, gone.id);
}
