//! Leave request lifecycle: creation gated by overlap and quota checks,
//! admin status transitions feeding the quota ledger, and the encrypted
//! soft-delete / restore pair.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::LeaveError;
use crate::model::{LeaveDecision, LeaveRequest};
use crate::service::quota::QuotaLedger;
use crate::store::{LeaveStore, NewLeaveRequest, RestoredFields};
use crate::utils::codec::{DELETED_SENTINEL, RedactionCodec, RedactionSnapshot};
use crate::utils::files::{FileStore, generate_file_name};

/// Validated create payload handed over by the HTTP boundary.
#[derive(Debug, Clone)]
pub struct CreateLeaveRequest {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub attachment: Option<AttachmentUpload>,
}

#[derive(Debug, Clone)]
pub struct AttachmentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// One page of a listing plus the derived page count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub pages: i64,
}

pub struct LeaveService {
    store: Arc<dyn LeaveStore>,
    files: Arc<dyn FileStore>,
    codec: RedactionCodec,
    ledger: QuotaLedger,
}

impl LeaveService {
    pub fn new(
        store: Arc<dyn LeaveStore>,
        files: Arc<dyn FileStore>,
        codec: RedactionCodec,
    ) -> Self {
        let ledger = QuotaLedger::new(store.clone());
        Self {
            store,
            files,
            codec,
            ledger,
        }
    }

    pub fn ledger(&self) -> &QuotaLedger {
        &self.ledger
    }

    pub async fn create_request(
        &self,
        user_id: u64,
        payload: CreateLeaveRequest,
    ) -> Result<LeaveRequest, LeaveError> {
        if self
            .store
            .has_overlap(user_id, payload.start_date, payload.end_date)
            .await?
        {
            return Err(LeaveError::Overlap);
        }

        if !self
            .ledger
            .has_enough(user_id, payload.start_date, payload.end_date)
            .await?
        {
            return Err(LeaveError::InsufficientQuota);
        }

        let attachment = match payload.attachment {
            Some(upload) => {
                let file_name = generate_file_name(&upload.file_name);
                Some(self.files.store(&upload.bytes, &file_name).await?)
            }
            None => None,
        };

        self.store
            .insert_request(NewLeaveRequest {
                user_id,
                start_date: payload.start_date,
                end_date: payload.end_date,
                reason: payload.reason,
                attachment,
            })
            .await
    }

    /// Active requests, newest first; `user_id` narrows to one owner.
    pub async fn list_active(
        &self,
        user_id: Option<u64>,
        page: u64,
        limit: u64,
    ) -> Result<Page<LeaveRequest>, LeaveError> {
        let limit = limit.max(1);
        let (data, total) = self.store.list_active(user_id, page, limit).await?;
        Ok(paged(data, total, limit))
    }

    pub async fn list_deleted(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<Page<LeaveRequest>, LeaveError> {
        let limit = limit.max(1);
        let (data, total) = self.store.list_trashed(page, limit).await?;
        Ok(paged(data, total, limit))
    }

    /// Active rows only; a soft-deleted id reads as absent here.
    pub async fn get_request(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        self.store.find_active(id).await?.ok_or(LeaveError::NotFound)
    }

    /// Admin transition to approved/rejected. The lookup intentionally
    /// spans soft-deleted rows, and a request that already carries a final
    /// status can be transitioned again; each approval call books the span
    /// against the quota once more. Both behaviours are long-standing and
    /// kept as-is.
    pub async fn update_status(
        &self,
        id: u64,
        decision: LeaveDecision,
    ) -> Result<LeaveRequest, LeaveError> {
        let mut request = self.store.find_by_id(id).await?.ok_or(LeaveError::NotFound)?;

        self.store.set_status(id, decision.as_str()).await?;
        request.status = decision.as_str().to_string();

        if decision == LeaveDecision::Approved {
            self.ledger
                .consume(request.user_id, request.start_date, request.end_date)
                .await?;
        }

        Ok(request)
    }

    /// Encrypts the row's field snapshot into the `reason` column and
    /// stamps `deleted_at`. The plaintext reason survives only inside the
    /// token.
    pub async fn soft_delete(&self, id: u64) -> Result<(), LeaveError> {
        let request = self.store.find_active(id).await?.ok_or(LeaveError::NotFound)?;

        let token = self.codec.encode(&RedactionSnapshot::from(&request))?;
        let redacted = format!("{DELETED_SENTINEL}{token}");

        self.store.mark_deleted(id, &redacted).await
    }

    /// Decrypts the embedded snapshot and writes the original fields back.
    /// A malformed or tampered token fails with `DecryptionFailed` and
    /// leaves the row soft-deleted.
    pub async fn restore(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        let request = self.store.find_trashed(id).await?.ok_or(LeaveError::NotFound)?;

        let token = request
            .reason
            .strip_prefix(DELETED_SENTINEL)
            .unwrap_or(&request.reason);
        let snapshot = self.codec.decode(token)?;

        self.store
            .write_restored(
                id,
                RestoredFields {
                    start_date: snapshot.start_date,
                    end_date: snapshot.end_date,
                    reason: snapshot.reason,
                    attachment: snapshot.attachment,
                    status: snapshot.status,
                },
            )
            .await?;

        self.store.find_by_id(id).await?.ok_or(LeaveError::NotFound)
    }
}

fn paged(data: Vec<LeaveRequest>, total: i64, limit: u64) -> Page<LeaveRequest> {
    let limit = limit as i64;
    Page {
        data,
        total,
        pages: (total + limit - 1) / limit,
    }
}
