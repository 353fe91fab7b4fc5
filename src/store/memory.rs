//! In-memory [`LeaveStore`] used by the scenario tests. Mirrors the SQL
//! store's semantics, including the endpoint-containment overlap test and
//! the upsert behaviour of `add_quota_used`.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;

use crate::error::LeaveError;
use crate::model::{DEFAULT_ANNUAL_QUOTA, LeaveQuota, LeaveRequest, LeaveStatus};
use crate::store::{LeaveStore, NewLeaveRequest, RestoredFields};

#[derive(Default)]
struct Inner {
    next_request_id: u64,
    next_quota_id: u64,
    requests: BTreeMap<u64, LeaveRequest>,
    quotas: Vec<LeaveQuota>,
}

#[derive(Default)]
pub struct MemoryLeaveStore {
    inner: Mutex<Inner>,
}

impl MemoryLeaveStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page_of(rows: Vec<LeaveRequest>, page: u64, limit: u64) -> (Vec<LeaveRequest>, i64) {
    let total = rows.len() as i64;
    let offset = ((page.max(1) - 1) * limit) as usize;
    let data = rows.into_iter().skip(offset).take(limit as usize).collect();
    (data, total)
}

#[async_trait::async_trait]
impl LeaveStore for MemoryLeaveStore {
    async fn insert_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, LeaveError> {
        let mut inner = self.inner.lock().await;
        inner.next_request_id += 1;
        let now = Utc::now();
        let row = LeaveRequest {
            id: inner.next_request_id,
            user_id: request.user_id,
            start_date: request.start_date,
            end_date: request.end_date,
            reason: request.reason,
            attachment: request.attachment,
            status: LeaveStatus::Pending.as_str().to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        inner.requests.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError> {
        let inner = self.inner.lock().await;
        Ok(inner.requests.get(&id).cloned())
    }

    async fn find_active(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .requests
            .get(&id)
            .filter(|r| r.deleted_at.is_none())
            .cloned())
    }

    async fn find_trashed(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .requests
            .get(&id)
            .filter(|r| r.deleted_at.is_some())
            .cloned())
    }

    async fn list_active(
        &self,
        user_id: Option<u64>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<LeaveRequest>, i64), LeaveError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<LeaveRequest> = inner
            .requests
            .values()
            .filter(|r| r.deleted_at.is_none())
            .filter(|r| user_id.is_none_or(|uid| r.user_id == uid))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page_of(rows, page, limit))
    }

    async fn list_trashed(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<LeaveRequest>, i64), LeaveError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<LeaveRequest> = inner
            .requests
            .values()
            .filter(|r| r.deleted_at.is_some())
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.deleted_at.cmp(&a.deleted_at).then(b.id.cmp(&a.id)));
        Ok(page_of(rows, page, limit))
    }

    async fn has_overlap(
        &self,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, LeaveError> {
        let inner = self.inner.lock().await;
        Ok(inner.requests.values().any(|r| {
            r.user_id == user_id
                && r.status == LeaveStatus::Approved.as_str()
                && ((r.start_date <= start_date && r.end_date >= start_date)
                    || (r.start_date <= end_date && r.end_date >= end_date))
        }))
    }

    async fn set_status(&self, id: u64, status: &str) -> Result<(), LeaveError> {
        let mut inner = self.inner.lock().await;
        if let Some(row) = inner.requests.get_mut(&id) {
            row.status = status.to_string();
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_deleted(&self, id: u64, redacted_reason: &str) -> Result<(), LeaveError> {
        let mut inner = self.inner.lock().await;
        if let Some(row) = inner.requests.get_mut(&id) {
            row.reason = redacted_reason.to_string();
            row.deleted_at = Some(Utc::now());
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn write_restored(&self, id: u64, fields: RestoredFields) -> Result<(), LeaveError> {
        let mut inner = self.inner.lock().await;
        if let Some(row) = inner.requests.get_mut(&id) {
            row.start_date = fields.start_date;
            row.end_date = fields.end_date;
            row.reason = fields.reason;
            row.attachment = fields.attachment;
            row.status = fields.status;
            row.deleted_at = None;
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn quota(&self, user_id: u64, year: i32) -> Result<Option<LeaveQuota>, LeaveError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .quotas
            .iter()
            .find(|q| q.user_id == user_id && q.year == year)
            .cloned())
    }

    async fn create_quota(&self, user_id: u64, year: i32) -> Result<LeaveQuota, LeaveError> {
        let mut inner = self.inner.lock().await;
        inner.next_quota_id += 1;
        let quota = LeaveQuota {
            id: inner.next_quota_id,
            user_id,
            year,
            quota_total: DEFAULT_ANNUAL_QUOTA,
            quota_used: 0,
        };
        inner.quotas.push(quota.clone());
        Ok(quota)
    }

    async fn add_quota_used(
        &self,
        user_id: u64,
        year: i32,
        days: i32,
    ) -> Result<(), LeaveError> {
        let mut inner = self.inner.lock().await;
        if let Some(quota) = inner
            .quotas
            .iter_mut()
            .find(|q| q.user_id == user_id && q.year == year)
        {
            quota.quota_used += days;
        } else {
            inner.next_quota_id += 1;
            let quota = LeaveQuota {
                id: inner.next_quota_id,
                user_id,
                year,
                quota_total: DEFAULT_ANNUAL_QUOTA,
                quota_used: days,
            };
            inner.quotas.push(quota);
        }
        Ok(())
    }
}
