//! Persistence boundary for leave requests and quotas.
//!
//! The service layer only talks to [`LeaveStore`]; production wires in
//! [`MySqlLeaveStore`], the test suite substitutes [`MemoryLeaveStore`].

use chrono::NaiveDate;

use crate::error::LeaveError;
use crate::model::{LeaveQuota, LeaveRequest};

pub mod memory;
pub mod mysql;

pub use memory::MemoryLeaveStore;
pub use mysql::MySqlLeaveStore;

/// Fields persisted when a new request is inserted. Status always starts
/// at `pending` with no deletion mark.
#[derive(Debug, Clone)]
pub struct NewLeaveRequest {
    pub user_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub attachment: Option<String>,
}

/// Fields written back when a soft-deleted row is restored from its
/// decrypted snapshot. `created_at` stays whatever the row already has.
#[derive(Debug, Clone)]
pub struct RestoredFields {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub attachment: Option<String>,
    pub status: String,
}

#[async_trait::async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert_request(&self, request: NewLeaveRequest)
    -> Result<LeaveRequest, LeaveError>;

    /// Lookup regardless of deletion state.
    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError>;

    async fn find_active(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError>;

    async fn find_trashed(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError>;

    /// Active rows, newest first, optionally restricted to one user.
    /// Returns the page plus the unpaginated total.
    async fn list_active(
        &self,
        user_id: Option<u64>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<LeaveRequest>, i64), LeaveError>;

    /// Soft-deleted rows, most recently deleted first.
    async fn list_trashed(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<LeaveRequest>, i64), LeaveError>;

    /// Endpoint-containment test against the user's approved requests:
    /// true when either candidate endpoint falls inside an approved range.
    async fn has_overlap(
        &self,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, LeaveError>;

    async fn set_status(&self, id: u64, status: &str) -> Result<(), LeaveError>;

    /// Stamps `deleted_at` and overwrites `reason` with the redacted payload.
    async fn mark_deleted(&self, id: u64, redacted_reason: &str) -> Result<(), LeaveError>;

    /// Clears `deleted_at` and writes the snapshot fields back.
    async fn write_restored(&self, id: u64, fields: RestoredFields) -> Result<(), LeaveError>;

    async fn quota(&self, user_id: u64, year: i32) -> Result<Option<LeaveQuota>, LeaveError>;

    async fn create_quota(&self, user_id: u64, year: i32) -> Result<LeaveQuota, LeaveError>;

    /// Atomic increment of `quota_used`, creating the year's row on first
    /// use. Single statement so concurrent approvals cannot lose updates.
    async fn add_quota_used(&self, user_id: u64, year: i32, days: i32)
    -> Result<(), LeaveError>;
}
