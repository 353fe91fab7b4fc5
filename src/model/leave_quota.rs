use serde::{Deserialize, Serialize};

/// Days granted per user per calendar year when no explicit quota row exists.
pub const DEFAULT_ANNUAL_QUOTA: i32 = 12;

/// One row of the per-user-per-year leave ledger. `quota_used` only ever
/// grows; approvals are never compensated by rejections or deletions.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct LeaveQuota {
    pub id: u64,
    pub user_id: u64,
    pub year: i32,
    pub quota_total: i32,
    pub quota_used: i32,
}

impl LeaveQuota {
    /// Derived balance; never persisted.
    pub fn remaining(&self) -> i32 {
        self.quota_total - self.quota_used
    }
}
