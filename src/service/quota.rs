//! Per-user-per-year leave day accounting.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};

use crate::error::LeaveError;
use crate::model::{DEFAULT_ANNUAL_QUOTA, LeaveQuota};
use crate::store::LeaveStore;

/// Calendar days in the range counting both endpoints.
pub fn inclusive_day_count(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - start_date).num_days() + 1
}

/// Reads and mutates the quota table. A request is always attributed to
/// the calendar year of its start date.
pub struct QuotaLedger {
    store: Arc<dyn LeaveStore>,
}

impl QuotaLedger {
    pub fn new(store: Arc<dyn LeaveStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: u64, year: i32) -> Result<Option<LeaveQuota>, LeaveError> {
        self.store.quota(user_id, year).await
    }

    /// Returns the year's quota row, creating it with the default total on
    /// first access.
    pub async fn ensure(&self, user_id: u64, year: i32) -> Result<LeaveQuota, LeaveError> {
        if let Some(quota) = self.store.quota(user_id, year).await? {
            return Ok(quota);
        }
        self.store.create_quota(user_id, year).await
    }

    /// Whether the user can still take the requested span. When no quota
    /// row exists yet the default total applies and no row is created.
    pub async fn has_enough(
        &self,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, LeaveError> {
        let days_needed = inclusive_day_count(start_date, end_date);

        match self.store.quota(user_id, start_date.year()).await? {
            None => Ok(days_needed <= i64::from(DEFAULT_ANNUAL_QUOTA)),
            Some(quota) => {
                Ok(i64::from(quota.quota_used) + days_needed <= i64::from(quota.quota_total))
            }
        }
    }

    /// Books the span against the start year's quota. Called on approval
    /// only; there is no compensating decrement anywhere.
    pub async fn consume(
        &self,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<(), LeaveError> {
        let days_used = inclusive_day_count(start_date, end_date) as i32;
        self.store
            .add_quota_used(user_id, start_date.year(), days_used)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn counts_both_endpoints() {
        assert_eq!(inclusive_day_count(date(2024, 3, 1), date(2024, 3, 3)), 3);
    }

    #[test]
    fn single_day_counts_as_one() {
        assert_eq!(inclusive_day_count(date(2024, 3, 1), date(2024, 3, 1)), 1);
    }

    #[test]
    fn spans_month_boundaries() {
        assert_eq!(inclusive_day_count(date(2024, 1, 30), date(2024, 2, 2)), 4);
    }

    #[test]
    fn spans_leap_day() {
        assert_eq!(inclusive_day_count(date(2024, 2, 28), date(2024, 3, 1)), 3);
    }
}
