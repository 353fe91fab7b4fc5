use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::error::LeaveError;
use crate::model::{DEFAULT_ANNUAL_QUOTA, LeaveQuota, LeaveRequest, LeaveStatus};
use crate::store::{LeaveStore, NewLeaveRequest, RestoredFields};

const REQUEST_COLUMNS: &str = "id, user_id, start_date, end_date, reason, attachment, \
     status, created_at, updated_at, deleted_at";

pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_request(
        &self,
        id: u64,
        extra_clause: &str,
    ) -> Result<Option<LeaveRequest>, LeaveError> {
        let sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?{extra_clause}"
        );
        let request = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(request)
    }
}

#[async_trait::async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn insert_request(
        &self,
        request: NewLeaveRequest,
    ) -> Result<LeaveRequest, LeaveError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (user_id, start_date, end_date, reason, attachment, status)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.user_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(&request.reason)
        .bind(&request.attachment)
        .bind(LeaveStatus::Pending.as_str())
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.find_by_id(id).await?.ok_or(LeaveError::NotFound)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError> {
        self.fetch_request(id, "").await
    }

    async fn find_active(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError> {
        self.fetch_request(id, " AND deleted_at IS NULL").await
    }

    async fn find_trashed(&self, id: u64) -> Result<Option<LeaveRequest>, LeaveError> {
        self.fetch_request(id, " AND deleted_at IS NOT NULL").await
    }

    async fn list_active(
        &self,
        user_id: Option<u64>,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<LeaveRequest>, i64), LeaveError> {
        let offset = (page.max(1) - 1) * limit;

        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE deleted_at IS NULL");
        if user_id.is_some() {
            where_sql.push_str(" AND user_id = ?");
        }

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(uid) = user_id {
            count_q = count_q.bind(uid);
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests{where_sql} \
             ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
        if let Some(uid) = user_id {
            data_q = data_q.bind(uid);
        }
        let data = data_q
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((data, total))
    }

    async fn list_trashed(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<LeaveRequest>, i64), LeaveError> {
        let offset = (page.max(1) - 1) * limit;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM leave_requests WHERE deleted_at IS NOT NULL",
        )
        .fetch_one(&self.pool)
        .await?;

        let data_sql = format!(
            "SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE deleted_at IS NOT NULL \
             ORDER BY deleted_at DESC, id DESC LIMIT ? OFFSET ?"
        );
        let data = sqlx::query_as::<_, LeaveRequest>(&data_sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((data, total))
    }

    async fn has_overlap(
        &self,
        user_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<bool, LeaveError> {
        let overlapping = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM leave_requests
                WHERE user_id = ?
                AND status = ?
                AND (
                    (start_date <= ? AND end_date >= ?)
                    OR (start_date <= ? AND end_date >= ?)
                )
            )
            "#,
        )
        .bind(user_id)
        .bind(LeaveStatus::Approved.as_str())
        .bind(start_date)
        .bind(start_date)
        .bind(end_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(overlapping)
    }

    async fn set_status(&self, id: u64, status: &str) -> Result<(), LeaveError> {
        sqlx::query("UPDATE leave_requests SET status = ? WHERE id = ?")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn mark_deleted(&self, id: u64, redacted_reason: &str) -> Result<(), LeaveError> {
        sqlx::query("UPDATE leave_requests SET deleted_at = NOW(), reason = ? WHERE id = ?")
            .bind(redacted_reason)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn write_restored(&self, id: u64, fields: RestoredFields) -> Result<(), LeaveError> {
        sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?, end_date = ?, reason = ?, attachment = ?,
                status = ?, deleted_at = NULL
            WHERE id = ?
            "#,
        )
        .bind(fields.start_date)
        .bind(fields.end_date)
        .bind(&fields.reason)
        .bind(&fields.attachment)
        .bind(&fields.status)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn quota(&self, user_id: u64, year: i32) -> Result<Option<LeaveQuota>, LeaveError> {
        let quota = sqlx::query_as::<_, LeaveQuota>(
            r#"
            SELECT id, user_id, year, quota_total, quota_used
            FROM leave_quotas
            WHERE user_id = ? AND year = ?
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(quota)
    }

    async fn create_quota(&self, user_id: u64, year: i32) -> Result<LeaveQuota, LeaveError> {
        sqlx::query(
            "INSERT INTO leave_quotas (user_id, year, quota_total, quota_used) VALUES (?, ?, ?, 0)",
        )
        .bind(user_id)
        .bind(year)
        .bind(DEFAULT_ANNUAL_QUOTA)
        .execute(&self.pool)
        .await?;

        self.quota(user_id, year).await?.ok_or(LeaveError::NotFound)
    }

    async fn add_quota_used(
        &self,
        user_id: u64,
        year: i32,
        days: i32,
    ) -> Result<(), LeaveError> {
        // Single upsert so concurrent approvals for the same user/year
        // cannot lose an increment.
        sqlx::query(
            r#"
            INSERT INTO leave_quotas (user_id, year, quota_total, quota_used)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE quota_used = quota_used + VALUES(quota_used)
            "#,
        )
        .bind(user_id)
        .bind(year)
        .bind(DEFAULT_ANNUAL_QUOTA)
        .bind(days)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
