use async_trait::async_trait;
use sqlx::MySqlPool;
use tracing::debug;

use super::LeaveStore;
use crate::error::{AppError, AppResult};
use crate::model::{
    leave_request::{LEAVE_COLUMNS, LeaveRequest, LeaveScope, LeaveStatus, NewLeave},
    leave_type::LeaveType,
};
use crate::utils::pagination::{Page, PageRequest};

#[derive(Clone)]
pub struct MySqlLeaveStore {
    pool: MySqlPool,
}

impl MySqlLeaveStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn scope_column(scope: LeaveScope) -> &'static str {
    match scope {
        LeaveScope::Mine => "requester_id",
        LeaveScope::Subordinates => "responder_id",
    }
}

#[async_trait]
impl LeaveStore for MySqlLeaveStore {
    async fn leave_types(&self) -> AppResult<Vec<LeaveType>> {
        let types = sqlx::query_as::<_, LeaveType>(
            "SELECT id, name, create_time FROM absent_types ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(types)
    }

    async fn leave_type_exists(&self, id: u64) -> AppResult<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM absent_types WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found > 0)
    }

    async fn insert(&self, leave: NewLeave) -> AppResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO absents
                (title, request_content, absent_type_id, requester_id, responder_id,
                 status, start_date, end_date, create_time, response_content)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, '')
            "#,
        )
        .bind(&leave.title)
        .bind(&leave.request_content)
        .bind(leave.absent_type_id)
        .bind(leave.requester_id)
        .bind(leave.responder_id)
        .bind(leave.status)
        .bind(leave.start_date)
        .bind(leave.end_date)
        .bind(leave.create_time)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.get(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("leave request {id} vanished after insert")))
    }

    async fn get(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM absents WHERE id = ?");
        let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(leave)
    }

    async fn list(
        &self,
        user_id: u64,
        scope: LeaveScope,
        page: PageRequest,
    ) -> AppResult<Page<LeaveRequest>> {
        let column = scope_column(scope);

        let count_sql = format!("SELECT COUNT(*) FROM absents WHERE {column} = ?");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        let data_sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM absents
            WHERE {column} = ?
            ORDER BY create_time DESC, id DESC
            LIMIT ? OFFSET ?
            "#
        );
        debug!(sql = %data_sql, user_id, page = page.page, size = page.size, "Fetching leave requests");

        let items = sqlx::query_as::<_, LeaveRequest>(&data_sql)
            .bind(user_id)
            .bind(page.size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, total })
    }

    async fn decide(
        &self,
        id: u64,
        responder_id: u64,
        status: LeaveStatus,
        response_content: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE absents
            SET status = ?, response_content = ?
            WHERE id = ?
            AND responder_id = ?
            AND status = ?
            "#,
        )
        .bind(status)
        .bind(response_content)
        .bind(id)
        .bind(responder_id)
        .bind(LeaveStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
