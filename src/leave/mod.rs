//! Leave requests: who approves them and how their status may change.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::model::{
    leave_request::{LeaveRequest, LeaveScope, LeaveStatus, NewLeave},
    leave_type::LeaveType,
};
use crate::utils::pagination::{Page, PageRequest};

pub mod mysql;
pub mod resolver;
pub mod service;

#[cfg(test)]
pub mod memory;

pub use mysql::MySqlLeaveStore;
pub use service::LeaveService;

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn leave_types(&self) -> AppResult<Vec<LeaveType>>;

    async fn leave_type_exists(&self, id: u64) -> AppResult<bool>;

    async fn insert(&self, leave: NewLeave) -> AppResult<LeaveRequest>;

    async fn get(&self, id: u64) -> AppResult<Option<LeaveRequest>>;

    /// Newest first. `Mine` matches the requester, `Subordinates` the approver.
    async fn list(
        &self,
        user_id: u64,
        scope: LeaveScope,
        page: PageRequest,
    ) -> AppResult<Page<LeaveRequest>>;

    /// Moves a pending request owned by `responder_id` to `status` in a single
    /// conditional write. Returns `false` when no pending row matched.
    async fn decide(
        &self,
        id: u64,
        responder_id: u64,
        status: LeaveStatus,
        response_content: &str,
    ) -> AppResult<bool>;
}
