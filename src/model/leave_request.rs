use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Pending is the only non-terminal state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i32", into = "i32")]
#[strum(serialize_all = "lowercase")]
#[repr(i32)]
pub enum LeaveStatus {
    Pending = 1,
    Approved = 2,
    Rejected = 3,
}

impl LeaveStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

impl TryFrom<i32> for LeaveStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(LeaveStatus::Pending),
            2 => Ok(LeaveStatus::Approved),
            3 => Ok(LeaveStatus::Rejected),
            other => Err(format!("unknown leave status {other}")),
        }
    }
}

impl From<LeaveStatus> for i32 {
    fn from(status: LeaveStatus) -> Self {
        status as i32
    }
}

/// Which side of a leave request the caller is looking from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LeaveScope {
    /// requests the caller filed
    Mine,
    /// requests routed to the caller for approval
    #[strum(serialize = "sub", serialize = "subordinates")]
    Subordinates,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Family trip")]
    pub title: String,
    #[schema(example = "Two days off to visit family")]
    pub request_content: String,
    #[schema(example = 1)]
    pub absent_type_id: u64,
    #[schema(example = 5)]
    pub requester_id: u64,
    /// None only when the requester leads the board.
    #[schema(example = 3, nullable = true)]
    pub responder_id: Option<u64>,
    /// 1 = pending, 2 = approved, 3 = rejected
    #[schema(value_type = i32, example = 1)]
    pub status: LeaveStatus,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "2026-01-01T09:00:00", format = "date-time", value_type = String)]
    pub create_time: NaiveDateTime,
    #[schema(example = "")]
    pub response_content: String,
}

pub const LEAVE_COLUMNS: &str = "id, title, request_content, absent_type_id, requester_id, \
     responder_id, status, start_date, end_date, create_time, response_content";

/// A validated request ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewLeave {
    pub title: String,
    pub request_content: String,
    pub absent_type_id: u64,
    pub requester_id: u64,
    pub responder_id: Option<u64>,
    pub status: LeaveStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub create_time: NaiveDateTime,
}
