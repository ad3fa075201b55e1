use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveType {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "sick")]
    pub name: String,
    #[schema(example = "2026-01-01T09:00:00", format = "date-time", value_type = String)]
    pub create_time: NaiveDateTime,
}
