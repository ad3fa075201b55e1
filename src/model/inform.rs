use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Department id that, when present in a publish request, makes an inform public.
pub const PUBLIC_DEPARTMENT_ID: u64 = 0;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Inform {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Office closed on Friday")]
    pub title: String,
    #[schema(example = "<p>Maintenance work</p>")]
    pub content: String,
    #[schema(example = "2026-01-01T09:00:00", format = "date-time", value_type = String)]
    pub create_time: NaiveDateTime,
    pub public: bool,
    #[schema(example = 1)]
    pub author_id: u64,
    #[schema(example = "Jane Doe")]
    pub author_name: String,
}

/// Where a new inform goes: everyone, or an explicit set of departments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Public,
    Departments(Vec<u64>),
}

impl Audience {
    pub fn from_department_ids(ids: &[u64]) -> Option<Self> {
        if ids.contains(&PUBLIC_DEPARTMENT_ID) {
            return Some(Audience::Public);
        }
        if ids.is_empty() {
            return None;
        }
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        Some(Audience::Departments(ids))
    }
}
