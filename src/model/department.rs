use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Leader, manager and staff links are ids into the user table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Department {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "Product development")]
    pub intro: String,
    /// At most one leader per department.
    #[schema(example = 3, nullable = true)]
    pub leader_id: Option<u64>,
    /// A board member overseeing this department; may manage several.
    #[schema(example = 1, nullable = true)]
    pub manager_id: Option<u64>,
}

impl Department {
    pub fn is_led_by(&self, user_id: u64) -> bool {
        self.leader_id == Some(user_id)
    }
}
