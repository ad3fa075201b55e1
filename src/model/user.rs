use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i32", into = "i32")]
#[strum(serialize_all = "lowercase")]
#[repr(i32)]
pub enum UserStatus {
    Active = 1,
    Inactive = 2,
    Locked = 3,
}

impl TryFrom<i32> for UserStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(UserStatus::Active),
            2 => Ok(UserStatus::Inactive),
            3 => Ok(UserStatus::Locked),
            other => Err(format!("unknown user status {other}")),
        }
    }
}

impl From<UserStatus> for i32 {
    fn from(status: UserStatus) -> Self {
        status as i32
    }
}

/// Staff account. The password hash never leaves the auth module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub realname: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "")]
    pub telephone: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// 1 = active, 2 = not yet activated, 3 = locked
    #[schema(value_type = i32, example = 1)]
    pub status: UserStatus,
    #[schema(example = "2026-01-01T09:00:00", format = "date-time", value_type = String)]
    pub date_joined: NaiveDateTime,
    #[schema(example = 2, nullable = true)]
    pub department_id: Option<u64>,
}

pub const USER_COLUMNS: &str =
    "id, realname, email, telephone, is_staff, is_superuser, status, date_joined, department_id";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_integer_codes_on_the_wire() {
        assert_eq!(serde_json::to_string(&UserStatus::Locked).unwrap(), "3");
        let parsed: UserStatus = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, UserStatus::Inactive);
        assert!(serde_json::from_str::<UserStatus>("9").is_err());
    }
}
