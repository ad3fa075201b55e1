//! Read access to departments and users.
//!
//! Departments and users reference each other by id only (a department
//! points at its leader and manager, a user points at its department), so
//! every link is resolved through one of the lookups below.

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::model::{department::Department, user::User};

pub mod mysql;

#[cfg(test)]
pub mod memory;

pub use mysql::MySqlDirectory;

#[async_trait]
pub trait Directory: Send + Sync {
    async fn get_user(&self, id: u64) -> AppResult<Option<User>>;
    async fn get_department(&self, id: u64) -> AppResult<Option<Department>>;
}

/// A user together with the department they belong to.
#[derive(Debug, Clone)]
pub struct Membership {
    pub user: User,
    pub department: Department,
}

impl Membership {
    pub fn is_leader(&self) -> bool {
        self.department.is_led_by(self.user.id)
    }

    pub fn in_board(&self, board_department: &str) -> bool {
        self.department.name == board_department
    }
}

/// Loads `user_id` and its department. A missing user or a user without a
/// department is a broken directory, not a client error.
pub async fn membership(directory: &dyn Directory, user_id: u64) -> AppResult<Membership> {
    let user = directory.get_user(user_id).await?.ok_or_else(|| {
        AppError::InvalidDirectoryState(format!("user {user_id} does not exist"))
    })?;

    let department_id = user.department_id.ok_or_else(|| {
        AppError::InvalidDirectoryState(format!("user {user_id} has no department"))
    })?;

    let department = directory
        .get_department(department_id)
        .await?
        .ok_or_else(|| {
            AppError::InvalidDirectoryState(format!(
                "department {department_id} of user {user_id} does not exist"
            ))
        })?;

    Ok(Membership { user, department })
}

/// Department of an authenticated caller; users without one get `None`.
pub async fn department_of(directory: &dyn Directory, user_id: u64) -> AppResult<Option<u64>> {
    let user = directory
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("user no longer exists".to_string()))?;
    Ok(user.department_id)
}

/// Whose staff records a caller may see and manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffScope {
    /// board members see every department
    All,
    /// a department leader sees their own department
    Department(u64),
}

impl StaffScope {
    pub fn covers(&self, department_id: Option<u64>) -> bool {
        match self {
            StaffScope::All => true,
            StaffScope::Department(id) => department_id == Some(*id),
        }
    }

    pub fn department(&self) -> Option<u64> {
        match self {
            StaffScope::All => None,
            StaffScope::Department(id) => Some(*id),
        }
    }
}

pub fn staff_scope(member: &Membership, board_department: &str) -> AppResult<StaffScope> {
    if member.in_board(board_department) {
        return Ok(StaffScope::All);
    }
    if member.is_leader() {
        return Ok(StaffScope::Department(member.department.id));
    }
    Err(AppError::Forbidden(
        "only department leaders can manage staff".to_string(),
    ))
}
