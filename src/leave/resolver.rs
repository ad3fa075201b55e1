use crate::directory::Membership;
use crate::error::{AppError, AppResult};

/// Who approves a leave request filed by `requester`.
///
/// * a regular member is approved by their department leader;
/// * a department leader is approved by the department's manager;
/// * the board leader has no approver (`Ok(None)`).
///
/// Missing leader or manager links are reported as
/// [`AppError::InvalidDirectoryState`].
pub fn resolve_approver(requester: &Membership, board_department: &str) -> AppResult<Option<u64>> {
    let user = &requester.user;
    let department = &requester.department;

    if user.department_id != Some(department.id) {
        return Err(AppError::InvalidDirectoryState(format!(
            "user {} is not a member of department {}",
            user.id, department.id
        )));
    }

    let leader_id = department.leader_id.ok_or_else(|| {
        AppError::InvalidDirectoryState(format!("department {} has no leader", department.name))
    })?;

    if leader_id != user.id {
        return Ok(Some(leader_id));
    }

    if requester.in_board(board_department) {
        return Ok(None);
    }

    department.manager_id.map(Some).ok_or_else(|| {
        AppError::InvalidDirectoryState(format!("department {} has no manager", department.name))
    })
}
