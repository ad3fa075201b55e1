use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::Directory;
use crate::error::AppResult;
use crate::model::{
    department::Department,
    user::{User, UserStatus},
};

/// Arena-style tables keyed by id.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: RwLock<HashMap<u64, User>>,
    departments: RwLock<HashMap<u64, Department>>,
}

impl InMemoryDirectory {
    pub fn put_user(&self, user: User) {
        self.users.write().unwrap().insert(user.id, user);
    }

    pub fn put_department(&self, department: Department) {
        self.departments
            .write()
            .unwrap()
            .insert(department.id, department);
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn get_user(&self, id: u64) -> AppResult<Option<User>> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn get_department(&self, id: u64) -> AppResult<Option<Department>> {
        Ok(self.departments.read().unwrap().get(&id).cloned())
    }
}

pub fn user(id: u64, department_id: Option<u64>) -> User {
    User {
        id,
        realname: format!("user-{id}"),
        email: format!("user{id}@example.com"),
        telephone: String::new(),
        is_staff: true,
        is_superuser: false,
        status: UserStatus::Active,
        date_joined: NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
        department_id,
    }
}

pub fn department(
    id: u64,
    name: &str,
    leader_id: Option<u64>,
    manager_id: Option<u64>,
) -> Department {
    Department {
        id,
        name: name.to_string(),
        intro: String::new(),
        leader_id,
        manager_id,
    }
}
