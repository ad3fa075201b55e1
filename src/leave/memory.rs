use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::LeaveStore;
use crate::error::AppResult;
use crate::model::{
    leave_request::{LeaveRequest, LeaveScope, LeaveStatus, NewLeave},
    leave_type::LeaveType,
};
use crate::utils::pagination::{Page, PageRequest};

#[derive(Default)]
pub struct InMemoryLeaveStore {
    types: Mutex<Vec<LeaveType>>,
    leaves: Mutex<BTreeMap<u64, LeaveRequest>>,
}

impl InMemoryLeaveStore {
    pub fn with_types(names: &[&str]) -> Self {
        let store = Self::default();
        let created = NaiveDateTime::default();
        *store.types.lock().unwrap() = names
            .iter()
            .enumerate()
            .map(|(i, name)| LeaveType {
                id: i as u64 + 1,
                name: name.to_string(),
                create_time: created,
            })
            .collect();
        store
    }

    pub fn status_of(&self, id: u64) -> Option<LeaveStatus> {
        self.leaves.lock().unwrap().get(&id).map(|l| l.status)
    }
}

#[async_trait]
impl LeaveStore for InMemoryLeaveStore {
    async fn leave_types(&self) -> AppResult<Vec<LeaveType>> {
        Ok(self.types.lock().unwrap().clone())
    }

    async fn leave_type_exists(&self, id: u64) -> AppResult<bool> {
        Ok(self.types.lock().unwrap().iter().any(|t| t.id == id))
    }

    async fn insert(&self, leave: NewLeave) -> AppResult<LeaveRequest> {
        let mut leaves = self.leaves.lock().unwrap();
        let id = leaves.keys().next_back().map_or(1, |last| last + 1);
        let record = LeaveRequest {
            id,
            title: leave.title,
            request_content: leave.request_content,
            absent_type_id: leave.absent_type_id,
            requester_id: leave.requester_id,
            responder_id: leave.responder_id,
            status: leave.status,
            start_date: leave.start_date,
            end_date: leave.end_date,
            create_time: leave.create_time,
            response_content: String::new(),
        };
        leaves.insert(id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
        Ok(self.leaves.lock().unwrap().get(&id).cloned())
    }

    async fn list(
        &self,
        user_id: u64,
        scope: LeaveScope,
        page: PageRequest,
    ) -> AppResult<Page<LeaveRequest>> {
        let mut matching: Vec<LeaveRequest> = self
            .leaves
            .lock()
            .unwrap()
            .values()
            .filter(|l| match scope {
                LeaveScope::Mine => l.requester_id == user_id,
                LeaveScope::Subordinates => l.responder_id == Some(user_id),
            })
            .cloned()
            .collect();
        matching.sort_by(|a, b| (b.create_time, b.id).cmp(&(a.create_time, a.id)));

        Ok(Page {
            total: matching.len() as i64,
            items: page.slice(&matching),
        })
    }

    async fn decide(
        &self,
        id: u64,
        responder_id: u64,
        status: LeaveStatus,
        response_content: &str,
    ) -> AppResult<bool> {
        let mut leaves = self.leaves.lock().unwrap();
        match leaves.get_mut(&id) {
            Some(leave)
                if leave.status == LeaveStatus::Pending
                    && leave.responder_id == Some(responder_id) =>
            {
                leave.status = status;
                leave.response_content = response_content.to_string();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
