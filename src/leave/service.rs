use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info, warn};

use super::{LeaveStore, resolver::resolve_approver};
use crate::directory::{Directory, membership};
use crate::error::{AppError, AppResult};
use crate::model::{
    leave_request::{LeaveRequest, LeaveScope, LeaveStatus, NewLeave},
    leave_type::LeaveType,
    user::User,
};
use crate::utils::pagination::{Page, PageRequest};

/// Input of [`LeaveService::create`].
#[derive(Debug, Clone)]
pub struct LeaveDraft {
    pub absent_type_id: u64,
    pub title: String,
    pub request_content: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub struct LeaveService {
    directory: Arc<dyn Directory>,
    store: Arc<dyn LeaveStore>,
    board_department: String,
}

impl LeaveService {
    pub fn new(
        directory: Arc<dyn Directory>,
        store: Arc<dyn LeaveStore>,
        board_department: impl Into<String>,
    ) -> Self {
        Self {
            directory,
            store,
            board_department: board_department.into(),
        }
    }

    pub async fn leave_types(&self) -> AppResult<Vec<LeaveType>> {
        self.store.leave_types().await
    }

    /// The user who would approve a request filed by `user_id` right now.
    pub async fn responder(&self, user_id: u64) -> AppResult<Option<User>> {
        let requester = membership(self.directory.as_ref(), user_id).await?;
        match resolve_approver(&requester, &self.board_department)? {
            Some(approver_id) => {
                let approver = self.directory.get_user(approver_id).await?.ok_or_else(|| {
                    AppError::InvalidDirectoryState(format!(
                        "approver {approver_id} does not exist"
                    ))
                })?;
                Ok(Some(approver))
            }
            None => Ok(None),
        }
    }

    pub async fn create(&self, requester_id: u64, draft: LeaveDraft) -> AppResult<LeaveRequest> {
        if draft.title.trim().is_empty() {
            return Err(AppError::Validation("title must not be empty".to_string()));
        }
        if draft.start_date > draft.end_date {
            return Err(AppError::Validation(
                "start_date cannot be after end_date".to_string(),
            ));
        }
        if !self.store.leave_type_exists(draft.absent_type_id).await? {
            return Err(AppError::Validation(format!(
                "leave type {} does not exist",
                draft.absent_type_id
            )));
        }

        let requester = membership(self.directory.as_ref(), requester_id).await?;
        let responder_id = resolve_approver(&requester, &self.board_department)?;
        let status = match responder_id {
            Some(_) => LeaveStatus::Pending,
            None => LeaveStatus::Approved,
        };

        let leave = self
            .store
            .insert(NewLeave {
                title: draft.title,
                request_content: draft.request_content,
                absent_type_id: draft.absent_type_id,
                requester_id,
                responder_id,
                status,
                start_date: draft.start_date,
                end_date: draft.end_date,
                create_time: Utc::now().naive_utc(),
            })
            .await?;

        info!(
            leave_id = leave.id,
            requester_id,
            responder_id = ?responder_id,
            status = %status,
            "Leave request created"
        );
        Ok(leave)
    }

    pub async fn list(
        &self,
        user_id: u64,
        scope: LeaveScope,
        page: PageRequest,
    ) -> AppResult<Page<LeaveRequest>> {
        debug!(user_id, scope = %scope, page = page.page, "Listing leave requests");
        self.store.list(user_id, scope, page).await
    }

    /// Visible to the requester and the approver only.
    pub async fn get(&self, user_id: u64, id: u64) -> AppResult<LeaveRequest> {
        let leave = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("leave request {id} not found")))?;

        if leave.requester_id != user_id && leave.responder_id != Some(user_id) {
            return Err(AppError::NotFound(format!("leave request {id} not found")));
        }
        Ok(leave)
    }

    pub async fn decide(
        &self,
        caller_id: u64,
        id: u64,
        status: LeaveStatus,
        response_content: String,
    ) -> AppResult<LeaveRequest> {
        if !status.is_terminal() {
            return Err(AppError::Validation(
                "status must be approved (2) or rejected (3)".to_string(),
            ));
        }

        let leave = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("leave request {id} not found")))?;

        if leave.status != LeaveStatus::Pending {
            return Err(AppError::InvalidState(
                "leave request has already been decided".to_string(),
            ));
        }
        if leave.responder_id != Some(caller_id) {
            warn!(leave_id = id, caller_id, "Decision attempted by non-approver");
            return Err(AppError::Authorization(
                "you are not the approver of this leave request".to_string(),
            ));
        }

        // A concurrent decision may have landed between the read and this write.
        if !self
            .store
            .decide(id, caller_id, status, &response_content)
            .await?
        {
            return Err(AppError::InvalidState(
                "leave request has already been decided".to_string(),
            ));
        }

        info!(leave_id = id, caller_id, status = %status, "Leave request decided");

        self.store
            .get(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("leave request {id} vanished after update")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::memory::{InMemoryDirectory, department, user};
    use crate::leave::memory::InMemoryLeaveStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    // Board(1): leader 10, member 11
    // Engineering(2): leader 20 managed by 10, members 21, 22
    // Broken(3): no leader, member 31
    fn fixture() -> (LeaveService, Arc<InMemoryLeaveStore>) {
        let dir = InMemoryDirectory::default();
        dir.put_department(department(1, "Board", Some(10), None));
        dir.put_department(department(2, "Engineering", Some(20), Some(10)));
        dir.put_department(department(3, "Broken", None, Some(10)));
        for (id, dept) in [(10, 1), (11, 1), (20, 2), (21, 2), (22, 2), (31, 3)] {
            dir.put_user(user(id, Some(dept)));
        }

        let store = Arc::new(InMemoryLeaveStore::with_types(&["personal", "sick"]));
        let service = LeaveService::new(Arc::new(dir), store.clone(), "Board");
        (service, store)
    }

    fn draft(day: u32) -> LeaveDraft {
        LeaveDraft {
            absent_type_id: 1,
            title: format!("leave {day}"),
            request_content: "please".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 3, day + 1).unwrap(),
        }
    }

    #[actix_web::test]
    async fn member_request_waits_for_leader() {
        let (service, _) = fixture();
        let leave = service.create(21, draft(1)).await.unwrap();
        assert_eq!(leave.responder_id, Some(20));
        assert_eq!(leave.status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn leader_request_goes_to_manager() {
        let (service, _) = fixture();
        let leave = service.create(20, draft(1)).await.unwrap();
        assert_eq!(leave.responder_id, Some(10));
        assert_eq!(leave.status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn board_leader_request_is_approved_immediately() {
        let (service, _) = fixture();
        let leave = service.create(10, draft(1)).await.unwrap();
        assert_eq!(leave.responder_id, None);
        assert_eq!(leave.status, LeaveStatus::Approved);
    }

    #[actix_web::test]
    async fn create_validates_input() {
        let (service, _) = fixture();

        let mut backwards = draft(5);
        std::mem::swap(&mut backwards.start_date, &mut backwards.end_date);
        assert!(matches!(
            service.create(21, backwards).await,
            Err(AppError::Validation(_))
        ));

        let mut unknown_type = draft(5);
        unknown_type.absent_type_id = 42;
        assert!(matches!(
            service.create(21, unknown_type).await,
            Err(AppError::Validation(_))
        ));

        assert!(matches!(
            service.create(31, draft(5)).await,
            Err(AppError::InvalidDirectoryState(_))
        ));
    }

    #[actix_web::test]
    async fn responder_matches_created_record() {
        let (service, _) = fixture();
        assert_eq!(service.responder(22).await.unwrap().map(|u| u.id), Some(20));
        assert_eq!(service.responder(20).await.unwrap().map(|u| u.id), Some(10));
        assert!(service.responder(10).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn approver_decides_once() {
        let (service, _) = fixture();
        let leave = service.create(21, draft(1)).await.unwrap();

        let decided = service
            .decide(20, leave.id, LeaveStatus::Rejected, "busy week".to_string())
            .await
            .unwrap();
        assert_eq!(decided.status, LeaveStatus::Rejected);
        assert_eq!(decided.response_content, "busy week");

        let again = service
            .decide(20, leave.id, LeaveStatus::Approved, "ok then".to_string())
            .await;
        assert!(matches!(again, Err(AppError::InvalidState(_))));
    }

    #[actix_web::test]
    async fn non_approver_cannot_decide() {
        let (service, store) = fixture();
        let leave = service.create(21, draft(1)).await.unwrap();

        for caller in [21, 22, 10] {
            let result = service
                .decide(caller, leave.id, LeaveStatus::Approved, String::new())
                .await;
            assert!(matches!(result, Err(AppError::Authorization(_))));
        }
        assert_eq!(store.status_of(leave.id), Some(LeaveStatus::Pending));
    }

    #[actix_web::test]
    async fn pending_is_not_a_decision() {
        let (service, _) = fixture();
        let leave = service.create(21, draft(1)).await.unwrap();
        let result = service
            .decide(20, leave.id, LeaveStatus::Pending, String::new())
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[actix_web::test]
    async fn auto_approved_record_is_final() {
        let (service, _) = fixture();
        let leave = service.create(10, draft(1)).await.unwrap();
        let result = service
            .decide(10, leave.id, LeaveStatus::Rejected, String::new())
            .await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    /// Holds the first `gated` reads at a barrier so that concurrent callers
    /// all observe the record before any of them writes.
    struct RacingStore {
        inner: InMemoryLeaveStore,
        barrier: Barrier,
        gated: usize,
        reads: AtomicUsize,
        writes: AtomicUsize,
        wins: AtomicUsize,
    }

    impl RacingStore {
        fn new(inner: InMemoryLeaveStore, gated: usize) -> Self {
            Self {
                inner,
                barrier: Barrier::new(gated),
                gated,
                reads: AtomicUsize::new(0),
                writes: AtomicUsize::new(0),
                wins: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LeaveStore for RacingStore {
        async fn leave_types(&self) -> AppResult<Vec<LeaveType>> {
            self.inner.leave_types().await
        }

        async fn leave_type_exists(&self, id: u64) -> AppResult<bool> {
            self.inner.leave_type_exists(id).await
        }

        async fn insert(&self, leave: NewLeave) -> AppResult<LeaveRequest> {
            self.inner.insert(leave).await
        }

        async fn get(&self, id: u64) -> AppResult<Option<LeaveRequest>> {
            let found = self.inner.get(id).await?;
            if self.reads.fetch_add(1, Ordering::SeqCst) < self.gated {
                self.barrier.wait().await;
            }
            Ok(found)
        }

        async fn list(
            &self,
            user_id: u64,
            scope: LeaveScope,
            page: PageRequest,
        ) -> AppResult<Page<LeaveRequest>> {
            self.inner.list(user_id, scope, page).await
        }

        async fn decide(
            &self,
            id: u64,
            responder_id: u64,
            status: LeaveStatus,
            response_content: &str,
        ) -> AppResult<bool> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            let won = self
                .inner
                .decide(id, responder_id, status, response_content)
                .await?;
            if won {
                self.wins.fetch_add(1, Ordering::SeqCst);
            }
            Ok(won)
        }
    }

    #[actix_web::test]
    async fn concurrent_decisions_have_one_winner() {
        let (service, _) = fixture();
        let store = Arc::new(RacingStore::new(
            InMemoryLeaveStore::with_types(&["personal"]),
            2,
        ));
        let service = LeaveService::new(service.directory.clone(), store.clone(), "Board");
        let leave = service.create(21, draft(1)).await.unwrap();

        let (first, second) = futures::join!(
            service.decide(20, leave.id, LeaveStatus::Approved, "yes".to_string()),
            service.decide(20, leave.id, LeaveStatus::Rejected, "no".to_string()),
        );

        // Both callers passed the pending check, so both reached the write.
        assert_eq!(store.writes.load(Ordering::SeqCst), 2);
        assert_eq!(store.wins.load(Ordering::SeqCst), 1);

        let outcomes = [first, second];
        let winner = outcomes
            .iter()
            .filter_map(|r| r.as_ref().ok())
            .collect::<Vec<_>>();
        assert_eq!(winner.len(), 1);
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(AppError::InvalidState(_))))
            .count();
        assert_eq!(conflicts, 1);
        assert_eq!(store.inner.status_of(leave.id), Some(winner[0].status));
        assert_ne!(winner[0].status, LeaveStatus::Pending);
    }

    #[actix_web::test]
    async fn conditional_write_rejects_a_decided_record() {
        let (service, store) = fixture();
        let leave = service.create(21, draft(1)).await.unwrap();

        assert!(store
            .decide(leave.id, 20, LeaveStatus::Approved, "first")
            .await
            .unwrap());
        assert!(!store
            .decide(leave.id, 20, LeaveStatus::Rejected, "second")
            .await
            .unwrap());
        assert_eq!(store.status_of(leave.id), Some(LeaveStatus::Approved));
    }

    #[actix_web::test]
    async fn lists_are_scoped_and_newest_first() {
        let (service, _) = fixture();
        let first = service.create(21, draft(1)).await.unwrap();
        let second = service.create(21, draft(3)).await.unwrap();
        service.create(22, draft(5)).await.unwrap();

        let mine = service
            .list(21, LeaveScope::Mine, PageRequest::new(None, None, 10))
            .await
            .unwrap();
        assert_eq!(mine.total, 2);
        let ids: Vec<u64> = mine.items.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(mine.items.iter().all(|l| l.requester_id == 21));

        let subordinates = service
            .list(20, LeaveScope::Subordinates, PageRequest::new(None, None, 10))
            .await
            .unwrap();
        assert_eq!(subordinates.total, 3);

        let beyond = service
            .list(21, LeaveScope::Mine, PageRequest::new(Some(5), Some(2), 10))
            .await
            .unwrap();
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 2);
    }

    #[actix_web::test]
    async fn only_parties_can_read_a_record() {
        let (service, _) = fixture();
        let leave = service.create(21, draft(1)).await.unwrap();

        assert!(service.get(21, leave.id).await.is_ok());
        assert!(service.get(20, leave.id).await.is_ok());
        assert!(matches!(
            service.get(22, leave.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
