use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppResult;
use crate::leave::{LeaveService, service::LeaveDraft};
use crate::model::leave_request::{LeaveRequest, LeaveScope, LeaveStatus};
use crate::utils::pagination::PageRequest;
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "Family trip")]
    pub title: String,
    #[serde(default)]
    #[schema(example = "Two days off to visit family")]
    pub request_content: String,
    #[schema(example = 1)]
    pub absent_type_id: u64,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-06", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct DecideLeave {
    /// 2 = approve, 3 = reject
    #[schema(value_type = i32, example = 2)]
    pub status: LeaveStatus,
    #[serde(default)]
    #[schema(example = "Enjoy your trip")]
    pub response_content: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    #[schema(example = "sub")]
    /// `sub` lists requests waiting on the caller; anything else lists the caller's own
    pub who: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,
    #[serde(alias = "per_page")]
    #[schema(example = 10)]
    /// Items per page
    pub size: Option<u64>,
}

impl LeaveFilter {
    fn scope(&self) -> LeaveScope {
        self.who
            .as_deref()
            .and_then(|who| who.parse().ok())
            .unwrap_or(LeaveScope::Mine)
    }
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/type").route(web::get().to(leave_types)))
        .service(web::resource("/responder").route(web::get().to(responder)))
        .service(
            web::resource("/absent")
                .route(web::get().to(leave_list))
                .route(web::post().to(create_leave)),
        )
        .service(
            web::resource("/absent/{id}")
                .route(web::get().to(get_leave))
                .route(web::put().to(decide_leave))
                .route(web::patch().to(decide_leave)),
        );
}

/// All leave types
#[utoipa::path(
    get,
    path = "/api/absent/type",
    responses(
        (status = 200, description = "Leave types", body = [LeaveType]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_types(
    _auth: AuthUser,
    service: web::Data<LeaveService>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(service.leave_types().await?))
}

/// Who would approve the caller's next leave request (`null` for the board leader)
#[utoipa::path(
    get,
    path = "/api/absent/responder",
    responses(
        (status = 200, description = "Approver or null", body = Option<User>),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Department or leader not configured")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn responder(auth: AuthUser, service: web::Data<LeaveService>) -> AppResult<HttpResponse> {
    let approver = service.responder(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(approver))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/absent/absent",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid dates or leave type"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Department or leader not configured")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    payload: web::Json<CreateLeave>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();
    let leave = service
        .create(
            auth.user_id,
            LeaveDraft {
                absent_type_id: payload.absent_type_id,
                title: payload.title,
                request_content: payload.request_content,
                start_date: payload.start_date,
                end_date: payload.end_date,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(leave))
}

/* =========================
Approve / reject (resolved approver only)
========================= */
#[utoipa::path(
    put,
    path = "/api/absent/absent/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to decide")
    ),
    request_body = DecideLeave,
    responses(
        (status = 200, description = "Leave request decided", body = LeaveRequest),
        (status = 400, description = "Status is not approve/reject"),
        (status = 403, description = "Caller is not the approver"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn decide_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
    payload: web::Json<DecideLeave>,
) -> AppResult<HttpResponse> {
    let leave_id = path.into_inner();
    let payload = payload.into_inner();

    let leave = service
        .decide(
            auth.user_id,
            leave_id,
            payload.status,
            payload.response_content,
        )
        .await?;

    Ok(HttpResponse::Ok().json(leave))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/absent/absent/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let leave = service.get(auth.user_id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/absent/absent",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list, newest first", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<LeaveService>,
    config: web::Data<Config>,
    query: web::Query<LeaveFilter>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::new(query.page, query.size, config.page_size);
    let result = service.list(auth.user_id, query.scope(), page).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: result.items,
        page: page.page,
        per_page: page.size,
        total: result.total,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{jwt::generate_access_token, middleware::auth_middleware};
    use crate::config::{Config, test_config};
    use crate::directory::memory::{InMemoryDirectory, department, user};
    use crate::leave::memory::InMemoryLeaveStore;
    use actix_web::{
        App,
        http::StatusCode,
        middleware::from_fn,
        test::{self, TestRequest},
    };
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn service() -> LeaveService {
        let dir = InMemoryDirectory::default();
        dir.put_department(department(1, "Board", Some(10), None));
        dir.put_department(department(2, "Engineering", Some(20), Some(10)));
        for (id, dept) in [(10, 1), (20, 2), (21, 2), (22, 2)] {
            dir.put_user(user(id, Some(dept)));
        }
        let store = InMemoryLeaveStore::with_types(&["personal", "sick"]);
        LeaveService::new(Arc::new(dir), Arc::new(store), "Board")
    }

    fn bearer(config: &Config, user_id: u64) -> (&'static str, String) {
        let token =
            generate_access_token(user_id, &format!("user{user_id}@example.com"), &config.jwt_secret, 60)
                .unwrap();
        ("Authorization", format!("JWT {token}"))
    }

    macro_rules! app {
        ($config:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($config.clone()))
                    .app_data(web::Data::new(service()))
                    .service(
                        web::scope("/api")
                            .wrap(from_fn(auth_middleware))
                            .service(web::scope("/absent").configure(configure)),
                    ),
            )
            .await
        };
    }

    fn new_leave(day: u32) -> Value {
        json!({
            "title": format!("leave {day}"),
            "request_content": "please",
            "absent_type_id": 1,
            "start_date": format!("2026-04-{day:02}"),
            "end_date": format!("2026-04-{:02}", day + 1),
        })
    }

    #[actix_web::test]
    async fn rejects_missing_token() {
        let config = test_config();
        let app = app!(config);
        let req = TestRequest::get().uri("/api/absent/absent").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn create_then_approve_flow() {
        let config = test_config();
        let app = app!(config);

        let req = TestRequest::post()
            .uri("/api/absent/absent")
            .insert_header(bearer(&config, 21))
            .set_json(new_leave(1))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["status"], 1);
        assert_eq!(created["responder_id"], 20);
        let id = created["id"].as_u64().unwrap();

        // a colleague cannot decide
        let req = TestRequest::put()
            .uri(&format!("/api/absent/absent/{id}"))
            .insert_header(bearer(&config, 22))
            .set_json(json!({"status": 2, "response_content": "ok"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        // the leader sees it under `who=sub` and approves it
        let req = TestRequest::get()
            .uri("/api/absent/absent?who=sub")
            .insert_header(bearer(&config, 20))
            .to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed["total"], 1);
        assert_eq!(listed["data"][0]["id"], id);

        let req = TestRequest::patch()
            .uri(&format!("/api/absent/absent/{id}"))
            .insert_header(bearer(&config, 20))
            .set_json(json!({"status": 2, "response_content": "enjoy"}))
            .to_request();
        let decided: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(decided["status"], 2);
        assert_eq!(decided["response_content"], "enjoy");

        let req = TestRequest::put()
            .uri(&format!("/api/absent/absent/{id}"))
            .insert_header(bearer(&config, 20))
            .set_json(json!({"status": 3}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "invalid_state");
    }

    #[actix_web::test]
    async fn board_leader_is_auto_approved() {
        let config = test_config();
        let app = app!(config);

        let req = TestRequest::get()
            .uri("/api/absent/responder")
            .insert_header(bearer(&config, 10))
            .to_request();
        let responder: Value = test::call_and_read_body_json(&app, req).await;
        assert!(responder.is_null());

        let req = TestRequest::post()
            .uri("/api/absent/absent")
            .insert_header(bearer(&config, 10))
            .set_json(new_leave(2))
            .to_request();
        let created: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created["status"], 2);
        assert!(created["responder_id"].is_null());
    }

    #[actix_web::test]
    async fn bad_dates_are_a_validation_error() {
        let config = test_config();
        let app = app!(config);

        let mut body = new_leave(9);
        body["end_date"] = json!("2026-04-01");
        let req = TestRequest::post()
            .uri("/api/absent/absent")
            .insert_header(bearer(&config, 21))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn own_list_pages_newest_first() {
        let config = test_config();
        let app = app!(config);

        for day in [1, 3, 5] {
            let req = TestRequest::post()
                .uri("/api/absent/absent")
                .insert_header(bearer(&config, 22))
                .set_json(new_leave(day))
                .to_request();
            assert!(test::call_service(&app, req).await.status().is_success());
        }

        let req = TestRequest::get()
            .uri("/api/absent/absent?page=1&size=2")
            .insert_header(bearer(&config, 22))
            .to_request();
        let first: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(first["total"], 3);
        assert_eq!(first["data"][0]["title"], "leave 5");
        assert_eq!(first["data"][1]["title"], "leave 3");

        let req = TestRequest::get()
            .uri("/api/absent/absent?page=4&size=2")
            .insert_header(bearer(&config, 22))
            .to_request();
        let beyond: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(beyond["data"].as_array().unwrap().len(), 0);

        let req = TestRequest::get()
            .uri("/api/absent/type")
            .insert_header(bearer(&config, 22))
            .to_request();
        let types: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(types.as_array().unwrap().len(), 2);
    }
}
