use crate::api::inform::visible_informs;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::directory::{Directory, department_of, membership};
use crate::error::AppResult;
use crate::model::leave_request::{LEAVE_COLUMNS, LeaveRequest};
use crate::utils::pagination::PageRequest;
use actix_web::{HttpResponse, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::ToSchema;

const LATEST_LIMIT: u64 = 10;

#[derive(Debug, Serialize, sqlx::FromRow, ToSchema)]
pub struct DepartmentStaffCount {
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = 12)]
    pub staff_count: i64,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/latest/inform").route(web::get().to(latest_informs)))
        .service(web::resource("/latest/absent").route(web::get().to(latest_leaves)))
        .service(web::resource("/department/staff/count").route(web::get().to(staff_count)))
        .service(web::resource("/health").route(web::get().to(health)));
}

#[utoipa::path(
    get,
    path = "/api/home/latest/inform",
    responses(
        (status = 200, description = "Ten newest visible informs", body = [InformItem])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Home"
)]
pub async fn latest_informs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    directory: web::Data<dyn Directory>,
) -> AppResult<HttpResponse> {
    let department_id = department_of(directory.get_ref(), auth.user_id).await?;
    let page = PageRequest::new(Some(1), Some(LATEST_LIMIT), LATEST_LIMIT);
    let (informs, _) = visible_informs(pool.get_ref(), auth.user_id, department_id, page).await?;
    Ok(HttpResponse::Ok().json(informs))
}

/// Board members see every department's requests, everyone else their own department's.
#[utoipa::path(
    get,
    path = "/api/home/latest/absent",
    responses(
        (status = 200, description = "Ten newest leave requests", body = [LeaveRequest])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Home"
)]
pub async fn latest_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    directory: web::Data<dyn Directory>,
) -> AppResult<HttpResponse> {
    let member = membership(directory.get_ref(), auth.user_id).await?;

    let leaves = if member.in_board(&config.board_department) {
        let sql = format!(
            "SELECT {LEAVE_COLUMNS} FROM absents ORDER BY create_time DESC, id DESC LIMIT ?"
        );
        sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(LATEST_LIMIT)
            .fetch_all(pool.get_ref())
            .await?
    } else {
        let sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS} FROM absents
            WHERE requester_id IN (SELECT id FROM users WHERE department_id = ?)
            ORDER BY create_time DESC, id DESC
            LIMIT ?
            "#
        );
        sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(member.department.id)
            .bind(LATEST_LIMIT)
            .fetch_all(pool.get_ref())
            .await?
    };

    Ok(HttpResponse::Ok().json(leaves))
}

#[utoipa::path(
    get,
    path = "/api/home/department/staff/count",
    responses(
        (status = 200, description = "Staff per department", body = [DepartmentStaffCount])
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Home"
)]
pub async fn staff_count(_auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    let counts = sqlx::query_as::<_, DepartmentStaffCount>(
        r#"
        SELECT d.name, COUNT(u.id) AS staff_count
        FROM departments d
        LEFT JOIN users u ON u.department_id = d.id
        GROUP BY d.id, d.name
        ORDER BY d.id
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(counts))
}

#[utoipa::path(
    get,
    path = "/api/home/health",
    responses(
        (status = 200, description = "Service is up", body = Object, example = json!({"code": 200}))
    ),
    tag = "Home"
)]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "code": 200 }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::middleware::auth_middleware;
    use crate::config::test_config;
    use actix_web::test::{TestRequest, call_and_read_body_json, call_service, init_service};
    use actix_web::{App, middleware::from_fn};

    #[actix_web::test]
    async fn health_needs_no_token() {
        let app = init_service(
            App::new().app_data(web::Data::new(test_config())).service(
                web::scope("/api")
                    .wrap(from_fn(auth_middleware))
                    .service(web::scope("/home").configure(configure)),
            ),
        )
        .await;

        let req = TestRequest::get().uri("/api/home/health").to_request();
        let body: serde_json::Value = call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"code": 200}));

        let req = TestRequest::get()
            .uri("/api/home/department/staff/count")
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::UNAUTHORIZED);
    }
}
