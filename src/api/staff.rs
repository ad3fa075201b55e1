use crate::auth::{
    auth::AuthUser,
    handlers::{PASSWORD_LEN, fetch_credentials},
    jwt::{generate_activation_token, verify_token},
    password::{hash_password, verify_password},
};
use crate::config::Config;
use crate::directory::{Directory, Membership, StaffScope, membership, staff_scope};
use crate::error::{AppError, AppResult};
use crate::model::department::Department;
use crate::model::user::{USER_COLUMNS, User, UserStatus};
use crate::models::{Claims, TokenType};
use crate::utils::db_utils::{build_update_sql, execute_update};
use crate::utils::excel::{
    MAX_SHEET_BYTES, StaffExportRow, StaffImportRow, XLSX_CONTENT_TYPE, read_staff_sheet,
    staff_workbook,
};
use crate::utils::mailer::{Mailer, OutgoingMail};
use crate::utils::pagination::PageRequest;
use actix_multipart::Multipart;
use actix_web::http::header::{CONTENT_DISPOSITION, ContentType};
use actix_web::{Either, HttpResponse, web};
use chrono::NaiveDate;
use futures_util::TryStreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::{MySql, MySqlPool, QueryBuilder};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};

/// Columns a staff update may touch.
pub const UPDATABLE_FIELDS: &[&str] = &["realname", "telephone", "status", "department_id"];

/// Initial password of imported staff; they confirm it when activating.
pub const IMPORT_PASSWORD: &str = "111111";
const SHEET_FIELD: &str = "file";

#[derive(Deserialize, ToSchema)]
pub struct CreateStaff {
    #[schema(example = "Jane Doe")]
    pub realname: String,
    #[schema(example = "jane@example.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "111111")]
    pub password: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActivationQuery {
    /// Activation token from the mailed link
    pub token: String,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DownloadQuery {
    /// JSON array of user ids, e.g. `[1,2,3]`
    #[param(example = "[1,2]")]
    pub pks: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ActivateStaff {
    pub token: String,
    #[schema(example = "jane@example.com", format = "email", value_type = String)]
    pub email: String,
    #[schema(example = "111111")]
    pub password: String,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct StaffFilter {
    pub page: Option<u64>,
    #[serde(alias = "per_page")]
    pub size: Option<u64>,
    /// Only honoured for board members
    pub department_id: Option<u64>,
    /// Substring match
    pub realname: Option<String>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub date_joined_start: Option<NaiveDate>,
    #[schema(example = "2026-12-31", format = "date", value_type = Option<String>)]
    pub date_joined_end: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct StaffListResponse {
    pub data: Vec<User>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/departments").route(web::get().to(list_departments)))
        .service(
            web::resource("/staff")
                .route(web::get().to(list_staff))
                .route(web::post().to(create_staff)),
        )
        .service(
            web::resource("/staff/{id}")
                .route(web::put().to(update_staff))
                .route(web::patch().to(update_staff)),
        )
        .service(web::resource("/download").route(web::get().to(download_staff)))
        .service(web::resource("/upload").route(web::post().to(upload_staff)))
        .service(
            web::resource("/active")
                .route(web::get().to(activation_page))
                .route(web::post().to(activate_staff)),
        );
}

fn activation_path(config: &Config) -> String {
    format!("{}/staff/active", config.api_prefix.trim_end_matches('/'))
}

/// Link mailed to new staff; opens [`activation_page`].
pub fn activation_link(config: &Config, token: &str) -> String {
    format!(
        "{}{}?token={}",
        config.public_base_url.trim_end_matches('/'),
        activation_path(config),
        token
    )
}

fn activation_mail(
    config: &Config,
    user_id: u64,
    email: &str,
    realname: &str,
) -> AppResult<OutgoingMail> {
    let token = generate_activation_token(
        user_id,
        email,
        &config.jwt_secret,
        config.activation_token_ttl,
    )?;
    Ok(OutgoingMail {
        to: email.to_string(),
        subject: "Activate your account".to_string(),
        body: format!(
            "Hello {},\n\nYour account has been created. Open the link below to activate it:\n\n{}\n",
            realname,
            activation_link(config, &token)
        ),
    })
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn activation_form(action: &str, token: &str, email: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Activate your account</title></head>
<body>
<h1>Activate your account</h1>
<form method="post" action="{action}">
<input type="hidden" name="token" value="{token}">
<p><label>E-mail <input type="email" name="email" value="{email}" required></label></p>
<p><label>Password <input type="password" name="password" required></label></p>
<p><button type="submit">Activate</button></p>
</form>
</body>
</html>
"#,
        action = escape_html(action),
        token = escape_html(token),
        email = escape_html(email),
    )
}

fn decode_activation_token(token: &str, secret: &str) -> AppResult<Claims> {
    let claims = verify_token(token, secret).map_err(|e| {
        warn!(error = %e, "Rejected activation token");
        AppError::Validation("invalid or expired activation token".to_string())
    })?;
    if claims.token_type != TokenType::Activation {
        return Err(AppError::Validation("not an activation token".to_string()));
    }
    Ok(claims)
}

/// `pks` arrives as a JSON array string.
pub fn parse_pks(raw: &str) -> AppResult<Vec<u64>> {
    let pks: Vec<u64> = serde_json::from_str(raw)
        .map_err(|_| AppError::Validation("pks must be a JSON array of user ids".to_string()))?;
    if pks.is_empty() {
        return Err(AppError::Validation("select at least one user".to_string()));
    }
    Ok(pks)
}

fn export_query(scope: StaffScope, pks: &[u64]) -> QueryBuilder<'static, MySql> {
    let mut qb: QueryBuilder<MySql> = QueryBuilder::new(
        "SELECT u.realname, u.email, d.name AS department, u.date_joined, u.status \
         FROM users u LEFT JOIN departments d ON d.id = u.department_id WHERE u.id IN (",
    );
    let mut ids = qb.separated(", ");
    for id in pks {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");

    if let Some(department_id) = scope.department() {
        qb.push(" AND u.department_id = ").push_bind(department_id);
    }
    qb.push(" ORDER BY u.id");
    qb
}

/// Only the leader of the board may import staff.
pub fn check_upload_permission(member: &Membership, board_department: &str) -> AppResult<()> {
    if member.in_board(board_department) && member.is_leader() {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "only the board leader can import staff".to_string(),
    ))
}

/// Department id named by an imported row.
pub fn import_department(row: &StaffImportRow, departments: &HashMap<String, u64>) -> AppResult<u64> {
    let name = row.department.as_deref().ok_or_else(|| {
        AppError::Validation(format!("no department given for {}", row.email))
    })?;
    departments
        .get(name)
        .copied()
        .ok_or_else(|| AppError::Validation(format!("department {name} does not exist")))
}

async fn read_sheet_upload(payload: &mut Multipart) -> AppResult<Vec<u8>> {
    let read_error = |e: actix_multipart::MultipartError| {
        AppError::Validation(format!("failed to read multipart data: {e}"))
    };

    while let Some(mut field) = payload.try_next().await.map_err(read_error)? {
        if field.name() != Some(SHEET_FIELD) {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if !filename.ends_with(".xlsx") {
            return Err(AppError::Validation("only .xlsx files are accepted".to_string()));
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.try_next().await.map_err(read_error)? {
            if data.len() + chunk.len() > MAX_SHEET_BYTES {
                return Err(AppError::Validation("file must not exceed 5MB".to_string()));
            }
            data.extend_from_slice(&chunk);
        }
        return Ok(data);
    }

    Err(AppError::Validation("no file provided".to_string()))
}

pub fn validate_new_staff(payload: &CreateStaff) -> AppResult<()> {
    if payload.realname.trim().is_empty() {
        return Err(AppError::Validation("realname is required".to_string()));
    }
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid e-mail is required".to_string()));
    }
    if !PASSWORD_LEN.contains(&payload.password.chars().count()) {
        return Err(AppError::Validation(
            "password must be 6 to 20 characters long".to_string(),
        ));
    }
    Ok(())
}

/// An activation token is only good for the address it was mailed to.
pub fn check_activation_claims(claims: &Claims, email: &str) -> AppResult<()> {
    if claims.token_type != TokenType::Activation {
        return Err(AppError::Validation("not an activation token".to_string()));
    }
    if claims.sub != email {
        return Err(AppError::Validation(
            "token does not belong to this e-mail".to_string(),
        ));
    }
    Ok(())
}

/// Rejects updates that would reach outside the caller's scope or set an
/// unknown status.
pub fn check_staff_update(scope: StaffScope, target: &User, payload: &Value) -> AppResult<()> {
    if !scope.covers(target.department_id) {
        return Err(AppError::Forbidden(
            "user is outside your department".to_string(),
        ));
    }

    if let Some(status) = payload.get("status") {
        let valid = status
            .as_i64()
            .and_then(|s| i32::try_from(s).ok())
            .is_some_and(|s| UserStatus::try_from(s).is_ok());
        if !valid {
            return Err(AppError::Validation("unknown status".to_string()));
        }
    }

    if let Some(department) = payload.get("department_id") {
        let department = department.as_u64();
        if department.is_none() || !scope.covers(department) {
            return Err(AppError::Forbidden(
                "cannot move staff to that department".to_string(),
            ));
        }
    }

    Ok(())
}

fn push_staff_filters(qb: &mut QueryBuilder<'_, MySql>, scope: StaffScope, filter: &StaffFilter) {
    qb.push(" WHERE 1=1");

    let department = scope.department().or(filter.department_id);
    if let Some(department_id) = department {
        qb.push(" AND department_id = ").push_bind(department_id);
    }

    if let Some(realname) = filter.realname.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND realname LIKE ").push_bind(format!("%{realname}%"));
    }

    if let Some(start) = filter.date_joined_start {
        qb.push(" AND DATE(date_joined) >= ").push_bind(start);
    }

    if let Some(end) = filter.date_joined_end {
        qb.push(" AND DATE(date_joined) <= ").push_bind(end);
    }
}

#[utoipa::path(
    get,
    path = "/api/staff/departments",
    responses(
        (status = 200, description = "All departments", body = [Department]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    let departments = sqlx::query_as::<_, Department>(
        "SELECT id, name, intro, leader_id, manager_id FROM departments ORDER BY id",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(departments))
}

#[utoipa::path(
    get,
    path = "/api/staff/staff",
    params(StaffFilter),
    responses(
        (status = 200, description = "Paginated staff list, newest joined first", body = StaffListResponse),
        (status = 403, description = "Only board members and department leaders")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
pub async fn list_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    directory: web::Data<dyn Directory>,
    query: web::Query<StaffFilter>,
) -> AppResult<HttpResponse> {
    let member = membership(directory.get_ref(), auth.user_id).await?;
    let scope = staff_scope(&member, &config.board_department)?;
    let page = PageRequest::new(query.page, query.size, config.page_size);

    let mut count_qb: QueryBuilder<MySql> = QueryBuilder::new("SELECT COUNT(*) FROM users");
    push_staff_filters(&mut count_qb, scope, &query);
    let total = count_qb
        .build_query_scalar::<i64>()
        .fetch_one(pool.get_ref())
        .await?;

    let mut data_qb: QueryBuilder<MySql> =
        QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
    push_staff_filters(&mut data_qb, scope, &query);
    data_qb
        .push(" ORDER BY date_joined DESC, id DESC LIMIT ")
        .push_bind(page.size)
        .push(" OFFSET ")
        .push_bind(page.offset());

    debug!(sql = data_qb.sql(), ?scope, "Fetching staff");
    let staff = data_qb
        .build_query_as::<User>()
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(StaffListResponse {
        data: staff,
        page: page.page,
        per_page: page.size,
        total,
    }))
}

/// Add staff to the caller's department
#[utoipa::path(
    post,
    path = "/api/staff/staff",
    request_body = CreateStaff,
    responses(
        (status = 201, description = "Staff created, activation mail queued", body = User),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Only department leaders"),
        (status = 409, description = "E-mail already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
#[instrument(name = "staff_create", skip_all, fields(leader_id = auth.user_id))]
pub async fn create_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    directory: web::Data<dyn Directory>,
    mailer: web::Data<Mailer>,
    payload: web::Json<CreateStaff>,
) -> AppResult<HttpResponse> {
    validate_new_staff(&payload)?;

    let member = membership(directory.get_ref(), auth.user_id).await?;
    if !member.is_leader() {
        return Err(AppError::Forbidden(
            "only department leaders can add staff".to_string(),
        ));
    }

    let email = payload.email.trim();
    let taken = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool.get_ref())
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(format!("{email} is already registered")));
    }

    let hashed = hash_password(&payload.password)?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO users
        (realname, email, password, telephone, is_staff, is_superuser, status, date_joined, department_id)
        VALUES (?, ?, ?, '', 1, 0, ?, NOW(), ?)
        "#,
    )
    .bind(payload.realname.trim())
    .bind(email)
    .bind(hashed)
    .bind(UserStatus::Inactive)
    .bind(member.department.id)
    .execute(pool.get_ref())
    .await;

    let user_id = match inserted {
        Ok(result) => result.last_insert_id(),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AppError::Conflict(format!("{email} is already registered")));
        }
        Err(e) => return Err(e.into()),
    };

    let user = directory
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {user_id} vanished after insert")))?;

    mailer.dispatch(activation_mail(&config, user_id, email, &user.realname)?);

    info!(user_id, department_id = member.department.id, "Staff created");
    Ok(HttpResponse::Created().json(user))
}

/// Partial update of a staff record
#[utoipa::path(
    put,
    path = "/api/staff/staff/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User ID")
    ),
    request_body(
        content = Object,
        description = "Any of realname, telephone, status, department_id",
        example = json!({"status": 3})
    ),
    responses(
        (status = 200, description = "Updated user", body = User),
        (status = 400, description = "Unknown field or value"),
        (status = 403, description = "User outside caller's scope"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
pub async fn update_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    directory: web::Data<dyn Directory>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> AppResult<HttpResponse> {
    let user_id = path.into_inner();

    let member = membership(directory.get_ref(), auth.user_id).await?;
    let scope = staff_scope(&member, &config.board_department)?;

    let target = directory
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))?;

    let update = build_update_sql("users", &body, UPDATABLE_FIELDS, "id", user_id)?;
    check_staff_update(scope, &target, &body)?;

    execute_update(pool.get_ref(), update).await?;

    let user = directory
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id} not found")))?;

    info!(user_id, by = auth.user_id, "Staff updated");
    Ok(HttpResponse::Ok().json(user))
}

/// Form opened from the activation mail
#[utoipa::path(
    get,
    path = "/api/staff/active",
    params(ActivationQuery),
    responses(
        (status = 200, description = "HTML activation form", content_type = "text/html", body = String),
        (status = 400, description = "Invalid or expired activation token")
    ),
    tag = "Staff"
)]
pub async fn activation_page(
    config: web::Data<Config>,
    query: web::Query<ActivationQuery>,
) -> AppResult<HttpResponse> {
    let claims = decode_activation_token(&query.token, &config.jwt_secret)?;
    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(activation_form(&activation_path(&config), &query.token, &claims.sub)))
}

/// Accepts JSON or the urlencoded form served by [`activation_page`]
#[utoipa::path(
    post,
    path = "/api/staff/active",
    request_body = ActivateStaff,
    responses(
        (status = 200, description = "Account activated"),
        (status = 400, description = "Invalid token, e-mail or password"),
        (status = 403, description = "Account locked")
    ),
    tag = "Staff"
)]
pub async fn activate_staff(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: Either<web::Json<ActivateStaff>, web::Form<ActivateStaff>>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();
    let claims = decode_activation_token(&payload.token, &config.jwt_secret)?;
    check_activation_claims(&claims, payload.email.trim())?;

    let creds = fetch_credentials(pool.get_ref(), &claims.sub)
        .await?
        .ok_or_else(|| AppError::Validation("account does not exist".to_string()))?;

    if !verify_password(&payload.password, &creds.password) {
        return Err(AppError::Validation("password is incorrect".to_string()));
    }

    match creds.status {
        UserStatus::Locked => {
            return Err(AppError::Forbidden(
                "account locked, please contact the administrator".to_string(),
            ));
        }
        UserStatus::Active => {}
        UserStatus::Inactive => {
            sqlx::query("UPDATE users SET status = ? WHERE id = ?")
                .bind(UserStatus::Active)
                .bind(creds.id)
                .execute(pool.get_ref())
                .await?;
            info!(user_id = creds.id, "Account activated");
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "account activated" })))
}

/// Export selected staff as an xlsx attachment
#[utoipa::path(
    get,
    path = "/api/staff/download",
    params(DownloadQuery),
    responses(
        (status = 200, description = "Spreadsheet of the selected staff within the caller's scope",
            content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", body = String),
        (status = 400, description = "pks is not a JSON array of ids"),
        (status = 403, description = "Only board members and department leaders")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
pub async fn download_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    directory: web::Data<dyn Directory>,
    query: web::Query<DownloadQuery>,
) -> AppResult<HttpResponse> {
    let pks = parse_pks(&query.pks)?;

    let member = membership(directory.get_ref(), auth.user_id).await?;
    let scope = staff_scope(&member, &config.board_department)?;

    let mut qb = export_query(scope, &pks);
    debug!(sql = qb.sql(), ?scope, "Exporting staff");
    let rows = qb
        .build_query_as::<StaffExportRow>()
        .fetch_all(pool.get_ref())
        .await?;

    let workbook = staff_workbook(&rows)?;
    info!(user_id = auth.user_id, rows = rows.len(), "Staff exported");

    Ok(HttpResponse::Ok()
        .content_type(XLSX_CONTENT_TYPE)
        .insert_header((CONTENT_DISPOSITION, "attachment; filename=\"staff.xlsx\""))
        .body(workbook))
}

/// Bulk import staff from an xlsx sheet
#[utoipa::path(
    post,
    path = "/api/staff/upload",
    request_body(content = String, description = "multipart/form-data with a `file` field holding an .xlsx sheet (Name, Email, Department columns)", content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Staff created inactive, activation mails queued", body = Object, example = json!({"created": 2})),
        (status = 400, description = "Unreadable sheet, bad row or unknown department"),
        (status = 403, description = "Only the board leader"),
        (status = 409, description = "An e-mail is already registered")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Staff"
)]
#[instrument(name = "staff_import", skip_all, fields(leader_id = auth.user_id))]
pub async fn upload_staff(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    directory: web::Data<dyn Directory>,
    mailer: web::Data<Mailer>,
    mut payload: Multipart,
) -> AppResult<HttpResponse> {
    let member = membership(directory.get_ref(), auth.user_id).await?;
    check_upload_permission(&member, &config.board_department)?;

    let rows = read_staff_sheet(read_sheet_upload(&mut payload).await?)?;

    let departments: HashMap<String, u64> =
        sqlx::query_as::<_, (String, u64)>("SELECT name, id FROM departments")
            .fetch_all(pool.get_ref())
            .await?
            .into_iter()
            .collect();
    let placed = rows
        .iter()
        .map(|row| import_department(row, &departments).map(|id| (row, id)))
        .collect::<AppResult<Vec<_>>>()?;

    let mut tx = pool.begin().await?;
    let mut created = Vec::with_capacity(placed.len());
    for (row, department_id) in placed {
        let inserted = sqlx::query(
            r#"
            INSERT INTO users
            (realname, email, password, telephone, is_staff, is_superuser, status, date_joined, department_id)
            VALUES (?, ?, ?, '', 1, 0, ?, NOW(), ?)
            "#,
        )
        .bind(&row.realname)
        .bind(&row.email)
        .bind(hash_password(IMPORT_PASSWORD)?)
        .bind(UserStatus::Inactive)
        .bind(department_id)
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(result) => created.push((result.last_insert_id(), row)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(AppError::Conflict(format!(
                    "{} is already registered",
                    row.email
                )));
            }
            Err(e) => return Err(e.into()),
        }
    }
    tx.commit().await?;

    for (user_id, row) in &created {
        mailer.dispatch(activation_mail(&config, *user_id, &row.email, &row.realname)?);
    }

    info!(created = created.len(), "Staff imported");
    Ok(HttpResponse::Created().json(json!({ "created": created.len() })))
}
