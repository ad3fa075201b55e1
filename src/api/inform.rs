use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::directory::{Directory, department_of};
use crate::error::{AppError, AppResult};
use crate::model::inform::{Audience, Inform};
use crate::utils::pagination::{PageQuery, PageRequest};
use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{MySql, MySqlPool, QueryBuilder};
use tracing::{debug, info};
use utoipa::ToSchema;

const INFORM_SELECT: &str = r#"
    SELECT i.id, i.title, i.content, i.create_time, i.public, i.author_id,
           u.realname AS author_name,
           (SELECT COUNT(*) FROM inform_reads r
             WHERE r.inform_id = i.id AND r.user_id = ?) AS read_flag,
           (SELECT COUNT(*) FROM inform_reads r
             WHERE r.inform_id = i.id) AS read_count
    FROM informs i
    JOIN users u ON u.id = i.author_id
"#;

/// Binds, in order: caller department, caller id.
const VISIBLE_TO: &str = r#"
    (i.public = 1
     OR EXISTS (SELECT 1 FROM inform_departments d
                WHERE d.inform_id = i.id AND d.department_id = ?)
     OR i.author_id = ?)
"#;

#[derive(Deserialize, ToSchema)]
pub struct CreateInform {
    #[schema(example = "Office closed on Friday")]
    pub title: String,
    #[schema(example = "<p>Maintenance work in the building</p>")]
    pub content: String,
    /// `0` publishes to everyone
    #[schema(example = json!([0]))]
    pub department_ids: Vec<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct ReadInform {
    #[schema(example = 1)]
    pub inform_pk: u64,
}

#[derive(sqlx::FromRow)]
struct InformRow {
    #[sqlx(flatten)]
    inform: Inform,
    read_flag: i64,
    read_count: i64,
}

#[derive(Serialize, ToSchema)]
pub struct InformItem {
    #[serde(flatten)]
    pub inform: Inform,
    pub is_read: bool,
    #[schema(example = 3)]
    pub read_count: i64,
}

impl From<InformRow> for InformItem {
    fn from(row: InformRow) -> Self {
        Self {
            inform: row.inform,
            is_read: row.read_flag > 0,
            read_count: row.read_count,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct InformListResponse {
    pub data: Vec<InformItem>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/inform")
            .route(web::get().to(list_informs))
            .route(web::post().to(create_inform)),
    )
    .service(
        web::resource("/inform/{id}")
            .route(web::get().to(get_inform))
            .route(web::delete().to(delete_inform)),
    )
    .service(web::resource("/read").route(web::post().to(read_inform)));
}

/// Informs visible to `user_id`, newest first.
pub async fn visible_informs(
    pool: &MySqlPool,
    user_id: u64,
    department_id: Option<u64>,
    page: PageRequest,
) -> AppResult<(Vec<InformItem>, i64)> {
    let count_sql = format!("SELECT COUNT(*) FROM informs i WHERE {VISIBLE_TO}");
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(department_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    let data_sql = format!(
        "{INFORM_SELECT} WHERE {VISIBLE_TO} ORDER BY i.create_time DESC, i.id DESC LIMIT ? OFFSET ?"
    );
    debug!(user_id, page = page.page, size = page.size, "Fetching informs");

    let rows = sqlx::query_as::<_, InformRow>(&data_sql)
        .bind(user_id)
        .bind(department_id)
        .bind(user_id)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(pool)
        .await?;

    Ok((rows.into_iter().map(InformItem::from).collect(), total))
}

async fn fetch_visible(
    pool: &MySqlPool,
    inform_id: u64,
    user_id: u64,
    department_id: Option<u64>,
) -> AppResult<Option<InformItem>> {
    let sql = format!("{INFORM_SELECT} WHERE i.id = ? AND {VISIBLE_TO}");
    let row = sqlx::query_as::<_, InformRow>(&sql)
        .bind(user_id)
        .bind(inform_id)
        .bind(department_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(InformItem::from))
}

/// Keeps only ids of departments that exist.
async fn known_departments(pool: &MySqlPool, ids: &[u64]) -> AppResult<Vec<u64>> {
    let mut qb: QueryBuilder<MySql> = QueryBuilder::new("SELECT id FROM departments WHERE id IN (");
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let known = qb.build_query_scalar::<u64>().fetch_all(pool).await?;
    Ok(known)
}

/* =========================
Publish
========================= */
#[utoipa::path(
    post,
    path = "/api/inform/inform",
    request_body = CreateInform,
    responses(
        (status = 201, description = "Inform published", body = InformItem),
        (status = 400, description = "Missing title or audience"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Inform"
)]
pub async fn create_inform(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    directory: web::Data<dyn Directory>,
    payload: web::Json<CreateInform>,
) -> AppResult<HttpResponse> {
    let payload = payload.into_inner();

    if payload.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }

    let audience = Audience::from_department_ids(&payload.department_ids)
        .ok_or_else(|| AppError::Validation("department_ids must not be empty".to_string()))?;

    let targets = match &audience {
        Audience::Public => Vec::new(),
        Audience::Departments(ids) => {
            let known = known_departments(pool.get_ref(), ids).await?;
            if known.is_empty() {
                return Err(AppError::Validation(
                    "none of the given departments exist".to_string(),
                ));
            }
            known
        }
    };

    let mut tx = pool.begin().await?;

    let inform_id = sqlx::query(
        r#"
        INSERT INTO informs (title, content, public, author_id, create_time)
        VALUES (?, ?, ?, ?, NOW())
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.content)
    .bind(audience == Audience::Public)
    .bind(auth.user_id)
    .execute(&mut *tx)
    .await?
    .last_insert_id();

    for department_id in &targets {
        sqlx::query("INSERT INTO inform_departments (inform_id, department_id) VALUES (?, ?)")
            .bind(inform_id)
            .bind(department_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    info!(inform_id, author_id = auth.user_id, departments = ?targets, "Inform published");

    let department_id = department_of(directory.get_ref(), auth.user_id).await?;
    let item = fetch_visible(pool.get_ref(), inform_id, auth.user_id, department_id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("inform {inform_id} vanished after insert")))?;

    Ok(HttpResponse::Created().json(item))
}

#[utoipa::path(
    get,
    path = "/api/inform/inform",
    params(PageQuery),
    responses(
        (status = 200, description = "Visible informs, newest first", body = InformListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Inform"
)]
pub async fn list_informs(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    directory: web::Data<dyn Directory>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = PageRequest::from_query(&query, config.page_size);
    let department_id = department_of(directory.get_ref(), auth.user_id).await?;

    let (data, total) = visible_informs(pool.get_ref(), auth.user_id, department_id, page).await?;

    Ok(HttpResponse::Ok().json(InformListResponse {
        data,
        page: page.page,
        per_page: page.size,
        total,
    }))
}

#[utoipa::path(
    get,
    path = "/api/inform/inform/{inform_id}",
    params(
        ("inform_id" = u64, Path, description = "Inform ID")
    ),
    responses(
        (status = 200, description = "Inform with read count", body = InformItem),
        (status = 404, description = "Inform not found or not visible")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Inform"
)]
pub async fn get_inform(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    directory: web::Data<dyn Directory>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let inform_id = path.into_inner();
    let department_id = department_of(directory.get_ref(), auth.user_id).await?;

    let item = fetch_visible(pool.get_ref(), inform_id, auth.user_id, department_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("inform {inform_id} not found")))?;

    Ok(HttpResponse::Ok().json(item))
}

#[utoipa::path(
    delete,
    path = "/api/inform/inform/{inform_id}",
    params(
        ("inform_id" = u64, Path, description = "Inform ID")
    ),
    responses(
        (status = 204, description = "Inform deleted"),
        (status = 403, description = "Only the author may delete"),
        (status = 404, description = "Inform not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Inform"
)]
pub async fn delete_inform(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    let inform_id = path.into_inner();

    let author_id = sqlx::query_scalar::<_, u64>("SELECT author_id FROM informs WHERE id = ?")
        .bind(inform_id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("inform {inform_id} not found")))?;

    if author_id != auth.user_id {
        return Err(AppError::Forbidden(
            "only the author can delete an inform".to_string(),
        ));
    }

    sqlx::query("DELETE FROM informs WHERE id = ?")
        .bind(inform_id)
        .execute(pool.get_ref())
        .await?;

    info!(inform_id, "Inform deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Marks an inform read; repeating it changes nothing.
#[utoipa::path(
    post,
    path = "/api/inform/read",
    request_body = ReadInform,
    responses(
        (status = 200, description = "Read recorded"),
        (status = 400, description = "Unknown inform")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Inform"
)]
pub async fn read_inform(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<ReadInform>,
) -> AppResult<HttpResponse> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM informs WHERE id = ?")
        .bind(payload.inform_pk)
        .fetch_one(pool.get_ref())
        .await?;

    if exists == 0 {
        return Err(AppError::Validation(format!(
            "inform {} does not exist",
            payload.inform_pk
        )));
    }

    sqlx::query(
        r#"
        INSERT IGNORE INTO inform_reads (inform_id, user_id, read_time)
        VALUES (?, ?, NOW())
        "#,
    )
    .bind(payload.inform_pk)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(json!({ "message": "ok" })))
}
