use crate::{
    auth::{
        auth::AuthUser,
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    directory::Directory,
    error::{AppError, AppResult},
    model::user::{User, UserStatus},
    models::{LoginReqDto, LoginResponse, ResetPwdReq, UserCredentials},
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument};

pub(crate) const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 6..=20;

/// Checks the three fields of a password change, in the order a user
/// would fix them.
pub fn validate_password_change(req: &ResetPwdReq) -> AppResult<()> {
    for pwd in [&req.oldpwd, &req.pwd1, &req.pwd2] {
        if !PASSWORD_LEN.contains(&pwd.chars().count()) {
            return Err(AppError::Validation(
                "passwords must be 6 to 20 characters long".to_string(),
            ));
        }
    }
    if req.pwd1 != req.pwd2 {
        return Err(AppError::Validation(
            "the two new passwords do not match".to_string(),
        ));
    }
    Ok(())
}

pub(crate) async fn fetch_credentials(pool: &MySqlPool, email: &str) -> AppResult<Option<UserCredentials>> {
    let creds = sqlx::query_as::<_, UserCredentials>(
        r#"
        SELECT id, email, password, status
        FROM users
        WHERE email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(creds)
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing e-mail or password"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account not activated or locked")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, directory, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    directory: web::Data<dyn Directory>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    if user.email.trim().is_empty() || user.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let creds = fetch_credentials(pool.get_ref(), user.email.trim())
        .await?
        .ok_or_else(|| {
            info!("Invalid credentials: user not found");
            AppError::Unauthenticated("invalid credentials".to_string())
        })?;

    debug!(user_id = creds.id, "Verifying password");
    if !verify_password(&user.password, &creds.password) {
        info!("Invalid credentials: password mismatch");
        return Err(AppError::Unauthenticated("invalid credentials".to_string()));
    }

    match creds.status {
        UserStatus::Active => {}
        UserStatus::Inactive => {
            return Err(AppError::Forbidden(
                "account not activated, please contact the administrator".to_string(),
            ));
        }
        UserStatus::Locked => {
            return Err(AppError::Forbidden(
                "account locked, please contact the administrator".to_string(),
            ));
        }
    }

    let token = generate_access_token(
        creds.id,
        &creds.email,
        &config.jwt_secret,
        config.access_token_ttl,
    )?;

    // non-fatal
    if let Err(e) = sqlx::query("UPDATE users SET last_login = NOW() WHERE id = ?")
        .bind(creds.id)
        .execute(pool.get_ref())
        .await
    {
        tracing::error!(error = %e, "Failed to update last_login");
    }

    let profile = directory
        .get_user(creds.id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("user {} vanished during login", creds.id)))?;

    info!(user_id = creds.id, "Login successful");
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        user: profile,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/resetpwd",
    request_body = ResetPwdReq,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn reset_password(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<ResetPwdReq>,
) -> AppResult<HttpResponse> {
    validate_password_change(&body)?;

    let creds = fetch_credentials(pool.get_ref(), &auth.email)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("user no longer exists".to_string()))?;

    if !verify_password(&body.oldpwd, &creds.password) {
        return Err(AppError::Validation("old password is incorrect".to_string()));
    }

    let hashed = hash_password(&body.pwd1)?;
    sqlx::query("UPDATE users SET password = ? WHERE id = ?")
        .bind(hashed)
        .bind(creds.id)
        .execute(pool.get_ref())
        .await?;

    info!(user_id = creds.id, "Password changed");
    Ok(HttpResponse::Ok().json(json!({
        "message": "password changed"
    })))
}

/// Current user's profile.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, directory: web::Data<dyn Directory>) -> AppResult<HttpResponse> {
    let user: User = directory
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("user no longer exists".to_string()))?;
    Ok(HttpResponse::Ok().json(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(old: &str, p1: &str, p2: &str) -> ResetPwdReq {
        ResetPwdReq {
            oldpwd: old.to_string(),
            pwd1: p1.to_string(),
            pwd2: p2.to_string(),
        }
    }

    #[test]
    fn password_change_rules() {
        assert!(validate_password_change(&req("111111", "222222", "222222")).is_ok());
        assert!(validate_password_change(&req("111", "222222", "222222")).is_err());
        assert!(validate_password_change(&req("111111", "222222", "333333")).is_err());
        assert!(validate_password_change(&req("111111", &"x".repeat(21), &"x".repeat(21))).is_err());
    }
}
