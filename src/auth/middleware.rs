use crate::auth::auth::AuthUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::models::TokenType;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;

/// Accepted `Authorization` schemes, compared case-insensitively.
const KEYWORDS: [&str; 2] = ["JWT", "Bearer"];

/// Routes reachable without a token. Prefix entries end with `/`.
pub fn is_public_path(config: &Config, path: &str) -> bool {
    let prefix = config.api_prefix.trim_end_matches('/');
    let exact = [
        format!("{prefix}/auth/login"),
        format!("{prefix}/staff/active"),
        format!("{prefix}/home/health"),
    ];
    let media = format!("{}/", config.media_url());

    exact.iter().any(|p| p == path) || path.starts_with(&media)
}

/// Splits `"<keyword> <token>"`, rejecting extra or missing parts.
pub fn parse_authorization(header: &str) -> Result<&str, &'static str> {
    let mut parts = header.split_whitespace();
    let keyword = parts.next().ok_or("Missing Authorization header")?;
    if !KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
        return Err("Authorization header must start with JWT or Bearer");
    }
    let token = parts.next().ok_or("Authorization header has no token")?;
    if parts.next().is_some() {
        return Err("Authorization header must contain exactly one space");
    }
    Ok(token)
}

fn unauthorized(req: ServiceRequest, body: serde_json::Value) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(body);
    req.into_response(resp.map_into_boxed_body())
}

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?
        .clone();

    if is_public_path(&config, req.path()) {
        return next.call(req).await;
    }

    let header_value = match req.headers().get("Authorization") {
        Some(h) => match h.to_str() {
            Ok(v) => v.to_string(),
            Err(_) => {
                return Ok(unauthorized(
                    req,
                    json!({"code": "unauthenticated", "message": "Invalid Authorization header encoding"}),
                ));
            }
        },
        None => {
            return Ok(unauthorized(
                req,
                json!({"code": "unauthenticated", "message": "please log in first"}),
            ));
        }
    };

    let token = match parse_authorization(&header_value) {
        Ok(t) => t,
        Err(msg) => {
            return Ok(unauthorized(
                req,
                json!({"code": "unauthenticated", "message": msg}),
            ));
        }
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Access => c,
        Ok(_) => {
            return Ok(unauthorized(
                req,
                json!({"code": "unauthenticated", "message": "Not an access token"}),
            ));
        }
        Err(e) => {
            tracing::debug!(error = %e, path = req.path(), "Rejected token");
            return Ok(unauthorized(
                req,
                json!({"code": "unauthenticated", "message": "Invalid or expired token", "details": e}),
            ));
        }
    };

    req.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
    });

    next.call(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn parses_both_keywords() {
        assert_eq!(parse_authorization("JWT abc"), Ok("abc"));
        assert_eq!(parse_authorization("bearer abc"), Ok("abc"));
        assert!(parse_authorization("JWT").is_err());
        assert!(parse_authorization("JWT a b").is_err());
        assert!(parse_authorization("Basic abc").is_err());
    }

    #[test]
    fn whitelist() {
        let config = test_config();
        assert!(is_public_path(&config, "/api/auth/login"));
        assert!(is_public_path(&config, "/api/staff/active"));
        assert!(is_public_path(&config, "/api/media/abc.png"));
        assert!(!is_public_path(&config, "/api/auth/resetpwd"));
        assert!(!is_public_path(&config, "/api/absent/absent"));
    }
}
