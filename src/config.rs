use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub activation_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,

    pub api_prefix: String,

    /// Name of the top-level department whose leader needs no approver.
    pub board_department: String,
    pub page_size: u64,

    pub media_root: String,
    pub public_base_url: String,
    pub log_dir: String,
}

pub(crate) fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

pub(crate) fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            access_token_ttl: var_or("ACCESS_TOKEN_TTL", 604_800)?, // default 7 days
            activation_token_ttl: var_or("ACTIVATION_TOKEN_TTL", 86_400)?, // default 1 day

            rate_login_per_min: var_or("RATE_LOGIN_PER_MIN", 60)?,

            api_prefix: var_or("API_PREFIX", "/api".to_string())?,
            board_department: var_or("BOARD_DEPARTMENT", "Board".to_string())?,
            page_size: var_or("PAGE_SIZE", 10)?,

            media_root: var_or("MEDIA_ROOT", "media".to_string())?,
            public_base_url: var_or("PUBLIC_BASE_URL", "http://localhost:8000".to_string())?,
            log_dir: var_or("LOG_DIR", "logs".to_string())?,
        })
    }

    /// URL path under which uploaded files are served, e.g. `/api/media`.
    pub fn media_url(&self) -> String {
        format!("{}/media", self.api_prefix.trim_end_matches('/'))
    }
}

#[cfg(test)]
pub fn test_config() -> Config {
    Config {
        database_url: "mysql://localhost/oa_test".to_string(),
        jwt_secret: "test-secret".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        access_token_ttl: 3600,
        activation_token_ttl: 3600,
        rate_login_per_min: 60,
        api_prefix: "/api".to_string(),
        board_department: "Board".to_string(),
        page_size: 10,
        media_root: std::env::temp_dir().to_string_lossy().into_owned(),
        public_base_url: "http://localhost:8000".to_string(),
        log_dir: "logs".to_string(),
    }
}
