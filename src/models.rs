use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::model::user::{User, UserStatus};

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "111111")]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize, ToSchema)]
pub struct ResetPwdReq {
    pub oldpwd: String,
    pub pwd1: String,
    pub pwd2: String,
}

#[derive(FromRow)]
pub struct UserCredentials {
    pub id: u64,
    pub email: String,
    pub password: String,
    pub status: UserStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// e-mail of the account the token was issued for
    pub sub: String,
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    /// mailed to new staff; proves ownership of the address
    Activation,
}
