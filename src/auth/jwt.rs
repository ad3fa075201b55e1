use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    error::{AppError, AppResult},
    models::{Claims, TokenType},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as usize)
        .unwrap_or_default()
}

fn issue(
    user_id: u64,
    email: &str,
    token_type: TokenType,
    secret: &str,
    ttl: usize,
) -> AppResult<(String, Claims)> {
    let claims = Claims {
        user_id,
        sub: email.to_string(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))?;

    Ok((token, claims))
}

pub fn generate_access_token(user_id: u64, email: &str, secret: &str, ttl: usize) -> AppResult<String> {
    issue(user_id, email, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

pub fn generate_activation_token(
    user_id: u64,
    email: &str,
    secret: &str,
    ttl: usize,
) -> AppResult<String> {
    issue(user_id, email, TokenType::Activation, secret, ttl).map(|(token, _)| token)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_token_round_trip() {
        let token = generate_access_token(7, "a@example.com", "secret", 60).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.sub, "a@example.com");
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_activation_token(7, "a@example.com", "secret", 60).unwrap();
        assert!(verify_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let (token, _) = issue(7, "a@example.com", TokenType::Access, "secret", 0).unwrap();
        // exp == now is still inside the default 60s leeway, so forge an older one
        let mut claims = verify_token(&token, "secret").unwrap();
        claims.exp = 1;
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verify_token(&stale, "secret").is_err());
    }
}
