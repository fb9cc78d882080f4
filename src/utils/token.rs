use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;

pub const REFRESH_TOKEN_LENGTH: usize = 48;

pub fn generate_refresh_token(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

pub fn issue_access_token(
    user_id: Uuid,
    email: &str,
    secret: &str,
    ttl_minutes: i64,
) -> Result<(String, DateTime<Utc>)> {
    let issued_at = crate::utils::time::now();
    let expires_at = crate::utils::time::minutes_from_now(ttl_minutes);
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: issued_at.timestamp().max(0) as usize,
        exp: expires_at.timestamp().max(0) as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign access token: {}", e)))?;
    Ok((token, expires_at))
}

pub fn decode_access_token(token: &str, secret: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| Error::Unauthorized(format!("invalid_token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_carries_subject() {
        let user_id = Uuid::new_v4();
        let (token, _) = issue_access_token(user_id, "a@example.com", "secret", 15).unwrap();
        let claims = decode_access_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.email, "a@example.com");
    }

    #[test]
    fn expired_or_foreign_tokens_are_rejected() {
        let user_id = Uuid::new_v4();
        let (expired, _) = issue_access_token(user_id, "a@example.com", "secret", -10).unwrap();
        assert!(matches!(
            decode_access_token(&expired, "secret"),
            Err(Error::Unauthorized(_))
        ));

        let (token, _) = issue_access_token(user_id, "a@example.com", "secret", 15).unwrap();
        assert!(decode_access_token(&token, "other-secret").is_err());
    }

    #[test]
    fn refresh_tokens_are_alphanumeric_and_distinct() {
        let a = generate_refresh_token(REFRESH_TOKEN_LENGTH);
        let b = generate_refresh_token(REFRESH_TOKEN_LENGTH);
        assert_eq!(a.len(), REFRESH_TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
