use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::error::CrmResult;
use crate::models::AuthPayload;

const TOKEN_TTL_SECS: i64 = 3600; // 1 hour

pub fn hash_password(password: &str) -> CrmResult<String> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn verify_password(password: &str, hash: &str) -> CrmResult<bool> {
    Ok(verify(password, hash)?)
}

pub fn create_jwt(username: &str, secret: &str) -> CrmResult<String> {
    let claims = AuthPayload {
        sub: username.to_owned(),
        exp: (Utc::now().timestamp() + TOKEN_TTL_SECS) as usize,
    };

    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn validate_jwt(token: &str, secret: &str) -> CrmResult<AuthPayload> {
    let token_data = decode::<AuthPayload>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hashed = hash_password("password123").unwrap();
        assert_ne!(hashed, "password123");
        assert!(verify_password("password123", &hashed).unwrap());
        assert!(!verify_password("wrong", &hashed).unwrap());
    }

    #[test]
    fn jwt_roundtrip_and_wrong_secret() {
        let token = create_jwt("testuser", "secret-a").unwrap();
        assert_eq!(validate_jwt(&token, "secret-a").unwrap().sub, "testuser");
        assert!(validate_jwt(&token, "secret-b").is_err());
    }
}
