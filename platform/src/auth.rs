//! Bearer-token verification and password hashing.
//!
//! The token is an HMAC-SHA256 signed JWT carrying `{user_id, role, exp}`.
//! This is deliberately narrower than a full JWT stack: one algorithm, one
//! shared secret, no revocation list, no key rotation.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as Argon2Hasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use jsonwebtoken::{decode, encode, Algorithm as JwtAlgorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tonic::Status;

/// Claims carried by a verified token. A dedicated typed value rather than
/// a string-keyed context, to prevent key collisions across call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: String,
    pub role: String,
    pub exp: i64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl AuthError {
    pub fn to_status(&self) -> Status {
        match self {
            AuthError::Unauthenticated(msg) => Status::unauthenticated(msg.clone()),
            AuthError::PermissionDenied(msg) => Status::permission_denied(msg.clone()),
        }
    }
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        err.to_status()
    }
}

/// Issues and verifies HMAC-SHA256 tokens against a shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mint a token for a freshly authenticated user, valid for `ttl_secs`.
    pub fn issue(&self, user_id: &str, role: &str, ttl_secs: i64) -> Result<String, AuthError> {
        let exp = chrono::Utc::now().timestamp() + ttl_secs;
        let claims = Claims {
            user_id: user_id.to_string(),
            role: role.to_string(),
            exp,
        };
        encode(&Header::new(JwtAlgorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Unauthenticated(format!("failed to issue token: {e}")))
    }

    /// Verify a bearer token: algorithm must be HMAC, signature must match,
    /// `exp` must be in the future.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(JwtAlgorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::Unauthenticated(format!("invalid token: {e}")))
    }

    /// Enforce a method's required-role gate once a token is verified.
    pub fn require_role(&self, claims: &Claims, required: &[&str]) -> Result<(), AuthError> {
        if required.is_empty() || required.contains(&claims.role.as_str()) {
            Ok(())
        } else {
            Err(AuthError::PermissionDenied(format!(
                "role {} is not permitted",
                claims.role
            )))
        }
    }
}

/// Extract the bearer token from an `Authorization` header value.
pub fn extract_bearer(header_value: Option<&str>) -> Result<&str, AuthError> {
    header_value
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AuthError::Unauthenticated("missing or malformed Authorization header".into()))
}

/// Password hashing configuration. OWASP-recommended Argon2id defaults.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
    pub min_password_length: usize,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost_kib: 19456,
            time_cost: 2,
            parallelism: 1,
            min_password_length: 8,
        }
    }
}

#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    min_password_length: usize,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(PasswordConfig::default())
    }
}

impl PasswordHasher {
    pub fn new(config: PasswordConfig) -> Self {
        let params = Params::new(config.memory_cost_kib, config.time_cost, config.parallelism, None)
            .expect("invalid argon2 parameters");
        Self {
            params,
            min_password_length: config.min_password_length,
        }
    }

    pub fn hash(&self, password: &str) -> Result<String, crate::error::DomainError> {
        if password.len() < self.min_password_length {
            return Err(crate::error::DomainError::invalid(format!(
                "password must be at least {} characters",
                self.min_password_length
            )));
        }
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| crate::error::DomainError::Internal(format!("failed to hash password: {e}")))
    }

    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, crate::error::DomainError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| crate::error::DomainError::Internal(format!("invalid password hash: {e}")))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(crate::error::DomainError::Internal(format!("password verification failed: {e}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies_with_same_secret() {
        let verifier = TokenVerifier::new("top-secret");
        let token = verifier.issue("u1", "customer", 3600).unwrap();
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.user_id, "u1");
        assert_eq!(claims.role, "customer");
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = TokenVerifier::new("top-secret");
        let token = verifier.issue("u1", "customer", -10).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn token_signed_with_different_secret_is_rejected() {
        let a = TokenVerifier::new("secret-a");
        let b = TokenVerifier::new("secret-b");
        let token = a.issue("u1", "customer", 3600).unwrap();
        assert!(b.verify(&token).is_err());
    }

    #[test]
    fn require_role_rejects_role_not_in_set() {
        let verifier = TokenVerifier::new("s");
        let claims = Claims { user_id: "u1".into(), role: "customer".into(), exp: 0 };
        assert!(verifier.require_role(&claims, &["admin"]).is_err());
        assert!(verifier.require_role(&claims, &[]).is_ok());
        assert!(verifier.require_role(&claims, &["customer", "admin"]).is_ok());
    }

    #[test]
    fn extract_bearer_requires_prefix() {
        assert!(extract_bearer(Some("Bearer abc")).is_ok());
        assert!(extract_bearer(Some("abc")).is_err());
        assert!(extract_bearer(None).is_err());
    }

    #[test]
    fn password_hash_and_verify_roundtrip() {
        let hasher = PasswordHasher::default();
        let hash = hasher.hash("correct-horse-battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct-horse-battery", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn password_too_short_is_rejected() {
        let hasher = PasswordHasher::default();
        assert!(hasher.hash("short").is_err());
    }
}
