// ==================== CREDENTIALS & SESSION TOKENS ====================
// Hashing (bcrypt), verification and JWT issuance for accounts.
// bcrypt is CPU-bound, so both directions run on the blocking pool.

use crate::{config::Config, models::Account, utils::AppError, utils::LoginRejection};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// JWT payload: `{ userId, iat, exp }`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionClaims {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: usize,
}

#[derive(Clone)]
pub struct CredentialManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    cost: u32,
}

impl CredentialManager {
    pub fn new(secret: &str, token_ttl_secs: i64, cost: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl: Duration::seconds(token_ttl_secs),
            cost,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.jwt_secret, config.token_ttl_secs, config.bcrypt_cost)
    }

    /// One-way hash with a fresh salt; the result embeds salt and cost.
    pub async fn hash(&self, password: &str) -> Result<String, AppError> {
        if password.is_empty() {
            return Err(AppError::Validation("password is required".to_string()));
        }

        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    }

    pub async fn verify(&self, candidate: &str, stored_hash: &str) -> Result<bool, AppError> {
        let candidate = candidate.to_string();
        let stored_hash = stored_hash.to_string();
        tokio::task::spawn_blocking(move || bcrypt::verify(candidate, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))
    }

    /// Hashes the account's password if it changed since the last seal.
    /// An untouched account keeps its stored hash as is.
    pub async fn seal(&self, account: &mut Account) -> Result<(), AppError> {
        if let Some(cleartext) = account.take_pending_password() {
            account.password = self.hash(&cleartext).await?;
            account.touch();
        }
        Ok(())
    }

    pub fn issue_token(&self, account_id: &ObjectId) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let iat = now.timestamp() as usize;
        let exp = (now + self.token_ttl).timestamp() as usize;

        let claims = SessionClaims {
            user_id: account_id.to_hex(),
            iat,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))?;

        Ok(IssuedToken {
            token,
            expires_at: exp,
        })
    }

    /// Checks signature and expiry against the issuing key.
    pub fn decode_token(&self, token: &str) -> Result<SessionClaims, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("Token rejected: {}", e);
                AppError::Rejected(LoginRejection::InvalidToken)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::sample_signup;

    fn manager() -> CredentialManager {
        CredentialManager::new("unit-test-secret", 3600, 4)
    }

    #[tokio::test]
    async fn hash_never_equals_cleartext_and_verifies() {
        let credentials = manager();
        let hashed = credentials.hash("secret1").await.unwrap();
        assert_ne!(hashed, "secret1");
        assert!(credentials.verify("secret1", &hashed).await.unwrap());
        assert!(!credentials.verify("secret2", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn hashing_is_salted() {
        let credentials = manager();
        let first = credentials.hash("same").await.unwrap();
        let second = credentials.hash("same").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn hash_embeds_configured_cost() {
        let credentials = CredentialManager::new("k", 3600, 10);
        let hashed = credentials.hash("secret1").await.unwrap();
        assert!(hashed.starts_with("$2b$10$"));
    }

    #[tokio::test]
    async fn empty_password_is_refused() {
        let err = manager().hash("").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn malformed_stored_hash_is_internal_error() {
        let err = manager().verify("x", "not-a-bcrypt-hash").await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn seal_hashes_only_when_password_changed() {
        let credentials = manager();
        let mut account = Account::new(sample_signup("a@x.com", "secret1"));

        credentials.seal(&mut account).await.unwrap();
        let first_hash = account.password.clone();
        assert!(!account.password_modified());
        assert!(credentials.verify("secret1", &first_hash).await.unwrap());

        credentials.seal(&mut account).await.unwrap();
        assert_eq!(account.password, first_hash);

        account.set_password("secret2");
        credentials.seal(&mut account).await.unwrap();
        assert_ne!(account.password, first_hash);
        assert!(credentials.verify("secret2", &account.password).await.unwrap());
    }

    #[test]
    fn token_binds_account_and_expires_in_an_hour() {
        let credentials = manager();
        let id = ObjectId::new();
        let issued = credentials.issue_token(&id).unwrap();

        let claims = credentials.decode_token(&issued.token).unwrap();
        assert_eq!(claims.user_id, id.to_hex());
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.exp, issued.expires_at);
    }

    #[test]
    fn token_from_another_key_is_rejected() {
        let issued = CredentialManager::new("other-key", 3600, 4)
            .issue_token(&ObjectId::new())
            .unwrap();
        let err = manager().decode_token(&issued.token).unwrap_err();
        assert!(matches!(err, AppError::Rejected(LoginRejection::InvalidToken)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let credentials = manager();
        let now = Utc::now().timestamp() as usize;
        let claims = SessionClaims {
            user_id: ObjectId::new().to_hex(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();
        assert!(credentials.decode_token(&token).is_err());
    }
}
