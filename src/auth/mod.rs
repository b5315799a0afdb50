/*!
 * # Authentication Module
 *
 * JWT-based authentication with company scoping. Every token carries the
 * user's company, and the middleware makes the authenticated user available
 * to handlers through request extensions so company isolation never depends
 * on client-supplied identifiers.
 */

use argon2::password_hash::{rand_core::OsRng, PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::AppConfig;
use crate::entities::user;
use crate::errors::ServiceError;

/// Claim structure for JWT tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,     // Subject (user ID)
    pub company_id: i32, // Company the user belongs to
    pub email: String,   // User's email
    pub iat: i64,        // Issued at time
    pub exp: i64,        // Expiration time
    pub iss: String,     // Issuer
}

/// Authenticated user data extracted from the JWT token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: i32,
    pub company_id: i32,
    pub email: String,
}

/// Authentication service that handles password hashing and token
/// issuance/validation.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
    issuer: String,
    expiration_secs: usize,
}

impl AuthService {
    pub fn new(
        jwt_secret: impl Into<String>,
        issuer: impl Into<String>,
        expiration_secs: usize,
    ) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            issuer: issuer.into(),
            expiration_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.jwt_secret.clone(),
            config.auth_issuer.clone(),
            config.jwt_expiration,
        )
    }

    /// Generate a JWT token for a user
    pub fn generate_token(&self, user: &user::Model) -> Result<String, ServiceError> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs as i64);

        let claims = Claims {
            sub: user.id.to_string(),
            company_id: user.company_id,
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: self.issuer.clone(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| ServiceError::InternalError(format!("Token creation failed: {}", e)))
    }

    /// Decode and validate a token, returning its claims.
    pub fn validate_token(&self, token: &str) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ServiceError::AuthError("Token has expired".to_string())
            }
            _ => ServiceError::AuthError("Invalid authentication token".to_string()),
        })?
        .claims;

        Ok(claims)
    }

    /// Hash a password with Argon2 and a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, ServiceError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| ServiceError::HashError(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verify a password against a stored Argon2 hash.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, ServiceError> {
        let parsed = PasswordHash::new(hash).map_err(|e| ServiceError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Middleware that rejects requests without a valid bearer token and stores
/// the authenticated user in request extensions.
pub async fn require_auth(
    State(state): State<crate::AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        ServiceError::Unauthorized("Missing or malformed authorization header".to_string())
    })?;

    let claims = state.auth.validate_token(&token)?;
    let user_id = claims
        .sub
        .parse::<i32>()
        .map_err(|_| ServiceError::AuthError("Invalid authentication token".to_string()))?;

    debug!(user_id, company_id = claims.company_id, "Authenticated request");

    request.extensions_mut().insert(AuthUser {
        user_id,
        company_id: claims.company_id,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const TEST_SECRET: &str =
        "unit-test-secret-0123456789-abcdefghijklmnopqrstuvwxyz-ABCDEFGHIJKLMNOP";

    fn sample_user() -> user::Model {
        user::Model {
            id: 7,
            company_id: 3,
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "unused".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service() -> AuthService {
        AuthService::new(TEST_SECRET, "brigade-api", 3600)
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let auth = service();
        let token = auth.generate_token(&sample_user()).unwrap();
        let claims = auth.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.company_id, 3);
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.iss, "brigade-api");
    }

    #[test]
    fn validate_rejects_expired_token() {
        let auth = service();
        let now = Utc::now();
        // Well past the default validation leeway.
        let claims = Claims {
            sub: "7".to_string(),
            company_id: 3,
            email: "alice@example.com".to_string(),
            iat: (now - Duration::hours(2)).timestamp(),
            exp: (now - Duration::hours(1)).timestamp(),
            iss: "brigade-api".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        let err = auth.validate_token(&token).unwrap_err();
        assert!(matches!(err, ServiceError::AuthError(ref msg) if msg.contains("expired")));
    }

    #[test]
    fn validate_rejects_wrong_issuer() {
        let auth = service();
        let other = AuthService::new(TEST_SECRET, "someone-else", 3600);
        let token = other.generate_token(&sample_user()).unwrap();

        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn validate_rejects_tampered_secret() {
        let auth = service();
        let other = AuthService::new(
            "another-secret-entirely-0123456789-abcdefghijklmnopqrstuvwxyz-ABC",
            "brigade-api",
            3600,
        );
        let token = other.generate_token(&sample_user()).unwrap();

        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn password_hash_round_trip() {
        let auth = service();
        let hash = auth.hash_password("correct horse battery staple").unwrap();

        assert_ne!(hash, "correct horse battery staple");
        assert!(auth
            .verify_password("correct horse battery staple", &hash)
            .unwrap());
        assert!(!auth.verify_password("wrong password", &hash).unwrap());
    }

    #[test]
    fn bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi".to_string()));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(bearer_token(&headers), None);
    }
}
