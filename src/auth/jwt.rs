use crate::types::{AppError, Identity, Result, Role, TokenResponse};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default token lifetime: one hour.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// Longest accepted token lifetime: one year.
pub const MAX_TOKEN_TTL_SECS: i64 = 365 * 24 * 3600;

/// Largest integer a JSON double can carry without losing precision.
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0; // 2^53

/// Why a token was rejected. Every variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("token is malformed: {0}")]
    Malformed(String),

    #[error("token claim '{0}' is missing or has the wrong type")]
    MissingClaim(&'static str),
}

/// Claims written into issued tokens.
#[derive(Debug, Serialize)]
struct Claims {
    user_id: i64,
    role: Role,
    iat: i64,
    exp: i64,
}

/// Claims as read back from a token, before any trust is placed in them.
#[derive(Debug, Clone, Deserialize)]
struct RawClaims {
    #[serde(default)]
    user_id: Option<Value>,
    #[serde(default)]
    role: Option<Value>,
    #[serde(default)]
    exp: Option<Value>,
}

/// Token issuance and validation with an immutable HS256 secret.
///
/// Built once at startup and shared behind an `Arc`; nothing in here is
/// mutated after construction, so validation is lock-free.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: i64,
}

impl AuthService {
    /// Creates a new AuthService.
    ///
    /// # Arguments
    /// * `jwt_secret` - Secret key for signing tokens
    /// * `token_ttl` - Token validity in seconds
    pub fn new(jwt_secret: &str, token_ttl: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_ttl,
        }
    }

    /// Issues a token for the given subject, valid for the configured TTL.
    pub fn issue(&self, user_id: i64, role: Role) -> Result<String> {
        self.issue_at(user_id, role, self.token_ttl, Utc::now())
    }

    /// Issues a token as of `now`, expiring `ttl` seconds later.
    pub fn issue_at(&self, user_id: i64, role: Role, ttl: i64, now: DateTime<Utc>) -> Result<String> {
        let expires_at = TimeDelta::try_seconds(ttl)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| AppError::Internal(format!("Token lifetime {}s is out of range", ttl)))?;

        let claims = Claims {
            user_id,
            role,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Issues a token and wraps it in the login response body.
    pub fn login_response(&self, user_id: i64, role: Role) -> Result<TokenResponse> {
        Ok(TokenResponse {
            token: self.issue(user_id, role)?,
            token_type: "Bearer".to_string(),
            expires_in: self.token_ttl,
        })
    }

    /// Validates a token against the current time.
    pub fn validate(&self, token: &str) -> std::result::Result<Identity, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validates a token as of `now`.
    ///
    /// The signature is checked first; claims are only interpreted once the
    /// token is known to come from us.
    pub fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below with a strict `now >= exp` and no leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        let claims = decode::<RawClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    TokenError::InvalidSignature
                }
                _ => TokenError::Malformed(e.to_string()),
            })?;

        let exp = claims
            .exp
            .as_ref()
            .and_then(integral_claim)
            .ok_or_else(|| TokenError::Malformed("exp is missing or not an integer".to_string()))?;
        if now.timestamp() >= exp {
            return Err(TokenError::Expired);
        }

        let user_id = claims
            .user_id
            .as_ref()
            .and_then(integral_claim)
            .filter(|id| *id > 0)
            .ok_or(TokenError::MissingClaim("user_id"))?;

        let role = match claims.role {
            Some(Value::String(role)) => match role.as_str() {
                "user" => Role::User,
                "admin" => Role::Admin,
                other => return Err(TokenError::Malformed(format!("unknown role '{}'", other))),
            },
            _ => return Err(TokenError::MissingClaim("role")),
        };

        Ok(Identity { user_id, role })
    }
}

/// Reads a JSON number as an exact integer.
///
/// Floats are accepted only when integral and within ±2^53.
fn integral_claim(value: &Value) -> Option<i64> {
    let Value::Number(n) = value else {
        return None;
    };
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    if f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    const SECRET: &str = "test-secret-key-that-is-at-least-32-chars";

    fn create_test_service() -> AuthService {
        AuthService::new(SECRET, DEFAULT_TOKEN_TTL_SECS)
    }

    fn sign_raw(claims: Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("should sign raw claims")
    }

    fn future_exp() -> i64 {
        Utc::now().timestamp() + 600
    }

    #[test]
    fn test_issue_and_validate() {
        let service = create_test_service();

        let token = service.issue(42, Role::User).expect("should issue token");
        let identity = service.validate(&token).expect("should validate token");

        assert_eq!(identity, Identity::new(42, Role::User));
    }

    #[test]
    fn test_admin_role_survives_round_trip() {
        let service = create_test_service();

        let token = service.issue(7, Role::Admin).expect("should issue token");
        let identity = service.validate(&token).expect("should validate token");

        assert_eq!(identity.role, Role::Admin);
    }

    #[test]
    fn test_token_valid_until_expiry() {
        let service = create_test_service();
        let issued = Utc::now();
        let token = service
            .issue_at(5, Role::User, 60, issued)
            .expect("should issue");

        let just_before = issued + Duration::seconds(59);
        assert!(service.validate_at(&token, just_before).is_ok());

        let at_expiry = issued + Duration::seconds(60);
        assert_eq!(
            service.validate_at(&token, at_expiry),
            Err(TokenError::Expired)
        );

        let later = issued + Duration::hours(2);
        assert_eq!(service.validate_at(&token, later), Err(TokenError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_invalid_signature() {
        let issuer = AuthService::new("secret-one-that-is-32-chars-long", 900);
        let verifier = AuthService::new("secret-two-that-is-32-chars-long", 900);

        let token = issuer.issue(1, Role::Admin).expect("should issue");

        assert_eq!(verifier.validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_foreign_algorithm_is_invalid_signature() {
        let service = create_test_service();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &json!({"user_id": 1, "role": "user", "exp": future_exp()}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .expect("should sign");

        assert_eq!(service.validate(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let service = create_test_service();

        for token in ["", "invalid.token.here", "a.b", "not a token at all"] {
            assert!(
                matches!(service.validate(token), Err(TokenError::Malformed(_))),
                "{token:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_missing_exp_is_malformed() {
        let service = create_test_service();
        let token = sign_raw(json!({"user_id": 1, "role": "user"}));

        assert!(matches!(
            service.validate(&token),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_missing_user_id_claim() {
        let service = create_test_service();
        let token = sign_raw(json!({"role": "user", "exp": future_exp()}));

        assert_eq!(
            service.validate(&token),
            Err(TokenError::MissingClaim("user_id"))
        );
    }

    #[test]
    fn test_string_user_id_is_wrong_type() {
        let service = create_test_service();
        let token = sign_raw(json!({"user_id": "12", "role": "user", "exp": future_exp()}));

        assert_eq!(
            service.validate(&token),
            Err(TokenError::MissingClaim("user_id"))
        );
    }

    #[test]
    fn test_missing_role_claim() {
        let service = create_test_service();
        let token = sign_raw(json!({"user_id": 3, "exp": future_exp()}));

        assert_eq!(
            service.validate(&token),
            Err(TokenError::MissingClaim("role"))
        );
    }

    #[test]
    fn test_non_string_role_is_wrong_type() {
        let service = create_test_service();
        let token = sign_raw(json!({"user_id": 3, "role": 1, "exp": future_exp()}));

        assert_eq!(
            service.validate(&token),
            Err(TokenError::MissingClaim("role"))
        );
    }

    #[test]
    fn test_unknown_role_is_malformed() {
        let service = create_test_service();
        let token = sign_raw(json!({"user_id": 3, "role": "superuser", "exp": future_exp()}));

        assert!(matches!(
            service.validate(&token),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_float_encoded_user_id_round_trips() {
        let service = create_test_service();
        let big = 9_007_199_254_740_991_i64; // 2^53 - 1
        let token = sign_raw(json!({"user_id": big as f64, "role": "user", "exp": future_exp()}));

        let identity = service.validate(&token).expect("integral float should be accepted");
        assert_eq!(identity.user_id, big);
    }

    #[test]
    fn test_fractional_or_oversized_user_id_rejected() {
        let service = create_test_service();

        for id in [json!(1.5), json!(1.0e300), json!(-4), json!(0)] {
            let token = sign_raw(json!({"user_id": id, "role": "user", "exp": future_exp()}));
            assert_eq!(
                service.validate(&token),
                Err(TokenError::MissingClaim("user_id")),
                "user_id {id} should be rejected"
            );
        }
    }

    #[test]
    fn test_large_integer_user_id_is_exact() {
        let service = create_test_service();
        let id = i64::MAX / 3;

        let token = service.issue(id, Role::User).expect("should issue");
        assert_eq!(service.validate(&token).unwrap().user_id, id);
    }

    #[test]
    fn test_login_response_shape() {
        let service = AuthService::new(SECRET, 900);

        let response = service.login_response(9, Role::User).expect("should issue");

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.expires_in, 900);
        assert!(service.validate(&response.token).is_ok());
    }

    #[test]
    fn test_out_of_range_lifetime_is_an_error() {
        let service = create_test_service();

        let result = service.issue_at(1, Role::User, i64::MAX, Utc::now());
        assert!(matches!(result, Err(AppError::Internal(_))));

        let near_max = DateTime::<Utc>::MAX_UTC - Duration::seconds(10);
        let result = service.issue_at(1, Role::User, MAX_TOKEN_TTL_SECS, near_max);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
