/// Token issuance and validation
///
/// Sessions ride on two classes of signed, time-bounded tokens. They are
/// structurally identical but configured independently:
///
/// - **Access token**: short-lived, presented as a bearer token on every
///   authenticated request.
/// - **Refresh token**: long-lived, travels only in an HTTP-only cookie and
///   is exchanged for fresh access tokens.
///
/// Each kind signs with its own secret, so a leaked access token (the one
/// that crosses the wire on every request) cannot be used to mint
/// anything, and a compromised access secret does not expose refresh
/// tokens.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::jwt::{issue, verify, JwtConfig, TokenKeys, TokenKind};
/// use taskboard_shared::models::user::UserRole;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = JwtConfig::new(
///     TokenKeys { secret: "access-secret-at-least-32-bytes-long".into(), ttl: Duration::minutes(15) },
///     TokenKeys { secret: "refresh-secret-at-least-32-bytes-lng".into(), ttl: Duration::days(7) },
/// );
///
/// let user_id = Uuid::new_v4();
/// let token = issue(&config, TokenKind::Access, user_id, UserRole::User)?;
/// let claims = verify(&config, TokenKind::Access, &token)?;
/// assert_eq!(claims.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::user::UserRole;

const ISSUER: &str = "taskboard";

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature mismatch, malformed payload, or wrong issuer
    #[error("Invalid token: {0}")]
    Invalid(String),

    /// A token of one kind was presented where the other was required
    #[error("Expected {expected} token, got {actual} token")]
    WrongKind {
        expected: TokenKind,
        actual: TokenKind,
    },
}

/// Token class identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Per-request bearer token, short-lived
    Access,

    /// Session token, long-lived, cookie-only
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signing secret and lifetime for one token kind
#[derive(Debug, Clone)]
pub struct TokenKeys {
    /// HS256 secret; should be at least 32 bytes of randomness
    pub secret: String,

    /// Lifetime embedded in each issued token's `exp`
    pub ttl: Duration,
}

/// The per-kind configuration table for the token service
///
/// Loaded once from the environment at startup and read-only afterwards.
/// Keeping both kinds in one keyed structure means there is exactly one
/// issuance and one verification path, whichever kind is in play.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    access: TokenKeys,
    refresh: TokenKeys,
}

impl JwtConfig {
    pub fn new(access: TokenKeys, refresh: TokenKeys) -> Self {
        Self { access, refresh }
    }

    /// The secret/ttl pair for a token kind
    pub fn keys(&self, kind: TokenKind) -> &TokenKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }
}

/// Claims carried by every token
///
/// `sub` and `role` are the identity claim the rest of the system runs on;
/// `kind` pins the token to the class it was issued as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Account role at issuance time
    pub role: UserRole,

    /// Token class
    pub kind: TokenKind,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Creates claims expiring `ttl` from now
    pub fn new(user_id: Uuid, role: UserRole, kind: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + ttl;

        Self {
            sub: user_id,
            role,
            kind,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with the given secret (HS256)
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Issues a token of the given kind for a user
///
/// The expiry and signing secret come from the kind's entry in the
/// configuration table.
pub fn issue(
    config: &JwtConfig,
    kind: TokenKind,
    user_id: Uuid,
    role: UserRole,
) -> Result<String, JwtError> {
    let keys = config.keys(kind);
    let claims = Claims::new(user_id, role, kind, keys.ttl);
    create_token(&claims, &keys.secret)
}

/// Verifies a token of the given kind and extracts its claims
///
/// Checks, with the kind's own secret:
/// - signature integrity
/// - expiry and not-before
/// - issuer
/// - that the embedded kind matches the expected kind
///
/// Expiry is reported as [`JwtError::Expired`], everything else as
/// [`JwtError::Invalid`] or [`JwtError::WrongKind`]; callers typically
/// collapse all three into a single 401, but logs keep the distinction.
pub fn verify(config: &JwtConfig, kind: TokenKind, token: &str) -> Result<Claims, JwtError> {
    let keys = config.keys(kind);
    let key = DecodingKey::from_secret(keys.secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(format!("Token validation failed: {}", e)),
    })?;

    let claims = token_data.claims;
    if claims.kind != kind {
        return Err(JwtError::WrongKind {
            expected: kind,
            actual: claims.kind,
        });
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig::new(
            TokenKeys {
                secret: "access-test-secret-at-least-32-bytes".to_string(),
                ttl: Duration::minutes(15),
            },
            TokenKeys {
                secret: "refresh-test-secret-at-least-32-byte".to_string(),
                ttl: Duration::days(7),
            },
        )
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, UserRole::User, TokenKind::Access, Duration::hours(1));

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::User);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.iss, ISSUER);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        for kind in [TokenKind::Access, TokenKind::Refresh] {
            let token = issue(&config, kind, user_id, UserRole::Admin).expect("Should issue");
            let claims = verify(&config, kind, &token).expect("Should verify");

            assert_eq!(claims.sub, user_id);
            assert_eq!(claims.role, UserRole::Admin);
            assert_eq!(claims.kind, kind);
        }
    }

    #[test]
    fn test_kinds_do_not_cross_verify() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let access = issue(&config, TokenKind::Access, user_id, UserRole::User).unwrap();
        let refresh = issue(&config, TokenKind::Refresh, user_id, UserRole::User).unwrap();

        // Signed with different secrets, so the signature check alone
        // rejects the swap
        assert!(verify(&config, TokenKind::Refresh, &access).is_err());
        assert!(verify(&config, TokenKind::Access, &refresh).is_err());
    }

    #[test]
    fn test_kind_claim_checked_even_with_shared_secret() {
        let shared = "one-secret-for-both-kinds-32-bytes!!";
        let config = JwtConfig::new(
            TokenKeys {
                secret: shared.to_string(),
                ttl: Duration::minutes(15),
            },
            TokenKeys {
                secret: shared.to_string(),
                ttl: Duration::days(7),
            },
        );

        let access = issue(&config, TokenKind::Access, Uuid::new_v4(), UserRole::User).unwrap();
        let result = verify(&config, TokenKind::Refresh, &access);

        assert!(matches!(
            result,
            Err(JwtError::WrongKind {
                expected: TokenKind::Refresh,
                actual: TokenKind::Access,
            })
        ));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let config = test_config();
        let token = issue(&config, TokenKind::Access, Uuid::new_v4(), UserRole::User).unwrap();

        let other = JwtConfig::new(
            TokenKeys {
                secret: "a-completely-different-access-secret".to_string(),
                ttl: Duration::minutes(15),
            },
            TokenKeys {
                secret: "a-completely-different-refresh-secrt".to_string(),
                ttl: Duration::days(7),
            },
        );

        assert!(verify(&other, TokenKind::Access, &token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = test_config();
        let claims = Claims::new(
            Uuid::new_v4(),
            UserRole::User,
            TokenKind::Access,
            Duration::seconds(-3600),
        );

        assert!(claims.is_expired());

        let token = create_token(&claims, &config.keys(TokenKind::Access).secret).unwrap();
        let result = verify(&config, TokenKind::Access, &token);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let config = test_config();
        assert!(verify(&config, TokenKind::Access, "not-a-token").is_err());
        assert!(verify(&config, TokenKind::Access, "").is_err());
        assert!(verify(&config, TokenKind::Access, "a.b.c").is_err());
    }
}
