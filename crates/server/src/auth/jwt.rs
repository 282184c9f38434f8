use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared_types::{Actor, AppError, Role};
use std::sync::Arc;

/// Token type discriminator. Prevents using a refresh token as an access token.
const TOKEN_TYPE_ACCESS: &str = "access";
const TOKEN_TYPE_REFRESH: &str = "refresh";

const DEFAULT_ACCESS_TOKEN_MINUTES: i64 = 60;

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
    /// Unique token identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    /// Token type: "access" or "refresh".
    #[serde(default)]
    pub typ: String,
}

impl Claims {
    /// The actor these claims speak for, if the role is one we know.
    pub fn actor(&self) -> Option<Actor> {
        Role::parse(&self.role).map(|role| Actor::new(self.sub, role))
    }
}

struct KeysInner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
}

/// HS256 signing material, shared by the middleware and the token issuer.
#[derive(Clone)]
pub struct JwtKeys {
    inner: Arc<KeysInner>,
}

impl JwtKeys {
    pub fn new(secret: &[u8], access_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(KeysInner {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
                access_ttl,
            }),
        }
    }

    /// Read `JWT_SECRET` and `JWT_ACCESS_TOKEN_EXPIRY_MINUTES` from the environment.
    pub fn from_env() -> Result<Self, AppError> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::internal("JWT_SECRET must be set"))?;
        if secret.is_empty() {
            return Err(AppError::internal("JWT_SECRET must not be empty"));
        }
        let minutes = std::env::var("JWT_ACCESS_TOKEN_EXPIRY_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_ACCESS_TOKEN_MINUTES);
        Ok(Self::new(secret.as_bytes(), Duration::minutes(minutes)))
    }

    fn sign(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::default(), claims, &self.inner.encoding)
    }

    pub fn create_access_token(&self, actor: Actor) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        self.sign(&Claims {
            sub: actor.id,
            role: actor.role.as_str().to_string(),
            iat: now.timestamp(),
            exp: (now + self.inner.access_ttl).timestamp(),
            jti: Some(uuid::Uuid::new_v4().to_string()),
            typ: TOKEN_TYPE_ACCESS.to_string(),
        })
    }

    /// Validate an access token. Rejects tokens with `typ: "refresh"`.
    /// Allows an empty `typ` for tokens minted by older issuers.
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.inner.decoding, &Validation::default())?;
        if token_data.claims.typ == TOKEN_TYPE_REFRESH {
            return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
        }
        Ok(token_data.claims)
    }
}
