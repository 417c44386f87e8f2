//! Bearer token issuance and verification.
//!
//! Tokens are HMAC-signed JWTs keyed by the process-wide [`SecretKey`].
//! Three flavours are issued: short-lived client tokens, long-lived service
//! tokens and non-expiring service tokens. Verification checks the
//! signature and, when the token carries one, the expiry.

use crate::config::SecretKey;
use crate::error::{AuthError, TokenError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Issuer used when a short-lived token is requested without one.
pub const DEFAULT_ISSUER: &str = "paperheadInt";
/// Default lifetime of a short-lived token, in minutes.
pub const DEFAULT_EXPIRY_MINUTES: i64 = 1;
/// Default lifetime of a service token, in days.
pub const DEFAULT_SERVICE_DAYS: i64 = 365;

pub const SERVICE_TOKEN_TYPE: &str = "service";
pub const PERMANENT_TOKEN_TYPE: &str = "service-permanent";

const API_KEY_BYTES: usize = 32;
const API_KEY_PREFIX: &str = "sk-proj";

/// JWT claims understood by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Who the token was issued to.
    #[serde(default)]
    pub iss: String,
    /// Token flavour; absent on short-lived client tokens.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Expiry as seconds since the epoch; absent on permanent tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Issued-at as seconds since the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
}

impl Claims {
    pub fn expires(&self) -> bool {
        self.exp.is_some()
    }
}

/// Signs tokens with the shared secret.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &SecretKey) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// A short-lived client token with claims `{iss, exp}`.
    pub fn short_lived(&self, issuer: Option<&str>, minutes: i64) -> Result<String, TokenError> {
        let claims = Claims {
            iss: issuer.unwrap_or(DEFAULT_ISSUER).to_string(),
            kind: None,
            exp: Some(timestamp_after(Duration::try_minutes(minutes))?),
            iat: None,
        };
        self.sign(&claims)
    }

    /// A long-lived token for server-to-server calls.
    pub fn service(&self, name: &str, days: i64) -> Result<String, TokenError> {
        let claims = Claims {
            iss: name.to_string(),
            kind: Some(SERVICE_TOKEN_TYPE.to_string()),
            exp: Some(timestamp_after(Duration::try_days(days))?),
            iat: Some(timestamp_after(Some(Duration::zero()))?),
        };
        self.sign(&claims)
    }

    /// A service token with no `exp` claim. It is valid until the secret rotates.
    pub fn permanent(&self, name: &str) -> Result<String, TokenError> {
        let claims = Claims {
            iss: name.to_string(),
            kind: Some(PERMANENT_TOKEN_TYPE.to_string()),
            exp: None,
            iat: Some(timestamp_after(Some(Duration::zero()))?),
        };
        self.sign(&claims)
    }

    /// Sign arbitrary claims.
    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.key)?)
    }
}

/// Verifies tokens against the shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &SecretKey) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // `exp` is checked when present; permanent tokens omit it.
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Check signature and expiry, returning the decoded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

/// Seconds since the epoch, `offset` from now.
///
/// `None` stands for an offset chrono could not represent.
fn timestamp_after(offset: Option<Duration>) -> Result<u64, TokenError> {
    let at = offset
        .and_then(|offset| Utc::now().checked_add_signed(offset))
        .ok_or(TokenError::LifetimeOutOfRange)?;
    u64::try_from(at.timestamp()).map_err(|_| TokenError::Clock)
}

/// Generate a random secret suitable for `INTERNAL_API_KEY`.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Generate a random secret with a recognisable `sk-proj-` prefix.
pub fn generate_prefixed_api_key() -> String {
    format!("{}-{}", API_KEY_PREFIX, generate_api_key())
}
