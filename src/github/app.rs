use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Backdating applied to `iat` so small clock drift does not reject the assertion.
const CLOCK_SKEW_SECS: i64 = 60;
/// GitHub caps app assertions at ten minutes.
const ASSERTION_TTL_SECS: i64 = 10 * 60;

#[derive(Debug, Serialize, Deserialize)]
pub struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Signs short-lived app assertions for the installation token exchange.
#[derive(Clone)]
pub struct AppCredentials {
    app_id: String,
    key: EncodingKey,
}

impl AppCredentials {
    /// Parses the private key up front; bad key material is a hard error here.
    pub fn new(app_id: &str, private_key: &str) -> Result<Self> {
        let app_id = app_id.trim();
        if app_id.is_empty() {
            return Err(Error::Credential("app id is empty".into()));
        }

        let pem = decode_private_key(private_key);
        let key = EncodingKey::from_rsa_pem(&pem)
            .map_err(|e| Error::Credential(format!("failed to parse private key: {e}")))?;

        Ok(Self {
            app_id: app_id.to_string(),
            key,
        })
    }

    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn mint_assertion(&self) -> Result<String> {
        let now = Utc::now();
        let claims = AppClaims {
            iat: (now - Duration::seconds(CLOCK_SKEW_SECS)).timestamp(),
            exp: (now + Duration::seconds(ASSERTION_TTL_SECS)).timestamp(),
            iss: self.app_id.clone(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map_err(|e| Error::Credential(format!("failed to sign assertion: {e}")))
    }
}

impl std::fmt::Debug for AppCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppCredentials")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}

/// Accepts the key either as PEM text or as base64-encoded PEM. Encoded keys
/// may be line-wrapped, as `base64` emits them.
fn decode_private_key(raw: &str) -> Vec<u8> {
    let trimmed = raw.trim();
    let compact: String = trimmed.split_ascii_whitespace().collect();
    match STANDARD.decode(compact) {
        Ok(decoded) => decoded,
        Err(_) => trimmed.as_bytes().to_vec(),
    }
}
