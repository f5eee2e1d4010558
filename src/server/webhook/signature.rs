use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Checks a `sha256=<hex>` signature over the raw request body.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> Result<()> {
    let Some(digest_hex) = signature.trim().strip_prefix("sha256=") else {
        return Err(Error::Unauthorized);
    };
    let signature_bytes = hex::decode(digest_hex).map_err(|_| Error::Unauthorized)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Config(format!("failed to initialize webhook HMAC verifier: {e}")))?;
    mac.update(payload);
    mac.verify_slice(&signature_bytes)
        .map_err(|_| Error::Unauthorized)
}

/// Produces the header value GitHub would send for `payload`.
pub fn sign_payload(payload: &[u8], secret: &str) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Config(format!("failed to initialize webhook HMAC signer: {e}")))?;
    mac.update(payload);
    Ok(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}
