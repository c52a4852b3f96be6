use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-hook-signature";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SignatureError {
    #[error("webhook secret is not configured")]
    MissingSecret,

    #[error("missing X-Hook-Signature header")]
    MissingSignature,

    #[error("webhook signature mismatch")]
    Mismatch,
}

/// Compute HMAC-SHA256 over the given body bytes using the shared secret.
/// Returns the hex-encoded MAC.
pub fn compute_signature(secret: &[u8], body: &[u8]) -> String {
    let mut mac = new_mac(secret);
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a hex HMAC-SHA256 signature against the exact bytes received.
///
/// The header must be exactly the lowercase hex that `compute_signature`
/// produces; uppercase or padded values are rejected. Comparison is
/// constant-time. Anything that is not lowercase hex is compared against
/// zeros so it takes the same path as a wrong signature.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let mut mac = new_mac(secret);
    mac.update(body);

    let expected = if is_lowercase_hex(signature) {
        hex::decode(signature).unwrap_or_else(|_| vec![0u8; 32])
    } else {
        vec![0u8; 32]
    };
    mac.verify_slice(&expected).is_ok()
}

fn is_lowercase_hex(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn new_mac(secret: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length")
}

/// Holds the process-wide webhook secret.
#[derive(Clone)]
pub struct SignatureVerifier {
    secret: Vec<u8>,
}

impl SignatureVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self { secret: secret.into() }
    }

    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        if self.secret.is_empty() {
            return Err(SignatureError::MissingSecret);
        }

        let signature = signature
            .filter(|s| !s.is_empty())
            .ok_or(SignatureError::MissingSignature)?;

        if verify_signature(&self.secret, body, signature) {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}
