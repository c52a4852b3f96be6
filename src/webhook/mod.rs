pub mod processor;
pub mod signature;

pub use processor::{ProcessingOutcome, WebhookError, WebhookProcessor};
pub use signature::{compute_signature, verify_signature, SignatureError, SignatureVerifier, SIGNATURE_HEADER};
