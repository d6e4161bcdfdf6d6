use base64::engine::{general_purpose, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "X-Scheduler-Timestamp";
pub const NONCE_HEADER: &str = "X-Scheduler-Nonce";
pub const SIGNATURE_HEADER: &str = "X-Scheduler-Signature";

/// Request signing for outbound notification webhooks.
///
/// The receiver recomputes the signature from the method, the headers and
/// the raw body with the shared secret.
pub struct WebhookAuth;

impl WebhookAuth {
    /// Eight random digits.
    pub fn generate_nonce() -> String {
        rand::thread_rng().gen_range(10000000..99999999).to_string()
    }

    pub fn get_timestamp() -> i64 {
        Utc::now().timestamp()
    }

    /// Base64 of the hex HMAC-SHA256 over
    /// `"{method}\n{timestamp}\n{nonce}\n{path}\n{body}"`.
    pub fn generate_signature(
        secret: &str,
        method: &str,
        path: &str,
        timestamp: i64,
        nonce: &str,
        body: &str,
    ) -> String {
        let content = format!("{}\n{}\n{}\n{}\n{}", method, timestamp, nonce, path, body);
        debug!("String to sign: {}", content.replace('\n', "\\n"));

        // HMAC accepts keys of any length, so this never fails
        let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(content.as_bytes());

        let hex_hash = hex::encode(mac.finalize().into_bytes());
        general_purpose::STANDARD.encode(hex_hash.as_bytes())
    }

    /// Check a received signature against the expected one.
    pub fn verify_signature(
        secret: &str,
        method: &str,
        path: &str,
        timestamp: i64,
        nonce: &str,
        body: &str,
        signature: &str,
    ) -> bool {
        let expected = Self::generate_signature(secret, method, path, timestamp, nonce, body);
        !expected.is_empty() && expected == signature
    }
}
