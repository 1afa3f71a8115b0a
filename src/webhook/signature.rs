use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-slack-signature";
pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";

/// Oldest (or furthest in the future) request we accept, in seconds.
pub const MAX_REQUEST_AGE_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    #[error("timestamp header is not a unix time")]
    BadTimestamp,

    #[error("request timestamp {timestamp} is outside the replay window (now {now})")]
    Stale { timestamp: i64, now: i64 },

    #[error("signature is not a v0 hex digest")]
    Malformed,

    #[error("signature does not match body")]
    Mismatch,
}

/// Check a request against the shared signing secret.
///
/// The signed base string is `v0:<timestamp>:<body>` and the header carries
/// `v0=<hex hmac-sha256>`. Digest comparison is constant time.
pub fn verify_request(
    secret: &str,
    headers: &HeaderMap,
    body: &[u8],
    now: i64,
) -> Result<(), SignatureError> {
    let signature = header_str(headers, SIGNATURE_HEADER)?;
    let timestamp_raw = header_str(headers, TIMESTAMP_HEADER)?;

    let timestamp = timestamp_raw
        .trim()
        .parse::<i64>()
        .map_err(|_| SignatureError::BadTimestamp)?;
    if (now - timestamp).abs() > MAX_REQUEST_AGE_SECS {
        return Err(SignatureError::Stale { timestamp, now });
    }

    let digest = signature
        .strip_prefix("v0=")
        .ok_or(SignatureError::Malformed)?;
    let expected = hex::decode(digest).map_err(|_| SignatureError::Malformed)?;

    let mut mac = base_mac(secret, timestamp_raw);
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Compute the `v0=` header value for a body.
#[cfg(test)]
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = base_mac(secret, timestamp);
    mac.update(body);
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}

fn base_mac(secret: &str, timestamp: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac
}

fn header_str<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, SignatureError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignatureError::MissingHeader(name))
}
