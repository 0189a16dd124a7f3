use {
    hmac::{Hmac, Mac},
    sha2::Sha256,
    tracing::warn,
};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the HMAC-SHA256 of the raw delivery body.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Verify a GitHub webhook signature.
///
/// GitHub sends `X-Hub-Signature-256: sha256=<hex>`. The comparison runs in
/// constant time.
pub fn verify(secret: &str, body: &[u8], signature_header: &str) -> bool {
    let Some(hex_sig) = signature_header.strip_prefix("sha256=") else {
        warn!("invalid signature header format (missing sha256= prefix)");
        return false;
    };

    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Compute the `sha256=<hex>` header value for `body`.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!("sha256={}", hex::encode(mac.finalize().into_bytes())))
}
