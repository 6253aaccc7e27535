// src/connectors/signer.rs
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Builds the canonical query string the signature is computed over.
/// Parameter order is preserved; the exchange verifies the signature
/// against these exact bytes, so the caller must not reorder or re-encode
/// the query afterwards.
///
/// Values are joined raw, without percent-encoding: every parameter sent
/// today (symbols, sides, decimal strings, exchange order ids) is
/// URL-safe. A value containing `&`, `=`, a space or other reserved
/// characters must not be passed here — it would be transmitted
/// differently than it was signed.
pub fn canonical_query(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// HMAC-SHA256 over the UTF-8 bytes of the query string, keyed by the API
/// secret, lowercase hex. Pure and deterministic; an empty secret is a
/// configuration problem for the caller, not an error here.
pub fn sign(query: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
