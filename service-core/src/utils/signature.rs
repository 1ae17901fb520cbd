use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `payload` under `secret`.
pub fn sign_payload(secret: &str, payload: &[u8]) -> Result<String, anyhow::Error> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid key length: {}", e))?;

    mac.update(payload);
    let result = mac.finalize();

    Ok(hex::encode(result.into_bytes()))
}

/// Verify a hex HMAC-SHA256 signature using constant-time comparison
pub fn verify_payload(secret: &str, payload: &[u8], signature: &str) -> Result<bool, anyhow::Error> {
    let expected_signature = sign_payload(secret, payload)?;

    let expected_bytes = expected_signature.as_bytes();
    let signature_bytes = signature.trim().to_ascii_lowercase();
    let signature_bytes = signature_bytes.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return Ok(false);
    }

    Ok(expected_bytes.ct_eq(signature_bytes).into())
}

/// Hook deliveries sign `"{timestamp}.{body}"` so the timestamp cannot be
/// swapped without invalidating the signature.
fn hook_payload(timestamp: i64, body: &[u8]) -> Vec<u8> {
    let mut payload = format!("{}.", timestamp).into_bytes();
    payload.extend_from_slice(body);
    payload
}

pub fn sign_hook(secret: &str, timestamp: i64, body: &[u8]) -> Result<String, anyhow::Error> {
    sign_payload(secret, &hook_payload(timestamp, body))
}

pub fn verify_hook(
    secret: &str,
    timestamp: i64,
    body: &[u8],
    signature: &str,
) -> Result<bool, anyhow::Error> {
    verify_payload(secret, &hook_payload(timestamp, body), signature)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "hook_secret";
    const BODY: &[u8] = br#"{"uid":"user-1"}"#;

    #[test]
    fn test_signature_generation_and_verification() {
        let signature = sign_payload(SECRET, BODY).unwrap();
        assert_eq!(signature.len(), 64);
        assert!(verify_payload(SECRET, BODY, &signature).unwrap());
    }

    #[test]
    fn test_uppercase_hex_accepted() {
        let signature = sign_payload(SECRET, BODY).unwrap().to_uppercase();
        assert!(verify_payload(SECRET, BODY, &signature).unwrap());
    }

    #[test]
    fn test_invalid_signature() {
        let signature = sign_payload(SECRET, BODY).unwrap();
        let flipped = if signature.starts_with('a') { 'b' } else { 'a' };
        let invalid_signature = format!("{}{}", flipped, &signature[1..]);
        assert!(!verify_payload(SECRET, BODY, &invalid_signature).unwrap());
    }

    #[test]
    fn test_tampered_body() {
        let signature = sign_payload(SECRET, BODY).unwrap();
        let modified_body = br#"{"uid":"user-2"}"#;
        assert!(!verify_payload(SECRET, modified_body, &signature).unwrap());
    }

    #[test]
    fn test_wrong_secret() {
        let signature = sign_payload("other_secret", BODY).unwrap();
        assert!(!verify_payload(SECRET, BODY, &signature).unwrap());
    }

    #[test]
    fn test_hook_signature_binds_timestamp() {
        let signature = sign_hook(SECRET, 1_700_000_000, BODY).unwrap();
        assert!(verify_hook(SECRET, 1_700_000_000, BODY, &signature).unwrap());
        assert!(!verify_hook(SECRET, 1_700_000_001, BODY, &signature).unwrap());
        assert!(!verify_payload(SECRET, BODY, &signature).unwrap());
    }
}
