//! Test fixture generators
//!
//! Unsigned JWT-shaped tokens for exercising expiry-claim caching. The
//! signature segment is empty; nothing in this crate verifies signatures.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde_json::{json, Value};

/// Encode `claims` as an unsigned token (`header.payload.`)
///
/// # Examples
///
/// ```
/// use steadfast_common::testing::fixtures::unsigned_jwt;
///
/// let token = unsigned_jwt(&serde_json::json!({"sub": "svc"}));
/// assert_eq!(token.split('.').count(), 3);
/// assert!(token.ends_with('.'));
/// ```
pub fn unsigned_jwt(claims: &Value) -> String {
    let header = json!({"alg": "none", "typ": "JWT"});
    format!(
        "{}.{}.",
        URL_SAFE_NO_PAD.encode(header.to_string()),
        URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

/// Unsigned token whose `exp` claim is `exp_secs` seconds after the epoch
pub fn jwt_expiring_at(exp_secs: i64) -> String {
    unsigned_jwt(&json!({"sub": "service-account", "exp": exp_secs}))
}

/// Unsigned token without an `exp` claim
pub fn jwt_without_expiry() -> String {
    unsigned_jwt(&json!({"sub": "service-account"}))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_round_trips() {
        let token = jwt_expiring_at(42);
        let payload = token.split('.').nth(1).unwrap();
        let claims: Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(payload).unwrap()).unwrap();

        assert_eq!(claims["exp"], 42);
        assert!(jwt_without_expiry().split('.').nth(1).is_some());
    }
}
