use axum::http::HeaderMap;
use sha2::{Digest, Sha256};

/// SHA-256 hash a raw value, returning the hex-encoded digest.
///
/// Rate-limit keys are hashes, never raw tokens or fingerprints.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Seam to the external identity subsystem.
///
/// The OAuth/session/token-encryption machinery lives outside this service;
/// all it owes us is a GitHub access token for the caller, or `None` for
/// anonymous requests.
pub trait SessionProvider: Send + Sync {
    fn access_token(&self, headers: &HeaderMap) -> Option<String>;
}

/// Default provider: the caller's GitHub token arrives as a bearer header,
/// already decrypted by the identity layer upstream of this service.
pub struct BearerSessions;

impl SessionProvider for BearerSessions {
    fn access_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .filter(|token| !token.is_empty())
            .map(String::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer gho_abc"));
        assert_eq!(
            BearerSessions.access_token(&headers),
            Some("gho_abc".to_string())
        );
    }

    #[test]
    fn ignores_missing_or_malformed_header() {
        assert_eq!(BearerSessions.access_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Token xyz"));
        assert_eq!(BearerSessions.access_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(BearerSessions.access_token(&headers), None);
    }

    #[test]
    fn hashes_are_stable_hex() {
        let hash = sha256_hex("fingerprint-1");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, sha256_hex("fingerprint-1"));
        assert_ne!(hash, sha256_hex("fingerprint-2"));
    }
}
