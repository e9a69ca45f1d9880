//! Bearer Token Extraction
//!
//! `Authorization: Bearer <token>` parsing shared by every protected route.

use axum::http::{HeaderMap, header};

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an `Authorization: Bearer` header.
///
/// Returns `None` when the header is missing, not ASCII, uses another
/// scheme, or carries an empty token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    // Scheme names are case-insensitive (RFC 9110 §11.1)
    let (scheme, token) = value.split_at_checked(BEARER_PREFIX.len())?;
    if !scheme.eq_ignore_ascii_case(BEARER_PREFIX) {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_extract_bearer_token() {
        let headers = headers_with("Bearer abc.123.xyz");
        assert_eq!(extract_bearer_token(&headers), Some("abc.123.xyz"));
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let headers = headers_with("bearer abc");
        assert_eq!(extract_bearer_token(&headers), Some("abc"));
    }

    #[test]
    fn test_rejects_other_schemes_and_empty_tokens() {
        assert_eq!(extract_bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer_token(&headers_with("Bearer    ")), None);
        assert_eq!(extract_bearer_token(&headers_with("Bear")), None);
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }
}
