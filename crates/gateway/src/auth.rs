//! Session-token verification. Tokens are issued by the authentication
//! collaborator; this service only decodes and validates them, from either
//! the session cookie or an `Authorization: Bearer` header.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "gear_session";

/// Claims carried by the signed session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    #[serde(rename = "userType")]
    pub user_type: String,
    pub email: String,
    pub exp: usize,
}

pub(crate) fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get("cookie")?.to_str().ok()?;
    for pair in cookie_header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let key = parts.next()?.trim();
        let value = parts.next()?.trim();
        if key == name {
            return Some(value.to_string());
        }
    }
    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Extracts and verifies the session token, preferring the cookie over the
/// bearer header.
pub fn require_session(headers: &HeaderMap, state: &AppState) -> Result<Claims, ApiError> {
    let token = get_cookie_value(headers, SESSION_COOKIE)
        .or_else(|| bearer_token(headers))
        .ok_or(ApiError::Unauthorized)?;

    let token_data = jsonwebtoken::decode::<Claims>(
        &token,
        &jsonwebtoken::DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|_| ApiError::Unauthorized)?;

    Ok(token_data.claims)
}

/// Administrative routes additionally require `userType == "admin"`.
pub fn require_admin(headers: &HeaderMap, state: &AppState) -> Result<Claims, ApiError> {
    let claims = require_session(headers, state)?;
    if claims.user_type != "admin" {
        return Err(ApiError::Forbidden);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_parsing_finds_the_named_pair() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("other=1; gear_session=abc.def.ghi; theme=dark"),
        );
        assert_eq!(
            get_cookie_value(&headers, SESSION_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
        assert!(get_cookie_value(&headers, "missing").is_none());
    }

    #[test]
    fn bearer_header_is_a_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer tok123"));
        assert_eq!(bearer_token(&headers).as_deref(), Some("tok123"));

        let empty = HeaderMap::new();
        assert!(bearer_token(&empty).is_none());
    }
}
