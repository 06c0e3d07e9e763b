//! Caller identity taken from request headers.
//!
//! Authentication happens upstream; the API trusts `X-User-Id` and the
//! `X-Premium` entitlement flag as given.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use aura_models::{is_valid_token, UserId};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const PREMIUM_HEADER: &str = "x-premium";
pub const PROGRESS_HEADER: &str = "x-progress-token";

/// User assumed when no `X-User-Id` header is sent.
pub const DEFAULT_USER_ID: UserId = 1;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// The calling user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub premium: bool,
}

impl Caller {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let user_id = match header_str(headers, USER_ID_HEADER) {
            Some(raw) => raw
                .parse()
                .map_err(|_| ApiError::bad_request("X-User-Id must be an integer"))?,
            None => DEFAULT_USER_ID,
        };
        let premium = header_str(headers, PREMIUM_HEADER)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(Self { user_id, premium })
    }

    pub fn require_premium(&self) -> Result<(), ApiError> {
        if self.premium {
            Ok(())
        } else {
            Err(ApiError::forbidden("Video briefings are a premium feature"))
        }
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Caller::from_headers(&parts.headers)
    }
}

/// Optional `X-Progress-Token` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressToken(pub Option<String>);

impl ProgressToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for ProgressToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match header_str(&parts.headers, PROGRESS_HEADER) {
            Some(token) if is_valid_token(token) => Ok(Self(Some(token.to_string()))),
            Some(_) => Err(ApiError::bad_request("Invalid progress token")),
            None => Ok(Self(None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_caller_defaults() {
        let caller = Caller::from_headers(&HeaderMap::new()).unwrap();
        assert_eq!(caller, Caller { user_id: DEFAULT_USER_ID, premium: false });
        assert!(caller.require_premium().is_err());
    }

    #[test]
    fn test_caller_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static(" 42 "));
        headers.insert(PREMIUM_HEADER, HeaderValue::from_static("TRUE"));
        let caller = Caller::from_headers(&headers).unwrap();
        assert_eq!(caller.user_id, 42);
        assert!(caller.require_premium().is_ok());

        headers.insert(USER_ID_HEADER, HeaderValue::from_static("abc"));
        assert!(Caller::from_headers(&headers).is_err());
    }
}
