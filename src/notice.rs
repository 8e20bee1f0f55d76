use crate::session::cookie_value;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

pub const NOTICE_COOKIE_NAME: &str = "agora_notice";

/// One-shot flash message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub text: String,
}

impl Notice {
    pub fn not_authorized() -> Self {
        Self {
            title: "Not Authorized".to_string(),
            text: "You are not authorized to do that!".to_string(),
        }
    }

    pub fn login_failed() -> Self {
        Self {
            title: "Login failed".to_string(),
            text: "Wrong email or password.".to_string(),
        }
    }

    pub fn banned() -> Self {
        Self {
            title: "You are banned!".to_string(),
            text: "Go play somewhere else :)".to_string(),
        }
    }

    pub fn to_cookie_header(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/",
            NOTICE_COOKIE_NAME,
            urlencoding::encode(&json)
        )
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let raw = cookie_value(headers, NOTICE_COOKIE_NAME)?;
        let json = urlencoding::decode(&raw).ok()?;
        serde_json::from_str(&json).ok()
    }

    pub fn clear_cookie_header() -> String {
        format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", NOTICE_COOKIE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;

    #[test]
    fn test_notice_survives_cookie_encoding() {
        let set_cookie = Notice::not_authorized().to_cookie_header();
        let pair = set_cookie.split(';').next().unwrap();
        assert!(!pair.contains(' '), "cookie value must be encoded: {pair}");

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(pair).unwrap());

        assert_eq!(Notice::from_headers(&headers), Some(Notice::not_authorized()));
    }

    #[test]
    fn test_garbage_notice_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("agora_notice=%7Bnope"));

        assert_eq!(Notice::from_headers(&headers), None);
    }
}
