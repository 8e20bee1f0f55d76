use axum::http::HeaderMap;

pub const SESSION_COOKIE_NAME: &str = "agora_session";

#[derive(Clone, Debug)]
pub struct SessionCookie {
    pub session_id: String,
}

impl SessionCookie {
    pub fn new(session_id: String) -> Self {
        Self { session_id }
    }

    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        cookie_value(headers, SESSION_COOKIE_NAME).map(|session_id| Self { session_id })
    }

    pub fn to_cookie_header(&self, max_age: i64) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE_NAME, self.session_id, max_age
        )
    }

    pub fn delete_cookie_header() -> String {
        format!(
            "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
            SESSION_COOKIE_NAME
        )
    }
}

/// Value of the first cookie called `name` in the `Cookie` header.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;

    cookie_header.split(';').find_map(|cookie| {
        cookie
            .trim()
            .strip_prefix(name)
            .and_then(|s| s.strip_prefix('='))
            .map(str::to_string)
    })
}
