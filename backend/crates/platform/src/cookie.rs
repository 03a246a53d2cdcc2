//! Cookie handling
//!
//! `Set-Cookie` values for the HttpOnly auth cookies, and lookup of values
//! sent back in `Cookie` headers.

use axum::http::{HeaderMap, header};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Attributes of one HttpOnly cookie
///
/// Script access is never granted: every cookie built here carries `HttpOnly`.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    /// Session cookie when `None`
    pub max_age_secs: Option<i64>,
}

impl CookieConfig {
    /// `Secure`, `SameSite=Lax`, `Path=/`, session lifetime
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            secure: true,
            same_site: SameSite::default(),
            path: "/".to_string(),
            max_age_secs: None,
        }
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    pub fn with_max_age(mut self, secs: i64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    pub fn build_set_cookie(&self, value: &str) -> String {
        self.render(value, self.max_age_secs)
    }

    /// Expire the cookie immediately, with the same scope it was set with
    pub fn build_delete_cookie(&self) -> String {
        self.render("", Some(0))
    }

    fn render(&self, value: &str, max_age_secs: Option<i64>) -> String {
        let mut parts = vec![
            format!("{}={}", self.name, value),
            "HttpOnly".to_string(),
        ];
        if self.secure {
            parts.push("Secure".to_string());
        }
        parts.push(format!("SameSite={}", self.same_site.as_str()));
        parts.push(format!("Path={}", self.path));
        if let Some(secs) = max_age_secs {
            parts.push(format!("Max-Age={secs}"));
        }

        parts.join("; ")
    }
}

/// First non-empty value of the named cookie
///
/// Every `Cookie` header is searched, since HTTP/2 clients may split them.
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_set_cookie_attributes() {
        let cookie = CookieConfig::named("accessToken")
            .with_same_site(SameSite::Strict)
            .with_max_age(3600)
            .build_set_cookie("jwt");

        assert_eq!(
            cookie,
            "accessToken=jwt; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age=3600"
        );
    }

    #[test]
    fn test_insecure_session_cookie() {
        let cookie = CookieConfig::named("oauthState")
            .with_secure(false)
            .build_set_cookie("s1");

        assert_eq!(cookie, "oauthState=s1; HttpOnly; SameSite=Lax; Path=/");
    }

    #[test]
    fn test_delete_cookie_keeps_scope() {
        let cookie = CookieConfig::named("oauthState")
            .with_same_site(SameSite::None)
            .with_max_age(600)
            .build_delete_cookie();

        assert_eq!(
            cookie,
            "oauthState=; HttpOnly; Secure; SameSite=None; Path=/; Max-Age=0"
        );
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; accessToken=abc123; empty="),
        );

        assert_eq!(
            extract_cookie(&headers, "accessToken"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_cookie(&headers, "empty"), None);
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }

    #[test]
    fn test_extract_cookie_across_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(header::COOKIE, HeaderValue::from_static("refreshToken=r1"));

        assert_eq!(
            extract_cookie(&headers, "refreshToken"),
            Some("r1".to_string())
        );
    }
}
