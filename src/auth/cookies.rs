use cookie::{Cookie, SameSite};

use super::SESSION_COOKIE;
use crate::config::MAX_SESSION_EXPIRY_HOURS;

/// `Set-Cookie` value carrying a freshly issued session token
pub fn session_cookie(token: &str, expiry_hours: u64, secure: bool) -> String {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(cookie::time::Duration::hours(expiry_hours.min(MAX_SESSION_EXPIRY_HOURS) as i64))
        .secure(secure)
        .build()
        .to_string()
}

/// `Set-Cookie` value that expires the session cookie
pub fn clear_session_cookie(secure: bool) -> String {
    Cookie::build((SESSION_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(cookie::time::Duration::ZERO)
        .secure(secure)
        .build()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_attributes() {
        let value = session_cookie("abc.def.ghi", 24, false);
        assert!(value.starts_with("portal_session=abc.def.ghi"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("SameSite=Lax"));
        assert!(value.contains("Path=/"));
        assert!(value.contains("Max-Age=86400"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn huge_expiry_is_capped_at_a_year() {
        let value = session_cookie("abc.def.ghi", u64::MAX, true);
        assert!(value.contains(&format!("Max-Age={}", MAX_SESSION_EXPIRY_HOURS * 3600)));
    }

    #[test]
    fn clearing_cookie_expires_immediately() {
        let value = clear_session_cookie(true);
        assert!(value.starts_with("portal_session=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(value.contains("Secure"));
    }
}
