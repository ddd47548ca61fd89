//! Session cookie formatting and parsing.

use std::fmt;
use std::str::FromStr;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// `SameSite` attribute of the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SameSite::Strict => f.write_str("Strict"),
            SameSite::Lax => f.write_str("Lax"),
        }
    }
}

impl FromStr for SameSite {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(SameSite::Strict),
            "lax" => Ok(SameSite::Lax),
            other => Err(format!("expected 'strict' or 'lax', got '{other}'")),
        }
    }
}

/// Attributes of the `Set-Cookie` header written on signin and logout
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub same_site: SameSite,
    /// Set `Secure`; on in production
    pub secure: bool,
    /// Lifetime in seconds, matching the token lifetime
    pub max_age_secs: i64,
}

impl SessionCookie {
    fn attributes(&self) -> String {
        let mut attrs = format!("Path=/; HttpOnly; SameSite={}", self.same_site);
        if self.secure {
            attrs.push_str("; Secure");
        }
        attrs
    }

    /// `Set-Cookie` value storing `token`
    pub fn issue(&self, token: &str) -> String {
        format!(
            "{SESSION_COOKIE}={token}; {}; Max-Age={}",
            self.attributes(),
            self.max_age_secs
        )
    }

    /// `Set-Cookie` value that expires the session cookie immediately
    pub fn clear(&self) -> String {
        format!(
            "{SESSION_COOKIE}=; {}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.attributes()
        )
    }
}

/// Pull the session token out of a `Cookie` request header.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cookie(secure: bool) -> SessionCookie {
        SessionCookie {
            same_site: SameSite::Strict,
            secure,
            max_age_secs: 86_400,
        }
    }

    #[test]
    fn test_issue_attributes() {
        let value = cookie(false).issue("abc.def.ghi");
        assert_eq!(
            value,
            "token=abc.def.ghi; Path=/; HttpOnly; SameSite=Strict; Max-Age=86400"
        );
        assert!(cookie(true).issue("t").contains("; Secure"));
    }

    #[test]
    fn test_clear_expires_cookie() {
        let value = cookie(true).clear();
        assert!(value.starts_with("token=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(value.contains("Expires=Thu, 01 Jan 1970 00:00:00 GMT"));
        assert!(value.contains("HttpOnly"));
    }

    #[test]
    fn test_parse_cookie_header() {
        assert_eq!(token_from_cookie_header("token=abc"), Some("abc"));
        assert_eq!(
            token_from_cookie_header("theme=dark; token=abc.def; lang=en"),
            Some("abc.def")
        );
        assert_eq!(token_from_cookie_header("mytoken=abc"), None);
        assert_eq!(token_from_cookie_header("token="), None);
        assert_eq!(token_from_cookie_header(""), None);
    }

    #[test]
    fn test_same_site_parse() {
        assert_eq!("LAX".parse::<SameSite>().unwrap(), SameSite::Lax);
        assert_eq!("strict".parse::<SameSite>().unwrap(), SameSite::Strict);
        assert!("none".parse::<SameSite>().is_err());
    }
}
