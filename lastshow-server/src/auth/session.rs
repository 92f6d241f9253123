use std::fmt;

use axum::http::{HeaderMap, header};
use cookie::{Cookie, SameSite};
use time::{Duration as TimeDuration, OffsetDateTime};

use shared::config::server::{Config, CookieSameSite};

/// Opaque bearer credential issued by the remote API.
///
/// The gateway never inspects the token; it only stores and forwards it.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a raw token.
    ///
    /// Returns `None` for an empty value or one that cannot be stored verbatim
    /// in a cookie (RFC 6265 `cookie-octet`s only).
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        if raw.is_empty() || !raw.bytes().all(is_cookie_octet) {
            None
        } else {
            Some(Self(raw))
        }
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// The session as seen by one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<SessionToken>,
}

impl Session {
    #[must_use]
    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    #[must_use]
    pub fn is_present(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn into_token(self) -> Option<SessionToken> {
        self.token
    }
}

/// Reads and writes the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCodec {
    cookie_name: String,
    max_age: TimeDuration,
    secure: bool,
    same_site: SameSite,
    domain: Option<String>,
}

impl SessionCodec {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let max_age = i64::try_from(config.session.max_age_seconds).unwrap_or(i64::MAX);
        Self {
            cookie_name: config.session.cookie_name.clone(),
            max_age: TimeDuration::seconds(max_age),
            secure: config.cookie_secure(),
            same_site: map_same_site(config.security.cookie.same_site),
            domain: config.security.cookie.domain.clone(),
        }
    }

    /// Extracts the session from the request's `Cookie` headers.
    #[must_use]
    pub fn read(&self, headers: &HeaderMap) -> Session {
        Session {
            token: extract_session_cookie(headers, &self.cookie_name).and_then(SessionToken::new),
        }
    }

    /// Cookie that stores `token` for the configured max-age.
    #[must_use]
    pub fn issue(&self, token: &SessionToken) -> Cookie<'static> {
        self.builder(token.expose().to_owned())
            .max_age(self.max_age)
            .build()
    }

    /// Cookie that makes the browser drop the session immediately.
    #[must_use]
    pub fn clear(&self) -> Cookie<'static> {
        self.builder(String::new())
            .max_age(TimeDuration::seconds(0))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }

    fn builder(&self, value: String) -> cookie::CookieBuilder<'static> {
        let mut builder = Cookie::build((self.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(self.same_site);

        if let Some(domain) = &self.domain {
            builder = builder.domain(domain.clone());
        }

        builder
    }
}

fn is_cookie_octet(byte: u8) -> bool {
    matches!(byte, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

fn map_same_site(value: CookieSameSite) -> SameSite {
    match value {
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::None => SameSite::None,
    }
}

fn extract_session_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value).flatten())
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
}
