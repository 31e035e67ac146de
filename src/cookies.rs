//! Session-scoped cookie jar shared by all scrapes within one resolver
//! call. See spec.md §4.1 and §5 ("Shared resources").
//!
//! Adapted from the teacher crate's `Cookie`/`CookieJar` (`core.rs`), with
//! expiry parsing relaxed to accept whatever `Set-Cookie` date format a
//! site sends rather than only SAP's fixed format, since here we talk to
//! arbitrary media sites rather than one known backend.

use chrono::{DateTime, Utc};
use url::Url;

/// One cookie as received via a `Set-Cookie` header.
#[derive(Debug, Clone)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    expires: Option<DateTime<Utc>>,
}

impl Cookie {
    pub fn parse(raw: &str) -> Option<Self> {
        let (name, rest) = raw.split_once('=')?;
        let mut parts = rest.split(';');
        let value = parts.next()?.trim().to_string();

        let mut cookie = Self {
            name: name.trim().to_string(),
            value,
            path: None,
            domain: None,
            expires: None,
        };

        for attr in parts {
            let attr = attr.trim();
            if let Some((k, v)) = attr.split_once('=') {
                match k.trim().to_ascii_lowercase().as_str() {
                    "path" => cookie.path = Some(v.trim().to_string()),
                    "domain" => cookie.domain = Some(v.trim().to_string()),
                    "expires" => {
                        cookie.expires = parse_cookie_date(v.trim());
                    }
                    _ => {}
                }
            }
        }
        Some(cookie)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn as_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }

    pub fn is_allowed_for(&self, destination: &Url) -> bool {
        let host_ok = self
            .domain
            .as_ref()
            .map(|d| destination.host_str().is_some_and(|h| h.ends_with(d.trim_start_matches('.'))))
            .unwrap_or(true);
        let path_ok = self
            .path
            .as_ref()
            .map(|p| destination.path().starts_with(p.as_str()))
            .unwrap_or(true);
        host_ok && path_ok
    }

    pub fn expired(&self) -> bool {
        self.expires.map(|exp| exp < Utc::now()).unwrap_or(false)
    }
}

fn parse_cookie_date(raw: &str) -> Option<DateTime<Utc>> {
    // Accept the two formats real servers actually send; unparseable
    // expiry just means we never expire the cookie proactively.
    for fmt in ["%a, %d %b %Y %H:%M:%S GMT", "%a, %d-%b-%Y %H:%M:%S GMT"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Accumulates cookies across all requests in one resolver call and renders
/// the `Cookie:` header for the next one.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn absorb_set_cookie(&mut self, raw: &str) {
        let Some(cookie) = Cookie::parse(raw) else {
            return;
        };
        if cookie.expired() {
            self.cookies.retain(|c| c.name != cookie.name);
            return;
        }
        if let Some(existing) = self.cookies.iter_mut().find(|c| c.name == cookie.name) {
            *existing = cookie;
        } else {
            self.cookies.push(cookie);
        }
    }

    pub fn absorb_all(&mut self, raw_set_cookies: &[String]) {
        for raw in raw_set_cookies {
            self.absorb_set_cookie(raw);
        }
    }

    pub fn header_for(&self, destination: &Url) -> String {
        self.cookies
            .iter()
            .filter(|c| c.is_allowed_for(destination))
            .map(Cookie::as_pair)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// All cookies currently held, exposed as name/value pairs for the
    /// `cookies.*` namespace collection (spec.md §4.3).
    pub fn as_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|c| (c.name(), c.value()))
    }

    pub fn get(&self, name: &str) -> String {
        self.cookies
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }
}
