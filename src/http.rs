//! The interface a NIPL session uses to perform a single HTTP request, and
//! the request/response records it carries. See spec.md §4.1.

use std::str::FromStr;

use async_trait::async_trait;
use http::HeaderMap;

use crate::error::NiplError;

/// The fixed Mozilla-on-Windows identity the NIPL ecosystem expects remote
/// sites to see unless the script overrides `s_agent`.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows; U; Windows NT 5.1; en-GB; rv:1.9.0.3) Gecko/2008092417 Firefox/3.0.3";

/// `s_method`: the HTTP verb used by a scrape request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl FromStr for Method {
    type Err = NiplError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "get" => Ok(Self::Get),
            "post" => Ok(Self::Post),
            other => Err(NiplError::InvalidMethod(other.to_string())),
        }
    }
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
        }
    }
}

/// `s_action`: what the fetch should populate in the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Populate `content` with the decoded body.
    Read,
    /// Leave `content` empty; only headers/cookies are populated.
    Headers,
    /// Leave `content` empty; resolve the redirected location.
    GetUrl,
}

impl FromStr for Action {
    type Err = NiplError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" => Ok(Self::Read),
            "headers" => Ok(Self::Headers),
            "geturl" => Ok(Self::GetUrl),
            other => Err(NiplError::InvalidAction(other.to_string())),
        }
    }
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Headers => "headers",
            Self::GetUrl => "geturl",
        }
    }
}

/// One outgoing HTTP request, built either from the `s_*` variables (a
/// scrape) or directly by the Phase Driver (a processor fetch).
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub action: Action,
    pub agent: String,
    pub referer: String,
    pub cookie: String,
    pub postdata: String,
    pub headers: HeaderMap,
}

impl Default for FetchRequest {
    fn default() -> Self {
        Self {
            method: Method::Get,
            action: Action::Read,
            agent: DEFAULT_USER_AGENT.to_string(),
            referer: String::new(),
            cookie: String::new(),
            postdata: String::new(),
            headers: HeaderMap::new(),
        }
    }
}

/// The result of a single HTTP call.
#[derive(Debug, Clone, Default)]
pub struct FetchResponse {
    /// Decoded body, populated only when `action == Action::Read`.
    pub content: String,
    /// Response headers, always populated.
    pub headers: HeaderMap,
    /// `Set-Cookie` values as received, always populated.
    pub set_cookies: Vec<String>,
    /// The `Location` header, if any (drives `geturl`).
    pub location: Option<String>,
}

/// Performs a single HTTP request. Implementations fail with
/// [`NetworkError`](crate::error::NetworkError) on any transport failure;
/// the session surfaces that and aborts.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn fetch(
        &self,
        url: &str,
        request: &FetchRequest,
    ) -> Result<FetchResponse, crate::error::NetworkError>;
}
