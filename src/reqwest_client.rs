//! `reqwest`-backed [`HttpClient`] implementation, mirroring the teacher
//! crate's own optional `reqwest` feature gate.

use async_trait::async_trait;
use http::HeaderMap;

use crate::error::NetworkError;
use crate::http::{Action, FetchRequest, FetchResponse, HttpClient, Method};

/// Thin wrapper so we can implement the foreign [`HttpClient`] trait on
/// `reqwest::Client` without an orphan-rule conflict, and so callers who
/// want a fresh client per session can just call [`ReqwestHttpClient::new`].
pub struct ReqwestHttpClient {
    inner: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl From<reqwest::Client> for ReqwestHttpClient {
    fn from(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn fetch(&self, url: &str, request: &FetchRequest) -> Result<FetchResponse, NetworkError> {
        let mut builder = match request.method {
            Method::Get => self.inner.get(url),
            Method::Post => self.inner.post(url).body(request.postdata.clone()),
        };

        if !request.agent.is_empty() {
            builder = builder.header(http::header::USER_AGENT, request.agent.clone());
        }
        if !request.referer.is_empty() {
            builder = builder.header(http::header::REFERER, request.referer.clone());
        }
        if !request.cookie.is_empty() {
            builder = builder.header(http::header::COOKIE, request.cookie.clone());
        }
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| NetworkError::Transport {
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let final_url = response.url().to_string();
        let location = response
            .headers()
            .get(http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .or_else(|| {
                if final_url != url {
                    Some(final_url.clone())
                } else {
                    None
                }
            });

        let mut headers = HeaderMap::new();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(http::header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(|s| s.to_string()))
            .collect();
        for (name, value) in response.headers().iter() {
            headers.append(name.clone(), value.clone());
        }

        let content = if matches!(request.action, Action::Read) {
            response
                .text()
                .await
                .map_err(|e| NetworkError::Transport {
                    url: url.to_string(),
                    source: Box::new(e),
                })?
        } else {
            // Body is still consumed to free the connection even if unused.
            let _ = response.bytes().await;
            String::new()
        };

        Ok(FetchResponse {
            content,
            headers,
            set_cookies,
            location,
        })
    }
}
