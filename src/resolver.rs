//! The Resolver Facade: the one public entry point most callers need.
//! See spec.md §4.7.

use std::sync::Arc;

use url::Url;

use crate::config::ResolverConfig;
use crate::descriptor::ResolvedDescriptor;
use crate::error::{NetworkError, ResolveError};
use crate::http::HttpClient;
use crate::nookies::{InMemoryNookieStore, NookieStore};
use crate::phase;
use crate::session::ProcessorSession;

/// Resolves one indirect media reference into a [`ResolvedDescriptor`] by
/// driving a [`ProcessorSession`] through as many phases as the processor
/// script at `processor_url` requests.
///
/// `nookies` defaults to a fresh, process-local [`InMemoryNookieStore`] per
/// call when `None`; pass a shared store to let nookies persist across
/// resolves (spec.md §4.2).
pub async fn resolve(
    source_url: impl Into<String>,
    processor_url: &str,
    http: &dyn HttpClient,
    config: &ResolverConfig,
    nookies: Option<Arc<dyn NookieStore>>,
) -> Result<ResolvedDescriptor, ResolveError> {
    let proc_url = Url::parse(processor_url).map_err(NetworkError::from)?;
    let nookies = nookies.unwrap_or_else(|| Arc::new(InMemoryNookieStore::new()));

    let mut session = ProcessorSession::new(
        source_url,
        proc_url,
        config.platform.clone(),
        config.version.clone(),
        config.default_agent.clone(),
        config.max_phases,
        nookies,
    );

    phase::run(&mut session, http).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::http::{FetchRequest, FetchResponse};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedClient {
        responses: Mutex<Vec<&'static str>>,
    }

    #[async_trait]
    impl HttpClient for ScriptedClient {
        async fn fetch(
            &self,
            _url: &str,
            _request: &FetchRequest,
        ) -> Result<FetchResponse, NetworkError> {
            let body = self.responses.lock().unwrap().remove(0);
            Ok(FetchResponse {
                content: body.to_string(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn resolves_a_one_phase_v2_script() {
        let client = ScriptedClient {
            responses: Mutex::new(vec!["v2\nurl='http://media.example/video.mp4\nplay"]),
        };
        let descriptor = resolve(
            "http://source.example/watch?id=1",
            "http://processor.example/resolve",
            &client,
            &ResolverConfig::default(),
            None,
        )
        .await
        .unwrap();
        assert_eq!(descriptor.url, "http://media.example/video.mp4");
    }

    #[tokio::test]
    async fn rejects_malformed_processor_url() {
        let client = ScriptedClient {
            responses: Mutex::new(vec![]),
        };
        let err = resolve(
            "http://source.example/watch",
            "not a url",
            &client,
            &ResolverConfig::default(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ResolveError::Network(_)));
    }
}
