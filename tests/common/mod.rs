use std::sync::Mutex;

use async_trait::async_trait;
use nipl_engine::{Action, FetchRequest, FetchResponse, HttpClient, NetworkError};

/// Replays a fixed sequence of processor/scrape responses by call order,
/// recording every request made for later assertions.
pub struct ScriptedHttpClient {
    responses: Mutex<Vec<FetchResponse>>,
    requests: Mutex<Vec<(String, FetchRequest)>>,
}

impl ScriptedHttpClient {
    pub fn new(responses: Vec<FetchResponse>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn requested_agents(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, request)| request.agent.clone())
            .collect()
    }
}

pub fn text_response(content: &str) -> FetchResponse {
    FetchResponse {
        content: content.to_string(),
        ..Default::default()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn fetch(
        &self,
        url: &str,
        request: &FetchRequest,
    ) -> Result<FetchResponse, NetworkError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), request.clone()));
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(NetworkError::Transport {
                url: url.to_string(),
                source: "scripted client ran out of responses".into(),
            });
        }
        let mut response = responses.remove(0);
        if !matches!(request.action, Action::Read) {
            response.content.clear();
        }
        Ok(response)
    }
}
