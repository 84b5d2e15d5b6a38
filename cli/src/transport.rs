//! Blocking HTTP execution for the core's request descriptions.

use std::time::Duration;

use items_core::{ApiError, HttpMethod, HttpRequest, HttpResponse, Transport};
use tracing::debug;

pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = request.url();
        let result = match (request.method, request.body) {
            (HttpMethod::Get, _) => self.agent.get(&url).call(),
            (HttpMethod::Delete, _) => self.agent.delete(&url).call(),
            (HttpMethod::Post, Some(body)) => self
                .agent
                .post(&url)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Post, None) => self.agent.post(&url).send_empty(),
            (HttpMethod::Put, Some(body)) => self
                .agent
                .put(&url)
                .content_type("application/json")
                .send(body.as_bytes()),
            (HttpMethod::Put, None) => self.agent.put(&url).send_empty(),
        };
        let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        debug!(%url, status, "response");
        Ok(HttpResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}
