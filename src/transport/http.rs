//! Cookie-carrying HTTP session client.
//!
//! Drives an ordered sequence of form submissions and reads against one
//! target instance, keeping session continuity (cookies) across steps and
//! following the target's own redirects. Each step hands the status and body
//! back to the adapter for marker inspection; the client itself interprets
//! nothing.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use crate::error::BotError;

/// Status and body of one step, for marker inspection by the adapter.
#[derive(Debug)]
pub struct StepResponse {
    /// Final HTTP status after redirects.
    pub status: StatusCode,
    /// Response body as text.
    pub body: String,
}

impl StepResponse {
    /// Fail the attempt if the target answered with an HTTP error status.
    ///
    /// A reachable target that serves 4xx/5xx on a step the protocol expects
    /// to succeed is treated as a transport-level fault (the scoring engine
    /// sees `error`, matching a target that is up but broken at the HTTP
    /// layer).
    pub fn ensure_ok(self, step: &str) -> Result<Self, BotError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(BotError::transport(format!(
                "{step} answered HTTP {}",
                self.status
            )))
        }
    }
}

/// One ephemeral HTTP session against a single target instance.
///
/// Owned by exactly one injection attempt and dropped with it; the cookie
/// store never outlives the attempt.
#[derive(Debug)]
pub struct FormSession {
    client: Client,
    base: Url,
}

impl FormSession {
    /// Build a session client for `http://host:port/` with a per-call timeout.
    pub fn open(host: &str, port: u16, call_timeout: Duration) -> Result<Self, BotError> {
        let base = Url::parse(&format!("http://{host}:{port}/"))
            .map_err(|e| BotError::input(format!("invalid target address {host}:{port}: {e}")))?;
        let client = Client::builder()
            .cookie_store(true)
            .timeout(call_timeout)
            .build()
            .map_err(|e| BotError::transport(format!("build http client: {e}")))?;
        Ok(Self { client, base })
    }

    fn url(&self, path: &str) -> Result<Url, BotError> {
        self.base
            .join(path)
            .map_err(|e| BotError::input(format!("invalid path {path}: {e}")))
    }

    /// Submit a form-encoded POST and return the final response.
    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> Result<StepResponse, BotError> {
        let url = self.url(path)?;
        let resp = self
            .client
            .post(url)
            .form(fields)
            .send()
            .await
            .map_err(|e| BotError::transport(format!("POST {path} failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BotError::transport(format!("read body of POST {path}: {e}")))?;
        Ok(StepResponse { status, body })
    }

    /// Fetch a page within the session.
    pub async fn get(&self, path: &str) -> Result<StepResponse, BotError> {
        let url = self.url(path)?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| BotError::transport(format!("GET {path} failed: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| BotError::transport(format!("read body of GET {path}: {e}")))?;
        Ok(StepResponse { status, body })
    }
}
