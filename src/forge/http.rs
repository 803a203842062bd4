//! HTTP client that authenticates every request through host rules.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{ForgeError, Result};
use crate::hosts::HostRules;

const USER_AGENT: &str = concat!("forge-update-coordinator/", env!("CARGO_PKG_VERSION"));

/// Sends requests carrying the token of the host rule that matches the URL.
///
/// The token is resolved before anything goes on the wire, so a host with
/// no usable token fails with [`ForgeError::Auth`] without network I/O.
pub struct AuthenticatedClient {
    http: HttpClient,
    rules: HostRules,
}

impl AuthenticatedClient {
    pub fn new(rules: HostRules, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { http, rules })
    }

    pub fn host_rules(&self) -> &HostRules {
        &self.rules
    }

    /// Starts a credentialed request to `url`.
    pub fn request(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self.rules.token_for(url)?;
        Ok(self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("token {}", token.expose_secret())))
    }

    /// Sends `request`, turning non-2xx responses into [`ForgeError::Api`].
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(url = %response.url(), status = status.as_u16(), "forge response");

        if status.is_client_error() || status.is_server_error() {
            let body = response.bytes().await?;
            return Err(parse_error_response(status, &body));
        }
        Ok(response)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, url)?).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let response = self
            .send(self.request(Method::POST, url)?.json(body))
            .await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Returns false on 404, true on success.
    pub async fn exists(&self, url: &str) -> Result<bool> {
        match self.send(self.request(Method::GET, url)?).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_status(404) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Creates a ForgeError from an error response body like
/// `{"message": "...", "url": "..."}`.
fn parse_error_response(status: StatusCode, body: &[u8]) -> ForgeError {
    #[derive(Deserialize)]
    struct ErrorResponse {
        message: Option<String>,
    }

    let message = serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.message)
        .unwrap_or_else(|| String::from_utf8_lossy(body).to_string());

    if status != StatusCode::NOT_FOUND {
        warn!(status = status.as_u16(), message = %message, "forge api error");
    }

    ForgeError::Api {
        status: status.as_u16(),
        message,
    }
}
