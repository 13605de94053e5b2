//! HTTP gateway to the register endpoints.
//!
//! Authenticates the way the browser does: the session and CSRF cookies, plus
//! `X-CSRFToken` and `X-Requested-With` on the close-out POST.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::traits::*;
use crate::types::*;
use crate::wire::*;

/// Convert a `reqwest::Error` into a user-facing message
fn friendly_error(url: &str, err: &reqwest::Error) -> ReconciliationError {
    let message = if err.is_connect() {
        format!("cannot reach the server at {url}")
    } else if err.is_timeout() {
        format!("request to {url} timed out")
    } else if err.is_decode() {
        format!("unexpected response body from {url}")
    } else {
        format!("error communicating with {url}: {err}")
    };
    ReconciliationError::Network(message)
}

fn status_error(status: StatusCode) -> ReconciliationError {
    let message = match status.as_u16() {
        401 | 403 => "session expired or missing permission".to_string(),
        404 => "register endpoint not found".to_string(),
        s if s >= 500 => format!("server error (HTTP {s})"),
        s => format!("unexpected response (HTTP {s})"),
    };
    ReconciliationError::Network(message)
}

/// Gateway backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    config: GatewayConfig,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> ReconciliationResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ReconciliationError::Network(format!("HTTP client error: {e}")))?;
        Ok(Self { client, config })
    }

    fn cookie_header(&self) -> Option<String> {
        let mut cookies = Vec::new();
        if let Some(session_id) = &self.config.session_id {
            cookies.push(format!("sessionid={session_id}"));
        }
        if let Some(token) = &self.config.csrf_token {
            cookies.push(format!("csrftoken={token}"));
        }
        if cookies.is_empty() {
            None
        } else {
            Some(cookies.join("; "))
        }
    }

    fn authenticated(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header("X-Requested-With", "XMLHttpRequest");
        match self.cookie_header() {
            Some(cookie) => builder.header("Cookie", cookie),
            None => builder,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> ReconciliationResult<T> {
        let url = self.config.url(path);
        debug!(url = %url, "GET");

        let response = self
            .authenticated(self.client.get(&url))
            .send()
            .await
            .map_err(|e| friendly_error(&url, &e))?;

        let status = response.status();
        // Failed lookups still answer with a JSON body carrying `success: false`.
        match response.json::<T>().await {
            Ok(body) => Ok(body),
            Err(_) if !status.is_success() => Err(status_error(status)),
            Err(e) => Err(friendly_error(&url, &e)),
        }
    }
}

#[async_trait]
impl CloseRegisterGateway for HttpGateway {
    async fn fetch_denominations(&self) -> ReconciliationResult<Vec<Denomination>> {
        let body: DenominationsResponse = self.get_json(&self.config.denominations_path).await?;
        body.into_domain()
    }

    async fn fetch_register_status(&self) -> ReconciliationResult<RegisterStatus> {
        let body: RegisterStatusResponse = self.get_json(&self.config.status_path).await?;
        body.into_domain()
    }

    async fn submit_close(
        &self,
        request: &CloseRegisterRequest,
    ) -> ReconciliationResult<CloseRegisterResponse> {
        let url = self.config.url(&self.config.close_path);
        debug!(url = %url, denominations = request.conteos.len(), "POST close-out");

        let mut builder = self.authenticated(self.client.post(&url)).json(request);
        if let Some(token) = &self.config.csrf_token {
            builder = builder.header("X-CSRFToken", token);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(url = %url, error = %e, "close-out POST failed");
            friendly_error(&url, &e)
        })?;

        let status = response.status();
        match response.json::<CloseRegisterResponse>().await {
            Ok(body) => Ok(body),
            Err(_) if !status.is_success() => Err(status_error(status)),
            Err(e) => Err(friendly_error(&url, &e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_header() {
        let mut config = GatewayConfig::new("https://pos.example.com");
        let gateway = HttpGateway::new(config.clone()).unwrap();
        assert_eq!(gateway.cookie_header(), None);

        config.session_id = Some("s3ss".to_string());
        config.csrf_token = Some("t0k".to_string());
        let gateway = HttpGateway::new(config).unwrap();
        assert_eq!(
            gateway.cookie_header().as_deref(),
            Some("sessionid=s3ss; csrftoken=t0k")
        );
    }

    #[test]
    fn test_status_error_is_network() {
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR),
            ReconciliationError::Network(_)
        ));
    }
}
