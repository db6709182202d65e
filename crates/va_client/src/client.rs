use std::collections::HashMap;

use async_trait::async_trait;
use futures::TryStreamExt as _;
use reqwest::{
    StatusCode,
    header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use tracing::{error, trace};

use crate::{
    Backend, ByteStream, ChatRequest,
    error::{Error, Result},
};

/// HTTP client for the inference endpoint.
///
/// Requests are sent to `{endpoint}/{model}`. When talking to the edge proxy
/// no credentials are needed; the API key is only required when talking to
/// the upstream gateway directly.
#[derive(Debug, Clone)]
pub struct Client {
    pub api_key: Option<String>,
    http_client: reqwest::Client,
    endpoint: String,
}

impl Client {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            api_key: None,
            http_client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The URL requests for `model` are sent to.
    #[must_use]
    pub fn url_for(&self, model: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            model.trim_start_matches('/')
        )
    }

    /// Build HTTP headers required for making API calls.
    /// Returns an error if any header value cannot be constructed.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(api_key) = &self.api_key {
            headers.insert(
                AUTHORIZATION,
                format!("Bearer {api_key}")
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid API key header format: {e}")))?,
            );
        }

        Ok(headers)
    }
}

#[async_trait]
impl Backend for Client {
    async fn send(&self, model: &str, request: &ChatRequest) -> Result<ByteStream> {
        let url = self.url_for(model);
        let headers = self.build_headers()?;
        let body = serde_json::to_vec(request)?;

        let redacted_headers = headers
            .iter()
            .map(|(k, v)| {
                if *k == AUTHORIZATION {
                    return (k.to_owned(), "[REDACTED]".to_string());
                }

                (k.to_owned(), v.to_str().unwrap_or_default().to_owned())
            })
            .collect::<HashMap<_, _>>();

        trace!(
            %url,
            headers = ?redacted_headers,
            messages = request.messages.len(),
            "Triggering request."
        );
        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        trace!(
            status = status.as_u16(),
            content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .map(|v| v.to_str().unwrap_or_default()),
            "Received response."
        );

        if status == StatusCode::UNAUTHORIZED {
            error!("Request was not authorized.");
            return Err(Error::Unauthorized);
        }

        if !status.is_success() {
            let code = status.as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status = code, %body, "Unexpected response.");

            return Err(Error::Status { code, body });
        }

        Ok(Box::pin(response.bytes_stream().map_err(Error::from)))
    }
}
