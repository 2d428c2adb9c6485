use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, header::HeaderName};
use tracing::{debug, info};
use url::Url;

use crate::error::ApiError;

use super::{ApiClient, ApiRequest};

pub const DEFAULT_BASE_URL: &str = "https://weatherkit.apple.com";

/// HTTP client for the WeatherKit REST API.
#[derive(Debug, Clone)]
pub struct WeatherKitClient {
    base_url: Url,
    token: Option<String>,
    http: Client,
}

impl WeatherKitClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::Request(format!("invalid base url '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::Request(format!("'{base_url}' cannot be used as a base url")));
        }

        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self { base_url, token, http })
    }

    /// Full target for `request`: base joined with the resource, then the present queries.
    pub fn url_for<R: ApiRequest>(&self, request: &R) -> Result<Url, ApiError> {
        let resource = request.resource();
        // non-finite coordinates would otherwise produce a path the API cannot resolve
        if resource.split('/').any(|s| matches!(s, "NaN" | "inf" | "-inf")) {
            return Err(ApiError::Request(format!("invalid resource path '{resource}'")));
        }

        let mut url = self
            .base_url
            .join(&resource)
            .map_err(|e| ApiError::Request(format!("invalid resource path '{resource}': {e}")))?;

        let present: Vec<(&str, String)> = request
            .queries()
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }

        Ok(url)
    }
}

#[async_trait]
impl ApiClient for WeatherKitClient {
    async fn perform<R: ApiRequest>(&self, request: &R) -> Result<R::Response, ApiError> {
        let url = self.url_for(request)?;
        let method = request.method();

        let mut builder = self.http.request(method.clone(), url.clone());
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        for (name, value) in request.headers() {
            let Some(value) = value else { continue };
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::Request(format!("invalid header '{name}': {e}")))?;
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body);
        }

        info!(%method, %url, "Running request");
        let res = builder.send().await?;

        let status = res.status();
        info!(status = status.as_u16(), "API response status code");

        let body = res.bytes().await?;
        if body.is_empty() {
            return Err(ApiError::Response("no data provided".to_string()));
        }

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: truncate_body(&String::from_utf8_lossy(&body)),
            });
        }

        debug!(bytes = body.len(), "Decoding response");
        let model = serde_json::from_slice(&body)?;
        Ok(model)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
