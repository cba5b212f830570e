use std::time::Duration;

use bytes::{Bytes, BytesMut};
use crawlx_core::{
    ConsoleError, ExportFormat, ExportOptions, HealthStatus, ListQuery, ScrapeJobRequest,
    ScrapeJobResponse, ScrapedItem, SearchQuery, UrlScrapeRequest, UrlScrapeResponse,
};
use crawlx_logging::{crawlx_debug, crawlx_warn};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;

use crate::params::{
    build_url, export_params, export_path, list_params, run_params, search_params, QueryPairs,
};
use crate::service_error::service_error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Covers the whole exchange, including the service-side `wait_for`.
    pub request_timeout: Duration,
    pub max_export_bytes: u64,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            max_export_bytes: 64 * 1024 * 1024,
        }
    }
}

/// The only component allowed to talk to the extraction service.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn health(&self) -> Result<HealthStatus, ConsoleError>;

    async fn list_items(&self, query: &ListQuery) -> Result<Vec<ScrapedItem>, ConsoleError>;

    /// Ranking and fuzzy matching happen service-side.
    async fn search_items(&self, query: &SearchQuery) -> Result<Vec<ScrapedItem>, ConsoleError>;

    /// Returns once the service accepted the jobs, not once they finish.
    async fn run_scrapers(
        &self,
        request: &ScrapeJobRequest,
    ) -> Result<ScrapeJobResponse, ConsoleError>;

    async fn scrape_url(&self, request: &UrlScrapeRequest)
        -> Result<UrlScrapeResponse, ConsoleError>;

    /// Raw export payload, never decoded as text. Only returns once the whole
    /// body has arrived.
    async fn export_blob(
        &self,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<Bytes, ConsoleError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    client: reqwest::Client,
    settings: GatewaySettings,
}

impl ReqwestGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, ConsoleError> {
        // Fail fast on a malformed base URL instead of on the first call.
        build_url(&settings.base_url, "/", &[])?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ConsoleError::Network(err.to_string()))?;

        Ok(Self { client, settings })
    }

    /// Sends the request and turns transport failures and non-2xx statuses
    /// into the console's error taxonomy.
    async fn send(
        &self,
        method: Method,
        path: &str,
        params: QueryPairs,
        body: Option<Vec<u8>>,
    ) -> Result<Response, ConsoleError> {
        let url = build_url(&self.settings.base_url, path, &params)?;
        crawlx_debug!("{} {}", method, url);

        let mut request = self.client.request(method.clone(), url);
        if let Some(body) = body {
            request = request.body(body);
        }
        let response = request.send().await.map_err(|err| {
            crawlx_warn!("{} {} failed: {}", method, path, err);
            map_reqwest_error(err)
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.bytes().await.unwrap_or_default();
        let err = service_error(status.as_u16(), status.canonical_reason(), &body);
        crawlx_warn!("{} {} returned {}: {}", method, path, status, err);
        Err(err)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: QueryPairs,
    ) -> Result<T, ConsoleError> {
        let response = self.send(Method::GET, path, params, None).await?;
        decode_json(response).await
    }
}

#[async_trait::async_trait]
impl Gateway for ReqwestGateway {
    async fn health(&self) -> Result<HealthStatus, ConsoleError> {
        self.get_json("/health", QueryPairs::new()).await
    }

    async fn list_items(&self, query: &ListQuery) -> Result<Vec<ScrapedItem>, ConsoleError> {
        self.get_json("/items", list_params(query)).await
    }

    async fn search_items(&self, query: &SearchQuery) -> Result<Vec<ScrapedItem>, ConsoleError> {
        self.get_json("/search", search_params(query)).await
    }

    async fn run_scrapers(
        &self,
        request: &ScrapeJobRequest,
    ) -> Result<ScrapeJobResponse, ConsoleError> {
        let response = self
            .send(Method::POST, "/scrape/run", run_params(request), None)
            .await?;
        decode_json(response).await
    }

    async fn scrape_url(
        &self,
        request: &UrlScrapeRequest,
    ) -> Result<UrlScrapeResponse, ConsoleError> {
        let body = serde_json::to_vec(request)
            .map_err(|err| ConsoleError::Validation(format!("cannot encode request: {err}")))?;
        let response = self
            .send(Method::POST, "/scrape/url", QueryPairs::new(), Some(body))
            .await?;
        decode_json(response).await
    }

    async fn export_blob(
        &self,
        format: ExportFormat,
        options: &ExportOptions,
    ) -> Result<Bytes, ConsoleError> {
        let max_bytes = self.settings.max_export_bytes;
        let response = self
            .send(
                Method::GET,
                export_path(format),
                export_params(format, options),
                None,
            )
            .await?;

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = buffer.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            buffer.extend_from_slice(&chunk);
        }
        crawlx_debug!("export {} complete: {} bytes", format, buffer.len());
        Ok(buffer.freeze())
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, ConsoleError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body).map_err(|err| ConsoleError::Decode(err.to_string()))
}

fn too_large(max_bytes: u64, actual: u64) -> ConsoleError {
    ConsoleError::Decode(format!(
        "export payload too large (max {max_bytes} bytes, got at least {actual})"
    ))
}

fn map_reqwest_error(err: reqwest::Error) -> ConsoleError {
    if err.is_timeout() {
        return ConsoleError::Network(format!("request timed out: {err}"));
    }
    if err.is_decode() {
        return ConsoleError::Decode(err.to_string());
    }
    ConsoleError::Network(err.to_string())
}
