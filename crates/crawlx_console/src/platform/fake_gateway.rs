//! In-memory gateway for console tests.

use std::sync::Mutex;

use bytes::Bytes;
use crawlx_core::{
    ConsoleError, ExportFormat, ExportOptions, HealthStatus, ListQuery, ScrapeJobRequest,
    ScrapeJobResponse, ScrapedItem, SearchQuery, UrlScrapeRequest, UrlScrapeResponse,
};
use crawlx_gateway::Gateway;

/// Answers from canned values; anything not configured fails as offline.
#[derive(Default)]
pub struct FakeGateway {
    pub health: Option<HealthStatus>,
    pub items: Option<Vec<ScrapedItem>>,
    pub scrape: Option<UrlScrapeResponse>,
    pub export: Option<Vec<u8>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeGateway {
    fn record(&self, call: impl Into<String>) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.into());
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

fn offline() -> ConsoleError {
    ConsoleError::Network("offline".into())
}

#[async_trait::async_trait]
impl Gateway for FakeGateway {
    async fn health(&self) -> Result<HealthStatus, ConsoleError> {
        self.record("health");
        self.health.clone().ok_or_else(offline)
    }

    async fn list_items(&self, query: &ListQuery) -> Result<Vec<ScrapedItem>, ConsoleError> {
        self.record(format!("list tag={:?}", query.tag));
        self.items.clone().ok_or_else(offline)
    }

    async fn search_items(&self, query: &SearchQuery) -> Result<Vec<ScrapedItem>, ConsoleError> {
        self.record(format!("search q={}", query.q));
        self.items.clone().ok_or_else(offline)
    }

    async fn run_scrapers(
        &self,
        request: &ScrapeJobRequest,
    ) -> Result<ScrapeJobResponse, ConsoleError> {
        self.record("run");
        Ok(ScrapeJobResponse {
            status: "started".into(),
            spiders: request.spiders.clone().unwrap_or_default(),
            message: String::new(),
        })
    }

    async fn scrape_url(
        &self,
        request: &UrlScrapeRequest,
    ) -> Result<UrlScrapeResponse, ConsoleError> {
        self.record(format!("scrape {}", request.url));
        self.scrape.clone().ok_or_else(offline)
    }

    async fn export_blob(
        &self,
        format: ExportFormat,
        _options: &ExportOptions,
    ) -> Result<Bytes, ConsoleError> {
        self.record(format!("export {format}"));
        self.export.clone().map(Bytes::from).ok_or_else(offline)
    }
}
