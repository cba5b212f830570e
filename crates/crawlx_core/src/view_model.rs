use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::{ExportFormat, ExtractedPage, ItemId, Notice, ScrapedItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Triggering,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobView {
    pub status: JobStatus,
    pub last_message: Option<String>,
    pub scheduled_spiders: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionStatus {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractionView {
    pub status: ExtractionStatus,
    pub result: Option<ExtractedPage>,
    /// Truncated text for display; the full text stays on `result`.
    pub preview: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRowView {
    pub id: ItemId,
    pub title: String,
    pub source: String,
    pub url: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub scraped_at: NaiveDateTime,
}

impl From<&ScrapedItem> for ItemRowView {
    fn from(item: &ScrapedItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            source: item.source.clone(),
            url: item.url.clone(),
            summary: item.summary.clone(),
            tags: item.tags.iter().flatten().cloned().collect(),
            scraped_at: item.scraped_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExplorerView {
    pub query: String,
    pub tag: Option<String>,
    pub fuzzy: bool,
    pub loading: bool,
    pub items: Vec<ItemRowView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsView {
    pub total: usize,
    pub today: usize,
    pub news: usize,
    pub jobs: usize,
    pub by_tag: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub jobs: JobView,
    pub extraction: ExtractionView,
    pub explorer: ExplorerView,
    pub exporting: Vec<ExportFormat>,
    pub stats: Option<StatsView>,
    pub notices: Vec<Notice>,
    pub dirty: bool,
}
