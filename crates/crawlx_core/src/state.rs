use std::collections::BTreeMap;
use std::time::Duration;

use crate::view_model::{
    AppViewModel, ExplorerView, ExtractionStatus, ExtractionView, ItemRowView, JobStatus, JobView,
    StatsView,
};
use crate::{
    prepare_preview_content, ConsoleError, ExportFormat, ExtractedPage, HealthStatus, ListQuery,
    ScrapedItem, SearchQuery, Stats,
};

/// Page size used by the item explorer for listing and search.
pub const ITEM_PAGE_SIZE: u32 = 100;
/// Page size used by the dashboard stats poll.
pub const STATS_PAGE_SIZE: u32 = 1000;
pub const STATS_REFRESH_INTERVAL: Duration = Duration::from_secs(10);
/// Delay before the best-effort refresh that follows a batch job trigger.
pub const JOB_REFRESH_DELAY: Duration = Duration::from_secs(3);

/// Sequence number stamped on each request an orchestrator issues.
pub type RequestSeq = u64;

/// Per-orchestrator request counter. Only the most recently issued request
/// is allowed to update view state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SeqCounter {
    issued: RequestSeq,
    in_flight: bool,
}

impl SeqCounter {
    pub fn issue(&mut self) -> RequestSeq {
        self.issued += 1;
        self.in_flight = true;
        self.issued
    }

    /// Marks `seq` complete. Returns false when a newer request has been
    /// issued since, in which case the response must be dropped.
    pub fn complete(&mut self, seq: RequestSeq) -> bool {
        if seq != self.issued {
            return false;
        }
        self.in_flight = false;
        true
    }

    /// Supersedes whatever is in flight without issuing a new request.
    pub fn invalidate(&mut self) {
        self.issued += 1;
        self.in_flight = false;
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Triggering,
    Failed(ConsoleError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobState {
    pub phase: JobPhase,
    pub last_message: Option<String>,
    pub scheduled_spiders: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExtractionPhase {
    #[default]
    Idle,
    Pending,
    Succeeded(ExtractedPage),
    Failed(ConsoleError),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractionState {
    pub phase: ExtractionPhase,
    pub seq: SeqCounter,
}

impl ExtractionState {
    pub fn result(&self) -> Option<&ExtractedPage> {
        match &self.phase {
            ExtractionPhase::Succeeded(page) => Some(page),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchState {
    pub query: String,
    pub tag: Option<String>,
    pub fuzzy: bool,
    pub items: Vec<ScrapedItem>,
    pub seq: SeqCounter,
    pub last_error: Option<ConsoleError>,
}

impl SearchState {
    pub fn list_query(&self) -> ListQuery {
        ListQuery {
            skip: None,
            limit: Some(ITEM_PAGE_SIZE),
            tag: self.tag.clone(),
        }
    }

    /// `None` when the current query is blank, meaning a plain listing.
    pub fn search_query(&self) -> Option<SearchQuery> {
        let q = self.query.trim();
        if q.is_empty() {
            return None;
        }
        Some(SearchQuery {
            q: q.to_string(),
            skip: None,
            limit: Some(ITEM_PAGE_SIZE),
            tag: self.tag.clone(),
            fuzzy: Some(self.fuzzy),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Downloading,
    Saving,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsState {
    pub active: bool,
    pub items: Vec<ScrapedItem>,
    pub stats: Option<Stats>,
    pub seq: SeqCounter,
    pub last_error: Option<ConsoleError>,
}

impl StatsState {
    pub fn query(&self) -> ListQuery {
        ListQuery {
            skip: None,
            limit: Some(STATS_PAGE_SIZE),
            tag: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeScope {
    Health,
    Jobs,
    Extraction,
    Clipboard,
    Explorer,
    Export,
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient message scoped to the action that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub scope: NoticeScope,
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub(crate) health: Option<Result<HealthStatus, ConsoleError>>,
    pub(crate) jobs: JobState,
    pub(crate) extraction: ExtractionState,
    pub(crate) search: SearchState,
    pub(crate) exports: BTreeMap<ExportFormat, ExportPhase>,
    pub(crate) stats: StatsState,
    notices: Vec<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> &JobState {
        &self.jobs
    }

    pub fn extraction(&self) -> &ExtractionState {
        &self.extraction
    }

    pub fn search(&self) -> &SearchState {
        &self.search
    }

    pub fn stats(&self) -> &StatsState {
        &self.stats
    }

    pub fn export_phase(&self, format: ExportFormat) -> Option<ExportPhase> {
        self.exports.get(&format).copied()
    }

    pub fn health(&self) -> Option<&Result<HealthStatus, ConsoleError>> {
        self.health.as_ref()
    }

    /// True while any orchestrator still waits on a network call or a save.
    pub fn is_busy(&self) -> bool {
        self.jobs.phase == JobPhase::Triggering
            || self.extraction.phase == ExtractionPhase::Pending
            || self.search.seq.in_flight()
            || !self.exports.is_empty()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            jobs: JobView {
                status: match &self.jobs.phase {
                    JobPhase::Idle => JobStatus::Idle,
                    JobPhase::Triggering => JobStatus::Triggering,
                    JobPhase::Failed(_) => JobStatus::Failed,
                },
                last_message: self.jobs.last_message.clone(),
                scheduled_spiders: self.jobs.scheduled_spiders.clone(),
            },
            extraction: self.extraction_view(),
            explorer: ExplorerView {
                query: self.search.query.clone(),
                tag: self.search.tag.clone(),
                fuzzy: self.search.fuzzy,
                loading: self.search.seq.in_flight(),
                items: self.search.items.iter().map(ItemRowView::from).collect(),
            },
            exporting: self.exports.keys().copied().collect(),
            stats: self.stats.stats.as_ref().map(|stats| StatsView {
                total: stats.total,
                today: stats.today,
                news: stats.tag_count("news"),
                jobs: stats.tag_count("jobs"),
                by_tag: stats.by_tag.clone(),
            }),
            notices: self.notices.clone(),
            dirty: self.dirty,
        }
    }

    fn extraction_view(&self) -> ExtractionView {
        match &self.extraction.phase {
            ExtractionPhase::Idle => ExtractionView::default(),
            ExtractionPhase::Pending => ExtractionView {
                status: ExtractionStatus::Pending,
                ..ExtractionView::default()
            },
            ExtractionPhase::Succeeded(page) => ExtractionView {
                status: ExtractionStatus::Succeeded,
                preview: page.text().map(prepare_preview_content),
                result: Some(page.clone()),
                error: None,
            },
            ExtractionPhase::Failed(err) => ExtractionView {
                status: ExtractionStatus::Failed,
                result: None,
                preview: None,
                error: Some(err.user_message()),
            },
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        let was_dirty = self.dirty;
        self.dirty = false;
        was_dirty
    }

    /// Drains pending notices; the presentation layer shows each once.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn notify(&mut self, scope: NoticeScope, message: impl Into<String>) {
        self.push_notice(scope, NoticeLevel::Info, message.into());
    }

    pub(crate) fn notify_error(&mut self, scope: NoticeScope, err: &ConsoleError) {
        self.push_notice(scope, NoticeLevel::Error, err.user_message());
    }

    fn push_notice(&mut self, scope: NoticeScope, level: NoticeLevel, message: String) {
        self.notices.push(Notice {
            scope,
            level,
            message,
        });
        self.dirty = true;
    }
}
