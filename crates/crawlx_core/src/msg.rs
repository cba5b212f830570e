use std::path::PathBuf;

use chrono::NaiveDate;

use crate::{
    ConsoleError, ExportFormat, ExportOptions, HealthStatus, RequestSeq, SavePurpose,
    ScrapeJobResponse, ScrapedItem, UrlScrapeRequest, UrlScrapeResponse,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Operator asked for a service health probe.
    HealthCheckRequested,
    HealthChecked(Result<HealthStatus, ConsoleError>),

    /// Operator clicked "run scrapers"; an empty list means all configured jobs.
    RunScrapersClicked { spiders: Vec<String> },
    ScrapersTriggered(Result<ScrapeJobResponse, ConsoleError>),
    /// The post-trigger refresh delay elapsed.
    JobRefreshDue,

    /// Operator submitted a single-URL extraction.
    ExtractionSubmitted(UrlScrapeRequest),
    ExtractionCompleted {
        seq: RequestSeq,
        result: Result<UrlScrapeResponse, ConsoleError>,
    },
    CopyContentClicked,
    SaveContentClicked,
    ClipboardWritten(Result<(), ConsoleError>),

    /// Explorer opened or asked to reload with the current tag filter.
    ListRequested,
    /// Query text edited. Does not issue a request on its own.
    QueryChanged(String),
    FuzzyToggled(bool),
    TagFilterChanged(Option<String>),
    SearchSubmitted,
    ResetClicked,
    ItemsLoaded {
        seq: RequestSeq,
        result: Result<Vec<ScrapedItem>, ConsoleError>,
    },

    ExportClicked {
        format: ExportFormat,
        options: ExportOptions,
    },
    ExportDownloaded {
        format: ExportFormat,
        result: Result<Vec<u8>, ConsoleError>,
    },
    FileSaved {
        purpose: SavePurpose,
        result: Result<PathBuf, ConsoleError>,
    },

    /// Dashboard became visible; starts periodic stats refresh.
    StatsViewOpened,
    /// Dashboard torn down; polling must stop.
    StatsViewClosed,
    StatsTick,
    StatsLoaded {
        seq: RequestSeq,
        /// Operator's local date at completion time.
        today: NaiveDate,
        result: Result<Vec<ScrapedItem>, ConsoleError>,
    },

    /// Pending notices were shown; failed orchestrators settle back to idle.
    NoticesShown,
}
