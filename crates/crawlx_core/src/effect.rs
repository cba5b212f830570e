use std::time::Duration;

use crate::{
    ExportFormat, ExportOptions, ListQuery, RequestSeq, ScrapeJobRequest, SearchQuery,
    UrlScrapeRequest,
};

/// Work the runtime performs on behalf of an orchestrator. Completions come
/// back as the matching `Msg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CheckHealth,
    RunScrapers {
        request: ScrapeJobRequest,
    },
    /// One-shot timer that answers with `Msg::JobRefreshDue`.
    ScheduleRefresh {
        delay: Duration,
    },
    ScrapeUrl {
        seq: RequestSeq,
        request: UrlScrapeRequest,
    },
    ListItems {
        seq: RequestSeq,
        query: ListQuery,
    },
    SearchItems {
        seq: RequestSeq,
        query: SearchQuery,
    },
    FetchStats {
        seq: RequestSeq,
        query: ListQuery,
    },
    /// Starts the interval timer that answers with `Msg::StatsTick`.
    StartPolling {
        interval: Duration,
    },
    StopPolling,
    ExportBlob {
        format: ExportFormat,
        options: ExportOptions,
    },
    /// Writes `bytes` under `filename` atomically; answers with `Msg::FileSaved`.
    SaveFile {
        purpose: SavePurpose,
        filename: String,
        bytes: Vec<u8>,
    },
    CopyToClipboard {
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePurpose {
    Export(ExportFormat),
    ExtractedText,
}
