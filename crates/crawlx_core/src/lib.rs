//! CrawlX core: data model and the pure orchestrator state machines.
mod effect;
mod error;
mod filename;
mod model;
mod msg;
mod preview;
mod state;
mod stats;
mod update;
mod view_model;

pub use effect::{Effect, SavePurpose};
pub use error::{ConsoleError, ErrorKind};
pub use filename::text_download_filename;
pub use model::{
    parse_timestamp, ExportFormat, ExportOptions, ExtractType, ExtractedPage, ExtractionOutcome,
    HealthStatus, ItemId, ListQuery, ScrapeJobRequest, ScrapeJobResponse, ScrapedItem,
    SearchQuery, Table, UrlScrapeRequest, UrlScrapeResponse, DEFAULT_WAIT_FOR, MAX_WAIT_FOR,
    MIN_WAIT_FOR,
};
pub use msg::Msg;
pub use preview::{prepare_preview_content, MAX_PREVIEW_CONTENT};
pub use state::{
    AppState, ExportPhase, ExtractionPhase, ExtractionState, JobPhase, JobState, Notice,
    NoticeLevel, NoticeScope, RequestSeq, SearchState, SeqCounter, StatsState, ITEM_PAGE_SIZE,
    JOB_REFRESH_DELAY, STATS_PAGE_SIZE, STATS_REFRESH_INTERVAL,
};
pub use stats::Stats;
pub use update::update;
pub use view_model::{
    AppViewModel, ExplorerView, ExtractionStatus, ExtractionView, ItemRowView, JobStatus, JobView,
    StatsView,
};
