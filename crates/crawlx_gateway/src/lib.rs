//! CrawlX gateway: typed HTTP boundary to the extraction service, plus the
//! atomic file writer used when saving downloads.
mod gateway;
mod params;
mod persist;
mod service_error;

pub use gateway::{Gateway, GatewaySettings, ReqwestGateway, DEFAULT_BASE_URL};
pub use params::{
    build_url, export_params, export_path, list_params, run_params, search_params, QueryPairs,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use service_error::service_error;
