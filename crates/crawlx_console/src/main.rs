//! `crawlx`: terminal operator console for the CrawlX extraction service.
mod platform;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use crawlx_core::{ExportFormat, ExtractType};

use platform::logging::LogDestination;

#[derive(Parser, Debug)]
#[command(name = "crawlx")]
#[command(about = "Operator console for the CrawlX extraction service")]
#[command(version)]
pub struct Cli {
    /// Base URL of the extraction service
    #[arg(long, global = true, env = platform::config::API_URL_ENV)]
    api_url: Option<String>,

    /// Directory where exports and saved extractions are written
    #[arg(long, global = true, default_value = platform::config::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Where log output goes
    #[arg(long, global = true, value_enum, default_value_t = LogArg::File)]
    log: LogArg,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Probe the service health endpoint
    Health,

    /// Trigger batch scrape jobs (all configured spiders when none are named)
    Run {
        /// Spider to run; repeat for several
        #[arg(long = "spider", value_name = "NAME")]
        spiders: Vec<String>,
    },

    /// Extract content from a single URL
    Scrape {
        url: String,

        #[arg(long, default_value = "auto")]
        extract_type: ExtractType,

        /// Seconds the service waits for dynamic content (clamped to 1..=10)
        #[arg(long)]
        wait_for: Option<u32>,

        /// Copy the extracted text to the clipboard
        #[arg(long)]
        copy: bool,

        /// Save the extracted text under the output directory
        #[arg(long)]
        save: bool,
    },

    /// List or search stored items
    Items {
        #[arg(long)]
        tag: Option<String>,

        /// Full-text query; lists items when omitted
        #[arg(long)]
        query: Option<String>,

        #[arg(long)]
        fuzzy: bool,
    },

    /// Download an export of stored items
    Export {
        format: ExportFormat,

        /// PDF layout style
        #[arg(long, default_value = "detailed")]
        style: String,

        /// Maximum items in a PDF export
        #[arg(long, default_value_t = 100)]
        limit: u32,

        /// Restrict a PDF export to one tag
        #[arg(long)]
        tag: Option<String>,
    },

    /// Show dashboard stats, refreshing periodically until Ctrl-C
    Watch {
        /// Stop after this many refreshes
        #[arg(long)]
        ticks: Option<u32>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum LogArg {
    Terminal,
    File,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::File => LogDestination::File,
            LogArg::Both => LogDestination::Both,
        }
    }
}

fn main() -> ExitCode {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    platform::logging::initialize(cli.log.into());

    match platform::run_console(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}
