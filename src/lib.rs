pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliArgs;

#[cfg(feature = "browser")]
pub use adapters::browser::ChromeSession;

pub use adapters::csv_sink::CsvSink;
pub use config::ScraperConfig;
pub use core::{
    decoder::decode,
    dedup::RoundDeduplicator,
    engine::ScrapeEngine,
    poller::{PollSettings, Poller, RunSummary, StopReason},
};
pub use utils::error::{Result, ScrapeError};
