// Adapters layer: concrete implementations of the ports (browser session, CSV file).

#[cfg(feature = "browser")]
pub mod browser;
pub mod csv_sink;
pub mod page;
