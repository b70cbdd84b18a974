pub mod decoder;
pub mod dedup;
pub mod engine;
pub mod poller;
pub mod token;

pub use crate::domain::model::{Card, CardToken, ScrapedRow};
pub use crate::domain::ports::{CardSource, RowSink};
pub use crate::utils::error::Result;
