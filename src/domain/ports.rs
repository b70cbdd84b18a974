use crate::domain::model::{CardToken, ScrapedRow};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Browser session driving the game page.
#[async_trait]
pub trait CardSource: Send {
    async fn login(&mut self) -> Result<()>;

    async fn navigate_to_game(&mut self) -> Result<()>;

    /// `Ok(None)` means no face-up card is visible right now.
    async fn read_current_card_token(&mut self) -> Result<Option<CardToken>>;

    /// Round id of the snapshot taken by the last `read_current_card_token`.
    async fn read_round_id(&mut self) -> Result<Option<String>>;

    /// Whether the page has shown no card for too long and needs a refresh.
    fn is_stale(&self) -> bool;

    async fn refresh(&mut self) -> Result<()>;

    /// 保存除錯快照；失敗不影響流程
    async fn dump_debug(&mut self, _tag: &str) {}

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Append-only destination for scraped rows.
pub trait RowSink: Send {
    fn append(&mut self, row: &ScrapedRow) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}
