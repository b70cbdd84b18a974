use crate::core::poller::{PollSettings, PollStats, Poller, RunSummary, StopReason};
use crate::domain::ports::{CardSource, RowSink};
use crate::utils::error::Result;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Login → navigation → polling → finalisation.
pub struct ScrapeEngine<S: CardSource, K: RowSink> {
    poller: Poller<S, K>,
    debug_dir: Option<PathBuf>,
}

impl<S: CardSource, K: RowSink> ScrapeEngine<S, K> {
    pub fn new(source: S, sink: K, settings: PollSettings) -> Self {
        Self {
            poller: Poller::new(source, sink, settings),
            debug_dir: None,
        }
    }

    /// Directory for the `NO_DATA.txt` marker written when a run saves nothing.
    pub fn with_debug_dir(mut self, debug_dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = Some(debug_dir.into());
        self
    }

    pub async fn run<F>(mut self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let started = Instant::now();

        let entered = tokio::select! {
            biased;
            _ = shutdown.as_mut() => None,
            entered = self.enter_game() => Some(entered),
        };

        let outcome = match entered {
            Some(Ok(())) => {
                tracing::info!("✅ Entered Lucky 7 game");
                self.poller.run(shutdown.as_mut()).await
            }
            Some(Err(e)) => {
                tracing::error!("❌ Could not reach the game: {}", e);
                self.poller.source_mut().dump_debug("navigation_failed").await;
                self.record_no_data().await;
                self.close_source().await;
                return Err(e);
            }
            None => {
                tracing::info!("🛑 Stopped by user before the game was reached");
                Ok(RunSummary {
                    stats: PollStats::default(),
                    stop_reason: StopReason::Interrupted,
                    elapsed: started.elapsed(),
                })
            }
        };

        if let Ok(summary) = &outcome {
            if summary.stop_reason == StopReason::Interrupted {
                tracing::info!("🛑 Stopped by user");
            }
        }

        if self.poller.stats().saved == 0 {
            self.record_no_data().await;
        }
        self.close_source().await;
        outcome
    }

    async fn enter_game(&mut self) -> Result<()> {
        let source = self.poller.source_mut();
        source.login().await?;
        source.navigate_to_game().await
    }

    async fn record_no_data(&mut self) {
        tracing::warn!("⚠️ Scraper saved 0 rounds this run");
        self.poller.source_mut().dump_debug("no_data_end").await;

        let Some(dir) = &self.debug_dir else {
            return;
        };
        if let Err(e) = write_no_data_marker(dir).await {
            tracing::warn!("⚠️ Failed to write NO_DATA.txt in {}: {}", dir.display(), e);
        }
    }

    async fn close_source(&mut self) {
        if let Err(e) = self.poller.source_mut().close().await {
            tracing::warn!("⚠️ Failed to close the browser: {}", e);
        }
    }
}

async fn write_no_data_marker(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join("NO_DATA.txt"), "Scraper saved 0 rounds this run.").await
}
