use crate::core::decoder::decode;
use crate::core::dedup::RoundDeduplicator;
use crate::domain::model::{Card, ScrapedRow};
use crate::domain::ports::{CardSource, RowSink};
use crate::utils::error::Result;
use chrono::Utc;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PollSettings {
    /// Wait after a processed card (emitted or duplicate).
    pub poll_interval: Duration,
    /// Wait after a poll that found no readable card.
    pub retry_interval: Duration,
    /// `None` runs until interrupted.
    pub run_limit: Option<Duration>,
    pub max_rounds: Option<u64>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(1200),
            retry_interval: Duration::from_millis(300),
            run_limit: None,
            max_rounds: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    TimeCap,
    RoundCap,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollStats {
    pub polls: u64,
    pub saved: u64,
    pub parse_failures: u64,
    pub failed_reads: u64,
    pub refreshes: u64,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub stats: PollStats,
    pub stop_reason: StopReason,
    pub elapsed: Duration,
}

/// Fixed-interval polling loop: read → decode → dedup → append.
pub struct Poller<S: CardSource, K: RowSink> {
    source: S,
    sink: K,
    dedup: RoundDeduplicator,
    settings: PollSettings,
    stats: PollStats,
}

impl<S: CardSource, K: RowSink> Poller<S, K> {
    pub fn new(source: S, sink: K, settings: PollSettings) -> Self {
        Self {
            source,
            sink,
            dedup: RoundDeduplicator::new(),
            settings,
            stats: PollStats::default(),
        }
    }

    pub fn stats(&self) -> &PollStats {
        &self.stats
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Polls until `shutdown` resolves or a cap is reached. The sink is
    /// flushed on every exit path.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<RunSummary>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let started = Instant::now();

        let outcome = self.poll_loop(&mut shutdown, started).await;
        let flushed = self.sink.flush();
        let stop_reason = outcome?;
        flushed?;

        let summary = RunSummary {
            stats: self.stats.clone(),
            stop_reason,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "📊 Polls: {}, saved: {}, parse failures: {}, failed reads: {}, refreshes: {}",
            summary.stats.polls,
            summary.stats.saved,
            summary.stats.parse_failures,
            summary.stats.failed_reads,
            summary.stats.refreshes
        );
        Ok(summary)
    }

    async fn poll_loop<F>(&mut self, shutdown: &mut Pin<&mut F>, started: Instant) -> Result<StopReason>
    where
        F: Future<Output = ()>,
    {
        let poll_interval = self.settings.poll_interval;
        let retry_interval = self.settings.retry_interval;

        loop {
            if let Some(limit) = self.settings.run_limit {
                if started.elapsed() >= limit {
                    tracing::info!(
                        "⏱️ Time cap reached ({}s). Saved {} rounds.",
                        started.elapsed().as_secs(),
                        self.stats.saved
                    );
                    return Ok(StopReason::TimeCap);
                }
            }

            self.stats.polls += 1;
            let read = tokio::select! {
                biased;
                _ = shutdown.as_mut() => return Ok(StopReason::Interrupted),
                read = self.source.read_current_card_token() => read,
            };

            let token = match read {
                Ok(Some(token)) => token,
                Ok(None) => {
                    if !self.refresh_if_stale(shutdown).await {
                        return Ok(StopReason::Interrupted);
                    }
                    if !pause(retry_interval, shutdown).await {
                        return Ok(StopReason::Interrupted);
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to read card: {}", e);
                    self.stats.failed_reads += 1;
                    // 頁面崩潰或分離時每次讀取都會失敗，同樣需要刷新
                    if !self.refresh_if_stale(shutdown).await {
                        return Ok(StopReason::Interrupted);
                    }
                    if !pause(retry_interval, shutdown).await {
                        return Ok(StopReason::Interrupted);
                    }
                    continue;
                }
            };

            let card = match decode(token.as_str()) {
                Ok(card) => card,
                Err(e) => {
                    tracing::warn!("⚠️ Skipping token '{}': {}", token, e);
                    self.stats.parse_failures += 1;
                    if !pause(poll_interval, shutdown).await {
                        return Ok(StopReason::Interrupted);
                    }
                    continue;
                }
            };

            let round_id = tokio::select! {
                biased;
                _ = shutdown.as_mut() => return Ok(StopReason::Interrupted),
                round_id = self.source.read_round_id() => round_id,
            };
            let round_id = match round_id {
                Ok(round_id) => round_id,
                Err(e) => {
                    tracing::warn!("⚠️ Failed to read round id: {}", e);
                    self.stats.failed_reads += 1;
                    if !pause(retry_interval, shutdown).await {
                        return Ok(StopReason::Interrupted);
                    }
                    continue;
                }
            };

            // decode → dedup → append 之間沒有 await，中斷不會留下半筆資料
            if self.emit(card, round_id)? {
                if let Some(max) = self.settings.max_rounds {
                    if self.stats.saved >= max {
                        tracing::info!(
                            "🏁 Done — captured {} rounds in {}s.",
                            self.stats.saved,
                            started.elapsed().as_secs()
                        );
                        return Ok(StopReason::RoundCap);
                    }
                }
            }

            if !pause(poll_interval, shutdown).await {
                return Ok(StopReason::Interrupted);
            }
        }
    }

    /// Reloads a stale source. Returns false when interrupted.
    async fn refresh_if_stale<F>(&mut self, shutdown: &mut Pin<&mut F>) -> bool
    where
        F: Future<Output = ()>,
    {
        if !self.source.is_stale() {
            return true;
        }

        tracing::warn!("⚠️ No card for too long, refreshing the page");
        let refreshed = tokio::select! {
            biased;
            _ = shutdown.as_mut() => return false,
            refreshed = self.source.refresh() => refreshed,
        };
        match refreshed {
            Ok(()) => self.stats.refreshes += 1,
            Err(e) => tracing::warn!("⚠️ Refresh failed: {}", e),
        }
        true
    }

    fn emit(&mut self, card: Card, round_id: Option<String>) -> Result<bool> {
        if !self.dedup.should_emit(&card, round_id.as_deref()) {
            tracing::debug!("Duplicate {} (round {:?}), skipping", card, round_id);
            return Ok(false);
        }

        let row = ScrapedRow::new(Utc::now(), round_id, card);
        self.sink.append(&row)?;
        self.stats.saved += 1;
        tracing::info!("✅ Round {}: {} → {}", self.stats.saved, card, row.result);
        Ok(true)
    }
}

/// Sleeps unless `shutdown` fires first; returns false when interrupted.
async fn pause<F>(duration: Duration, shutdown: &mut Pin<&mut F>) -> bool
where
    F: Future<Output = ()>,
{
    tokio::select! {
        biased;
        _ = shutdown.as_mut() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
