use anyhow::Result;
use async_trait::async_trait;
use lucky7_etl::adapters::page::PageSnapshot;
use lucky7_etl::domain::model::CardToken;
use lucky7_etl::domain::ports::CardSource;
use lucky7_etl::{CsvSink, PollSettings, Poller, ScrapeEngine, StopReason};
use std::collections::VecDeque;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::oneshot;

/// Replays a fixed list of (token, round id) reads, then signals shutdown.
struct ReplaySource {
    reads: VecDeque<(String, Option<String>)>,
    round_id: Option<String>,
    exhausted: Option<oneshot::Sender<()>>,
}

impl ReplaySource {
    fn new(tokens: &[&str], round_ids: &[Option<&str>]) -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let reads = tokens
            .iter()
            .zip(round_ids)
            .map(|(t, r)| (t.to_string(), r.map(str::to_string)))
            .collect();
        (
            Self {
                reads,
                round_id: None,
                exhausted: Some(tx),
            },
            rx,
        )
    }
}

#[async_trait]
impl CardSource for ReplaySource {
    async fn login(&mut self) -> lucky7_etl::Result<()> {
        Ok(())
    }

    async fn navigate_to_game(&mut self) -> lucky7_etl::Result<()> {
        Ok(())
    }

    async fn read_current_card_token(&mut self) -> lucky7_etl::Result<Option<CardToken>> {
        match self.reads.pop_front() {
            Some((token, round_id)) => {
                self.round_id = round_id;
                Ok(Some(CardToken::new(token)))
            }
            None => {
                if let Some(tx) = self.exhausted.take() {
                    let _ = tx.send(());
                }
                Ok(None)
            }
        }
    }

    async fn read_round_id(&mut self) -> lucky7_etl::Result<Option<String>> {
        Ok(self.round_id.clone())
    }

    fn is_stale(&self) -> bool {
        false
    }

    async fn refresh(&mut self) -> lucky7_etl::Result<()> {
        Ok(())
    }
}

/// Serves HTML pages the way the browser session would, one per poll.
struct HtmlReplaySource {
    pages: VecDeque<String>,
    snapshot: PageSnapshot,
    exhausted: Option<oneshot::Sender<()>>,
}

#[async_trait]
impl CardSource for HtmlReplaySource {
    async fn login(&mut self) -> lucky7_etl::Result<()> {
        Ok(())
    }

    async fn navigate_to_game(&mut self) -> lucky7_etl::Result<()> {
        Ok(())
    }

    async fn read_current_card_token(&mut self) -> lucky7_etl::Result<Option<CardToken>> {
        match self.pages.pop_front() {
            Some(html) => {
                self.snapshot = PageSnapshot::parse(&html);
                Ok(self.snapshot.card_token())
            }
            None => {
                if let Some(tx) = self.exhausted.take() {
                    let _ = tx.send(());
                }
                Ok(None)
            }
        }
    }

    async fn read_round_id(&mut self) -> lucky7_etl::Result<Option<String>> {
        Ok(self.snapshot.round_id.clone())
    }

    fn is_stale(&self) -> bool {
        false
    }

    async fn refresh(&mut self) -> lucky7_etl::Result<()> {
        Ok(())
    }
}

fn fast_settings() -> PollSettings {
    PollSettings {
        poll_interval: Duration::ZERO,
        retry_interval: Duration::ZERO,
        run_limit: None,
        max_rounds: None,
    }
}

fn read_rows(path: &std::path::Path) -> Result<Vec<csv::StringRecord>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["ts_utc", "round_id", "rank", "suit_key", "color", "result"]
    );
    Ok(reader.records().collect::<std::result::Result<Vec<_>, _>>()?)
}

#[tokio::test]
async fn test_duplicate_polls_within_a_round_write_one_row() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let csv_path = temp_dir.path().join("lucky7_data.csv");

    let (source, exhausted) = ReplaySource::new(
        &["AS", "AS", "2H", "2H", "3D"],
        &[Some("1"), Some("1"), Some("2"), Some("2"), Some("3")],
    );
    let engine = ScrapeEngine::new(source, CsvSink::open(&csv_path)?, fast_settings());

    let summary = engine
        .run(async {
            let _ = exhausted.await;
        })
        .await?;

    assert_eq!(summary.stop_reason, StopReason::Interrupted);
    assert_eq!(summary.stats.saved, 3);

    let rows = read_rows(&csv_path)?;
    assert_eq!(rows.len(), 3);

    let columns: Vec<(&str, &str, &str, &str, &str)> = rows
        .iter()
        .map(|r| (&r[1], &r[2], &r[3], &r[4], &r[5]))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("1", "1", "S", "black", "below7"),
            ("2", "2", "H", "red", "below7"),
            ("3", "3", "D", "red", "below7"),
        ]
    );

    // ts_utc 是 RFC 3339 UTC 時間
    for row in &rows {
        let ts = chrono::DateTime::parse_from_rfc3339(&row[0])?;
        assert_eq!(ts.offset().local_minus_utc(), 0);
    }
    Ok(())
}

#[tokio::test]
async fn test_rows_append_across_runs() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let csv_path = temp_dir.path().join("lucky7_data.csv");

    for (tokens, round_ids) in [
        (vec!["KC"], vec![Some("10")]),
        (vec!["7S", "7S"], vec![None, None]),
    ] {
        let (source, _exhausted) = ReplaySource::new(&tokens, &round_ids);
        let settings = PollSettings {
            max_rounds: Some(1),
            ..fast_settings()
        };
        let mut poller = Poller::new(source, CsvSink::open(&csv_path)?, settings);
        let summary = poller.run(std::future::pending::<()>()).await?;
        assert_eq!(summary.stop_reason, StopReason::RoundCap);
    }

    let rows = read_rows(&csv_path)?;
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][1], "10");
    assert_eq!(&rows[0][2], "13");
    assert_eq!(&rows[1][1], "");
    assert_eq!(&rows[1][5], "seven");
    Ok(())
}

#[tokio::test]
async fn test_html_snapshots_to_csv() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let csv_path = temp_dir.path().join("lucky7_data.csv");

    let page = |card_src: &str, round: &str| {
        format!(
            r#"<html><body>
                 <div class="casino-round-id">{round}</div>
                 <div class="casino-video-cards">
                   <div class="flip-card-inner"><div class="flip-card-back"><img src="{card_src}"></div></div>
                 </div>
               </body></html>"#
        )
    };

    let (tx, exhausted) = oneshot::channel();
    let source = HtmlReplaySource {
        pages: VecDeque::from(vec![
            page("/img/cards/1_card_20_20.png", "5001"),
            page("/img/cards/10SS.png", "5001"),
            page("/img/cards/10SS.png", "5001"),
            page("/img/cards/broken.png", "5002"),
            page("/img/cards/JH.webp", "5002"),
        ]),
        snapshot: PageSnapshot::default(),
        exhausted: Some(tx),
    };
    let engine = ScrapeEngine::new(source, CsvSink::open(&csv_path)?, fast_settings())
        .with_debug_dir(temp_dir.path().join("debug"));

    let summary = engine
        .run(async {
            let _ = exhausted.await;
        })
        .await?;

    assert_eq!(summary.stats.saved, 2);
    assert!(!temp_dir.path().join("debug").join("NO_DATA.txt").exists());

    let rows = read_rows(&csv_path)?;
    assert_eq!(&rows[0][1], "5001");
    assert_eq!(&rows[0][2], "10");
    assert_eq!(&rows[0][3], "S");
    assert_eq!(&rows[1][1], "5002");
    assert_eq!(&rows[1][2], "11");
    assert_eq!(&rows[1][4], "red");
    Ok(())
}
