use crate::domain::model::ScrapedRow;
use crate::domain::ports::RowSink;
use crate::utils::error::{Result, ScrapeError};
use csv::{Writer, WriterBuilder};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

pub const HEADERS: [&str; 6] = ["ts_utc", "round_id", "rank", "suit_key", "color", "result"];

/// Appends rows to a CSV file, writing the header only when the file is new or empty.
pub struct CsvSink {
    path: PathBuf,
    writer: Writer<File>,
}

impl CsvSink {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(HEADERS)?;
            writer.flush()?;
            tracing::debug!("Created {} with header", path.display());
        }

        Ok(Self { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSink for CsvSink {
    fn append(&mut self, row: &ScrapedRow) -> Result<()> {
        self.writer.serialize(row).map_err(|e| ScrapeError::SinkError {
            message: format!("failed to append to {}: {}", self.path.display(), e),
        })?;
        // 每筆立即落盤，被中斷時不遺失已擷取的回合
        self.writer.flush()?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decoder::decode;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn row(token: &str, round_id: Option<&str>) -> ScrapedRow {
        let ts = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        ScrapedRow::new(ts, round_id.map(str::to_string), decode(token).unwrap())
    }

    #[test]
    fn test_new_file_gets_header_and_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("lucky7.csv");

        let mut sink = CsvSink::open(&path).unwrap();
        sink.append(&row("10h", Some("201.5"))).unwrap();
        sink.append(&row("7C", None)).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "ts_utc,round_id,rank,suit_key,color,result");
        assert_eq!(lines[1], "2026-10-19T08:30:00Z,201.5,10,H,red,above7");
        assert_eq!(lines[2], "2026-10-19T08:30:00Z,,7,C,black,seven");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_reopening_does_not_repeat_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("lucky7.csv");

        CsvSink::open(&path).unwrap().append(&row("AS", Some("1"))).unwrap();
        CsvSink::open(&path).unwrap().append(&row("2S", Some("2"))).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("ts_utc").count(), 1);
        assert_eq!(content.lines().count(), 3);
        assert!(content.lines().last().unwrap().contains(",2,S,black,below7"));
    }
}
