///! On-disk persistence for schedules and snapshots
///!
///! Three artifacts live in the output directory:
///! - the current full schedule as CSV and JSON (display clients and
///!   the email attachment read these),
///! - the window-filtered snapshot baseline the next cycle diffs
///!   against,
///! - the change artifact from the last cycle that detected changes.
///!
///! A missing snapshot file is the bootstrap case, not an error.

use super::types::{ChangeReport, ScheduleEntry};
use anyhow::{Context, Result};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

const SCHEDULE_CSV_FILE: &str = "schedule_current.csv";
const SCHEDULE_JSON_FILE: &str = "schedule_current.json";
const SNAPSHOT_FILE: &str = "schedule_snapshot.csv";
const CHANGES_FILE: &str = "schedule_changes.json";

const CSV_HEADERS: [&str; 7] = [
    "date",
    "start_time",
    "end_time",
    "type",
    "league",
    "team",
    "venue",
];

/// JSON export of the current schedule for display clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleExport {
    pub generated_at: String,
    pub timezone: String,
    pub venue_filter: String,
    pub days_ahead: i64,
    pub items: Vec<ScheduleEntry>,
}

impl ScheduleExport {
    pub fn new(
        items: Vec<ScheduleEntry>,
        timezone: &str,
        venue_filter: &str,
        days_ahead: i64,
    ) -> Self {
        Self {
            generated_at: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            timezone: timezone.to_string(),
            venue_filter: venue_filter.to_string(),
            days_ahead,
            items,
        }
    }
}

/// Change report plus detection time, persisted for audit after a
/// cycle with changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangesArtifact {
    #[serde(flatten)]
    pub report: ChangeReport,
    pub detection_time: String,
}

impl ChangesArtifact {
    pub fn new(report: ChangeReport, detected_at: NaiveDateTime) -> Self {
        Self {
            report,
            detection_time: detected_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// Persistence manager for the output directory.
pub struct SnapshotStore {
    output_dir: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub async fn ensure_output_dir(&self) -> Result<()> {
        if !self.output_dir.exists() {
            fs::create_dir_all(&self.output_dir)
                .await
                .context("Failed to create output directory")?;
            tracing::info!("Created output directory: {:?}", self.output_dir);
        }
        Ok(())
    }

    pub fn schedule_csv_path(&self) -> PathBuf {
        self.output_dir.join(SCHEDULE_CSV_FILE)
    }

    fn schedule_json_path(&self) -> PathBuf {
        self.output_dir.join(SCHEDULE_JSON_FILE)
    }

    fn snapshot_path(&self) -> PathBuf {
        self.output_dir.join(SNAPSHOT_FILE)
    }

    fn changes_path(&self) -> PathBuf {
        self.output_dir.join(CHANGES_FILE)
    }

    /// Write the full current schedule as CSV. An empty schedule still
    /// produces a header-only file so downstream readers see a valid
    /// document rather than a missing one.
    pub async fn save_schedule_csv(&self, entries: &[ScheduleEntry]) -> Result<PathBuf> {
        let path = self.schedule_csv_path();
        let content = entries_to_csv(entries)?;
        fs::write(&path, content)
            .await
            .context("Failed to write schedule CSV")?;
        tracing::info!("Saved {} entries to {:?}", entries.len(), path);
        Ok(path)
    }

    pub async fn save_schedule_json(&self, export: &ScheduleExport) -> Result<()> {
        let path = self.schedule_json_path();
        let content =
            serde_json::to_string_pretty(export).context("Failed to serialize schedule export")?;
        fs::write(&path, content)
            .await
            .context("Failed to write schedule JSON")?;
        tracing::info!("Saved JSON export to {:?}", path);
        Ok(())
    }

    /// Load the previous snapshot baseline. `None` means no snapshot
    /// exists yet (bootstrap cycle).
    pub async fn load_snapshot(&self) -> Result<Option<Vec<ScheduleEntry>>> {
        let path = self.snapshot_path();
        if !path.exists() {
            tracing::debug!("Snapshot file does not exist: {:?}", path);
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .context("Failed to read snapshot file")?;
        let entries = entries_from_csv(&content);
        tracing::info!("Loaded {} entries from snapshot", entries.len());
        Ok(Some(entries))
    }

    /// Persist the filtered collection as the next comparison baseline.
    /// Callers only write this after the diff has completed, so the file
    /// is always either the previous or the new baseline in full.
    pub async fn save_snapshot(&self, entries: &[ScheduleEntry]) -> Result<()> {
        self.ensure_output_dir().await?;
        let path = self.snapshot_path();
        let content = entries_to_csv(entries)?;
        fs::write(&path, content)
            .await
            .context("Failed to write snapshot file")?;
        tracing::info!("Saved snapshot with {} entries to {:?}", entries.len(), path);
        Ok(())
    }

    pub async fn save_changes(&self, artifact: &ChangesArtifact) -> Result<PathBuf> {
        let path = self.changes_path();
        let content =
            serde_json::to_string_pretty(artifact).context("Failed to serialize changes")?;
        fs::write(&path, content)
            .await
            .context("Failed to write changes file")?;
        tracing::info!("Saved changes to {:?}", path);
        Ok(path)
    }
}

fn entries_to_csv(entries: &[ScheduleEntry]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if entries.is_empty() {
        writer
            .write_record(CSV_HEADERS)
            .context("Failed to write CSV header")?;
    } else {
        for entry in entries {
            writer
                .serialize(entry)
                .context("Failed to serialize schedule entry")?;
        }
    }

    writer.flush().context("Failed to flush CSV writer")?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

/// Parse entries from CSV, skipping malformed rows with a warning. A
/// single bad row must never abort a comparison cycle.
fn entries_from_csv(content: &str) -> Vec<ScheduleEntry> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut entries = Vec::new();

    for result in reader.deserialize::<ScheduleEntry>() {
        match result {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!("Skipping malformed snapshot row: {}", e),
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::schedule::types::ScheduleType;
    use tempfile::TempDir;

    fn entry(date: &str, stype: ScheduleType) -> ScheduleEntry {
        ScheduleEntry {
            date: date.to_string(),
            start_time: "18:00".to_string(),
            end_time: "19:00".to_string(),
            schedule_type: stype,
            league: "U13".to_string(),
            team: "TeamX vs TeamY".to_string(),
            venue: "Amherst Stadium".to_string(),
        }
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path());

        let entries = vec![
            entry("2024-06-01", ScheduleType::Game),
            entry("2024-06-02", ScheduleType::OffIceTraining),
        ];
        store.save_snapshot(&entries).await.unwrap();

        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded, entries);
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_bootstrap() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path());
        assert!(store.load_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_schedule_writes_header_only() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path());

        let path = store.save_schedule_csv(&[]).await.unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("date,start_time,end_time,type,league,team,venue"));

        store.save_snapshot(&[]).await.unwrap();
        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_malformed_row_skipped() {
        let content = "date,start_time,end_time,type,league,team,venue\n\
                       2024-06-01,18:00,19:00,Game,U13,TeamX vs TeamY,Amherst Stadium\n\
                       only,three,cells\n";
        let entries = entries_from_csv(content);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].schedule_type, ScheduleType::Game);
    }

    #[tokio::test]
    async fn test_changes_artifact_written() {
        let temp_dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(temp_dir.path());

        let report = ChangeReport {
            added: vec![entry("2024-06-01", ScheduleType::Game)],
            removed: vec![],
            modified: vec![],
            has_changes: true,
        };
        let detected_at = chrono::NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let path = store
            .save_changes(&ChangesArtifact::new(report, detected_at))
            .await
            .unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("\"has_changes\": true"));
        assert!(content.contains("\"detection_time\""));
    }
}
