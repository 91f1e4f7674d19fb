///! Monitoring pipeline - one-shot scrape, diff and notify cycles
///!
///! Stages run sequentially in-process and hand each other values; the
///! only state that survives across invocations is the snapshot
///! baseline on disk. The process model is one shot per invocation
///! (an external scheduler drives repetition), so the cycle runs to
///! completion and reports its outcome through `MonitorOutcome`.

use super::api_client::{self, ScheduleApiClient};
use super::diff;
use super::notifier::EmailNotifier;
use super::render;
use super::scraper;
use super::snapshot::{ChangesArtifact, ScheduleExport, SnapshotStore};
use super::types::{ChangeReport, ScheduleEntry};
use super::window;
use crate::config::MonitorConfig;
use anyhow::Result;
use chrono::{Local, NaiveDateTime};

/// Outcome of one change-detection cycle, mapped to the process exit
/// code by the binary (0 = no changes or bootstrap, 1 = changes).
#[derive(Debug)]
pub enum MonitorOutcome {
    /// Nothing changed inside the monitored window.
    NoChanges,
    /// First run: baseline established, nothing to report.
    Bootstrap,
    /// Changes were found; `notified` records whether the email
    /// hand-off succeeded.
    ChangesDetected {
        report: ChangeReport,
        notified: bool,
    },
}

/// Outcome of a weekly report run. Upstream failures (fetch, disk)
/// propagate as errors; a failed email hand-off is distinguished here
/// so the caller can map it to a different exit code.
#[derive(Debug)]
pub enum ReportOutcome {
    Sent,
    NotifyFailed,
}

/// Window-filter the loaded snapshot to the same horizon as the
/// current collection, then diff the two.
///
/// Re-filtering the old side is what keeps naturally expired entries
/// out of `removed`: a booking dated before today drops out of both
/// collections and never reaches the diff, so aging out is not
/// mistaken for a cancellation.
fn compare_snapshots(
    previous_all: &[ScheduleEntry],
    current: &[ScheduleEntry],
    horizon_days: i64,
    now: NaiveDateTime,
) -> ChangeReport {
    let previous = window::filter_next_days(previous_all, horizon_days, now);
    tracing::info!(
        "Previous snapshot: {} entries, {} still in window",
        previous_all.len(),
        previous.len()
    );

    // Cheap equality pre-check. The key-based diff below stays the
    // path of record: it runs whenever the fingerprints differ or
    // cannot be computed.
    match (diff::fingerprint(&previous), diff::fingerprint(current)) {
        (Ok(old_fp), Ok(new_fp)) if old_fp == new_fp => {
            tracing::info!("Schedule fingerprint unchanged ({})", new_fp);
            return ChangeReport::default();
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!("Fingerprint unavailable, running full diff: {}", e);
        }
        _ => {}
    }

    diff::diff(&previous, current)
}

pub struct Monitor {
    config: MonitorConfig,
    api: ScheduleApiClient,
    store: SnapshotStore,
    notifier: EmailNotifier,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Result<Self> {
        let api = ScheduleApiClient::new(&config.base_url)?;
        let store = SnapshotStore::new(&config.output_dir);
        let notifier = EmailNotifier::new(config.smtp.clone(), config.test_mode);

        Ok(Self {
            config,
            api,
            store,
            notifier,
        })
    }

    /// Fetch, venue-filter and format the current schedule, and refresh
    /// the CSV/JSON exports that display clients read.
    async fn scrape_current(&self, now: NaiveDateTime) -> Result<Vec<ScheduleEntry>> {
        let raw = self.api.fetch_master_schedule().await?;
        let raw = api_client::filter_date_range(raw, self.config.days_ahead, now.date());
        let raw = scraper::filter_by_venue(raw, &self.config.venue_filter);
        let entries = scraper::format_items(raw);

        self.store.ensure_output_dir().await?;
        self.store.save_schedule_csv(&entries).await?;
        let export = ScheduleExport::new(
            entries.clone(),
            &self.config.timezone,
            &self.config.venue_filter,
            self.config.days_ahead,
        );
        self.store.save_schedule_json(&export).await?;

        Ok(entries)
    }

    /// Run one change-detection cycle: scrape, window-filter both
    /// sides, diff, persist the new baseline and notify.
    pub async fn run_change_cycle(&self) -> Result<MonitorOutcome> {
        let now = Local::now().naive_local();
        tracing::info!(
            "Starting change-detection cycle: next {} days at '{}'",
            self.config.monitor_days,
            self.config.venue_filter
        );

        let entries = self.scrape_current(now).await?;
        let current = window::filter_next_days(&entries, self.config.monitor_days, now);
        tracing::info!(
            "Current schedule has {} entries in the next {} days",
            current.len(),
            self.config.monitor_days
        );

        // Bootstrap must be decided before diffing: an empty old side
        // would misreport every current entry as added.
        let Some(previous_all) = self.store.load_snapshot().await? else {
            tracing::info!("No previous snapshot found - establishing baseline");
            self.store.save_snapshot(&current).await?;
            return Ok(MonitorOutcome::Bootstrap);
        };

        let report = compare_snapshots(&previous_all, &current, self.config.monitor_days, now);
        if !report.has_changes {
            tracing::info!("No changes detected");
            return Ok(MonitorOutcome::NoChanges);
        }

        tracing::info!("Changes detected: {}", report.summary());

        // The new baseline is persisted once the diff has completed,
        // independent of whether the notification goes through.
        self.store
            .save_changes(&ChangesArtifact::new(report.clone(), now))
            .await?;
        self.store.save_snapshot(&current).await?;

        let notified = match self.notify_changes(&report, now).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to send change notification: {}", e);
                false
            }
        };

        Ok(MonitorOutcome::ChangesDetected { report, notified })
    }

    async fn notify_changes(&self, report: &ChangeReport, now: NaiveDateTime) -> Result<()> {
        let html = render::render_change_report(
            report,
            &self.config.venue_filter,
            self.config.monitor_days,
            now,
        );
        let subject = self.subject(&format!(
            "Schedule Alert - Changes Detected at {}",
            self.config.venue_filter
        ));

        self.notifier
            .send(&self.config.recipients, &subject, &html, None)
            .await
    }

    /// Send the weekly full-schedule report with the current CSV
    /// attached, regardless of whether anything changed.
    pub async fn run_weekly_report(&self) -> Result<ReportOutcome> {
        let now = Local::now().naive_local();
        tracing::info!(
            "Preparing weekly schedule report for '{}'",
            self.config.venue_filter
        );

        let entries = self.scrape_current(now).await?;
        let week = window::filter_next_days(&entries, window::DEFAULT_HORIZON_DAYS, now);

        let html = render::render_weekly_report(
            &week,
            &self.config.venue_filter,
            &self.config.schedule_url,
            now,
            self.config.test_mode,
        );
        let subject = self.subject(&format!(
            "Weekly Schedule - {} ({})",
            self.config.venue_filter,
            now.format("%b %d, %Y")
        ));

        let csv_path = self.store.schedule_csv_path();
        let attachment = csv_path.exists().then_some(csv_path.as_path());

        // A failed hand-off after a successful scrape is not an
        // unexpected failure; surface it as its own outcome.
        match self
            .notifier
            .send(&self.config.recipients, &subject, &html, attachment)
            .await
        {
            Ok(()) => {
                tracing::info!("Weekly report completed");
                Ok(ReportOutcome::Sent)
            }
            Err(e) => {
                tracing::error!("Failed to send weekly report: {}", e);
                Ok(ReportOutcome::NotifyFailed)
            }
        }
    }

    fn subject(&self, base: &str) -> String {
        if self.config.test_mode {
            format!("[TEST] {}", base)
        } else {
            base.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::types::ScheduleType;
    use chrono::NaiveDate;

    fn entry(date: &str, start: &str) -> ScheduleEntry {
        ScheduleEntry {
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: String::new(),
            schedule_type: ScheduleType::Practice,
            league: "U11".to_string(),
            team: String::new(),
            venue: "Amherst Stadium".to_string(),
        }
    }

    fn noon(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_aged_out_entry_is_not_reported_as_removed() {
        // Yesterday's booking is in the stored snapshot but absent from
        // the current scrape. It expired naturally, so it must not be
        // treated as a cancellation.
        let previous = vec![entry("2024-06-07", "18:00"), entry("2024-06-10", "18:00")];
        let current = vec![entry("2024-06-10", "18:00")];

        let report = compare_snapshots(&previous, &current, 7, noon("2024-06-08"));
        assert!(report.removed.is_empty());
        assert!(!report.has_changes);
    }

    #[test]
    fn test_cancelled_in_window_entry_is_reported_as_removed() {
        let previous = vec![entry("2024-06-10", "18:00"), entry("2024-06-12", "09:00")];
        let current = vec![entry("2024-06-10", "18:00")];

        let report = compare_snapshots(&previous, &current, 7, noon("2024-06-08"));
        assert!(report.has_changes);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].date, "2024-06-12");
        assert!(report.added.is_empty());
    }

    #[test]
    fn test_aged_out_and_cancelled_entries_are_distinguished() {
        let previous = vec![
            entry("2024-06-07", "18:00"), // expired
            entry("2024-06-10", "18:00"), // unchanged
            entry("2024-06-12", "09:00"), // cancelled
        ];
        let current = vec![entry("2024-06-10", "18:00"), entry("2024-06-13", "20:00")];

        let report = compare_snapshots(&previous, &current, 7, noon("2024-06-08"));
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].date, "2024-06-12");
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].date, "2024-06-13");
    }

    #[test]
    fn test_test_mode_subject_prefix() {
        let mut config = MonitorConfig::default();
        config.test_mode = true;
        let monitor = Monitor::new(config).unwrap();
        assert_eq!(monitor.subject("Weekly Schedule"), "[TEST] Weekly Schedule");

        let monitor = Monitor::new(MonitorConfig::default()).unwrap();
        assert_eq!(monitor.subject("Weekly Schedule"), "Weekly Schedule");
    }
}
