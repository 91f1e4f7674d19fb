///! Ice-time schedule monitoring module
///!
///! Polls the league master-schedule API for one venue, persists the
///! result, diffs it against the previous snapshot inside a sliding
///! time window, and emails human-readable change reports.
///!
///! ## Pipeline
///! scrape (`api_client` + `scraper`) -> `window` filter -> `diff`
///! against the `snapshot` baseline -> `render` + `notifier`.
///! `monitor` drives the stages in-process.

// ============ Core Data Structures ============
mod types;
pub use types::{ChangeReport, ModifiedEntry, ScheduleEntry, ScheduleType};

// ============ Window Filter and Diff Engine ============
mod window;
pub use window::{filter_next_days, parse_entry_date, parse_entry_time, DEFAULT_HORIZON_DAYS};

mod diff;
pub use diff::{diff, fingerprint};

// ============ API Client and Scraper ============
mod api_client;
pub use api_client::{filter_date_range, RawScheduleItem, ScheduleApiClient};

mod scraper;
pub use scraper::{filter_by_venue, format_items};

// ============ Persistence ============
mod snapshot;
pub use snapshot::{ChangesArtifact, ScheduleExport, SnapshotStore};

// ============ Rendering and Notification ============
mod render;
pub use render::{render_change_report, render_weekly_report};

mod notifier;
pub use notifier::EmailNotifier;

// ============ Pipeline ============
mod monitor;
pub use monitor::{Monitor, MonitorOutcome, ReportOutcome};
