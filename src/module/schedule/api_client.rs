///! League API client for fetching the master schedule
use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use std::time::Duration as StdDuration;

const MASTER_SCHEDULE_PATH: &str = "/api/teams/frontendMasterSchedule/";
/// All schedule type ids, in the order the site itself requests them.
const ALL_SCHEDULE_TYPES: &str = "7,1,2,3,4,6,5";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36";

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_SECONDS: u64 = 2;
const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// One raw item from the master schedule API. Games and other bookings
/// share the endpoint but use disjoint field sets, hence everything is
/// optional; `scraper::format_items` decides which set applies.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScheduleItem {
    pub game_id: Option<i64>,
    pub game_date: Option<String>,
    pub game_start_time: Option<String>,
    pub game_end_time: Option<String>,
    pub team_a_name: Option<String>,
    pub team_b_name: Option<String>,
    pub team_schedule_date: Option<String>,
    pub team_schedule_start_time: Option<String>,
    pub team_schedule_end_time: Option<String>,
    pub team_schedule_type_id: Option<i64>,
    pub team_name: Option<String>,
    pub league_name: Option<String>,
    pub venue_name: Option<String>,
}

impl RawScheduleItem {
    /// The calendar date of the item, whichever field family carries it.
    pub fn date(&self) -> Option<&str> {
        self.team_schedule_date
            .as_deref()
            .or(self.game_date.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct MasterScheduleResponse {
    status: String,
    #[serde(default)]
    data: Vec<RawScheduleItem>,
}

/// HTTP client for the league scheduling site.
pub struct ScheduleApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ScheduleApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    fn master_schedule_url(&self) -> String {
        format!(
            "{}{}?true=1&team_id=0&league_id=0&schedule_types={}&season_id=0&show_past=0",
            self.base_url, MASTER_SCHEDULE_PATH, ALL_SCHEDULE_TYPES
        )
    }

    /// Fetch the complete master schedule (games, practices, everything),
    /// retrying transient failures with a growing delay.
    pub async fn fetch_master_schedule(&self) -> Result<Vec<RawScheduleItem>> {
        let url = self.master_schedule_url();

        for attempt in 1..=MAX_RETRIES {
            if attempt > 1 {
                let delay = StdDuration::from_secs(RETRY_DELAY_SECONDS * attempt as u64);
                tracing::debug!(
                    "Retrying master schedule fetch after {:?} (attempt {}/{})",
                    delay,
                    attempt,
                    MAX_RETRIES
                );
                tokio::time::sleep(delay).await;
            }

            match self.fetch_attempt(&url).await {
                Ok(items) => {
                    tracing::info!("API returned {} schedule items", items.len());
                    return Ok(items);
                }
                Err(e) if attempt == MAX_RETRIES => {
                    tracing::error!(
                        "Failed to fetch master schedule after {} attempts: {}",
                        MAX_RETRIES,
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for master schedule: {}",
                        attempt,
                        MAX_RETRIES,
                        e
                    );
                }
            }
        }

        Err(anyhow::anyhow!(
            "Failed to fetch master schedule after {} attempts",
            MAX_RETRIES
        ))
    }

    async fn fetch_attempt(&self, url: &str) -> Result<Vec<RawScheduleItem>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send master schedule request")?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "HTTP error {} from master schedule API",
                response.status()
            ));
        }

        let body: MasterScheduleResponse = response
            .json()
            .await
            .context("Failed to parse master schedule response")?;

        if body.status != "success" {
            return Err(anyhow::anyhow!(
                "API returned non-success status: {}",
                body.status
            ));
        }

        Ok(body.data)
    }
}

/// Coarse fetch-side trim: keep items dated within `[today, today + days_ahead]`.
/// The window filter applies the fine-grained policy later; this only
/// keeps the working set small.
pub fn filter_date_range(
    items: Vec<RawScheduleItem>,
    days_ahead: i64,
    today: NaiveDate,
) -> Vec<RawScheduleItem> {
    let end_date = today + Duration::days(days_ahead);

    let filtered: Vec<RawScheduleItem> = items
        .into_iter()
        .filter(|item| {
            let Some(raw_date) = item.date() else {
                tracing::warn!("Dropping schedule item with no date field");
                return false;
            };
            match NaiveDate::parse_from_str(raw_date, "%Y-%m-%d") {
                Ok(date) => today <= date && date <= end_date,
                Err(_) => {
                    tracing::warn!("Could not parse date: {}", raw_date);
                    false
                }
            }
        })
        .collect();

    tracing::info!("Filtered to {} items in date range", filtered.len());
    filtered
}
