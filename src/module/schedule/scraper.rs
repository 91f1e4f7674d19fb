///! Raw API items to schedule entries
///!
///! The master schedule endpoint mixes two record shapes: games (which
///! carry `game_*` fields) and team schedule items (practices, training,
///! meetings). It also returns a duplicate team-schedule row for every
///! game, which has to be dropped before diffing or every game would
///! appear twice under different identity keys.

use super::api_client::RawScheduleItem;
use super::types::{ScheduleEntry, ScheduleType};
use std::collections::HashSet;

/// Keep only items at venues whose name contains `venue_filter`
/// (case-insensitive substring match).
pub fn filter_by_venue(items: Vec<RawScheduleItem>, venue_filter: &str) -> Vec<RawScheduleItem> {
    let needle = venue_filter.to_lowercase();

    let filtered: Vec<RawScheduleItem> = items
        .into_iter()
        .filter(|item| {
            item.venue_name
                .as_deref()
                .map(|venue| venue.to_lowercase().contains(&needle))
                .unwrap_or(false)
        })
        .collect();

    tracing::info!("Found {} items at '{}'", filtered.len(), venue_filter);
    filtered
}

/// Convert raw API items into schedule entries, drop the duplicate
/// team-schedule rows the API emits for games, and sort the result by
/// `(date, start_time)`.
pub fn format_items(items: Vec<RawScheduleItem>) -> Vec<ScheduleEntry> {
    let mut games = Vec::new();
    let mut non_games = Vec::new();

    for item in items {
        if item.game_id.is_some() {
            games.push(format_game(&item));
        } else {
            non_games.push(format_team_schedule(&item));
        }
    }

    // Time slots occupied by games; a non-game row in the same slot is
    // the API's duplicate entry for that game.
    let game_slots: HashSet<(String, String)> = games
        .iter()
        .map(|g| (g.date.clone(), g.start_time.clone()))
        .collect();

    let before = non_games.len();
    non_games.retain(|ng| !game_slots.contains(&(ng.date.clone(), ng.start_time.clone())));
    let duplicates = before - non_games.len();

    let mut all_items = games;
    all_items.append(&mut non_games);
    all_items.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    tracing::info!(
        "Formatted {} entries ({} duplicates removed)",
        all_items.len(),
        duplicates
    );

    all_items
}

fn format_game(item: &RawScheduleItem) -> ScheduleEntry {
    let team_a = item.team_a_name.as_deref().unwrap_or("");
    let team_b = item.team_b_name.as_deref().unwrap_or("");
    let team = if !team_a.is_empty() && !team_b.is_empty() {
        format!("{} vs {}", team_a, team_b)
    } else {
        "TBA".to_string()
    };

    ScheduleEntry {
        date: item.game_date.clone().unwrap_or_default(),
        start_time: item.game_start_time.clone().unwrap_or_default(),
        end_time: item.game_end_time.clone().unwrap_or_default(),
        schedule_type: ScheduleType::Game,
        league: item.league_name.clone().unwrap_or_default(),
        team,
        venue: item.venue_name.clone().unwrap_or_default(),
    }
}

fn format_team_schedule(item: &RawScheduleItem) -> ScheduleEntry {
    let schedule_type = ScheduleType::from_type_id(item.team_schedule_type_id.unwrap_or(1));

    ScheduleEntry {
        date: item.team_schedule_date.clone().unwrap_or_default(),
        start_time: item.team_schedule_start_time.clone().unwrap_or_default(),
        end_time: item.team_schedule_end_time.clone().unwrap_or_default(),
        schedule_type,
        league: item.league_name.clone().unwrap_or_default(),
        team: item.team_name.clone().unwrap_or_default(),
        venue: item.venue_name.clone().unwrap_or_default(),
    }
}
