///! Core schedule data structures
///!
///! A `ScheduleEntry` is one bookable ice-time slot as reported by the
///! league API. Entries carry no persistent identity: two entries
///! observed at different times are "the same booking" iff they agree
///! on date, start time, schedule type and league (see `ScheduleEntry::key`).

use serde::{Deserialize, Serialize};

/// Category of an ice-time booking.
///
/// Serializes to the display strings the league site uses, so the
/// values round-trip through CSV and JSON unchanged. Anything the API
/// invents later lands on `Other` instead of failing deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScheduleType {
    Game,
    Practice,
    OffIceTraining,
    TeamMeeting,
    TournamentGame,
    Evaluation,
    Other,
}

impl From<String> for ScheduleType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Game" => Self::Game,
            "Practice" => Self::Practice,
            "Off-Ice Training" => Self::OffIceTraining,
            "Team Meeting" => Self::TeamMeeting,
            "Tournament Game" => Self::TournamentGame,
            "Evaluation" => Self::Evaluation,
            _ => Self::Other,
        }
    }
}

impl From<ScheduleType> for String {
    fn from(schedule_type: ScheduleType) -> Self {
        schedule_type.as_str().to_string()
    }
}

impl Default for ScheduleType {
    fn default() -> Self {
        Self::Other
    }
}

impl ScheduleType {
    /// Map the numeric `team_schedule_type_id` used by the master
    /// schedule API to a schedule type.
    pub fn from_type_id(type_id: i64) -> Self {
        match type_id {
            1 => Self::Practice,
            2 => Self::OffIceTraining,
            3 => Self::TeamMeeting,
            4 => Self::TournamentGame,
            5 => Self::Other,
            6 => Self::Evaluation,
            7 => Self::Game,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Game => "Game",
            Self::Practice => "Practice",
            Self::OffIceTraining => "Off-Ice Training",
            Self::TeamMeeting => "Team Meeting",
            Self::TournamentGame => "Tournament Game",
            Self::Evaluation => "Evaluation",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for ScheduleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One bookable ice-time slot.
///
/// Date and time fields are kept as the raw wall-clock strings the API
/// reports (`YYYY-MM-DD`, `HH:MM` or `HH:MM:SS`). Parsing happens at
/// the point of use so that a malformed time on one entry never poisons
/// the rest of a scrape. An empty string is the explicit "absent" state
/// for a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(rename = "type", default)]
    pub schedule_type: ScheduleType,
    #[serde(default)]
    pub league: String,
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub venue: String,
}

impl ScheduleEntry {
    /// Identity key of the booking: `date_startTime_type_league`.
    ///
    /// Stable across re-scrapes for a given booking; `team`, `venue`
    /// and `end_time` are deliberately excluded so that administrative
    /// corrections to those fields show up as modifications rather than
    /// as a remove/add pair. Absent fields contribute empty-string
    /// components, which can collide if several entries are missing the
    /// same fields (known sharp edge).
    pub fn key(&self) -> String {
        format!(
            "{}_{}_{}_{}",
            self.date, self.start_time, self.schedule_type, self.league
        )
    }

    /// Presentation ordering: by date, then start time. Lexicographic
    /// comparison is chronological for `YYYY-MM-DD` / `HH:MM[:SS]`.
    pub fn sort_key(&self) -> (&str, &str) {
        (self.date.as_str(), self.start_time.as_str())
    }
}

/// One modified booking: same identity key on both sides, at least one
/// of `team`, `venue`, `end_time` differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedEntry {
    pub key: String,
    pub old: ScheduleEntry,
    pub new: ScheduleEntry,
}

/// Output of one diff cycle.
///
/// The key sets of `added`, `removed` and `modified` are pairwise
/// disjoint; `added` and `removed` are sorted by `(date, start_time)`
/// ascending, which downstream formatting relies on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangeReport {
    pub added: Vec<ScheduleEntry>,
    pub removed: Vec<ScheduleEntry>,
    pub modified: Vec<ModifiedEntry>,
    pub has_changes: bool,
}

impl ChangeReport {
    pub fn summary(&self) -> String {
        format!(
            "{} added, {} removed, {} modified",
            self.added.len(),
            self.removed.len(),
            self.modified.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(date: &str, start: &str, stype: ScheduleType, league: &str) -> ScheduleEntry {
        ScheduleEntry {
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: String::new(),
            schedule_type: stype,
            league: league.to_string(),
            team: String::new(),
            venue: String::new(),
        }
    }

    #[test]
    fn test_key_format() {
        let e = entry("2024-06-01", "18:00", ScheduleType::Game, "LeagueA");
        assert_eq!(e.key(), "2024-06-01_18:00_Game_LeagueA");
    }

    #[test]
    fn test_key_ignores_descriptive_fields() {
        let mut a = entry("2024-06-01", "18:00", ScheduleType::Game, "LeagueA");
        let mut b = a.clone();
        b.team = "TeamX vs TeamY".to_string();
        b.venue = "Rink 2".to_string();
        b.end_time = "19:30".to_string();
        a.team = "TeamX vs TeamQ".to_string();
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_key_with_missing_fields() {
        let e = ScheduleEntry {
            date: String::new(),
            start_time: String::new(),
            end_time: String::new(),
            schedule_type: ScheduleType::Other,
            league: String::new(),
            team: String::new(),
            venue: String::new(),
        };
        assert_eq!(e.key(), "__Other_");
    }

    #[test]
    fn test_type_id_mapping() {
        assert_eq!(ScheduleType::from_type_id(1), ScheduleType::Practice);
        assert_eq!(ScheduleType::from_type_id(7), ScheduleType::Game);
        assert_eq!(ScheduleType::from_type_id(42), ScheduleType::Other);
    }

    #[test]
    fn test_type_serde_round_trip() {
        let json = serde_json::to_string(&ScheduleType::OffIceTraining).unwrap();
        assert_eq!(json, "\"Off-Ice Training\"");
        let back: ScheduleType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScheduleType::OffIceTraining);
    }

    #[test]
    fn test_unknown_type_falls_back_to_other() {
        let back: ScheduleType = serde_json::from_str("\"Scrimmage\"").unwrap();
        assert_eq!(back, ScheduleType::Other);
    }
}
