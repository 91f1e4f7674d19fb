///! Key-based schedule diffing
///!
///! Given two window-filtered collections of entries, partitions the
///! union of their identity keys into added, removed, modified and
///! unchanged. A canonical fingerprint over a sorted serialization is
///! available as a cheap equality pre-check; the key-based diff remains
///! the path of record for reporting.

use super::types::{ChangeReport, ModifiedEntry, ScheduleEntry};
use anyhow::{Context, Result};
use std::collections::HashMap;

/// Compute the change report between two schedule collections.
///
/// Duplicate identity keys within one side overwrite earlier entries
/// (last-write-wins); the upstream feed is not expected to produce two
/// distinct bookings with identical date, start time, type and league.
pub fn diff(old: &[ScheduleEntry], new: &[ScheduleEntry]) -> ChangeReport {
    let old_by_key: HashMap<String, &ScheduleEntry> =
        old.iter().map(|e| (e.key(), e)).collect();
    let new_by_key: HashMap<String, &ScheduleEntry> =
        new.iter().map(|e| (e.key(), e)).collect();

    let mut added: Vec<ScheduleEntry> = new_by_key
        .iter()
        .filter(|(key, _)| !old_by_key.contains_key(*key))
        .map(|(_, entry)| (*entry).clone())
        .collect();

    let mut removed: Vec<ScheduleEntry> = old_by_key
        .iter()
        .filter(|(key, _)| !new_by_key.contains_key(*key))
        .map(|(_, entry)| (*entry).clone())
        .collect();

    let mut modified = Vec::new();
    for (key, new_entry) in &new_by_key {
        if let Some(old_entry) = old_by_key.get(key) {
            if old_entry.team != new_entry.team
                || old_entry.venue != new_entry.venue
                || old_entry.end_time != new_entry.end_time
            {
                modified.push(ModifiedEntry {
                    key: key.clone(),
                    old: (*old_entry).clone(),
                    new: (*new_entry).clone(),
                });
            }
        }
    }

    // Downstream formatting assumes chronological input and does not
    // sort on its own.
    added.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    removed.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    modified.sort_by(|a, b| a.new.sort_key().cmp(&b.new.sort_key()));

    let has_changes = !added.is_empty() || !removed.is_empty() || !modified.is_empty();

    ChangeReport {
        added,
        removed,
        modified,
        has_changes,
    }
}

/// Stable fingerprint of a schedule collection.
///
/// Entries are sorted by `(date, start_time, type)` and serialized to
/// canonical JSON (struct field order is fixed), then digested with
/// MD5. Collision resistance is irrelevant here, the input is not
/// adversarial; a fast 128-bit digest is all the cheap equality
/// pre-check needs.
pub fn fingerprint(entries: &[ScheduleEntry]) -> Result<String> {
    let mut sorted: Vec<&ScheduleEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        (a.date.as_str(), a.start_time.as_str(), a.schedule_type.as_str())
            .cmp(&(b.date.as_str(), b.start_time.as_str(), b.schedule_type.as_str()))
    });

    let canonical =
        serde_json::to_string(&sorted).context("Failed to canonicalize schedule")?;

    Ok(format!("{:x}", md5::compute(canonical.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::schedule::types::ScheduleType;
    use std::collections::HashSet;

    fn entry(
        date: &str,
        start: &str,
        stype: ScheduleType,
        league: &str,
        team: &str,
        venue: &str,
    ) -> ScheduleEntry {
        ScheduleEntry {
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: "19:00".to_string(),
            schedule_type: stype,
            league: league.to_string(),
            team: team.to_string(),
            venue: venue.to_string(),
        }
    }

    fn game(date: &str, start: &str, team: &str) -> ScheduleEntry {
        entry(date, start, ScheduleType::Game, "LeagueA", team, "VenueY")
    }

    #[test]
    fn test_no_op_idempotence() {
        let items = vec![game("2024-06-01", "18:00", "TeamX vs TeamY")];
        let report = diff(&items, &items);
        assert!(!report.has_changes);
        assert!(report.added.is_empty());
        assert!(report.removed.is_empty());
        assert!(report.modified.is_empty());

        let report = diff(&[], &[]);
        assert!(!report.has_changes);
    }

    #[test]
    fn test_pure_addition() {
        let old = vec![game("2024-06-01", "18:00", "TeamX")];
        let mut new = old.clone();
        new.push(entry(
            "2024-06-02",
            "09:00",
            ScheduleType::Practice,
            "LeagueA",
            "TeamZ",
            "VenueY",
        ));

        let report = diff(&old, &new);
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].schedule_type, ScheduleType::Practice);
        assert!(report.removed.is_empty());
        assert!(report.modified.is_empty());
        assert!(report.has_changes);
    }

    #[test]
    fn test_pure_modification() {
        let old = vec![game("2024-06-01", "18:00", "TeamX vs TeamY")];
        let new = vec![game("2024-06-01", "18:00", "TeamX vs TeamQ")];

        let report = diff(&old, &new);
        assert!(report.added.is_empty());
        assert!(report.removed.is_empty());
        assert_eq!(report.modified.len(), 1);
        assert_eq!(report.modified[0].old.team, "TeamX vs TeamY");
        assert_eq!(report.modified[0].new.team, "TeamX vs TeamQ");
    }

    #[test]
    fn test_end_time_change_is_modification() {
        let old = vec![game("2024-06-01", "18:00", "TeamX")];
        let mut new = old.clone();
        new[0].end_time = "19:30".to_string();

        let report = diff(&old, &new);
        assert_eq!(report.modified.len(), 1);
        assert!(report.added.is_empty() && report.removed.is_empty());
    }

    #[test]
    fn test_removal() {
        let old = vec![
            game("2024-06-01", "18:00", "TeamX"),
            game("2024-06-02", "18:00", "TeamZ"),
        ];
        let new = vec![old[0].clone()];

        let report = diff(&old, &new);
        assert_eq!(report.removed.len(), 1);
        assert_eq!(report.removed[0].date, "2024-06-02");
    }

    #[test]
    fn test_symmetry_of_structure() {
        let a = vec![
            game("2024-06-01", "18:00", "TeamX"),
            game("2024-06-03", "09:00", "TeamY"),
        ];
        let b = vec![
            game("2024-06-01", "18:00", "TeamX"),
            game("2024-06-04", "20:00", "TeamW"),
        ];

        let ab = diff(&a, &b);
        let ba = diff(&b, &a);

        let ab_added: HashSet<String> = ab.added.iter().map(|e| e.key()).collect();
        let ba_removed: HashSet<String> = ba.removed.iter().map(|e| e.key()).collect();
        assert_eq!(ab_added, ba_removed);
    }

    #[test]
    fn test_partition_completeness() {
        let old = vec![
            game("2024-06-01", "18:00", "TeamX"),
            game("2024-06-02", "18:00", "TeamY"),
            game("2024-06-03", "18:00", "TeamZ"),
        ];
        let new = vec![
            game("2024-06-01", "18:00", "TeamX"),         // unchanged
            game("2024-06-02", "18:00", "TeamY changed"), // modified
            game("2024-06-04", "18:00", "TeamW"),         // added
        ];

        let report = diff(&old, &new);

        let added: HashSet<String> = report.added.iter().map(|e| e.key()).collect();
        let removed: HashSet<String> = report.removed.iter().map(|e| e.key()).collect();
        let modified: HashSet<String> = report.modified.iter().map(|m| m.key.clone()).collect();

        assert!(added.is_disjoint(&removed));
        assert!(added.is_disjoint(&modified));
        assert!(removed.is_disjoint(&modified));

        let all_keys: HashSet<String> = old
            .iter()
            .chain(new.iter())
            .map(|e| e.key())
            .collect();
        let categorized = added.len() + removed.len() + modified.len();
        // One key is unchanged; every other key lands in exactly one bucket.
        assert_eq!(categorized, all_keys.len() - 1);
    }

    #[test]
    fn test_duplicate_keys_last_write_wins() {
        let mut first = game("2024-06-01", "18:00", "TeamX");
        first.venue = "Rink 1".to_string();
        let mut second = first.clone();
        second.venue = "Rink 2".to_string();

        let report = diff(&[first, second.clone()], &[second]);
        assert!(!report.has_changes);
    }

    #[test]
    fn test_presentation_order_sorted() {
        let new = vec![
            game("2024-06-03", "09:00", "B"),
            game("2024-06-01", "20:00", "C"),
            game("2024-06-01", "08:00", "A"),
        ];
        let report = diff(&[], &new);
        let order: Vec<(&str, &str)> = report.added.iter().map(|e| e.sort_key()).collect();
        assert_eq!(
            order,
            vec![
                ("2024-06-01", "08:00"),
                ("2024-06-01", "20:00"),
                ("2024-06-03", "09:00"),
            ]
        );
    }

    #[test]
    fn test_fingerprint_order_independent() {
        let a = vec![
            game("2024-06-01", "18:00", "TeamX"),
            game("2024-06-02", "09:00", "TeamY"),
        ];
        let b = vec![a[1].clone(), a[0].clone()];
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_detects_field_change() {
        let a = vec![game("2024-06-01", "18:00", "TeamX")];
        let mut b = a.clone();
        b[0].venue = "Rink 2".to_string();
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_fingerprint_empty_collection() {
        assert_eq!(fingerprint(&[]).unwrap(), fingerprint(&[]).unwrap());
    }
}
