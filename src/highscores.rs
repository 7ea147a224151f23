//! Leaderboards: most survivors and fastest perfect containment
//!
//! Both lists live in one JSON document behind a `Store`.

use serde::{Deserialize, Serialize};

use crate::persistence::{Store, StoreError};
use crate::sim::Outcome;

/// Default number of entries kept per list
pub const DEFAULT_LEADERBOARD_SIZE: usize = 10;

/// Longest name accepted on a leaderboard
pub const MAX_NAME_LEN: usize = 20;

/// Name used when the player enters nothing usable
pub const ANONYMOUS_NAME: &str = "ANONYMOUS";

/// Which direction is better for a list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankOrder {
    /// Sorted descending (scores)
    HigherIsBetter,
    /// Sorted ascending (times)
    LowerIsBetter,
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub value: f64,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

/// A capped, sorted list of entries
#[derive(Debug, Clone)]
pub struct RankedList {
    order: RankOrder,
    capacity: usize,
    entries: Vec<LeaderboardEntry>,
}

impl RankedList {
    pub fn new(order: RankOrder, capacity: usize) -> Self {
        Self {
            order,
            capacity,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Strictly better; ties keep the earlier entry ahead
    fn beats(&self, a: f64, b: f64) -> bool {
        match self.order {
            RankOrder::HigherIsBetter => a > b,
            RankOrder::LowerIsBetter => a < b,
        }
    }

    /// Check if a value would make the list
    pub fn qualifies(&self, value: f64) -> bool {
        if self.capacity == 0 || !value.is_finite() {
            return false;
        }
        if self.entries.len() < self.capacity {
            return true;
        }
        self.entries
            .last()
            .map(|e| self.beats(value, e.value))
            .unwrap_or(true)
    }

    /// Get the rank a value would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, value: f64) -> Option<usize> {
        if !self.qualifies(value) {
            return None;
        }
        let rank = self.entries.iter().position(|e| self.beats(value, e.value));
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add an entry if it qualifies
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify
    pub fn insert(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        let rank = self.potential_rank(entry.value)?;
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(self.capacity);
        Some(rank)
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn best(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Replace contents with `entries`, re-sorted and capped
    fn fill(&mut self, entries: Vec<LeaderboardEntry>) {
        self.entries.clear();
        for entry in entries {
            self.insert(entry);
        }
    }
}

/// Where a finished run landed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub score_rank: Option<usize>,
    pub time_rank: Option<usize>,
}

/// On-disk shape: only the entries are stored
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredBoards {
    #[serde(default)]
    scores: Vec<LeaderboardEntry>,
    #[serde(default)]
    times: Vec<LeaderboardEntry>,
}

/// High scores and best times
#[derive(Debug, Clone)]
pub struct Leaderboards {
    /// Survivors, most first
    pub scores: RankedList,
    /// Seconds to perfect containment, fastest first
    pub times: RankedList,
}

impl Default for Leaderboards {
    fn default() -> Self {
        Self::new(DEFAULT_LEADERBOARD_SIZE)
    }
}

impl Leaderboards {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "outbreak_leaderboards";

    /// Create empty leaderboards
    pub fn new(capacity: usize) -> Self {
        Self {
            scores: RankedList::new(RankOrder::HigherIsBetter, capacity),
            times: RankedList::new(RankOrder::LowerIsBetter, capacity),
        }
    }

    /// Would this run place anywhere?
    pub fn qualifies(&self, outcome: &Outcome) -> bool {
        (outcome.survivors > 0 && self.scores.qualifies(outcome.survivors as f64))
            || (outcome.is_perfect() && self.times.qualifies(outcome.elapsed_secs as f64))
    }

    /// Record a finished run under `name`
    ///
    /// Every run with survivors competes on score. Only perfect runs compete
    /// on time.
    pub fn record_outcome(&mut self, outcome: &Outcome, name: &str, timestamp: f64) -> Placement {
        let mut placement = Placement::default();

        if outcome.survivors > 0 {
            placement.score_rank = self.scores.insert(LeaderboardEntry {
                name: name.to_string(),
                value: outcome.survivors as f64,
                timestamp,
            });
        }
        if outcome.is_perfect() {
            placement.time_rank = self.times.insert(LeaderboardEntry {
                name: name.to_string(),
                value: outcome.elapsed_secs as f64,
                timestamp,
            });
        }

        if let Some(rank) = placement.score_rank {
            log::info!("{} placed #{} on high scores", name, rank);
        }
        if let Some(rank) = placement.time_rank {
            log::info!("{} placed #{} on best times", name, rank);
        }
        placement
    }

    /// Load leaderboards
    ///
    /// Malformed data is discarded and overwritten with empty lists.
    pub fn load<S: Store + ?Sized>(store: &mut S, capacity: usize) -> Self {
        let mut boards = Self::new(capacity);

        let json = match store.get(Self::STORAGE_KEY) {
            Ok(Some(json)) => json,
            Ok(None) => {
                log::info!("No leaderboards found, starting fresh");
                return boards;
            }
            Err(e) => {
                log::warn!("Leaderboards unavailable: {}", e);
                return boards;
            }
        };

        match serde_json::from_str::<StoredBoards>(&json) {
            Ok(stored) => {
                boards.scores.fill(stored.scores);
                boards.times.fill(stored.times);
                log::info!(
                    "Loaded {} high scores, {} best times",
                    boards.scores.entries().len(),
                    boards.times.entries().len()
                );
            }
            Err(e) => {
                log::warn!("Malformed leaderboards ({}), resetting", e);
                if let Err(e) = boards.save(store) {
                    log::warn!("Could not overwrite leaderboards: {}", e);
                }
            }
        }
        boards
    }

    pub fn save<S: Store + ?Sized>(&self, store: &mut S) -> Result<(), StoreError> {
        let stored = StoredBoards {
            scores: self.scores.entries().to_vec(),
            times: self.times.entries().to_vec(),
        };
        store.put(Self::STORAGE_KEY, &serde_json::to_string(&stored)?)?;
        log::info!("Leaderboards saved");
        Ok(())
    }
}

/// Clean up a typed name for the leaderboard
///
/// Strict mode keeps only A-Z (uppercased). Both modes cap the length.
pub fn sanitize_name(raw: &str, strict: bool) -> String {
    let name: String = if strict {
        raw.chars()
            .filter(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
            .take(MAX_NAME_LEN)
            .collect()
    } else {
        raw.trim()
            .chars()
            .filter(|c| !c.is_control())
            .take(MAX_NAME_LEN)
            .collect()
    };

    if name.is_empty() {
        ANONYMOUS_NAME.to_string()
    } else {
        name
    }
}

/// Format seconds as `m:ss.t`
pub fn format_time(secs: f32) -> String {
    let tenths = (secs.max(0.0) * 10.0).round() as u32;
    let minutes = tenths / 600;
    let seconds = (tenths % 600) / 10;
    format!("{}:{:02}.{}", minutes, seconds, tenths % 10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn entry(name: &str, value: f64) -> LeaderboardEntry {
        LeaderboardEntry {
            name: name.to_string(),
            value,
            timestamp: 0.0,
        }
    }

    fn outcome(survivors: usize, total: usize, elapsed_secs: f32) -> Outcome {
        Outcome {
            survivors,
            total,
            elapsed_secs,
        }
    }

    #[test]
    fn test_scores_sorted_descending() {
        let mut list = RankedList::new(RankOrder::HigherIsBetter, 3);
        assert_eq!(list.insert(entry("A", 10.0)), Some(1));
        assert_eq!(list.insert(entry("B", 20.0)), Some(1));
        assert_eq!(list.insert(entry("C", 15.0)), Some(2));
        // Full; must beat the last entry
        assert_eq!(list.insert(entry("D", 10.0)), None);
        assert_eq!(list.insert(entry("E", 12.0)), Some(3));

        let values: Vec<f64> = list.entries().iter().map(|e| e.value).collect();
        assert_eq!(values, vec![20.0, 15.0, 12.0]);
    }

    #[test]
    fn test_times_sorted_ascending() {
        let mut list = RankedList::new(RankOrder::LowerIsBetter, 2);
        list.insert(entry("A", 30.0));
        list.insert(entry("B", 25.0));
        assert_eq!(list.potential_rank(40.0), None);
        assert_eq!(list.potential_rank(20.0), Some(1));
        assert_eq!(list.best().map(|e| e.name.as_str()), Some("B"));
    }

    #[test]
    fn test_ties_rank_after_existing() {
        let mut list = RankedList::new(RankOrder::HigherIsBetter, 5);
        list.insert(entry("FIRST", 10.0));
        assert_eq!(list.insert(entry("SECOND", 10.0)), Some(2));
    }

    #[test]
    fn test_record_outcome() {
        let mut boards = Leaderboards::new(5);

        let placed = boards.record_outcome(&outcome(18, 25, 40.0), "ANNA", 1.0);
        assert_eq!(placed.score_rank, Some(1));
        assert_eq!(placed.time_rank, None);

        let placed = boards.record_outcome(&outcome(25, 25, 33.5), "BO", 2.0);
        assert_eq!(placed.score_rank, Some(1));
        assert_eq!(placed.time_rank, Some(1));

        let placed = boards.record_outcome(&outcome(0, 25, 20.0), "CY", 3.0);
        assert_eq!(placed, Placement::default());
        assert!(!boards.qualifies(&outcome(0, 25, 20.0)));
    }

    #[test]
    fn test_save_and_load() {
        let mut store = MemoryStore::default();
        let mut boards = Leaderboards::new(10);
        boards.record_outcome(&outcome(20, 20, 12.0), "ZED", 5.0);
        boards.save(&mut store).unwrap();

        let loaded = Leaderboards::load(&mut store, 10);
        assert_eq!(loaded.scores.entries(), boards.scores.entries());
        assert_eq!(loaded.times.entries(), boards.times.entries());
    }

    #[test]
    fn test_load_applies_capacity_and_order() {
        let mut store = MemoryStore::default();
        let json = r#"{"scores":[
            {"name":"A","value":3,"timestamp":0},
            {"name":"B","value":9,"timestamp":0},
            {"name":"C","value":5,"timestamp":0}
        ]}"#;
        store.put(Leaderboards::STORAGE_KEY, json).unwrap();

        let boards = Leaderboards::load(&mut store, 2);
        let names: Vec<&str> = boards.scores.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["B", "C"]);
        assert!(boards.times.is_empty());
    }

    #[test]
    fn test_malformed_data_is_reset() {
        let mut store = MemoryStore::default();
        store.put(Leaderboards::STORAGE_KEY, "garbage").unwrap();

        let boards = Leaderboards::load(&mut store, 10);
        assert!(boards.scores.is_empty());
        assert!(boards.times.is_empty());

        let stored = store.get(Leaderboards::STORAGE_KEY).unwrap().unwrap();
        assert!(serde_json::from_str::<serde_json::Value>(&stored).is_ok());
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("ab-c 9d", true), "ABCD");
        assert_eq!(sanitize_name("123", true), ANONYMOUS_NAME);
        assert_eq!(sanitize_name("  Dr. Who  ", false), "Dr. Who");
        assert_eq!(sanitize_name(&"x".repeat(40), true).len(), MAX_NAME_LEN);
        assert_eq!(sanitize_name(&"é".repeat(40), false).chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00.0");
        assert_eq!(format_time(65.34), "1:05.3");
    }
}
