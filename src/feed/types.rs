use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{AnalyticsError, Result};

// Normalized internal types used by the engines (sport-agnostic).

/// One game in a player's (or team's) log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub date: NaiveDate,
    pub opponent: String,
    pub is_home: bool,
    pub minutes_played: f64,
    /// Counting stats keyed by the provider's stat name ("PTS", "REB", ...).
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
}

impl GameRecord {
    pub fn new(date: NaiveDate, opponent: &str, is_home: bool, minutes_played: f64) -> Self {
        Self {
            date,
            opponent: opponent.to_string(),
            is_home,
            minutes_played,
            stats: BTreeMap::new(),
        }
    }

    pub fn with_stat(mut self, name: &str, value: f64) -> Self {
        self.stats.insert(name.to_string(), value);
        self
    }

    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }
}

/// Games in ascending date order. Position in the log defines "recent".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GameLog {
    records: Vec<GameRecord>,
}

impl GameLog {
    /// Build a log, rejecting out-of-order dates and repeated date+opponent pairs.
    pub fn new(records: Vec<GameRecord>) -> Result<Self> {
        for (index, pair) in records.windows(2).enumerate() {
            if pair[1].date < pair[0].date {
                return Err(AnalyticsError::OutOfOrder { index: index + 1 });
            }
        }
        for (index, record) in records.iter().enumerate() {
            let duplicate = records[..index]
                .iter()
                .rev()
                .take_while(|earlier| earlier.date == record.date)
                .any(|earlier| earlier.opponent == record.opponent);
            if duplicate {
                return Err(AnalyticsError::DuplicateGame { index });
            }
        }
        Ok(Self { records })
    }

    /// Sort by date before validating. Providers that return newest-first use this.
    pub fn from_unsorted(mut records: Vec<GameRecord>) -> Result<Self> {
        records.sort_by_key(|r| r.date);
        Self::new(records)
    }

    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GameRecord> {
        self.records.get(index)
    }

    /// Ingestion-time schema check: every record must carry every required stat.
    pub fn require_stats<S: AsRef<str>>(&self, required: &[S]) -> Result<()> {
        for (index, record) in self.records.iter().enumerate() {
            for stat in required {
                if record.stat(stat.as_ref()).is_none() {
                    return Err(AnalyticsError::MissingStat {
                        stat: stat.as_ref().to_string(),
                        index,
                    });
                }
            }
        }
        Ok(())
    }

    /// Values of one stat in log order. Fails on an empty log or a missing value.
    pub fn values(&self, stat: &str) -> Result<Vec<f64>> {
        if self.records.is_empty() {
            return Err(AnalyticsError::EmptyLog);
        }
        self.records
            .iter()
            .enumerate()
            .map(|(index, r)| {
                r.stat(stat).ok_or_else(|| AnalyticsError::MissingStat {
                    stat: stat.to_string(),
                    index,
                })
            })
            .collect()
    }
}

/// Season per-game averages for one player, as served by a league dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSeasonLine {
    pub player_id: String,
    pub name: String,
    pub team: Option<String>,
    pub stats: BTreeMap<String, f64>,
}

/// What a caller asks a provider for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameLogRequest {
    pub entity_id: String,
    pub season: String,
    pub as_of: NaiveDate,
}
