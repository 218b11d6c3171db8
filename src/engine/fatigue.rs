//! Heuristic fatigue score (0-100) from rest, travel and recent workload.
//!
//! Each component is normalized to [0, 1] and combined with the configured
//! weights. The score describes fatigue entering a game, so the workload
//! component only looks at games before it.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::FatigueConfig;
use crate::error::{AnalyticsError, Result};
use crate::feed::types::{GameLog, GameRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FatigueLevel {
    Low,
    Elevated,
    High,
}

impl FatigueLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 40.0 {
            FatigueLevel::Low
        } else if score < 70.0 {
            FatigueLevel::Elevated
        } else {
            FatigueLevel::High
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FatigueLevel::Low => "low",
            FatigueLevel::Elevated => "elevated",
            FatigueLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FatigueScore {
    pub score: f64,
    pub level: FatigueLevel,
    pub rest_component: f64,
    pub travel_component: f64,
    pub load_component: f64,
    /// Days since the previous game, `None` for the first game of a log.
    pub rest_days: Option<i64>,
}

/// A game that has not been played yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpcomingGame {
    pub date: NaiveDate,
    pub is_home: bool,
}

/// Fatigue entering the game at `index`.
///
/// The first game of a log has neutral rest and travel components.
pub fn compute_fatigue(
    log: &GameLog,
    index: usize,
    config: &FatigueConfig,
) -> Result<FatigueScore> {
    config.validate()?;
    let game = log.get(index).ok_or(AnalyticsError::IndexOutOfRange {
        index,
        len: log.len(),
    })?;
    Ok(score_against(&log.records()[..index], game.date, game.is_home, config))
}

/// Fatigue for every game in the log, in log order.
pub fn fatigue_series(log: &GameLog, config: &FatigueConfig) -> Result<Vec<FatigueScore>> {
    config.validate()?;
    if log.is_empty() {
        return Err(AnalyticsError::EmptyLog);
    }
    Ok(log
        .records()
        .iter()
        .enumerate()
        .map(|(i, game)| score_against(&log.records()[..i], game.date, game.is_home, config))
        .collect())
}

/// Fatigue entering a game after the last one in the log.
pub fn project_fatigue(
    log: &GameLog,
    upcoming: &UpcomingGame,
    config: &FatigueConfig,
) -> Result<FatigueScore> {
    config.validate()?;
    if let Some(last) = log.records().last() {
        if upcoming.date < last.date {
            return Err(AnalyticsError::OutOfOrder { index: log.len() });
        }
    }
    Ok(score_against(log.records(), upcoming.date, upcoming.is_home, config))
}

fn score_against(
    previous: &[GameRecord],
    date: NaiveDate,
    is_home: bool,
    config: &FatigueConfig,
) -> FatigueScore {
    let last = previous.last();
    let rest_days = last.map(|prev| date.signed_duration_since(prev.date).num_days());

    let rest_component = rest_days.map_or(0.0, |days| rest_load(days, config.max_rest_days));
    let travel_component = last.map_or(0.0, |prev| travel_load(prev.is_home, is_home, config));
    let load_component = minutes_load(previous, config);

    let raw = config.rest_weight * rest_component
        + config.travel_weight * travel_component
        + config.load_weight * load_component;
    let score = (raw * 100.0).clamp(0.0, 100.0);

    FatigueScore {
        score,
        level: FatigueLevel::from_score(score),
        rest_component,
        travel_component,
        load_component,
        rest_days,
    }
}

/// 1.0 with no rest, falling linearly to 0.0 at `max_rest_days`.
fn rest_load(days: i64, max_rest_days: u32) -> f64 {
    let max = max_rest_days as f64;
    ((max - days.max(0) as f64) / max).clamp(0.0, 1.0)
}

fn travel_load(previous_home: bool, current_home: bool, config: &FatigueConfig) -> f64 {
    match (previous_home, current_home) {
        (_, true) => 0.0,
        (true, false) => 1.0,
        (false, false) => config.back_to_back_away_load,
    }
}

/// Average minutes over the trailing `load_window` prior games, over the reference.
fn minutes_load(previous: &[GameRecord], config: &FatigueConfig) -> f64 {
    if previous.is_empty() {
        return 0.0;
    }
    let start = previous.len().saturating_sub(config.load_window);
    let window = &previous[start..];
    let avg = window.iter().map(|g| g.minutes_played.max(0.0)).sum::<f64>() / window.len() as f64;
    (avg / config.reference_minutes).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn game(d: u32, is_home: bool, minutes: f64) -> GameRecord {
        GameRecord::new(day(d), "OPP", is_home, minutes)
    }

    #[test]
    fn test_first_game_is_neutral() {
        let log = GameLog::new(vec![game(1, false, 38.0)]).unwrap();
        for weights in [(1.0, 0.0, 0.0), (0.0, 1.0, 0.0), (0.2, 0.3, 0.5)] {
            let config = FatigueConfig {
                rest_weight: weights.0,
                travel_weight: weights.1,
                load_weight: weights.2,
                ..FatigueConfig::default()
            };
            let score = compute_fatigue(&log, 0, &config).unwrap();
            assert_eq!(score.rest_component, 0.0);
            assert_eq!(score.travel_component, 0.0);
            assert_eq!(score.rest_days, None);
        }
    }

    #[test]
    fn test_back_to_back_home_to_away() {
        // rest: (4-1)/4 = 0.75, travel: 1.0, load: 40/40 = 1.0
        // 0.5*0.75 + 0.2*1.0 + 0.3*1.0 = 0.875 -> 87.5
        let log = GameLog::new(vec![game(1, true, 40.0), game(2, false, 36.0)]).unwrap();
        let score = compute_fatigue(&log, 1, &FatigueConfig::default()).unwrap();
        assert!((score.rest_component - 0.75).abs() < 1e-9);
        assert_eq!(score.travel_component, 1.0);
        assert!((score.score - 87.5).abs() < 1e-9, "score: {}", score.score);
        assert_eq!(score.level, FatigueLevel::High);
    }

    #[test]
    fn test_consecutive_away_reduced_travel() {
        let log = GameLog::new(vec![game(1, false, 30.0), game(3, false, 30.0)]).unwrap();
        let score = compute_fatigue(&log, 1, &FatigueConfig::default()).unwrap();
        assert_eq!(score.travel_component, 0.5);
    }

    #[test]
    fn test_home_game_has_no_travel() {
        let log = GameLog::new(vec![game(1, false, 30.0), game(3, true, 30.0)]).unwrap();
        let score = compute_fatigue(&log, 1, &FatigueConfig::default()).unwrap();
        assert_eq!(score.travel_component, 0.0);
    }

    #[test]
    fn test_long_rest_saturates() {
        let log = GameLog::new(vec![game(1, true, 0.0), game(20, true, 0.0)]).unwrap();
        let score = compute_fatigue(&log, 1, &FatigueConfig::default()).unwrap();
        assert_eq!(score.rest_component, 0.0);
        assert_eq!(score.score, 0.0);
        assert_eq!(score.level, FatigueLevel::Low);
    }

    #[test]
    fn test_load_uses_only_prior_games() {
        // Window of 3 prior games: 30, 36, 42 -> 36 / 40 = 0.9
        let log = GameLog::new(vec![
            game(1, true, 10.0),
            game(3, true, 30.0),
            game(5, true, 36.0),
            game(7, true, 42.0),
            game(9, true, 48.0),
        ])
        .unwrap();
        let score = compute_fatigue(&log, 4, &FatigueConfig::default()).unwrap();
        assert!((score.load_component - 0.9).abs() < 1e-9, "load: {}", score.load_component);
    }

    #[test]
    fn test_index_out_of_range() {
        let log = GameLog::new(vec![game(1, true, 30.0)]).unwrap();
        assert_eq!(
            compute_fatigue(&log, 3, &FatigueConfig::default()),
            Err(AnalyticsError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let log = GameLog::new(vec![game(1, true, 30.0)]).unwrap();
        let config = FatigueConfig {
            rest_weight: 0.9,
            ..FatigueConfig::default()
        };
        assert!(matches!(
            compute_fatigue(&log, 0, &config),
            Err(AnalyticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_series_matches_single_calls() {
        let log = GameLog::new(vec![
            game(1, true, 30.0),
            game(2, false, 35.0),
            game(4, false, 33.0),
        ])
            .unwrap();
        let config = FatigueConfig::default();
        let series = fatigue_series(&log, &config).unwrap();
        for (i, score) in series.iter().enumerate() {
            assert_eq!(*score, compute_fatigue(&log, i, &config).unwrap());
        }
    }

    #[test]
    fn test_project_upcoming_game() {
        let log = GameLog::new(vec![game(1, true, 40.0)]).unwrap();
        let upcoming = UpcomingGame {
            date: day(2),
            is_home: false,
        };
        let score = project_fatigue(&log, &upcoming, &FatigueConfig::default()).unwrap();
        assert_eq!(score.rest_days, Some(1));
        assert_eq!(score.travel_component, 1.0);

        let stale = UpcomingGame {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            is_home: true,
        };
        assert!(project_fatigue(&log, &stale, &FatigueConfig::default()).is_err());
    }
}
