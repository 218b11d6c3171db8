use serde::Serialize;

use super::rolling::{mean, tail_mean, trailing_mean};
use crate::error::{AnalyticsError, Result};
use crate::feed::types::GameLog;

/// Recent-form windows reported by `recent_form`.
pub const FORM_WINDOWS: [usize; 2] = [5, 10];

/// Short and long rolling averages at one game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub index: usize,
    pub value: f64,
    pub short_avg: f64,
    pub long_avg: f64,
    /// `short_avg - long_avg`
    pub delta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub stat: String,
    pub short_window: usize,
    pub long_window: usize,
    pub points: Vec<TrendPoint>,
}

impl TrendResult {
    pub fn latest(&self) -> Option<&TrendPoint> {
        self.points.last()
    }
}

/// Rolling short/long averages aligned to each game.
///
/// Windows only look back, never ahead of the game they are attached to,
/// and shrink to the available history when the log is short.
pub fn compute_trend(
    log: &GameLog,
    short_window: usize,
    long_window: usize,
    stat: &str,
) -> Result<TrendResult> {
    if short_window == 0 || short_window >= long_window {
        return Err(AnalyticsError::InvalidWindow {
            short: short_window,
            long: long_window,
        });
    }
    let values = log.values(stat)?;

    let points = values
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            let (short_avg, _) = trailing_mean(&values, index, short_window);
            let (long_avg, _) = trailing_mean(&values, index, long_window);
            TrendPoint {
                index,
                value,
                short_avg,
                long_avg,
                delta: short_avg - long_avg,
            }
        })
        .collect();

    Ok(TrendResult {
        stat: stat.to_string(),
        short_window,
        long_window,
        points,
    })
}

/// Mean over one venue partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PartitionMean {
    pub games: usize,
    pub mean: f64,
}

/// `None` marks a partition with no games.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HomeAwaySplit {
    pub home: Option<PartitionMean>,
    pub away: Option<PartitionMean>,
}

fn partition_mean(values: &[f64]) -> Option<PartitionMean> {
    mean(values).map(|m| PartitionMean {
        games: values.len(),
        mean: m,
    })
}

pub fn home_away_split(log: &GameLog, stat: &str) -> Result<HomeAwaySplit> {
    let values = log.values(stat)?;
    let mut home = Vec::new();
    let mut away = Vec::new();
    for (record, value) in log.records().iter().zip(values) {
        if record.is_home {
            home.push(value);
        } else {
            away.push(value);
        }
    }

    Ok(HomeAwaySplit {
        home: partition_mean(&home),
        away: partition_mean(&away),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FormWindow {
    pub requested: usize,
    pub games: usize,
    pub mean: f64,
    /// Window mean minus season mean.
    pub delta: f64,
    /// Fewer games were available than requested.
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentForm {
    pub season_mean: f64,
    pub windows: Vec<FormWindow>,
}

impl RecentForm {
    pub fn window(&self, requested: usize) -> Option<&FormWindow> {
        self.windows.iter().find(|w| w.requested == requested)
    }
}

/// Last-5 and last-10 means against the full-season mean.
pub fn recent_form(log: &GameLog, stat: &str) -> Result<RecentForm> {
    let values = log.values(stat)?;
    let season_mean = mean(&values).ok_or(AnalyticsError::EmptyLog)?;

    let windows = FORM_WINDOWS
        .iter()
        .filter_map(|&requested| {
            tail_mean(&values, requested).map(|(window_mean, games)| FormWindow {
                requested,
                games,
                mean: window_mean,
                delta: window_mean - season_mean,
                partial: games < requested,
            })
        })
        .collect();

    Ok(RecentForm {
        season_mean,
        windows,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StreakKind {
    Hot,
    Cold,
    None,
}

impl StreakKind {
    pub fn as_str(&self) -> &str {
        match self {
            StreakKind::Hot => "hot",
            StreakKind::Cold => "cold",
            StreakKind::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Streak {
    pub kind: StreakKind,
    pub length: usize,
    pub season_mean: f64,
}

/// Classify one game against the season mean.
///
/// A game is hot when it beats the mean by at least `threshold * |mean|`
/// and strictly exceeds it; cold is symmetric. Games exactly at the mean
/// never qualify.
fn classify(value: f64, season_mean: f64, threshold: f64) -> StreakKind {
    let required = threshold * season_mean.abs();
    if value > season_mean && value - season_mean >= required {
        StreakKind::Hot
    } else if value < season_mean && season_mean - value >= required {
        StreakKind::Cold
    } else {
        StreakKind::None
    }
}

/// Longest trailing run of games on the same side of the season mean.
///
/// The most recent game decides the direction; if it does not qualify the
/// result is `StreakKind::None` with length 0.
pub fn detect_streak(log: &GameLog, stat: &str, threshold: f64) -> Result<Streak> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "threshold",
            value: threshold,
        });
    }
    let values = log.values(stat)?;
    let season_mean = mean(&values).ok_or(AnalyticsError::EmptyLog)?;

    let kinds: Vec<StreakKind> = values
        .iter()
        .map(|&v| classify(v, season_mean, threshold))
        .collect();

    let kind = kinds.last().copied().unwrap_or(StreakKind::None);
    let length = match kind {
        StreakKind::None => 0,
        _ => kinds.iter().rev().take_while(|&&k| k == kind).count(),
    };

    Ok(Streak {
        kind,
        length,
        season_mean,
    })
}

/// Games in the trailing `window` strictly above the season mean.
///
/// Returns `(hot_games, games_in_window)`.
pub fn hot_games(log: &GameLog, stat: &str, window: usize) -> Result<(usize, usize)> {
    if window == 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "window",
            value: 0.0,
        });
    }
    let values = log.values(stat)?;
    let season_mean = mean(&values).ok_or(AnalyticsError::EmptyLog)?;
    let start = values.len().saturating_sub(window);
    let recent = &values[start..];
    let hot = recent.iter().filter(|&&v| v > season_mean).count();
    Ok((hot, recent.len()))
}
