use serde::Serialize;

use super::rolling::{mean, rolling_means, tail_mean};
use crate::error::{AnalyticsError, Result};
use crate::feed::types::GameLog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropSignal {
    TrendingOver,
    TrendingUnder,
    Neutral,
}

impl PropSignal {
    pub fn as_str(&self) -> &str {
        match self {
            PropSignal::TrendingOver => "trending over",
            PropSignal::TrendingUnder => "trending under",
            PropSignal::Neutral => "neutral",
        }
    }
}

/// How much history backs a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PropConfidence {
    Low,
    Medium,
    High,
}

impl PropConfidence {
    pub fn from_games_played(games: usize) -> Self {
        if games < 10 {
            PropConfidence::Low
        } else if games < 30 {
            PropConfidence::Medium
        } else {
            PropConfidence::High
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PropConfidence::Low => "low",
            PropConfidence::Medium => "medium",
            PropConfidence::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PropFlag {
    pub signal: PropSignal,
    pub confidence: PropConfidence,
    pub recent_mean: f64,
    pub season_mean: f64,
    pub prop_line: f64,
    /// `recent_mean - prop_line`
    pub gap: f64,
    /// `recent_mean - season_mean`
    pub season_gap: f64,
    pub recent_games: usize,
    /// The log held fewer games than the requested window.
    pub partial_window: bool,
}

/// Compare the trailing `recent_window` mean against the line and the season.
///
/// Trending over requires the recent mean to beat both `prop_line + margin`
/// and `season_mean + margin` strictly; trending under is symmetric. Landing
/// exactly on either boundary is neutral.
pub fn validate_prop(
    log: &GameLog,
    stat: &str,
    prop_line: f64,
    recent_window: usize,
    margin: f64,
) -> Result<PropFlag> {
    if recent_window == 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "recent_window",
            value: 0.0,
        });
    }
    if !prop_line.is_finite() {
        return Err(AnalyticsError::InvalidParameter {
            name: "prop_line",
            value: prop_line,
        });
    }
    if !margin.is_finite() || margin < 0.0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "margin",
            value: margin,
        });
    }
    let values = log.values(stat)?;
    let season_mean = mean(&values).ok_or(AnalyticsError::EmptyLog)?;
    let (recent_mean, recent_games) =
        tail_mean(&values, recent_window).ok_or(AnalyticsError::EmptyLog)?;

    Ok(PropFlag {
        signal: classify(recent_mean, prop_line, season_mean, margin),
        confidence: PropConfidence::from_games_played(values.len()),
        recent_mean,
        season_mean,
        prop_line,
        gap: recent_mean - prop_line,
        season_gap: recent_mean - season_mean,
        recent_games,
        partial_window: recent_games < recent_window,
    })
}

fn classify(recent: f64, line: f64, season: f64, margin: f64) -> PropSignal {
    if recent > line + margin && recent > season + margin {
        PropSignal::TrendingOver
    } else if recent < line - margin && recent < season - margin {
        PropSignal::TrendingUnder
    } else {
        PropSignal::Neutral
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RollingSignal {
    Hot,
    Cold,
    Neutral,
}

impl RollingSignal {
    pub fn as_str(&self) -> &str {
        match self {
            RollingSignal::Hot => "hot streak",
            RollingSignal::Cold => "cold streak",
            RollingSignal::Neutral => "neutral",
        }
    }
}

/// One row of the per-game anomaly table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalRow {
    pub index: usize,
    pub value: f64,
    pub rolling_mean: f64,
    pub season_mean: f64,
    pub signal: RollingSignal,
}

/// Per-game rolling mean against a relative band around the season mean.
///
/// Hot when the rolling mean exceeds `season_mean * (1 + band)`, cold when it
/// falls below `season_mean * (1 - band)`.
pub fn rolling_signals(
    log: &GameLog,
    stat: &str,
    window: usize,
    band: f64,
) -> Result<Vec<SignalRow>> {
    if window == 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "window",
            value: 0.0,
        });
    }
    if !band.is_finite() || band < 0.0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "band",
            value: band,
        });
    }
    let values = log.values(stat)?;
    let season_mean = mean(&values).ok_or(AnalyticsError::EmptyLog)?;
    let upper = season_mean * (1.0 + band);
    let lower = season_mean * (1.0 - band);

    Ok(rolling_means(&values, window)
        .into_iter()
        .zip(&values)
        .enumerate()
        .map(|(index, (rolling_mean, &value))| {
            let signal = if rolling_mean > upper {
                RollingSignal::Hot
            } else if rolling_mean < lower {
                RollingSignal::Cold
            } else {
                RollingSignal::Neutral
            };
            SignalRow {
                index,
                value,
                rolling_mean,
                season_mean,
                signal,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::GameRecord;
    use chrono::NaiveDate;

    fn log_of(points: &[f64]) -> GameLog {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        GameLog::new(
            points
                .iter()
                .enumerate()
                .map(|(i, &p)| {
                    GameRecord::new(start + chrono::Days::new(i as u64), "OPP", true, 33.0)
                        .with_stat("PTS", p)
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_classify_over() {
        // recent 28 > line 22 + 3 and > season 20 + 3
        assert_eq!(classify(28.0, 22.0, 20.0, 3.0), PropSignal::TrendingOver);
    }

    #[test]
    fn test_classify_tie_is_neutral() {
        assert_eq!(classify(25.0, 22.0, 20.0, 3.0), PropSignal::Neutral);
        assert_eq!(classify(17.0, 20.0, 22.0, 3.0), PropSignal::Neutral);
    }

    #[test]
    fn test_classify_under() {
        assert_eq!(classify(12.0, 20.0, 18.0, 3.0), PropSignal::TrendingUnder);
    }

    #[test]
    fn test_over_requires_both_baselines() {
        // Beats the line but not the season mean.
        assert_eq!(classify(28.0, 20.0, 27.0, 3.0), PropSignal::Neutral);
    }

    #[test]
    fn test_validate_prop_from_log() {
        // Season of ten: five 12s then five 28s. Season mean 20, last five 28.
        let mut points = vec![12.0; 5];
        points.extend([28.0; 5]);
        let flag = validate_prop(&log_of(&points), "PTS", 22.0, 5, 3.0).unwrap();
        assert_eq!(flag.signal, PropSignal::TrendingOver);
        assert_eq!(flag.recent_mean, 28.0);
        assert_eq!(flag.season_mean, 20.0);
        assert_eq!(flag.gap, 6.0);
        assert_eq!(flag.confidence, PropConfidence::Medium);
        assert!(!flag.partial_window);
    }

    #[test]
    fn test_short_log_marks_partial() {
        let flag = validate_prop(&log_of(&[20.0, 22.0]), "PTS", 21.0, 5, 1.0).unwrap();
        assert!(flag.partial_window);
        assert_eq!(flag.recent_games, 2);
        assert_eq!(flag.signal, PropSignal::Neutral);
        assert_eq!(flag.confidence, PropConfidence::Low);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let log = log_of(&[20.0]);
        assert!(validate_prop(&log, "PTS", 20.0, 0, 1.0).is_err());
        assert!(validate_prop(&log, "PTS", 20.0, 5, -1.0).is_err());
        assert!(validate_prop(&log, "PTS", f64::NAN, 5, 1.0).is_err());
        assert_eq!(
            validate_prop(&GameLog::default(), "PTS", 20.0, 5, 1.0),
            Err(AnalyticsError::EmptyLog)
        );
    }

    #[test]
    fn test_rolling_signals_table() {
        // Season mean 20: band 0.2 -> hot above 24, cold below 16.
        let log = log_of(&[10.0, 10.0, 20.0, 30.0, 30.0, 20.0]);
        let rows = rolling_signals(&log, "PTS", 2, 0.2).unwrap();
        let signals: Vec<RollingSignal> = rows.iter().map(|r| r.signal).collect();
        assert_eq!(
            signals,
            vec![
                RollingSignal::Cold,
                RollingSignal::Cold,
                RollingSignal::Cold,
                RollingSignal::Hot,
                RollingSignal::Hot,
                RollingSignal::Hot,
            ]
        );
        assert_eq!(rows[2].rolling_mean, 15.0);
    }
}
