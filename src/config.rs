use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::AnalyticsError;

const WEIGHT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub trend: TrendConfig,
    #[serde(default)]
    pub streak: StreakConfig,
    #[serde(default)]
    pub fatigue: FatigueConfig,
    #[serde(default)]
    pub prop: PropConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default = "default_sports")]
    pub sports: BTreeMap<String, SportProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trend: TrendConfig::default(),
            streak: StreakConfig::default(),
            fatigue: FatigueConfig::default(),
            prop: PropConfig::default(),
            similarity: SimilarityConfig::default(),
            cache: CacheConfig::default(),
            sports: default_sports(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrendConfig {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            short_window: 5,
            long_window: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StreakConfig {
    /// Fraction of the season mean a game must clear to count toward a streak.
    pub threshold: f64,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self { threshold: 0.2 }
    }
}

/// Fatigue weights and reference constants. None of the defaults are
/// calibrated against outcome data; retune per sport.
#[derive(Debug, Deserialize, Clone)]
pub struct FatigueConfig {
    pub rest_weight: f64,
    pub travel_weight: f64,
    pub load_weight: f64,
    /// Rest beyond this many days contributes no fatigue.
    pub max_rest_days: u32,
    /// Travel load for an away game that follows another away game.
    pub back_to_back_away_load: f64,
    /// Prior games averaged for the minutes load.
    pub load_window: usize,
    /// Minutes treated as a full workload.
    #[serde(default = "default_reference_minutes")]
    pub reference_minutes: f64,
}

fn default_reference_minutes() -> f64 {
    40.0
}

impl Default for FatigueConfig {
    fn default() -> Self {
        Self {
            rest_weight: 0.5,
            travel_weight: 0.2,
            load_weight: 0.3,
            max_rest_days: 4,
            back_to_back_away_load: 0.5,
            load_window: 3,
            reference_minutes: default_reference_minutes(),
        }
    }
}

impl FatigueConfig {
    /// Same weights with the sport's workload reference.
    pub fn for_sport(&self, profile: &SportProfile) -> Self {
        Self {
            reference_minutes: profile.reference_minutes,
            ..self.clone()
        }
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        let weights = [self.rest_weight, self.travel_weight, self.load_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AnalyticsError::InvalidConfig(
                "fatigue weights must be non-negative".to_string(),
            ));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(AnalyticsError::InvalidConfig(format!(
                "fatigue weights sum to {sum}, expected 1"
            )));
        }
        if self.max_rest_days == 0 || self.load_window == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "max_rest_days and load_window must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.back_to_back_away_load) {
            return Err(AnalyticsError::InvalidConfig(
                "back_to_back_away_load must be within [0, 1]".to_string(),
            ));
        }
        if !(self.reference_minutes > 0.0) {
            return Err(AnalyticsError::InvalidConfig(
                "reference_minutes must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PropConfig {
    pub recent_window: usize,
    /// Distance the recent mean must clear above (or below) both the line and
    /// the season mean. Landing exactly on the margin is neutral.
    pub margin: f64,
    /// Relative band around the season mean for the rolling signal table.
    pub signal_band: f64,
}

impl Default for PropConfig {
    fn default() -> Self {
        Self {
            recent_window: 5,
            margin: 1.0,
            signal_band: 0.2,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SimilarityConfig {
    pub k: usize,
    pub features: Vec<String>,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            k: 3,
            features: ["PTS", "AST", "REB", "USG_PCT", "TS_PCT"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 900 }
    }
}

/// Sport-specific constants. The engines never branch on sport; callers pick
/// a profile and pass its values in.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SportProfile {
    pub required_stats: Vec<String>,
    pub reference_minutes: f64,
    #[serde(default = "default_minutes_stat")]
    pub minutes_stat: String,
}

fn default_minutes_stat() -> String {
    "MIN".to_string()
}

fn default_sports() -> BTreeMap<String, SportProfile> {
    let mut sports = BTreeMap::new();
    sports.insert(
        "nba".to_string(),
        SportProfile {
            required_stats: ["PTS", "AST", "REB"].iter().map(|s| s.to_string()).collect(),
            reference_minutes: 40.0,
            minutes_stat: default_minutes_stat(),
        },
    );
    sports.insert(
        "nhl".to_string(),
        SportProfile {
            required_stats: ["G", "A", "PTS"].iter().map(|s| s.to_string()).collect(),
            reference_minutes: 24.0,
            minutes_stat: "TOI".to_string(),
        },
    );
    sports
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AnalyticsError> {
        if self.trend.short_window == 0 || self.trend.short_window >= self.trend.long_window {
            return Err(AnalyticsError::InvalidConfig(format!(
                "trend windows {}/{} must satisfy 0 < short < long",
                self.trend.short_window, self.trend.long_window
            )));
        }
        if !self.streak.threshold.is_finite() || self.streak.threshold < 0.0 {
            return Err(AnalyticsError::InvalidConfig(
                "streak threshold must be non-negative".to_string(),
            ));
        }
        if self.prop.recent_window == 0 || !(self.prop.margin >= 0.0) {
            return Err(AnalyticsError::InvalidConfig(
                "prop recent_window must be positive and margin non-negative".to_string(),
            ));
        }
        if self.similarity.k == 0 || self.similarity.features.is_empty() {
            return Err(AnalyticsError::InvalidConfig(
                "similarity needs k > 0 and at least one feature".to_string(),
            ));
        }
        self.fatigue.validate()
    }

    /// Look up a sport profile by name (case-insensitive).
    pub fn profile(&self, sport: &str) -> Result<&SportProfile> {
        let key = sport.to_ascii_lowercase();
        self.sports
            .get(&key)
            .with_context(|| format!("Unknown sport: {sport}"))
    }
}
