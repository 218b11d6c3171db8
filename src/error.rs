use thiserror::Error;

/// Failures returned by the analytics engines.
///
/// Every variant describes bad caller input; the engines have no other
/// failure mode. Degraded computations (shrunken windows, unscaled
/// zero-variance features, neutral first-game fatigue) are not errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("game log is empty")]
    EmptyLog,

    #[error("stat '{stat}' missing from game at index {index}")]
    MissingStat { stat: String, index: usize },

    #[error("season line for '{id}' has no value for feature '{feature}'")]
    MissingFeature { id: String, feature: String },

    #[error("invalid windows: short {short}, long {long}")]
    InvalidWindow { short: usize, long: usize },

    #[error("invalid parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("game index {index} out of range for log of {len} games")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("game at index {index} is dated before its predecessor")]
    OutOfOrder { index: usize },

    #[error("game at index {index} duplicates an earlier date and opponent")]
    DuplicateGame { index: usize },

    #[error("candidate pool is empty")]
    EmptyPool,

    #[error("feature vector for '{id}' has {found} features, expected {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        found: usize,
    },

    #[error("feature {feature} for '{id}' is not a finite number")]
    NonFiniteFeature { id: String, feature: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalyticsError {
    /// All engine errors belong to the invalid-input class.
    pub fn is_invalid_input(&self) -> bool {
        true
    }
}

pub type Result<T> = std::result::Result<T, AnalyticsError>;
