pub mod fatigue;
pub mod metrics;
pub mod prop;
pub mod rolling;
pub mod similarity;
