pub mod config;
pub mod engine;
pub mod error;
pub mod feed;
pub mod pipeline;

pub use error::{AnalyticsError, Result};
