pub mod cache;
pub mod file;
pub mod nba_stats;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use types::{GameLog, GameLogRequest, PlayerSeasonLine};

/// Source of game logs and league-wide season lines for one sport.
///
/// The engines never see which sport or source produced the data.
#[async_trait]
pub trait GameLogProvider: Send + Sync {
    async fn fetch_game_log(&mut self, request: &GameLogRequest) -> Result<GameLog>;
    async fn fetch_league_stats(&mut self, season: &str) -> Result<Vec<PlayerSeasonLine>>;
}
