use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::nba_stats::{parse_league_player_stats, parse_player_game_log};
use super::types::{GameLog, GameLogRequest, PlayerSeasonLine};
use super::GameLogProvider;

/// Reads saved stats-API responses from a directory.
///
/// Layout: `{entity_id}_{season}.json` for game logs and
/// `league_{season}.json` for league dashboards.
pub struct JsonFileProvider {
    dir: PathBuf,
    minutes_stat: String,
}

impl JsonFileProvider {
    pub fn new(dir: &Path, minutes_stat: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            minutes_stat: minutes_stat.to_string(),
        }
    }

    fn game_log_path(&self, request: &GameLogRequest) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", request.entity_id, request.season))
    }

    fn league_path(&self, season: &str) -> PathBuf {
        self.dir.join(format!("league_{}.json", season))
    }
}

#[async_trait]
impl GameLogProvider for JsonFileProvider {
    async fn fetch_game_log(&mut self, request: &GameLogRequest) -> Result<GameLog> {
        let path = self.game_log_path(request);
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read game log: {}", path.display()))?;
        let log = parse_player_game_log(&json, &self.minutes_stat)?;

        // Games after the as-of date are not visible to this request.
        let visible: Vec<_> = log
            .records()
            .iter()
            .filter(|g| g.date <= request.as_of)
            .cloned()
            .collect();
        tracing::info!(
            entity = %request.entity_id,
            season = %request.season,
            games = visible.len(),
            hidden = log.len() - visible.len(),
            "loaded game log"
        );
        Ok(GameLog::new(visible)?)
    }

    async fn fetch_league_stats(&mut self, season: &str) -> Result<Vec<PlayerSeasonLine>> {
        let path = self.league_path(season);
        let json = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read league stats: {}", path.display()))?;
        let lines = parse_league_player_stats(&json)?;
        tracing::info!(season, players = lines.len(), "loaded league stats");
        Ok(lines)
    }
}
