use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::types::{GameLog, GameRecord, PlayerSeasonLine};

/// Box-score columns carried into `GameRecord::stats`.
const GAME_STATS: &[&str] = &[
    "PTS", "AST", "REB", "OREB", "DREB", "STL", "BLK", "TOV", "PF", "MIN", "FGM", "FGA",
    "FG_PCT", "FG3M", "FG3A", "FG3_PCT", "FTM", "FTA", "FT_PCT", "PLUS_MINUS",
];

/// Identifier columns that are numeric but are not stats.
const ID_COLUMNS: &[&str] = &[
    "PLAYER_ID",
    "TEAM_ID",
    "Player_ID",
    "Game_ID",
    "SEASON_ID",
];

// ── Stats API table shape ───────────────────────────────────────────

#[derive(Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets", alias = "resultSet")]
    result_sets: ResultSets,
}

/// Some endpoints return a single table instead of a list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ResultSets {
    Many(Vec<ResultSet>),
    One(ResultSet),
}

#[derive(Deserialize)]
struct ResultSet {
    #[serde(default)]
    name: String,
    headers: Vec<String>,
    #[serde(rename = "rowSet")]
    row_set: Vec<Vec<Value>>,
}

impl StatsResponse {
    fn first_table(self) -> Result<ResultSet> {
        match self.result_sets {
            ResultSets::One(set) => Ok(set),
            ResultSets::Many(sets) => sets
                .into_iter()
                .next()
                .context("response has no result sets"),
        }
    }
}

struct Row<'a> {
    headers: &'a [String],
    values: &'a [Value],
}

impl<'a> Row<'a> {
    fn get(&self, column: &str) -> Option<&'a Value> {
        let pos = self.headers.iter().position(|h| h == column)?;
        self.values.get(pos)
    }

    fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(Value::as_str)
    }

    fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(numeric)
    }
}

/// Numbers, numeric strings, and "MM:SS" clock strings.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if let Some((min, sec)) = s.split_once(':') {
                let min: f64 = min.parse().ok()?;
                let sec: f64 = sec.parse().ok()?;
                Some(min + sec / 60.0)
            } else {
                s.parse().ok()
            }
        }
        _ => None,
    }
}

/// Accepts "2024-04-14" and the API's "APR 14, 2024".
fn parse_game_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%b %d, %Y"))
        .ok()
}

/// "DAL vs. DET" is a home game against DET; "DAL @ DET" is away at DET.
fn parse_matchup(matchup: &str) -> Option<(bool, String)> {
    if let Some((_, opp)) = matchup.split_once(" vs. ") {
        return Some((true, opp.trim().to_string()));
    }
    if let Some((_, opp)) = matchup.split_once(" @ ") {
        return Some((false, opp.trim().to_string()));
    }
    None
}

/// Parse a player or team game-log response into an ascending `GameLog`.
///
/// `minutes_stat` names the column holding playing time ("MIN", "TOI").
/// Rows without a readable date or matchup are skipped.
pub fn parse_player_game_log(json: &str, minutes_stat: &str) -> Result<GameLog> {
    let response: StatsResponse =
        serde_json::from_str(json).context("Failed to parse game log response")?;
    let table = response.first_table()?;

    let mut records = Vec::with_capacity(table.row_set.len());
    for values in &table.row_set {
        let row = Row {
            headers: &table.headers,
            values,
        };
        let date = match row.text("GAME_DATE").and_then(parse_game_date) {
            Some(d) => d,
            None => {
                tracing::warn!(table = %table.name, "skipping game row: unreadable GAME_DATE");
                continue;
            }
        };
        let (is_home, opponent) = match row.text("MATCHUP").and_then(parse_matchup) {
            Some(m) => m,
            None => {
                tracing::warn!(table = %table.name, %date, "skipping game row: unreadable MATCHUP");
                continue;
            }
        };
        let minutes = row.number(minutes_stat).unwrap_or(0.0);

        let mut record = GameRecord::new(date, &opponent, is_home, minutes);
        for stat in GAME_STATS {
            if let Some(v) = row.number(stat) {
                record.stats.insert(stat.to_string(), v);
            }
        }
        if let Some(v) = row.number(minutes_stat) {
            record.stats.insert(minutes_stat.to_string(), v);
        }
        records.push(record);
    }

    tracing::debug!(games = records.len(), "parsed game log");
    Ok(GameLog::from_unsorted(records)?)
}

/// Parse a league dashboard response into per-player season lines.
pub fn parse_league_player_stats(json: &str) -> Result<Vec<PlayerSeasonLine>> {
    let response: StatsResponse =
        serde_json::from_str(json).context("Failed to parse league stats response")?;
    let table = response.first_table()?;

    let mut lines = Vec::with_capacity(table.row_set.len());
    for values in &table.row_set {
        let row = Row {
            headers: &table.headers,
            values,
        };
        let player_id = match row.get("PLAYER_ID") {
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::String(s)) => s.clone(),
            _ => continue,
        };
        let stats: BTreeMap<String, f64> = table
            .headers
            .iter()
            .filter(|h| !ID_COLUMNS.contains(&h.as_str()))
            .filter_map(|h| {
                row.number(h)
                    .filter(|v| v.is_finite())
                    .map(|v| (h.clone(), v))
            })
            .collect();

        lines.push(PlayerSeasonLine {
            player_id,
            name: row.text("PLAYER_NAME").unwrap_or_default().to_string(),
            team: row.text("TEAM_ABBREVIATION").map(str::to_string),
            stats,
        });
    }
    Ok(lines)
}
