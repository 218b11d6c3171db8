use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use signal_analytics::config::Config;
use signal_analytics::feed::cache::CachedProvider;
use signal_analytics::feed::file::JsonFileProvider;
use signal_analytics::feed::types::{GameLog, GameLogRequest};
use signal_analytics::feed::GameLogProvider;
use signal_analytics::pipeline::{format_report, PlayerPipeline, PlayerReport};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_SEASON: &str = "2023-24";

const USAGE: &str = "usage: signal-analytics <data-dir> <player-id> \
[--season S] [--stat NAME] [--sport NAME] [--prop LINE] [--config PATH] [--json]";

struct Args {
    data_dir: PathBuf,
    player_id: String,
    season: String,
    stat: String,
    sport: String,
    prop_line: Option<f64>,
    config_path: PathBuf,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut args = Args {
        data_dir: PathBuf::new(),
        player_id: String::new(),
        season: DEFAULT_SEASON.to_string(),
        stat: "PTS".to_string(),
        sport: "nba".to_string(),
        prop_line: None,
        config_path: PathBuf::from("config.toml"),
        json: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .with_context(|| format!("{flag} needs a value"))
        };
        match arg.as_str() {
            "--season" => args.season = value("--season")?,
            "--stat" => args.stat = value("--stat")?,
            "--sport" => args.sport = value("--sport")?,
            "--config" => args.config_path = PathBuf::from(value("--config")?),
            "--prop" => {
                let raw = value("--prop")?;
                let line = raw
                    .parse()
                    .with_context(|| format!("bad prop line: {raw}"))?;
                args.prop_line = Some(line);
            }
            "--json" => args.json = true,
            _ => positional.push(arg),
        }
    }

    match positional.as_slice() {
        [dir, player] => {
            args.data_dir = PathBuf::from(dir);
            args.player_id = player.clone();
            Ok(args)
        }
        _ => anyhow::bail!(USAGE),
    }
}

#[derive(Serialize)]
struct NamedComparable {
    id: String,
    name: String,
    distance: f64,
    score: f64,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a PlayerReport,
    comparables: Option<&'a [NamedComparable]>,
}

/// Comparables for the requested player, or `None` when the league file is
/// missing or the player cannot be placed in it.
async fn find_comparables<P: GameLogProvider>(
    provider: &mut P,
    pipeline: &PlayerPipeline,
    args: &Args,
    log: &GameLog,
) -> Option<Vec<NamedComparable>> {
    let league = match provider.fetch_league_stats(&args.season).await {
        Ok(league) => league,
        Err(e) => {
            tracing::info!(error = %e, "no league stats, skipping comparables");
            return None;
        }
    };
    let result = match pipeline.comparables_for(&args.player_id, log, &league) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(player = %args.player_id, error = %e, "no comparables");
            return None;
        }
    };
    let named = result
        .comparables
        .into_iter()
        .map(|comp| {
            let name = league
                .iter()
                .find(|l| l.player_id == comp.id)
                .map_or_else(|| comp.id.clone(), |l| l.name.clone());
            NamedComparable {
                id: comp.id,
                name,
                distance: comp.distance,
                score: comp.score,
            }
        })
        .collect();
    Some(named)
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_file = std::fs::File::create("signal-analytics.log")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("signal_analytics=info")),
        )
        .with_writer(log_file)
        .init();

    let args = parse_args()?;
    let config = if args.config_path.exists() {
        Config::load(&args.config_path)?
    } else {
        tracing::warn!(path = %args.config_path.display(), "config not found, using defaults");
        Config::default()
    };

    let pipeline = PlayerPipeline::new(config.clone(), &args.sport)?;
    let files = JsonFileProvider::new(Path::new(&args.data_dir), &pipeline.profile().minutes_stat);
    let mut provider = CachedProvider::new(files, Duration::from_secs(config.cache.ttl_secs));

    let request = GameLogRequest {
        entity_id: args.player_id.clone(),
        season: args.season.clone(),
        as_of: Utc::now().date_naive(),
    };
    let log = provider.fetch_game_log(&request).await?;
    let report = pipeline
        .analyze(&log, &args.stat, args.prop_line)
        .with_context(|| format!("analysis failed for player {}", args.player_id))?;

    let comparables = find_comparables(&mut provider, &pipeline, &args, &log).await;

    if args.json {
        let output = JsonOutput {
            report: &report,
            comparables: comparables.as_deref(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!();
        println!("  Signal Analytics ({} {})", args.sport.to_uppercase(), args.season);
        println!("  ==============================");
        print!("{}", format_report(&report));
        match &comparables {
            Some(comps) => {
                println!("  Comparables:");
                for comp in comps {
                    println!(
                        "    {:<24} distance {:.2} score {:.2}",
                        comp.name, comp.distance, comp.score
                    );
                }
            }
            None => println!("  Comparables: none"),
        }
    }

    tracing::debug!("done");
    Ok(())
}
