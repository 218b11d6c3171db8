use serde::Serialize;

use crate::config::{Config, FatigueConfig, SportProfile};
use crate::engine::fatigue::{self, FatigueScore};
use crate::engine::metrics::{self, HomeAwaySplit, RecentForm, Streak, TrendResult};
use crate::engine::prop::{self, PropFlag, SignalRow};
use crate::engine::similarity::{self, FeatureSchema, SimilarityResult};
use crate::error::{AnalyticsError, Result};
use crate::feed::types::{GameLog, PlayerSeasonLine};

/// Every engine output for one player and one stat.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerReport {
    pub stat: String,
    pub games: usize,
    pub trend: TrendResult,
    pub split: HomeAwaySplit,
    pub form: RecentForm,
    pub streak: Streak,
    /// (hot games, games considered) over the last five.
    pub hot_games: (usize, usize),
    pub fatigue: FatigueScore,
    pub prop: Option<PropFlag>,
    pub signals: Vec<SignalRow>,
}

/// Engine settings resolved for one sport.
pub struct PlayerPipeline {
    config: Config,
    profile: SportProfile,
    fatigue: FatigueConfig,
}

impl PlayerPipeline {
    pub fn new(config: Config, sport: &str) -> anyhow::Result<Self> {
        config.validate()?;
        let profile = config.profile(sport)?.clone();
        let fatigue = config.fatigue.for_sport(&profile);
        Ok(Self {
            config,
            profile,
            fatigue,
        })
    }

    pub fn profile(&self) -> &SportProfile {
        &self.profile
    }

    /// Run the per-log engines. `prop_line` is optional since not every
    /// stat has a posted line.
    pub fn analyze(
        &self,
        log: &GameLog,
        stat: &str,
        prop_line: Option<f64>,
    ) -> Result<PlayerReport> {
        log.require_stats(&self.profile.required_stats)?;
        let last = log.len().checked_sub(1).ok_or(AnalyticsError::EmptyLog)?;

        let prop = prop_line
            .map(|line| {
                prop::validate_prop(
                    log,
                    stat,
                    line,
                    self.config.prop.recent_window,
                    self.config.prop.margin,
                )
            })
            .transpose()?;

        Ok(PlayerReport {
            stat: stat.to_string(),
            games: log.len(),
            trend: metrics::compute_trend(
                log,
                self.config.trend.short_window,
                self.config.trend.long_window,
                stat,
            )?,
            split: metrics::home_away_split(log, stat)?,
            form: metrics::recent_form(log, stat)?,
            streak: metrics::detect_streak(log, stat, self.config.streak.threshold)?,
            hot_games: metrics::hot_games(log, stat, metrics::FORM_WINDOWS[0])?,
            fatigue: fatigue::compute_fatigue(log, last, &self.fatigue)?,
            prop,
            signals: prop::rolling_signals(
                log,
                stat,
                self.config.prop.recent_window,
                self.config.prop.signal_band,
            )?,
        })
    }

    /// Closest players in `league` to `target` on the configured features.
    /// League lines missing a feature are dropped from the pool; a target
    /// missing one is an error.
    pub fn comparables(
        &self,
        target: &PlayerSeasonLine,
        league: &[PlayerSeasonLine],
    ) -> Result<SimilarityResult> {
        let schema = FeatureSchema::new(&self.config.similarity.features);
        self.rank(&schema, target, league)
    }

    /// Comparables for `player_id`. Uses the player's league line when there
    /// is one, otherwise averages `log` over the configured features it
    /// carries in every game.
    pub fn comparables_for(
        &self,
        player_id: &str,
        log: &GameLog,
        league: &[PlayerSeasonLine],
    ) -> Result<SimilarityResult> {
        if let Some(line) = league.iter().find(|l| l.player_id == player_id) {
            return self.comparables(line, league);
        }

        let features: Vec<&str> = self
            .config
            .similarity
            .features
            .iter()
            .map(String::as_str)
            .filter(|f| log.values(f).is_ok())
            .collect();
        if features.is_empty() {
            let first = self.config.similarity.features.first().cloned();
            return Err(match first {
                Some(feature) => AnalyticsError::MissingFeature {
                    id: player_id.to_string(),
                    feature,
                },
                None => AnalyticsError::EmptyPool,
            });
        }
        tracing::debug!(player = player_id, ?features, "comparables from game log averages");

        let target = similarity::season_line(player_id, player_id, log, &features)?;
        self.rank(&FeatureSchema::new(&features), &target, league)
    }

    fn rank(
        &self,
        schema: &FeatureSchema,
        target: &PlayerSeasonLine,
        league: &[PlayerSeasonLine],
    ) -> Result<SimilarityResult> {
        let target_vector = schema.project(target)?;
        let pool = schema.project_all(league);
        if !pool.skipped.is_empty() {
            tracing::warn!(
                skipped = pool.skipped.len(),
                ids = ?pool.skipped,
                "league lines missing features, left out of comparables"
            );
        }
        similarity::find_similar(&target_vector, &pool.vectors, self.config.similarity.k)
    }
}

/// Plain-text rendering of a report for the terminal.
pub fn format_report(report: &PlayerReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("  {} over {} games\n", report.stat, report.games));

    if let Some(point) = report.trend.latest() {
        out.push_str(&format!(
            "  Trend: last-{} {:.1} vs last-{} {:.1} ({:+.1})\n",
            report.trend.short_window,
            point.short_avg,
            report.trend.long_window,
            point.long_avg,
            point.delta
        ));
    }

    let side = |p: Option<metrics::PartitionMean>| match p {
        Some(p) => format!("{:.1} ({} g)", p.mean, p.games),
        None => "-".to_string(),
    };
    out.push_str(&format!(
        "  Home {} / Away {}\n",
        side(report.split.home),
        side(report.split.away)
    ));

    out.push_str(&format!("  Season mean {:.1}\n", report.form.season_mean));
    for w in &report.form.windows {
        let partial = if w.partial { " (partial)" } else { "" };
        out.push_str(&format!(
            "  Last {}: {:.1} ({:+.1}){}\n",
            w.requested, w.mean, w.delta, partial
        ));
    }

    out.push_str(&format!(
        "  Streak: {} x{} | Hot games {}/{}\n",
        report.streak.kind.as_str(),
        report.streak.length,
        report.hot_games.0,
        report.hot_games.1
    ));

    out.push_str(&format!(
        "  Fatigue: {:.0} ({}) rest {:.2} travel {:.2} load {:.2}\n",
        report.fatigue.score,
        report.fatigue.level.as_str(),
        report.fatigue.rest_component,
        report.fatigue.travel_component,
        report.fatigue.load_component
    ));

    if let Some(flag) = &report.prop {
        out.push_str(&format!(
            "  Prop {:.1}: {} (recent {:.1}, gap {:+.1}, confidence {})\n",
            flag.prop_line,
            flag.signal.as_str(),
            flag.recent_mean,
            flag.gap,
            flag.confidence.as_str()
        ));
    }
    out
}
