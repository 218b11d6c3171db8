//! Nearest-neighbor player comparables over standardized season features.
//!
//! Standardization parameters (per-feature mean and population standard
//! deviation) come from the candidate pool plus the target, so a query is
//! stable under reordering of the pool but changes when the pool changes.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::rolling::mean;
use crate::error::{AnalyticsError, Result};
use crate::feed::types::{GameLog, PlayerSeasonLine};

/// Below this a feature is treated as constant across the pool.
const STDEV_EPSILON: f64 = 1e-12;

/// Floor for the distance used to turn distances into scores.
const MIN_SCORE_SCALE: f64 = 1e-6;

/// One player's season aggregates in a fixed feature order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub id: String,
    pub values: Vec<f64>,
}

impl FeatureVector {
    pub fn new(id: &str, values: Vec<f64>) -> Self {
        Self {
            id: id.to_string(),
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparable {
    pub id: String,
    pub distance: f64,
    /// 1.0 for the closest comparable in the result, falling toward 0.0.
    pub score: f64,
}

/// Comparables ascending by distance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityResult {
    pub comparables: Vec<Comparable>,
}

impl SimilarityResult {
    pub fn ids(&self) -> Vec<&str> {
        self.comparables.iter().map(|c| c.id.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy)]
struct FeatureScale {
    mean: f64,
    stdev: f64,
}

impl FeatureScale {
    /// Constant features are centered but left unscaled.
    fn apply(&self, value: f64) -> f64 {
        if self.stdev < STDEV_EPSILON {
            value - self.mean
        } else {
            (value - self.mean) / self.stdev
        }
    }
}

fn validate(vector: &FeatureVector, expected: usize) -> Result<()> {
    if vector.values.len() != expected {
        return Err(AnalyticsError::DimensionMismatch {
            id: vector.id.clone(),
            expected,
            found: vector.values.len(),
        });
    }
    if let Some(feature) = vector.values.iter().position(|v| !v.is_finite()) {
        return Err(AnalyticsError::NonFiniteFeature {
            id: vector.id.clone(),
            feature,
        });
    }
    Ok(())
}

fn fit_scales(vectors: &[&FeatureVector], dims: usize) -> Vec<FeatureScale> {
    (0..dims)
        .map(|d| {
            let column: Vec<f64> = vectors.iter().map(|v| v.values[d]).collect();
            let m = mean(&column).unwrap_or(0.0);
            let variance =
                column.iter().map(|x| (x - m).powi(2)).sum::<f64>() / column.len() as f64;
            FeatureScale {
                mean: m,
                stdev: variance.sqrt(),
            }
        })
        .collect()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// The `k` candidates closest to `target`, excluding the target's own id.
///
/// `k` is clamped to the number of eligible candidates. Distance ties are
/// broken by id so the result does not depend on pool order.
pub fn find_similar(
    target: &FeatureVector,
    pool: &[FeatureVector],
    k: usize,
) -> Result<SimilarityResult> {
    if k == 0 {
        return Err(AnalyticsError::InvalidParameter {
            name: "k",
            value: 0.0,
        });
    }
    if pool.is_empty() {
        return Err(AnalyticsError::EmptyPool);
    }
    let dims = target.values.len();
    validate(target, dims)?;
    for candidate in pool {
        validate(candidate, dims)?;
    }

    let candidates: Vec<&FeatureVector> = pool.iter().filter(|c| c.id != target.id).collect();
    if candidates.is_empty() {
        return Err(AnalyticsError::EmptyPool);
    }

    let mut fit_set = candidates.clone();
    fit_set.push(target);
    let scales = fit_scales(&fit_set, dims);
    let standardize = |v: &FeatureVector| -> Vec<f64> {
        v.values
            .iter()
            .zip(&scales)
            .map(|(&x, scale)| scale.apply(x))
            .collect()
    };

    let target_z = standardize(target);
    let mut ranked: Vec<(&str, f64)> = candidates
        .iter()
        .map(|c| (c.id.as_str(), euclidean(&target_z, &standardize(*c))))
        .collect();
    ranked.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked.truncate(k.min(ranked.len()));

    let max_distance = ranked.iter().map(|(_, d)| *d).fold(0.0, f64::max);
    let scale = max_distance.max(MIN_SCORE_SCALE);
    let comparables = ranked
        .into_iter()
        .map(|(id, distance)| Comparable {
            id: id.to_string(),
            distance,
            score: 1.0 - distance / scale,
        })
        .collect();

    Ok(SimilarityResult { comparables })
}

/// Ordered stat names projected out of season lines.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    pub features: Vec<String>,
}

impl FeatureSchema {
    pub fn new<S: AsRef<str>>(features: &[S]) -> Self {
        Self {
            features: features.iter().map(|f| f.as_ref().to_string()).collect(),
        }
    }

    /// Build a vector, failing if the line lacks any schema stat.
    pub fn project(&self, line: &PlayerSeasonLine) -> Result<FeatureVector> {
        let values = self
            .features
            .iter()
            .map(|name| {
                line.stats
                    .get(name)
                    .copied()
                    .ok_or_else(|| AnalyticsError::MissingFeature {
                        id: line.player_id.clone(),
                        feature: name.clone(),
                    })
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(FeatureVector::new(&line.player_id, values))
    }

    /// Project a candidate pool. Lines missing a feature are left out and
    /// their ids returned in `skipped`.
    pub fn project_all(&self, lines: &[PlayerSeasonLine]) -> ProjectedPool {
        let mut pool = ProjectedPool::default();
        for line in lines {
            match self.project(line) {
                Ok(vector) => pool.vectors.push(vector),
                Err(_) => pool.skipped.push(line.player_id.clone()),
            }
        }
        pool
    }
}

/// Result of projecting a league pool through a schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectedPool {
    pub vectors: Vec<FeatureVector>,
    pub skipped: Vec<String>,
}

/// Per-game season averages computed from a game log.
pub fn season_line<S: AsRef<str>>(
    player_id: &str,
    name: &str,
    log: &GameLog,
    stats: &[S],
) -> Result<PlayerSeasonLine> {
    let averages = stats
        .iter()
        .map(|stat| -> Result<(String, f64)> {
            let values = log.values(stat.as_ref())?;
            let avg = mean(&values).ok_or(AnalyticsError::EmptyLog)?;
            Ok((stat.as_ref().to_string(), avg))
        })
        .collect::<Result<BTreeMap<String, f64>>>()?;
    Ok(PlayerSeasonLine {
        player_id: player_id.to_string(),
        name: name.to_string(),
        team: None,
        stats: averages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::GameRecord;
    use chrono::NaiveDate;

    fn pool() -> Vec<FeatureVector> {
        vec![
            FeatureVector::new("a", vec![25.0, 5.0, 7.0]),
            FeatureVector::new("b", vec![12.0, 9.0, 3.0]),
            FeatureVector::new("c", vec![24.0, 6.0, 8.0]),
            FeatureVector::new("d", vec![8.0, 2.0, 11.0]),
            FeatureVector::new("e", vec![27.0, 4.0, 6.0]),
        ]
    }

    #[test]
    fn test_nearest_first() {
        let target = FeatureVector::new("t", vec![25.0, 5.0, 7.0]);
        let result = find_similar(&target, &pool(), 2).unwrap();
        assert_eq!(result.comparables[0].id, "a");
        assert!(result.comparables[0].distance <= result.comparables[1].distance);
        assert_eq!(result.comparables[0].score, 1.0);
        assert_eq!(result.comparables[1].score, 0.0);
    }

    #[test]
    fn test_excludes_target_from_pool() {
        let target = FeatureVector::new("a", vec![25.0, 5.0, 7.0]);
        let result = find_similar(&target, &pool(), 10).unwrap();
        assert_eq!(result.comparables.len(), 4);
        assert!(!result.ids().contains(&"a"));
    }

    #[test]
    fn test_k_clamped_to_pool() {
        let target = FeatureVector::new("t", vec![20.0, 5.0, 5.0]);
        let result = find_similar(&target, &pool(), 50).unwrap();
        assert_eq!(result.comparables.len(), 5);
    }

    #[test]
    fn test_permuted_pool_same_answer() {
        let target = FeatureVector::new("t", vec![18.0, 6.0, 6.0]);
        let forward = find_similar(&target, &pool(), 3).unwrap();
        let mut reversed = pool();
        reversed.reverse();
        let backward = find_similar(&target, &reversed, 3).unwrap();
        assert_eq!(forward.ids(), backward.ids());
    }

    #[test]
    fn test_empty_pool() {
        let target = FeatureVector::new("t", vec![1.0]);
        assert_eq!(find_similar(&target, &[], 3), Err(AnalyticsError::EmptyPool));
    }

    #[test]
    fn test_dimension_mismatch() {
        let target = FeatureVector::new("t", vec![1.0, 2.0]);
        let err = find_similar(&target, &pool(), 3).unwrap_err();
        assert!(matches!(err, AnalyticsError::DimensionMismatch { expected: 2, found: 3, .. }));
    }

    #[test]
    fn test_zero_variance_feature_left_unscaled() {
        // Second feature is identical everywhere; ranking follows the first.
        let pool = vec![
            FeatureVector::new("near", vec![10.0, 3.0]),
            FeatureVector::new("far", vec![30.0, 3.0]),
        ];
        let target = FeatureVector::new("t", vec![12.0, 3.0]);
        let result = find_similar(&target, &pool, 2).unwrap();
        assert_eq!(result.ids(), vec!["near", "far"]);
        assert!(result.comparables.iter().all(|c| c.distance.is_finite()));
    }

    #[test]
    fn test_non_finite_feature_rejected() {
        let target = FeatureVector::new("t", vec![f64::NAN, 1.0, 1.0]);
        assert!(matches!(
            find_similar(&target, &pool(), 1),
            Err(AnalyticsError::NonFiniteFeature { feature: 0, .. })
        ));
    }

    fn line(id: &str, stats: &[(&str, f64)]) -> PlayerSeasonLine {
        PlayerSeasonLine {
            player_id: id.to_string(),
            name: format!("Player {}", id),
            team: None,
            stats: stats.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_schema_projection_requires_stats() {
        let line = line("7", &[("PTS", 20.0)]);
        let schema = FeatureSchema::new(&["PTS", "AST"]);
        assert_eq!(
            schema.project(&line),
            Err(AnalyticsError::MissingFeature {
                id: "7".to_string(),
                feature: "AST".to_string(),
            })
        );
        let vector = FeatureSchema::new(&["PTS"]).project(&line).unwrap();
        assert_eq!(vector.values, vec![20.0]);
        assert_eq!(vector.id, "7");
    }

    #[test]
    fn test_project_all_skips_incomplete_lines() {
        let schema = FeatureSchema::new(&["PTS", "USG_PCT"]);
        let lines = vec![
            line("1", &[("PTS", 25.0), ("USG_PCT", 0.30)]),
            line("2", &[("PTS", 18.0)]),
            line("3", &[("PTS", 11.0), ("USG_PCT", 0.17)]),
        ];
        let pool = schema.project_all(&lines);
        let ids: Vec<&str> = pool.vectors.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(pool.skipped, vec!["2".to_string()]);
        assert_eq!(pool.vectors[1].values, vec![11.0, 0.17]);
    }

    #[test]
    fn test_season_line_averages() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records = [(20.0, 4.0), (30.0, 8.0), (25.0, 6.0)]
            .iter()
            .enumerate()
            .map(|(i, &(pts, ast))| {
                GameRecord::new(start + chrono::Days::new(i as u64 * 2), "OPP", true, 33.0)
                    .with_stat("PTS", pts)
                    .with_stat("AST", ast)
            })
            .collect();
        let log = GameLog::new(records).unwrap();

        let season = season_line("42", "Forty Two", &log, &["PTS", "AST"]).unwrap();
        assert_eq!(season.player_id, "42");
        assert_eq!(season.stats.get("PTS"), Some(&25.0));
        assert_eq!(season.stats.get("AST"), Some(&6.0));

        assert!(matches!(
            season_line("42", "Forty Two", &log, &["PTS", "USG_PCT"]),
            Err(AnalyticsError::MissingStat { ref stat, index: 0 }) if stat == "USG_PCT"
        ));
        assert_eq!(
            season_line("42", "Forty Two", &GameLog::default(), &["PTS"]),
            Err(AnalyticsError::EmptyLog)
        );
    }
}
