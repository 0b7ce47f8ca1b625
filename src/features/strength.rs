//! Offensive strength ranking
//!
//! A strength score is taken from the first available source: an explicit
//! `win_pct` column, then `avg_points_for`, then a composite of normalized
//! offensive metrics.

use crate::data::team_summary::{AVG_POINTS_FOR_COLUMN, WIN_PCT_COLUMN};
use crate::data::{Metric, TeamTable};
use crate::{OffenseError, Result};

/// Scale a column by its maximum.
///
/// Non-finite entries count as 0. When the maximum is zero or not finite the
/// whole column normalizes to 0.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let clean: Vec<f64> = values
        .iter()
        .map(|v| if v.is_finite() { *v } else { 0.0 })
        .collect();
    let max = clean.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() || max == 0.0 {
        return vec![0.0; clean.len()];
    }
    clean.iter().map(|v| v / max).collect()
}

/// A way of scoring every team in a table
pub trait StrengthSource {
    fn name(&self) -> &str;

    /// Strength per team in table order, or None when the inputs are absent
    fn try_compute(&self, table: &TeamTable) -> Option<Vec<f64>>;
}

/// Use an existing column as the strength
pub struct ColumnStrength {
    column: &'static str,
}

impl ColumnStrength {
    pub fn new(column: &'static str) -> Self {
        ColumnStrength { column }
    }
}

impl StrengthSource for ColumnStrength {
    fn name(&self) -> &str {
        self.column
    }

    fn try_compute(&self, table: &TeamTable) -> Option<Vec<f64>> {
        let values = table.column_values(self.column)?;
        Some(
            values
                .into_iter()
                .map(|v| if v.is_finite() { v } else { 0.0 })
                .collect(),
        )
    }
}

/// Weighted blend of normalized metrics
pub struct CompositeStrength {
    /// (metric, weight, use absolute value)
    terms: Vec<(Metric, f64, bool)>,
}

impl CompositeStrength {
    /// 35% total yards, 30% yards per play, 25% touchdowns, -10% penalties
    pub fn offensive() -> Self {
        CompositeStrength {
            terms: vec![
                (Metric::TotalYards, 0.35, false),
                (Metric::AvgYardsPerPlay, 0.30, false),
                (Metric::Touchdowns, 0.25, false),
                (Metric::Penalties, -0.10, true),
            ],
        }
    }
}

impl StrengthSource for CompositeStrength {
    fn name(&self) -> &str {
        "composite"
    }

    fn try_compute(&self, table: &TeamTable) -> Option<Vec<f64>> {
        let mut strength = vec![0.0; table.len()];
        for (metric, weight, absolute) in &self.terms {
            let column: Vec<f64> = table
                .teams()
                .iter()
                .map(|t| {
                    let v = t.get(*metric);
                    if *absolute {
                        v.abs()
                    } else {
                        v
                    }
                })
                .collect();
            for (s, n) in strength.iter_mut().zip(normalize(&column)) {
                *s += weight * n;
            }
        }
        Some(strength)
    }
}

/// A team with its strength score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedTeam {
    pub team: String,
    pub strength: f64,
}

/// Teams ordered strongest first
#[derive(Debug, Clone)]
pub struct Ranking {
    /// Name of the strength source that produced the scores
    pub source: String,
    pub teams: Vec<RankedTeam>,
}

/// Scores and sorts teams
pub struct StrengthRanker {
    sources: Vec<Box<dyn StrengthSource>>,
}

impl Default for StrengthRanker {
    fn default() -> Self {
        StrengthRanker {
            sources: vec![
                Box::new(ColumnStrength::new(WIN_PCT_COLUMN)),
                Box::new(ColumnStrength::new(AVG_POINTS_FOR_COLUMN)),
                Box::new(CompositeStrength::offensive()),
            ],
        }
    }
}

impl StrengthRanker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rank teams by descending strength; equal strengths keep table order
    pub fn rank(&self, table: &TeamTable) -> Result<Ranking> {
        if table.len() < 2 {
            return Err(OffenseError::Configuration(format!(
                "Need at least 2 teams to create pairs, found {}",
                table.len()
            )));
        }

        let (source, scores) = self
            .sources
            .iter()
            .find_map(|s| s.try_compute(table).map(|scores| (s.name().to_string(), scores)))
            .ok_or_else(|| {
                OffenseError::Configuration("No strength source could score the teams".to_string())
            })?;
        log::info!("Using '{}' as strength metric", source);

        let mut teams: Vec<RankedTeam> = table
            .teams()
            .iter()
            .zip(scores)
            .map(|(stat, strength)| RankedTeam {
                team: stat.team.clone(),
                strength,
            })
            .collect();
        // Vec::sort_by is stable
        teams.sort_by(|a, b| b.strength.total_cmp(&a.strength));

        Ok(Ranking { source, teams })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{TeamStat, METRIC_COUNT};

    fn stat(team: &str, yards: f64, ypp: f64, td: f64, pen: f64) -> TeamStat {
        let mut metrics = [0.0; METRIC_COUNT];
        metrics[Metric::TotalYards.index()] = yards;
        metrics[Metric::AvgYardsPerPlay.index()] = ypp;
        metrics[Metric::Touchdowns.index()] = td;
        metrics[Metric::Penalties.index()] = pen;
        TeamStat::new(team, metrics)
    }

    #[test]
    fn test_normalize_range() {
        let norm = normalize(&[0.0, 50.0, 100.0, 25.0]);
        assert_eq!(norm, vec![0.0, 0.5, 1.0, 0.25]);
        assert!(norm.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_normalize_zero_and_undefined() {
        assert_eq!(normalize(&[0.0, 0.0, 0.0]), vec![0.0, 0.0, 0.0]);
        assert_eq!(normalize(&[f64::NAN, f64::NAN]), vec![0.0, 0.0]);
        assert!(normalize(&[]).is_empty());
        assert_eq!(normalize(&[f64::NAN, 2.0]), vec![0.0, 1.0]);
    }

    #[test]
    fn test_composite_strength() {
        let table = TeamTable::new(vec![
            stat("KC", 400.0, 6.0, 4.0, 10.0),
            stat("BUF", 200.0, 3.0, 2.0, 5.0),
        ])
        .unwrap();
        let ranking = StrengthRanker::new().rank(&table).unwrap();

        assert_eq!(ranking.source, "composite");
        assert_eq!(ranking.teams[0].team, "KC");
        assert!((ranking.teams[0].strength - 0.80).abs() < 1e-12);
        assert!((ranking.teams[1].strength - 0.40).abs() < 1e-12);
    }

    #[test]
    fn test_win_pct_takes_precedence() {
        let table = TeamTable::new(vec![
            stat("KC", 400.0, 6.0, 4.0, 10.0).with_win_pct(0.2).with_avg_points_for(30.0),
            stat("BUF", 200.0, 3.0, 2.0, 5.0).with_win_pct(0.8).with_avg_points_for(10.0),
        ])
        .unwrap();
        let ranking = StrengthRanker::new().rank(&table).unwrap();

        assert_eq!(ranking.source, WIN_PCT_COLUMN);
        assert_eq!(ranking.teams[0].team, "BUF");
    }

    #[test]
    fn test_avg_points_for_before_composite() {
        let table = TeamTable::new(vec![
            stat("KC", 400.0, 6.0, 4.0, 10.0).with_avg_points_for(17.0),
            stat("BUF", 200.0, 3.0, 2.0, 5.0).with_avg_points_for(27.0),
        ])
        .unwrap();
        let ranking = StrengthRanker::new().rank(&table).unwrap();

        assert_eq!(ranking.source, AVG_POINTS_FOR_COLUMN);
        assert_eq!(ranking.teams[0].team, "BUF");
    }

    #[test]
    fn test_ties_keep_table_order() {
        let table = TeamTable::new(vec![
            stat("A", 1.0, 1.0, 1.0, 0.0).with_win_pct(0.5),
            stat("B", 1.0, 1.0, 1.0, 0.0).with_win_pct(0.9),
            stat("C", 1.0, 1.0, 1.0, 0.0).with_win_pct(0.5),
            stat("D", 1.0, 1.0, 1.0, 0.0).with_win_pct(0.5),
        ])
        .unwrap();
        let ranking = StrengthRanker::new().rank(&table).unwrap();
        let order: Vec<&str> = ranking.teams.iter().map(|t| t.team.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C", "D"]);
    }

    #[test]
    fn test_needs_two_teams() {
        let table = TeamTable::new(vec![stat("KC", 1.0, 1.0, 1.0, 1.0)]).unwrap();
        assert!(matches!(
            StrengthRanker::new().rank(&table),
            Err(OffenseError::Configuration(_))
        ));
    }
}
