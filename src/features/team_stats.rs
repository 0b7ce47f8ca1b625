//! Team statistics computation
//!
//! Season totals for each offense built from play-by-play rows.

use crate::data::{Metric, PlayRow, TeamStat, TeamTable, METRIC_COUNT};
use crate::Result;
use std::collections::BTreeMap;

/// Running totals for one offense
#[derive(Debug, Clone, Default)]
pub struct TeamTotals {
    /// Plays run
    pub plays: usize,
    /// Sum of yards over plays with a yardage value
    pub yards: f64,
    /// Plays with a yardage value
    pub yards_count: usize,
    pub rushes: f64,
    pub passes: f64,
    pub touchdowns: f64,
    pub penalties: f64,
}

impl TeamTotals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update totals with a single play
    pub fn update(&mut self, play: &PlayRow) {
        self.plays += 1;
        if let Some(yards) = play.yards {
            self.yards += yards;
            self.yards_count += 1;
        }
        self.rushes += play.is_rush.unwrap_or(0.0);
        self.passes += play.is_pass.unwrap_or(0.0);
        self.touchdowns += play.is_touchdown.unwrap_or(0.0);
        self.penalties += play.is_penalty.unwrap_or(0.0);
    }

    /// Mean yards over plays with a yardage value
    pub fn avg_yards_per_play(&self) -> f64 {
        if self.yards_count == 0 {
            0.0
        } else {
            self.yards / self.yards_count as f64
        }
    }

    pub fn rush_pct(&self) -> f64 {
        self.share(self.rushes)
    }

    pub fn pass_pct(&self) -> f64 {
        self.share(self.passes)
    }

    /// Yards per touchdown, 0 for a team that never scored
    pub fn yards_per_touchdown(&self) -> f64 {
        if self.touchdowns == 0.0 {
            0.0
        } else {
            self.yards / self.touchdowns
        }
    }

    fn share(&self, count: f64) -> f64 {
        if self.plays == 0 {
            0.0
        } else {
            count / self.plays as f64
        }
    }

    /// Convert to a stat row
    pub fn to_stat(&self, team: &str) -> TeamStat {
        let mut metrics = [0.0; METRIC_COUNT];
        for metric in Metric::ALL {
            metrics[metric.index()] = match metric {
                Metric::TotalPlays => self.plays as f64,
                Metric::TotalYards => self.yards,
                Metric::AvgYardsPerPlay => self.avg_yards_per_play(),
                Metric::RushPlays => self.rushes,
                Metric::PassPlays => self.passes,
                Metric::Touchdowns => self.touchdowns,
                Metric::Penalties => self.penalties,
                Metric::RushPct => self.rush_pct(),
                Metric::PassPct => self.pass_pct(),
                Metric::YardsPerTouchdown => self.yards_per_touchdown(),
            };
        }
        TeamStat::new(team, metrics)
    }
}

/// Group plays by offense
pub struct TeamTotalsComputer {
    /// Totals by team, kept in name order
    totals: BTreeMap<String, TeamTotals>,
    skipped: usize,
}

impl TeamTotalsComputer {
    pub fn new() -> Self {
        TeamTotalsComputer {
            totals: BTreeMap::new(),
            skipped: 0,
        }
    }

    /// Process plays; rows without an offense are skipped
    pub fn process_plays(&mut self, plays: &[PlayRow]) {
        for play in plays {
            match play.team() {
                Some(team) => self.totals.entry(team.to_string()).or_default().update(play),
                None => self.skipped += 1,
            }
        }
    }

    /// Build the team statistics table
    pub fn into_table(self) -> Result<TeamTable> {
        if self.skipped > 0 {
            log::warn!("Skipped {} plays with no offense team", self.skipped);
        }
        let teams = self
            .totals
            .iter()
            .map(|(team, totals)| totals.to_stat(team))
            .collect();
        TeamTable::new(teams)
    }
}

impl Default for TeamTotalsComputer {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate play rows into one statistics row per offense
pub fn summarize_plays(plays: &[PlayRow]) -> Result<TeamTable> {
    let mut computer = TeamTotalsComputer::new();
    computer.process_plays(plays);
    let table = computer.into_table()?;
    log::info!("Summarized {} plays into {} teams", plays.len(), table.len());
    Ok(table)
}
