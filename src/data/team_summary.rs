//! Team statistics table
//!
//! One row per offense with the fixed metric set used for ranking and for
//! the differential features, plus optional win-rate style columns.

use crate::data::{ensure_parent, format_value};
use crate::{OffenseError, Result};
use std::collections::HashMap;
use std::fmt;
use std::io::{Read, Write};
use std::path::Path;

/// Number of metrics carried per team
pub const METRIC_COUNT: usize = 10;

/// Accepted names for the team identifier column
pub const TEAM_COLUMNS: [&str; 2] = ["OffenseTeam", "team"];

pub const WIN_PCT_COLUMN: &str = "win_pct";
pub const AVG_POINTS_FOR_COLUMN: &str = "avg_points_for";

/// Offensive metric tracked for every team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalPlays,
    TotalYards,
    AvgYardsPerPlay,
    RushPlays,
    PassPlays,
    Touchdowns,
    Penalties,
    RushPct,
    PassPct,
    YardsPerTouchdown,
}

impl Metric {
    /// All metrics in column order
    pub const ALL: [Metric; METRIC_COUNT] = [
        Metric::TotalPlays,
        Metric::TotalYards,
        Metric::AvgYardsPerPlay,
        Metric::RushPlays,
        Metric::PassPlays,
        Metric::Touchdowns,
        Metric::Penalties,
        Metric::RushPct,
        Metric::PassPct,
        Metric::YardsPerTouchdown,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Metric::TotalPlays => "total_plays",
            Metric::TotalYards => "total_yards",
            Metric::AvgYardsPerPlay => "avg_yards_per_play",
            Metric::RushPlays => "rush_plays",
            Metric::PassPlays => "pass_plays",
            Metric::Touchdowns => "touchdowns",
            Metric::Penalties => "penalties",
            Metric::RushPct => "rush_pct",
            Metric::PassPct => "pass_pct",
            Metric::YardsPerTouchdown => "yards_per_touchdown",
        }
    }

    /// Name of the differential feature for this metric
    pub fn diff_column(&self) -> String {
        format!("diff_{}", self.column())
    }

    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Statistics for a single offense
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStat {
    pub team: String,
    pub metrics: [f64; METRIC_COUNT],
    pub win_pct: Option<f64>,
    pub avg_points_for: Option<f64>,
}

impl TeamStat {
    pub fn new(team: impl Into<String>, metrics: [f64; METRIC_COUNT]) -> Self {
        TeamStat {
            team: team.into(),
            metrics,
            win_pct: None,
            avg_points_for: None,
        }
    }

    pub fn with_win_pct(mut self, win_pct: f64) -> Self {
        self.win_pct = Some(win_pct);
        self
    }

    pub fn with_avg_points_for(mut self, avg_points_for: f64) -> Self {
        self.avg_points_for = Some(avg_points_for);
        self
    }

    pub fn get(&self, metric: Metric) -> f64 {
        self.metrics[metric.index()]
    }
}

/// All team rows for a pipeline run, indexed by team name
#[derive(Debug, Clone, Default)]
pub struct TeamTable {
    teams: Vec<TeamStat>,
    index: HashMap<String, usize>,
    has_win_pct: bool,
    has_avg_points_for: bool,
}

impl TeamTable {
    /// Build a table; optional columns count as present when any team has a value
    pub fn new(teams: Vec<TeamStat>) -> Result<Self> {
        let has_win_pct = teams.iter().any(|t| t.win_pct.is_some());
        let has_avg_points_for = teams.iter().any(|t| t.avg_points_for.is_some());
        Self::with_columns(teams, has_win_pct, has_avg_points_for)
    }

    fn with_columns(
        teams: Vec<TeamStat>,
        has_win_pct: bool,
        has_avg_points_for: bool,
    ) -> Result<Self> {
        let mut index = HashMap::with_capacity(teams.len());
        for (i, stat) in teams.iter().enumerate() {
            if index.insert(stat.team.clone(), i).is_some() {
                return Err(OffenseError::Configuration(format!(
                    "team {} appears more than once in the team statistics",
                    stat.team
                )));
            }
        }
        Ok(TeamTable {
            teams,
            index,
            has_win_pct,
            has_avg_points_for,
        })
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn teams(&self) -> &[TeamStat] {
        &self.teams
    }

    /// Exact-name lookup
    pub fn get(&self, team: &str) -> Option<&TeamStat> {
        self.index.get(team).map(|&i| &self.teams[i])
    }

    pub fn has_column(&self, column: &str) -> bool {
        match column {
            WIN_PCT_COLUMN => self.has_win_pct,
            AVG_POINTS_FOR_COLUMN => self.has_avg_points_for,
            other => Metric::ALL.iter().any(|m| m.column() == other),
        }
    }

    /// Column values in table order, metric or optional column
    pub fn column_values(&self, column: &str) -> Option<Vec<f64>> {
        if !self.has_column(column) {
            return None;
        }
        let values = match column {
            WIN_PCT_COLUMN => self.teams.iter().map(|t| t.win_pct.unwrap_or(0.0)).collect(),
            AVG_POINTS_FOR_COLUMN => self
                .teams
                .iter()
                .map(|t| t.avg_points_for.unwrap_or(0.0))
                .collect(),
            other => {
                let metric = Metric::ALL.iter().find(|m| m.column() == other)?;
                self.teams.iter().map(|t| t.get(*metric)).collect()
            }
        };
        Some(values)
    }

    /// Load from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            OffenseError::Configuration(format!(
                "Could not open team statistics {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::read_csv(file)
    }

    /// Parse a team statistics CSV; a missing required column aborts the read
    pub fn read_csv<R: Read>(input: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(input);
        let headers = reader.headers()?.clone();
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);

        let team_col = TEAM_COLUMNS.iter().find_map(|&c| position(c)).ok_or_else(|| {
            OffenseError::Configuration(format!(
                "team statistics need one of the columns {:?}",
                TEAM_COLUMNS
            ))
        })?;

        let mut metric_cols = [0usize; METRIC_COUNT];
        let mut missing = Vec::new();
        for metric in Metric::ALL {
            match position(metric.column()) {
                Some(i) => metric_cols[metric.index()] = i,
                None => missing.push(metric.column()),
            }
        }
        if !missing.is_empty() {
            return Err(OffenseError::Configuration(format!(
                "These required columns are missing in the team statistics: {:?}",
                missing
            )));
        }

        let win_col = position(WIN_PCT_COLUMN);
        let points_col = position(AVG_POINTS_FOR_COLUMN);

        let mut blanks = [0usize; METRIC_COUNT];
        let mut teams = Vec::new();
        for record in reader.records() {
            let record = record?;
            let team = record.get(team_col).unwrap_or("").trim().to_string();
            if team.is_empty() {
                log::warn!("Skipping team statistics row with no team name");
                continue;
            }

            let mut metrics = [0.0f64; METRIC_COUNT];
            for metric in Metric::ALL {
                let raw = record.get(metric_cols[metric.index()]).unwrap_or("");
                match parse_cell(raw, metric.column(), &team)? {
                    Some(v) => metrics[metric.index()] = v,
                    None => blanks[metric.index()] += 1,
                }
            }

            let optional = |col: Option<usize>, name: &str| -> Result<Option<f64>> {
                match col {
                    Some(i) => parse_cell(record.get(i).unwrap_or(""), name, &team),
                    None => Ok(None),
                }
            };
            let win_pct = optional(win_col, WIN_PCT_COLUMN)?;
            let avg_points_for = optional(points_col, AVG_POINTS_FOR_COLUMN)?;

            teams.push(TeamStat {
                team,
                metrics,
                win_pct,
                avg_points_for,
            });
        }

        for metric in Metric::ALL {
            let count = blanks[metric.index()];
            if count > 0 {
                log::warn!(
                    "{} blank values in column '{}' read as 0",
                    count,
                    metric.column()
                );
            }
        }

        Self::with_columns(teams, win_col.is_some(), points_col.is_some())
    }

    /// Save as CSV with the `OffenseTeam` header
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ensure_parent(&path)?;
        let file = std::fs::File::create(path.as_ref())?;
        self.write_csv(file)
    }

    pub fn write_csv<W: Write>(&self, output: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(output);

        let mut header: Vec<String> = vec![TEAM_COLUMNS[0].to_string()];
        header.extend(Metric::ALL.iter().map(|m| m.column().to_string()));
        if self.has_win_pct {
            header.push(WIN_PCT_COLUMN.to_string());
        }
        if self.has_avg_points_for {
            header.push(AVG_POINTS_FOR_COLUMN.to_string());
        }
        writer.write_record(&header)?;

        for stat in &self.teams {
            let mut row = vec![stat.team.clone()];
            row.extend(stat.metrics.iter().map(|v| format_value(*v)));
            if self.has_win_pct {
                row.push(stat.win_pct.map(format_value).unwrap_or_default());
            }
            if self.has_avg_points_for {
                row.push(stat.avg_points_for.map(format_value).unwrap_or_default());
            }
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Blank and non-finite cells are missing; anything else must be numeric
fn parse_cell(raw: &str, column: &str, team: &str) -> Result<Option<f64>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    let value: f64 = raw.parse().map_err(|_| {
        OffenseError::Configuration(format!(
            "column '{}' for team {} is not numeric: {:?}",
            column, team, raw
        ))
    })?;
    Ok(value.is_finite().then_some(value))
}
