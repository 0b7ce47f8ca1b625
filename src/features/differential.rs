//! Differential features for labelled pairs
//!
//! Each feature is Team A's metric minus Team B's metric, so a positive
//! value means Team A is higher on that stat.

use crate::data::{ensure_parent, format_value, Metric, TeamTable, METRIC_COUNT};
use crate::judge::labels::Label;
use crate::{OffenseError, Result};
use std::io::{Read, Write};
use std::path::Path;

pub const TARGET_COLUMN: &str = "llm_prefers_teamA";

/// Feature names in column order
pub fn feature_names() -> Vec<String> {
    Metric::ALL.iter().map(Metric::diff_column).collect()
}

/// One training example
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub pair_id: String,
    pub team_a: String,
    pub team_b: String,
    /// 1 when the judge preferred Team A
    pub target: u8,
    pub diffs: [f64; METRIC_COUNT],
}

impl FeatureRow {
    pub fn diff(&self, metric: Metric) -> f64 {
        self.diffs[metric.index()]
    }
}

/// Looks up both teams of a pair and subtracts their metrics
pub struct FeatureDifferencer<'a> {
    teams: &'a TeamTable,
}

impl<'a> FeatureDifferencer<'a> {
    pub fn new(teams: &'a TeamTable) -> Self {
        FeatureDifferencer { teams }
    }

    /// Team A minus Team B for every metric
    pub fn differences(
        &self,
        pair_id: &str,
        team_a: &str,
        team_b: &str,
    ) -> Result<[f64; METRIC_COUNT]> {
        let lookup = |team: &str| {
            self.teams.get(team).ok_or_else(|| OffenseError::Lookup {
                pair_id: pair_id.to_string(),
                team: team.to_string(),
            })
        };
        let a = lookup(team_a)?;
        let b = lookup(team_b)?;

        let mut diffs = [0.0; METRIC_COUNT];
        for (d, (x, y)) in diffs.iter_mut().zip(a.metrics.iter().zip(b.metrics.iter())) {
            *d = x - y;
        }
        Ok(diffs)
    }

    /// Resolve every label, then keep the ones with a known target
    pub fn build(&self, labels: &[Label]) -> Result<TrainingTable> {
        let mut rows = Vec::with_capacity(labels.len());
        for label in labels {
            let diffs = self.differences(&label.pair_id, &label.team_a, &label.team_b)?;
            if let Some(target) = label.llm_prefers_team_a {
                rows.push(FeatureRow {
                    pair_id: label.pair_id.clone(),
                    team_a: label.team_a.clone(),
                    team_b: label.team_b.clone(),
                    target,
                    diffs,
                });
            }
        }

        log::info!(
            "Built {} training rows from {} labels ({} without a target)",
            rows.len(),
            labels.len(),
            labels.len() - rows.len()
        );
        Ok(TrainingTable { rows })
    }
}

/// Rows ready for the classifier
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingTable {
    pub rows: Vec<FeatureRow>,
}

impl TrainingTable {
    pub fn new(rows: Vec<FeatureRow>) -> Self {
        TrainingTable { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn targets(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.target).collect()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ensure_parent(&path)?;
        let file = std::fs::File::create(path.as_ref())?;
        self.write_csv(file)
    }

    pub fn write_csv<W: Write>(&self, output: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(output);

        let mut header = vec![
            "pair_id".to_string(),
            "teamA".to_string(),
            "teamB".to_string(),
            TARGET_COLUMN.to_string(),
        ];
        header.extend(feature_names());
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![
                row.pair_id.clone(),
                row.team_a.clone(),
                row.team_b.clone(),
                row.target.to_string(),
            ];
            record.extend(row.diffs.iter().map(|d| format_value(*d)));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        Self::read_csv(file)
    }

    /// Read a training table; rows with a blank target are skipped
    pub fn read_csv<R: Read>(input: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(input);
        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers.iter().position(|h| h == name).ok_or_else(|| {
                OffenseError::Configuration(format!("training data is missing column '{}'", name))
            })
        };

        let pair_col = column("pair_id")?;
        let a_col = column("teamA")?;
        let b_col = column("teamB")?;
        let target_col = column(TARGET_COLUMN)?;
        let diff_cols = feature_names()
            .iter()
            .map(|name| column(name.as_str()))
            .collect::<Result<Vec<_>>>()?;

        let mut rows = Vec::new();
        let mut skipped = 0;
        for record in reader.records() {
            let record = record?;
            let field = |i: usize| record.get(i).unwrap_or("").trim();

            let target = match field(target_col) {
                "" => {
                    skipped += 1;
                    continue;
                }
                raw => parse_target(raw)?,
            };

            let mut diffs = [0.0; METRIC_COUNT];
            for (d, &col) in diffs.iter_mut().zip(diff_cols.iter()) {
                *d = field(col).parse().map_err(|_| {
                    OffenseError::Parse(format!(
                        "non-numeric feature {:?} for {}",
                        field(col),
                        field(pair_col)
                    ))
                })?;
            }

            rows.push(FeatureRow {
                pair_id: field(pair_col).to_string(),
                team_a: field(a_col).to_string(),
                team_b: field(b_col).to_string(),
                target,
                diffs,
            });
        }
        if skipped > 0 {
            log::warn!("Dropped {} training rows with no target", skipped);
        }
        Ok(TrainingTable { rows })
    }
}

fn parse_target(raw: &str) -> Result<u8> {
    match raw.parse::<f64>() {
        Ok(v) if v == 1.0 => Ok(1),
        Ok(v) if v == 0.0 => Ok(0),
        _ => Err(OffenseError::Parse(format!(
            "target must be 0 or 1, got {:?}",
            raw
        ))),
    }
}
