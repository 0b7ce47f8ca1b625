//! Play-by-play rows

use crate::Result;
use serde::Deserialize;
use std::path::Path;

/// One play; flags are 0/1 columns, unused columns in the file are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayRow {
    #[serde(rename = "OffenseTeam", default)]
    pub offense_team: Option<String>,
    #[serde(rename = "Yards", default)]
    pub yards: Option<f64>,
    #[serde(rename = "IsRush", default)]
    pub is_rush: Option<f64>,
    #[serde(rename = "IsPass", default)]
    pub is_pass: Option<f64>,
    #[serde(rename = "IsTouchdown", default)]
    pub is_touchdown: Option<f64>,
    #[serde(rename = "IsPenalty", default)]
    pub is_penalty: Option<f64>,
}

impl PlayRow {
    /// Team name, if the row has one
    pub fn team(&self) -> Option<&str> {
        self.offense_team
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// Load every play from a CSV export
pub fn load_plays<P: AsRef<Path>>(path: P) -> Result<Vec<PlayRow>> {
    let plays: Vec<PlayRow> =
        crate::data::read_csv(path, "the play-by-play table", &["OffenseTeam"])?;
    log::info!("Loaded {} plays", plays.len());
    Ok(plays)
}
