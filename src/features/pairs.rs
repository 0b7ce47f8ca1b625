//! Head-to-head pairs built from a strength ranking

use crate::features::strength::Ranking;
use crate::{OffenseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Columns a pair table must carry; strengths are informational
pub const PAIR_COLUMNS: [&str; 3] = ["pair_id", "teamA", "teamB"];

/// Two adjacent teams from the ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    pub pair_id: String,
    #[serde(rename = "teamA")]
    pub team_a: String,
    #[serde(rename = "teamB")]
    pub team_b: String,
    #[serde(rename = "teamA_strength", default)]
    pub team_a_strength: f64,
    #[serde(rename = "teamB_strength", default)]
    pub team_b_strength: f64,
}

/// Identifier for the n-th pair, counting from 1
pub fn pair_id(n: usize) -> String {
    format!("PAIR_{}", n)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Pair table with lookup by pair_id
#[derive(Debug, Clone, Default)]
pub struct PairRegistry {
    pairs: Vec<Pair>,
    index: HashMap<String, Vec<usize>>,
    unpaired: Option<String>,
}

impl PairRegistry {
    /// Pair ranks (0,1), (2,3), ...; an odd last team is left out
    pub fn from_ranking(ranking: &Ranking) -> Self {
        log::info!("Creating pairs for {} teams", ranking.teams.len());

        let pairs: Vec<Pair> = ranking
            .teams
            .chunks_exact(2)
            .enumerate()
            .map(|(i, chunk)| Pair {
                pair_id: pair_id(i + 1),
                team_a: chunk[0].team.clone(),
                team_b: chunk[1].team.clone(),
                team_a_strength: round4(chunk[0].strength),
                team_b_strength: round4(chunk[1].strength),
            })
            .collect();

        let unpaired = ranking
            .teams
            .chunks_exact(2)
            .remainder()
            .first()
            .map(|t| t.team.clone());
        if let Some(team) = &unpaired {
            log::warn!("Odd number of teams. '{}' has no pair and will be skipped", team);
        }

        let mut registry = Self::from_pairs(pairs);
        registry.unpaired = unpaired;
        registry
    }

    /// Wrap an existing pair table; duplicate ids are kept so joins can reject them
    pub fn from_pairs(pairs: Vec<Pair>) -> Self {
        let mut index: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, pair) in pairs.iter().enumerate() {
            index.entry(pair.pair_id.clone()).or_default().push(i);
        }
        PairRegistry {
            pairs,
            index,
            unpaired: None,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let pairs: Vec<Pair> = crate::data::read_csv(path, "the pair table", &PAIR_COLUMNS)?;
        Ok(Self::from_pairs(pairs))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::data::write_csv(path, &self.pairs)
    }

    pub fn pairs(&self) -> &[Pair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Team dropped for lack of a partner
    pub fn unpaired(&self) -> Option<&str> {
        self.unpaired.as_deref()
    }

    /// The single pair with this id; zero or several matches is an integrity error
    pub fn resolve(&self, pair_id: &str) -> Result<&Pair> {
        match self.index.get(pair_id).map(Vec::as_slice) {
            Some([i]) => Ok(&self.pairs[*i]),
            Some(rows) => Err(OffenseError::Integrity {
                pair_id: pair_id.to_string(),
                matches: rows.len(),
            }),
            None => Err(OffenseError::Integrity {
                pair_id: pair_id.to_string(),
                matches: 0,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::strength::RankedTeam;

    fn ranking(strengths: &[(&str, f64)]) -> Ranking {
        Ranking {
            source: "win_pct".to_string(),
            teams: strengths
                .iter()
                .map(|(team, strength)| RankedTeam {
                    team: team.to_string(),
                    strength: *strength,
                })
                .collect(),
        }
    }

    #[test]
    fn test_adjacent_pairs() {
        let registry = PairRegistry::from_ranking(&ranking(&[
            ("KC", 0.9),
            ("BUF", 0.7),
            ("PHI", 0.5),
            ("DAL", 0.3),
        ]));

        assert_eq!(registry.len(), 2);
        let first = registry.resolve("PAIR_1").unwrap();
        assert_eq!((first.team_a.as_str(), first.team_b.as_str()), ("KC", "BUF"));
        let second = registry.resolve("PAIR_2").unwrap();
        assert_eq!((second.team_a.as_str(), second.team_b.as_str()), ("PHI", "DAL"));
        assert!(registry.unpaired().is_none());
    }

    #[test]
    fn test_odd_team_dropped() {
        let registry =
            PairRegistry::from_ranking(&ranking(&[("KC", 0.9), ("BUF", 0.7), ("NYJ", 0.1)]));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.unpaired(), Some("NYJ"));
    }

    #[test]
    fn test_strength_rounded() {
        let registry = PairRegistry::from_ranking(&ranking(&[("KC", 0.123456), ("BUF", 0.1)]));
        assert_eq!(registry.pairs()[0].team_a_strength, 0.1235);
    }

    #[test]
    fn test_resolve_cardinality() {
        let pair = Pair {
            pair_id: "PAIR_1".to_string(),
            team_a: "KC".to_string(),
            team_b: "BUF".to_string(),
            team_a_strength: 0.9,
            team_b_strength: 0.7,
        };
        let registry = PairRegistry::from_pairs(vec![pair.clone(), pair]);

        match registry.resolve("PAIR_1") {
            Err(OffenseError::Integrity { matches, .. }) => assert_eq!(matches, 2),
            other => panic!("unexpected result: {other:?}"),
        }
        match registry.resolve("PAIR_9") {
            Err(OffenseError::Integrity { matches, .. }) => assert_eq!(matches, 0),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_pair_table_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results").join("team_pairs.csv");
        let registry = PairRegistry::from_ranking(&ranking(&[("KC", 0.9), ("BUF", 0.7)]));
        registry.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("pair_id,teamA,teamB,teamA_strength,teamB_strength"));

        let loaded = PairRegistry::load(&path).unwrap();
        assert_eq!(loaded.pairs(), registry.pairs());
    }

    #[test]
    fn test_missing_pair_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team_pairs.csv");
        std::fs::write(&path, "pair_id,teamA\nPAIR_1,KC\n").unwrap();

        match PairRegistry::load(&path) {
            Err(OffenseError::Configuration(msg)) => {
                assert!(msg.contains("teamB"));
                assert!(!msg.contains("strength"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_strengths_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("team_pairs.csv");
        std::fs::write(&path, "pair_id,teamA,teamB\nPAIR_1,KC,BUF\n").unwrap();

        let registry = PairRegistry::load(&path).unwrap();
        let pair = registry.resolve("PAIR_1").unwrap();
        assert_eq!(pair.team_b, "BUF");
        assert_eq!(pair.team_a_strength, 0.0);
    }
}
