//! Preference labels joined from judge answers and the pair table

use crate::data::AnswerRecord;
use crate::features::PairRegistry;
use crate::judge::parser::extract_choice;
use crate::{Choice, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Columns a label table must carry; `answer_text` may be absent
pub const LABEL_COLUMNS: [&str; 6] = [
    "pair_id",
    "question_type",
    "choice",
    "teamA",
    "teamB",
    "llm_prefers_teamA",
];

/// One parsed answer with the teams it refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub pair_id: String,
    pub question_type: String,
    pub answer_text: Option<String>,
    pub choice: Choice,
    #[serde(rename = "teamA")]
    pub team_a: String,
    #[serde(rename = "teamB")]
    pub team_b: String,
    /// 1 = Team A, 0 = Team B, blank when the answer was ambiguous
    #[serde(rename = "llm_prefers_teamA")]
    pub llm_prefers_team_a: Option<u8>,
}

/// Labels for a run plus the counts reported alongside them
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    pub labels: Vec<Label>,
    /// Labels whose answer named neither team
    pub unknown: usize,
    /// Answers of other question types, by type
    pub other_types: BTreeMap<String, usize>,
}

impl LabelTable {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn parsed(&self) -> usize {
        self.labels.len() - self.unknown
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::data::write_csv(path, &self.labels)
    }

    /// Load a saved label table; the counts are recomputed from the rows
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let labels: Vec<Label> = crate::data::read_csv(path, "the label table", &LABEL_COLUMNS)?;
        let unknown = labels.iter().filter(|l| !l.choice.is_known()).count();
        Ok(LabelTable {
            labels,
            unknown,
            other_types: BTreeMap::new(),
        })
    }
}

/// Keeps answers of one question type and attaches their pair
pub struct LabelJoiner {
    question_type: String,
}

impl LabelJoiner {
    pub fn new(question_type: impl Into<String>) -> Self {
        LabelJoiner {
            question_type: question_type.into(),
        }
    }

    /// Every kept answer must resolve to exactly one pair
    pub fn join(&self, answers: &[AnswerRecord], registry: &PairRegistry) -> Result<LabelTable> {
        let mut table = LabelTable::default();

        for record in answers {
            if !record.is_type(&self.question_type) {
                let kind = record.prompt_type.clone().unwrap_or_default();
                *table.other_types.entry(kind).or_default() += 1;
                continue;
            }

            let pair = registry.resolve(&record.pair_id)?;
            let choice = extract_choice(record.answer.as_deref());
            if !choice.is_known() {
                table.unknown += 1;
                log::debug!("No clear choice in answer for {}", record.pair_id);
            }

            table.labels.push(Label {
                pair_id: record.pair_id.clone(),
                question_type: self.question_type.clone(),
                answer_text: record.answer.clone(),
                choice,
                team_a: pair.team_a.clone(),
                team_b: pair.team_b.clone(),
                llm_prefers_team_a: choice.prefers_team_a(),
            });
        }

        log::info!(
            "Parsed choices for {}/{} answers",
            table.parsed(),
            table.len()
        );
        if table.unknown > 0 {
            log::warn!(
                "{} answers did not clearly say 'Team A' or 'Team B'",
                table.unknown
            );
        }
        Ok(table)
    }
}
