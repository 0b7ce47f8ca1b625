//! Prompt and answer records exchanged with the judge as JSON lines

use crate::data::ensure_parent;
use crate::{OffenseError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A templated question about one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptRecord {
    pub pair_id: String,
    pub prompt_type: String,
    #[serde(rename = "teamA")]
    pub team_a: String,
    #[serde(rename = "teamB")]
    pub team_b: String,
    pub prompt: String,
}

/// Judge output for one prompt; `answer` is null when the call failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct AnswerRecord {
    pub pair_id: String,
    pub prompt_type: Option<String>,
    #[serde(rename = "teamA", skip_serializing_if = "Option::is_none")]
    pub team_a: Option<String>,
    #[serde(rename = "teamB", skip_serializing_if = "Option::is_none")]
    pub team_b: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const TYPE_KEYS: [&str; 3] = ["type", "prompt_type", "question_type"];
const ANSWER_KEYS: [&str; 4] = ["answer", "response", "model_answer", "content"];

/// First key holding a non-empty string
fn first_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k).and_then(Value::as_str))
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

impl TryFrom<Map<String, Value>> for AnswerRecord {
    type Error = String;

    /// Type and answer may appear under several keys; the earliest non-empty one wins
    fn try_from(map: Map<String, Value>) -> std::result::Result<Self, Self::Error> {
        let pair_id = match map.get("pair_id") {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Err("answer record has no pair_id".to_string()),
        };
        Ok(AnswerRecord {
            pair_id,
            prompt_type: first_text(&map, &TYPE_KEYS),
            team_a: first_text(&map, &["teamA"]),
            team_b: first_text(&map, &["teamB"]),
            prompt: first_text(&map, &["prompt"]),
            answer: first_text(&map, &ANSWER_KEYS),
            error: first_text(&map, &["error"]),
        })
    }
}

impl AnswerRecord {
    /// Merge a prompt with the outcome of asking it
    pub fn from_outcome(prompt: &PromptRecord, outcome: Result<String>) -> Self {
        let (answer, error) = match outcome {
            Ok(text) => (Some(text), None),
            Err(e) => (None, Some(e.to_string())),
        };
        AnswerRecord {
            pair_id: prompt.pair_id.clone(),
            prompt_type: Some(prompt.prompt_type.clone()),
            team_a: Some(prompt.team_a.clone()),
            team_b: Some(prompt.team_b.clone()),
            prompt: Some(prompt.prompt.clone()),
            answer,
            error,
        }
    }

    pub fn is_type(&self, question_type: &str) -> bool {
        self.prompt_type.as_deref() == Some(question_type)
    }
}

/// Read one JSON value per non-blank line
pub fn read_jsonl<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item = serde_json::from_str(line).map_err(|e| {
            OffenseError::Parse(format!("{}:{}: {}", path.display(), i + 1, e))
        })?;
        items.push(item);
    }
    Ok(items)
}

/// Write one JSON value per line
pub fn write_jsonl<T: Serialize, P: AsRef<Path>>(path: P, items: &[T]) -> Result<()> {
    ensure_parent(&path)?;
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    for item in items {
        serde_json::to_writer(&mut writer, item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// JSON-lines file written one record at a time, flushed after each
pub struct JsonlWriter {
    writer: BufWriter<File>,
}

impl JsonlWriter {
    /// Truncate or create the file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        ensure_parent(&path)?;
        Ok(JsonlWriter {
            writer: BufWriter::new(File::create(path.as_ref())?),
        })
    }

    pub fn append<T: Serialize>(&mut self, item: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, item)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
