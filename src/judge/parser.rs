//! Pull an A/B choice out of a judge's free-text answer

use crate::Choice;

const TEAM_A: &str = "team a";
const TEAM_B: &str = "team b";

/// Detect which team the answer picked.
///
/// Only one of "team a" / "team b" mentioned picks that team. When both are
/// mentioned the one named first wins. Matching ignores case; a missing
/// answer or one naming neither team is `Unknown`.
pub fn extract_choice(answer: Option<&str>) -> Choice {
    let Some(text) = answer else {
        return Choice::Unknown;
    };
    let text = text.to_lowercase();

    match (text.find(TEAM_A), text.find(TEAM_B)) {
        (None, None) => Choice::Unknown,
        (Some(_), None) => Choice::A,
        (None, Some(_)) => Choice::B,
        (Some(a), Some(b)) => {
            if a < b {
                Choice::A
            } else {
                Choice::B
            }
        }
    }
}
