//! Feature extraction
//!
//! Team totals, strength ranking, pairing, and differential features.

pub mod differential;
pub mod pairs;
pub mod strength;
pub mod team_stats;

pub use differential::{FeatureDifferencer, FeatureRow, TrainingTable};
pub use pairs::{Pair, PairRegistry};
pub use strength::{Ranking, StrengthRanker, StrengthSource};
pub use team_stats::{summarize_plays, TeamTotals};
