//! The text judge: prompts in, labels out
//!
//! Prompt templating, the chat-completion client, answer parsing, and the
//! join from answers to preference labels.

pub mod client;
pub mod labels;
pub mod parser;
pub mod prompts;

pub use client::{ChatJudge, Judge, JudgeRunner};
pub use labels::{Label, LabelJoiner, LabelTable};
pub use parser::extract_choice;
pub use prompts::build_prompts;
