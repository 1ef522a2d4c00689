//! Shared vocabulary of the context engine.
//!
//! These enums appear both in configuration files and in the engine,
//! so they live here rather than in either crate.

use serde::{Deserialize, Serialize};

/// Which end of a text is sacrificed first when it must shrink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimDirection {
    /// Drop from the start, keep the tail.
    Top,
    /// Drop from the end, keep the head.
    #[default]
    Bottom,
    /// Never trim.
    None,
}

/// Granularity of trimming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimType {
    /// Whole `\n`-delimited lines.
    Newline,
    /// Whole sentences.
    #[default]
    Sentence,
    /// Raw tokens.
    Token,
}

/// Unit an entry is inserted in. Splicing is line based regardless;
/// the value is carried for callers that inspect entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertionType {
    Newline,
    #[default]
    Sentence,
    Token,
}

/// What the composer does when the running budget goes negative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetMode {
    /// Tolerate the overrun and keep composing.
    #[default]
    Permissive,
    /// Fail the composition.
    Strict,
}

impl std::str::FromStr for BudgetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(format!("unknown budget mode '{other}'")),
        }
    }
}
