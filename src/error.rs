use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Caller contract violations on [`Leaderboard`](crate::Leaderboard) queries
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LeaderboardError {
    #[error("k must be at least 1, got {0}")]
    InvalidK(usize),
    #[error("range start {t1} is after range end {t2}")]
    InvertedRange { t1: i64, t2: i64 },
}

/// Failures while reading participant records
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),
    #[error("line {line}: expected `name, id, rank, country, signup time`, got {content:?}")]
    Malformed { line: usize, content: String },
    #[error("line {line}: invalid {field} {value:?}: {source}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
        #[source]
        source: ParseIntError,
    },
}
