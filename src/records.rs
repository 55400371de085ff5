//! Reading participants from comma-separated text
//!
//! One record per line, five fields in fixed order:
//!
//! ```text
//! name, id, rank, country, signup time
//! ```
//!
//! Whitespace around fields is ignored, as are blank lines.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;

use log::{info, warn};
use regex::Regex;
use rustc_hash::FxHashSet;

use crate::{Leaderboard, Participant, RecordError};

const RECORD_PATTERN: &str =
    r"^\s*([^,]*?)\s*,\s*([^,]*?)\s*,\s*([^,]*?)\s*,\s*([^,]*?)\s*,\s*([^,]*?)\s*$";

fn record_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(RECORD_PATTERN).expect("record pattern is valid"))
}

fn parse_field(line: usize, field: &'static str, value: &str) -> Result<i64, RecordError> {
    value
        .parse()
        .map_err(|source| RecordError::InvalidNumber {
            line,
            field,
            value: value.to_string(),
            source,
        })
}

/// Parse one record; `line` is the 1-based line number used in errors
pub fn parse_record(line: usize, content: &str) -> Result<Participant, RecordError> {
    let caps = record_pattern()
        .captures(content)
        .ok_or_else(|| RecordError::Malformed {
            line,
            content: content.to_string(),
        })?;
    Ok(Participant {
        name: caps[1].to_string(),
        id: parse_field(line, "id", &caps[2])?,
        rank: parse_field(line, "rank", &caps[3])?,
        country: caps[4].to_string(),
        signup_time: parse_field(line, "signup time", &caps[5])?,
    })
}

/// Read every record from `reader`, stopping at the first bad line
///
/// Duplicate IDs are kept, but reported.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<Participant>, RecordError> {
    let mut participants = Vec::new();
    let mut seen = FxHashSet::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let participant = parse_record(idx + 1, &line)?;
        if !seen.insert(participant.id) {
            warn!("line {}: duplicate participant id {}", idx + 1, participant.id);
        }
        participants.push(participant);
    }
    Ok(participants)
}

/// Read every record from the file at `path`
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<Vec<Participant>, RecordError> {
    let path = path.as_ref();
    let f = File::open(path).map_err(|source| RecordError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(BufReader::new(f))
}

/// Insert every record from the file at `path` into `board`, returning how many
///
/// Nothing is inserted if any line fails to parse.
pub fn load_file<P: AsRef<Path>>(board: &mut Leaderboard, path: P) -> Result<usize, RecordError> {
    let participants = read_file(&path)?;
    let count = participants.len();
    board.extend(participants);
    info!("loaded {count} participants from {}", path.as_ref().display());
    Ok(count)
}
