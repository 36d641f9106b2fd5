use thiserror::Error;

/// A source CSV could not be obtained or understood. Always recoverable:
/// the loaders substitute an empty table and surface the message.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("fetch {url} failed: {reason}")]
    Fetch { url: String, reason: String },
    #[error("read {path} failed: {reason}")]
    Read { path: String, reason: String },
    #[error("{source_name} csv is missing columns: {}", missing.join(", "))]
    MissingColumns {
        source_name: &'static str,
        missing: Vec<String>,
    },
    #[error("{source_name} csv could not be decoded: {reason}")]
    Decode {
        source_name: &'static str,
        reason: String,
    },
}

/// One fixture could not be projected; the rest of the batch carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectionError {
    #[error("fixture row {row} has a blank {side} team")]
    BlankTeam { row: usize, side: &'static str },
    #[error("fixture row {row} lists {team} on both sides")]
    SameTeam { row: usize, team: String },
}
