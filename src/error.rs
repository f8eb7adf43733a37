use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;

/// Failure talking to the bracket API. Propagated unmodified through the cache
/// and the match aggregator; never retried.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("response not ok. {}", status_text(.status))]
    Status { status: StatusCode },

    #[error("{message}. Internal Server Error")]
    Decode { message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("fan-out incomplete: {received} of {expected} workers reported")]
    WorkerLost { expected: usize, received: usize },

    /// One failed refresh handed to every caller that waited on it.
    #[error(transparent)]
    Shared(Arc<UpstreamError>),
}

impl UpstreamError {
    pub fn decode(err: impl std::fmt::Display) -> Self {
        UpstreamError::Decode {
            message: err.to_string(),
        }
    }
}

fn status_text(status: &StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown Status")
}

/// Rejected `/v1/matches` query parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("date query parameter not provided")]
    DateNotProvided,

    #[error("incorrect date format. Expect formatting YYYY-MM-DD")]
    DateIncorrectFormat,

    #[error("tournamentOrg query parameter not provided")]
    OrganizerNotProvided,

    #[error("unknown tournament organizer: {0}")]
    UnknownOrganizer(String),
}
