//! Error types for bet-number expansion and pick inference.

use thiserror::Error;

use crate::bet_number::{BetNumberError, HorseNumber};
use crate::inference::Role;
use crate::ticket::{BaseTicketType, TicketType};

/// Failure to expand one condensed bet-number notation.
///
/// Scoped to a single ticket row; the rest of the batch keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpandError {
    #[error("invalid horse number token: {token:?}")]
    Parse { token: String },

    #[error("unsupported notation {notation:?}: {reason}")]
    UnsupportedEncoding { notation: String, reason: String },

    #[error("invalid bet number: {0}")]
    InvalidBetNumber(#[from] BetNumberError),
}

impl ExpandError {
    pub(crate) fn unsupported(notation: &str, reason: impl Into<String>) -> Self {
        ExpandError::UnsupportedEncoding {
            notation: notation.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure to infer picks for one race. Fatal for that race only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("race {race_id}: no payout result for {base} but a {base} ticket hit")]
    MissingPayout {
        race_id: String,
        base: BaseTicketType,
    },

    #[error("race {race_id}: {ticket_type} {bet_number} hit but equals no official winner")]
    UnmatchedHit {
        race_id: String,
        ticket_type: TicketType,
        bet_number: String,
    },

    #[error(
        "{base} payout columns differ in length: {numbers} numbers, {odds} odds, {popularity} ranks"
    )]
    PayoutLengthMismatch {
        base: BaseTicketType,
        numbers: usize,
        odds: usize,
        popularity: usize,
    },

    #[error("race {race_id}: could not narrow {role} pick, candidates {candidates:?}")]
    AmbiguousResolution {
        race_id: String,
        role: Role,
        candidates: Vec<HorseNumber>,
    },
}
