//! Official payout results (払戻金) per race.

use std::collections::HashMap;

use crate::bet_number::BetNumber;
use crate::error::InferenceError;
use crate::ticket::BaseTicketType;

/// Winning combinations of one base ticket type in one race.
///
/// Dead heats and wide bets produce several winners, so the three columns
/// are parallel arrays of equal length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutResult {
    base: BaseTicketType,
    numbers: Vec<BetNumber>,
    odds: Vec<String>,
    popularity: Vec<u32>,
}

impl PayoutResult {
    pub fn new(
        base: BaseTicketType,
        numbers: Vec<BetNumber>,
        odds: Vec<String>,
        popularity: Vec<u32>,
    ) -> Result<Self, InferenceError> {
        if numbers.len() != odds.len() || numbers.len() != popularity.len() {
            return Err(InferenceError::PayoutLengthMismatch {
                base,
                numbers: numbers.len(),
                odds: odds.len(),
                popularity: popularity.len(),
            });
        }
        Ok(Self {
            base,
            numbers,
            odds,
            popularity,
        })
    }

    pub fn base(&self) -> BaseTicketType {
        self.base
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    /// Winning number, odds and popularity rank per position.
    pub fn winners(&self) -> impl Iterator<Item = (&BetNumber, &str, u32)> + '_ {
        self.numbers
            .iter()
            .zip(&self.odds)
            .zip(&self.popularity)
            .map(|((n, o), p)| (n, o.as_str(), *p))
    }

    pub fn contains(&self, bet: &BetNumber) -> bool {
        self.numbers.contains(bet)
    }
}

/// All payout results of one race, keyed by base ticket type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayoutIndex {
    results: HashMap<BaseTicketType, PayoutResult>,
}

impl PayoutIndex {
    /// Add a result, replacing any earlier one for the same base type.
    pub fn insert(&mut self, result: PayoutResult) {
        self.results.insert(result.base(), result);
    }

    pub fn get(&self, base: BaseTicketType) -> Option<&PayoutResult> {
        self.results.get(&base)
    }

    pub fn is_winner(&self, base: BaseTicketType, bet: &BetNumber) -> bool {
        self.get(base).is_some_and(|r| r.contains(bet))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
