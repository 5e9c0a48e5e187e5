//! Stake-weighted voting over horse numbers.
//!
//! Each ticket spreads its payment over the horses it names. The first
//! position always carries full weight; in ordered bets the second and third
//! positions count for a quarter and a tenth. Weights are kept in
//! thousandths so that sums are exact integers and ties compare equal.

use std::collections::{BTreeMap, BTreeSet};

use crate::bet_number::HorseNumber;
use crate::ticket::RaceTicket;

/// Scores are yen scaled by this factor.
pub const SCALE: u64 = 1000;

const SECOND_ORDERED: u64 = 250;
const THIRD_ORDERED: u64 = 100;

/// Weight of a finishing position, in thousandths.
pub fn position_weight(ordered: bool, position: usize) -> u64 {
    match (ordered, position) {
        (_, 0) | (false, _) => SCALE,
        (true, 1) => SECOND_ORDERED,
        (true, _) => THIRD_ORDERED,
    }
}

/// Weighted payment per horse for the horses accepted by `keep`.
pub fn weighted_scores<'a, I, F>(tickets: I, keep: F) -> BTreeMap<HorseNumber, u64>
where
    I: IntoIterator<Item = &'a RaceTicket>,
    F: Fn(HorseNumber) -> bool,
{
    let mut scores = BTreeMap::new();
    for race_ticket in tickets {
        let ticket = &race_ticket.ticket;
        let ordered = ticket.ticket_type.is_ordered();
        for (position, horse) in ticket.bet_number.positions() {
            if !keep(horse) {
                continue;
            }
            *scores.entry(horse).or_insert(0) += ticket.payment * position_weight(ordered, position);
        }
    }
    scores
}

/// Horses with the highest score.
fn top(scores: &BTreeMap<HorseNumber, u64>) -> BTreeSet<HorseNumber> {
    let Some(&best) = scores.values().max() else {
        return BTreeSet::new();
    };
    scores
        .iter()
        .filter(|(_, score)| **score == best)
        .map(|(&horse, _)| horse)
        .collect()
}

/// Horses with the highest weighted payment, skipping `exclude` entirely.
pub fn max_candidates<'a, I>(tickets: I, exclude: &BTreeSet<HorseNumber>) -> BTreeSet<HorseNumber>
where
    I: IntoIterator<Item = &'a RaceTicket>,
{
    top(&weighted_scores(tickets, |h| !exclude.contains(&h)))
}

/// Re-score only among `candidates`; tickets not naming any of them add
/// nothing.
pub fn max_candidates_within<'a, I>(
    tickets: I,
    candidates: &BTreeSet<HorseNumber>,
) -> BTreeSet<HorseNumber>
where
    I: IntoIterator<Item = &'a RaceTicket>,
{
    top(&weighted_scores(tickets, |h| candidates.contains(&h)))
}
