//! Tie-breaks for picks still holding several candidates after narrowing.

use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use super::status::{PickStatus, Role, RoleStatus};
use super::EventInput;
use crate::bet_number::HorseNumber;
use crate::error::InferenceError;

/// Outcome of breaking one tie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TieBreak {
    pub winner: HorseNumber,
    pub losers: Vec<HorseNumber>,
}

/// Resolve both picks. Horses losing the primary tie-break move to the
/// secondary pool; horses losing the secondary tie-break are dropped.
pub(crate) fn resolve(input: &EventInput, status: &mut PickStatus) -> Result<(), InferenceError> {
    if let RoleStatus::Candidates(candidates) = &status.primary {
        let tie = break_tie(input, Role::Primary, candidates)?;
        status.primary = RoleStatus::Resolved(tie.winner);
        status.secondary.absorb(tie.losers);
    }

    if let RoleStatus::Candidates(candidates) = &status.secondary {
        let tie = break_tie(input, Role::Secondary, candidates)?;
        status.secondary = RoleStatus::Resolved(tie.winner);
    }

    Ok(())
}

/// Narrow candidates to one horse: highest realized payout first, then
/// popularity order.
pub(crate) fn break_tie(
    input: &EventInput,
    role: Role,
    candidates: &BTreeSet<HorseNumber>,
) -> Result<TieBreak, InferenceError> {
    let mut losers = Vec::new();

    let kept = match realized_payouts(input, candidates) {
        Some(payouts) => {
            let best = payouts.values().copied().max().unwrap_or(0);
            let (kept, dropped): (BTreeSet<_>, BTreeSet<_>) = candidates
                .iter()
                .copied()
                .partition(|h| payouts.get(h).copied().unwrap_or(0) == best);
            debug!(race_id = %input.race.race_id, %role, ?kept, ?dropped, "payout tie-break");
            losers.extend(dropped);
            kept
        }
        None => {
            debug!(race_id = %input.race.race_id, %role, "no hit ticket among candidates");
            candidates.clone()
        }
    };

    if kept.len() == 1 {
        let winner = kept.into_iter().next().unwrap_or_default();
        return Ok(TieBreak { winner, losers });
    }

    let Some(winner) = input
        .race
        .popularity_order()
        .into_iter()
        .find(|h| kept.contains(h))
    else {
        return Err(InferenceError::AmbiguousResolution {
            race_id: input.race.race_id.clone(),
            role,
            candidates: kept.into_iter().collect(),
        });
    };

    debug!(race_id = %input.race.race_id, %role, winner, "popularity tie-break");
    losers.extend(kept.into_iter().filter(|h| *h != winner));
    Ok(TieBreak { winner, losers })
}

/// Payout of hit tickets credited to every candidate they name, or None when
/// no hit ticket names a candidate.
fn realized_payouts(
    input: &EventInput,
    candidates: &BTreeSet<HorseNumber>,
) -> Option<BTreeMap<HorseNumber, u64>> {
    let mut payouts = BTreeMap::new();
    let mut found = false;

    for race_ticket in input.voting_tickets().filter(|t| t.ticket.hit) {
        let ticket = &race_ticket.ticket;
        for &horse in ticket.bet_number.horses() {
            if candidates.contains(&horse) {
                found = true;
                *payouts.entry(horse).or_insert(0) += ticket.payout;
            }
        }
    }

    found.then_some(payouts)
}
