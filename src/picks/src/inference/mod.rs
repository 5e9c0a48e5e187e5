//! Primary/secondary pick inference (本命・対抗の推定).
//!
//! The bettor never records which horse they backed most. The engine infers
//! it from what was bought: ticket types are visited from the most decisive
//! (win, exacta, trifecta) to the least (place, bracket quinella), and each
//! pass votes with stake-weighted scores until both picks are settled. Ties
//! left at the end are broken by realized payout and then popularity.

pub mod matching;
pub mod resolve;
pub mod scoring;
pub mod status;

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::bet_number::HorseNumber;
use crate::config::InferenceConfig;
use crate::error::InferenceError;
use crate::payout::PayoutIndex;
use crate::race::RaceResult;
use crate::ticket::{RaceTicket, TicketType};

pub use matching::{match_winning_tickets, MatchedTicket};
pub use scoring::{max_candidates, max_candidates_within, weighted_scores};
pub use status::{PickStatus, Role, RoleStatus};

/// Everything known about one race.
#[derive(Debug, Clone)]
pub struct EventInput {
    pub race: RaceResult,
    pub payouts: PayoutIndex,
    /// Elementary tickets only; condensed notation is expanded upstream.
    pub tickets: Vec<RaceTicket>,
}

impl EventInput {
    pub fn race_id(&self) -> &str {
        &self.race.race_id
    }

    pub fn total_payment(&self) -> u64 {
        self.tickets.iter().map(|t| t.ticket.payment).sum()
    }

    pub fn total_payout(&self) -> u64 {
        self.tickets.iter().map(|t| t.ticket.payout).sum()
    }

    /// Tickets that vote on horses. Bracket-quinella numbers are brackets,
    /// not horses, so they count only when nothing else was bought.
    pub fn voting_tickets(&self) -> impl Iterator<Item = &RaceTicket> + '_ {
        let brackets_only = self
            .tickets
            .iter()
            .all(|t| t.ticket.ticket_type == TicketType::BracketQuinella);
        self.tickets.iter().filter(move |t| {
            brackets_only || t.ticket.ticket_type != TicketType::BracketQuinella
        })
    }
}

/// Picks inferred for one race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InferenceOutcome {
    pub race_id: String,
    pub primary: Option<HorseNumber>,
    pub secondary: Option<HorseNumber>,
    pub matched_tickets: Vec<MatchedTicket>,
    pub status: PickStatus,
}

/// Runs inference race by race. Holds configuration only; every call starts
/// from a fresh state.
#[derive(Debug, Clone)]
pub struct PickEngine {
    low_confidence_ratio: f64,
}

impl Default for PickEngine {
    fn default() -> Self {
        Self::new(&InferenceConfig::default())
    }
}

impl PickEngine {
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            low_confidence_ratio: config.low_confidence_ratio,
        }
    }

    /// Infer the primary and secondary picks of one race.
    pub fn infer(&self, input: &EventInput) -> Result<InferenceOutcome, InferenceError> {
        let total_payment = input.total_payment();
        let mut status = PickStatus::default();

        for ticket_type in TicketType::PRIORITY {
            let pass: Vec<&RaceTicket> = input
                .voting_tickets()
                .filter(|t| t.ticket.ticket_type == ticket_type)
                .collect();
            if pass.is_empty() {
                continue;
            }

            self.narrow(ticket_type, &pass, total_payment, &mut status);
            debug!(
                race_id = input.race_id(),
                %ticket_type,
                tickets = pass.len(),
                ?status,
                "narrowing pass"
            );

            if status.is_complete() {
                break;
            }
        }

        resolve::resolve(input, &mut status)?;
        let matched_tickets = match_winning_tickets(input)?;

        Ok(InferenceOutcome {
            race_id: input.race_id().to_string(),
            primary: status.primary.resolved(),
            secondary: status.secondary.resolved(),
            matched_tickets,
            status,
        })
    }

    /// One pass over the tickets of a single ticket type.
    fn narrow(
        &self,
        ticket_type: TicketType,
        pass: &[&RaceTicket],
        total_payment: u64,
        status: &mut PickStatus,
    ) {
        let tickets = || pass.iter().copied();

        if let RoleStatus::Candidates(candidates) = &status.primary {
            let narrowed = max_candidates_within(tickets(), candidates);
            if !narrowed.is_empty() {
                match self.settle_primary(ticket_type, pass, total_payment, narrowed) {
                    RoleStatus::Unresolved => {}
                    settled => status.primary = settled,
                }
            }
        }

        if let RoleStatus::Candidates(candidates) = &status.secondary {
            let narrowed = max_candidates_within(tickets(), candidates);
            if !narrowed.is_empty() {
                status.secondary = RoleStatus::from_candidates(narrowed);
            }
        }

        if let Some(primary) = status.primary.resolved() {
            if status.secondary.is_unresolved() {
                let exclude = BTreeSet::from([primary]);
                status.secondary =
                    RoleStatus::from_candidates(max_candidates(tickets(), &exclude));
            }
        }

        if status.is_untouched() {
            let seeds = max_candidates(tickets(), &BTreeSet::new());
            status.primary = self.settle_primary(ticket_type, pass, total_payment, seeds.clone());
            if status.primary.is_unresolved() {
                return;
            }
            status.secondary = RoleStatus::from_candidates(max_candidates(tickets(), &seeds));
        }
    }

    /// Turn primary candidates into a state, refusing a lone win-ticket pick
    /// that carries too small a share of the race's stake.
    fn settle_primary(
        &self,
        ticket_type: TicketType,
        pass: &[&RaceTicket],
        total_payment: u64,
        candidates: BTreeSet<HorseNumber>,
    ) -> RoleStatus {
        if ticket_type == TicketType::Win && candidates.len() == 1 {
            if let Some(&horse) = candidates.first() {
                let stake: u64 = pass
                    .iter()
                    .filter(|t| t.ticket.bet_number.contains(horse))
                    .map(|t| t.ticket.payment)
                    .sum();
                let share = if total_payment == 0 {
                    0.0
                } else {
                    stake as f64 / total_payment as f64
                };
                if share < self.low_confidence_ratio {
                    debug!(horse, share, "win stake below confidence threshold");
                    return RoleStatus::Unresolved;
                }
            }
        }
        RoleStatus::from_candidates(candidates)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::expander::Expander;
    use crate::race::{entry, RaceEntry};
    use crate::ticket::Ticket;
    use chrono::NaiveDate;

    /// Elementary ticket for race `R1`; `raw` must expand to a single bet.
    pub(crate) fn ticket(
        ticket_type: TicketType,
        raw: &str,
        payment: u64,
        hit: bool,
        payout: u64,
    ) -> RaceTicket {
        let mut bets = Expander::default().expand(ticket_type, raw).unwrap();
        assert_eq!(bets.len(), 1, "{} is not elementary", raw);
        RaceTicket::new(
            "R1",
            Ticket {
                race_date: NaiveDate::from_ymd_opt(2024, 5, 26).unwrap(),
                racecourse: "東京".to_string(),
                race_number: 11,
                bet_number: bets.remove(0),
                ticket_type,
                hit,
                payment,
                payout,
            },
        )
    }

    pub(crate) fn event(tickets: Vec<RaceTicket>, entries: Vec<RaceEntry>) -> EventInput {
        EventInput {
            race: RaceResult {
                race_id: "R1".to_string(),
                race_date: NaiveDate::from_ymd_opt(2024, 5, 26).unwrap(),
                racecourse: "東京".to_string(),
                race_number: 11,
                entries,
            },
            payouts: PayoutIndex::default(),
            tickets,
        }
    }

    fn field() -> Vec<RaceEntry> {
        (1..=12).map(|h| entry(h, h, h)).collect()
    }

    #[test]
    fn test_two_win_tickets() {
        let input = event(
            vec![
                ticket(TicketType::Win, "5", 800, false, 0),
                ticket(TicketType::Win, "3", 200, false, 0),
            ],
            field(),
        );

        let outcome = PickEngine::default().infer(&input).unwrap();
        assert_eq!(outcome.primary, Some(5));
        assert_eq!(outcome.secondary, Some(3));
        assert!(outcome.status.is_complete());
        assert!(outcome.matched_tickets.is_empty());
    }

    #[test]
    fn test_small_win_ticket_does_not_decide() {
        // 100 of 1000 is below the 15% threshold; the quinella pass decides
        let input = event(
            vec![
                ticket(TicketType::Win, "4", 100, false, 0),
                ticket(TicketType::Quinella, "7-9", 600, false, 0),
                ticket(TicketType::Quinella, "7-2", 300, false, 0),
            ],
            field(),
        );

        let outcome = PickEngine::default().infer(&input).unwrap();
        assert_eq!(outcome.primary, Some(7));
        assert_eq!(outcome.secondary, Some(9));
    }

    #[test]
    fn test_guard_leaves_state_untouched_after_win_pass() {
        let input = event(
            vec![
                ticket(TicketType::Win, "4", 100, false, 0),
                ticket(TicketType::Place, "8", 900, false, 0),
            ],
            field(),
        );
        let engine = PickEngine::default();
        let win_pass: Vec<&RaceTicket> = input.tickets[..1].iter().collect();
        let mut status = PickStatus::default();

        engine.narrow(TicketType::Win, &win_pass, input.total_payment(), &mut status);
        assert!(status.is_untouched());

        // the place pass then seeds the primary
        let outcome = engine.infer(&input).unwrap();
        assert_eq!(outcome.primary, Some(8));
        assert_eq!(outcome.secondary, None);
    }

    #[test]
    fn test_guard_threshold_is_configurable() {
        let input = event(
            vec![
                ticket(TicketType::Win, "4", 100, false, 0),
                ticket(TicketType::Place, "8", 900, false, 0),
            ],
            field(),
        );
        let engine = PickEngine::new(&InferenceConfig {
            low_confidence_ratio: 0.05,
        });
        let outcome = engine.infer(&input).unwrap();
        assert_eq!(outcome.primary, Some(4));
        assert_eq!(outcome.secondary, Some(8));
    }

    #[test]
    fn test_place_tie_resolved_by_popularity() {
        let input = event(
            vec![
                ticket(TicketType::Place, "2", 500, false, 0),
                ticket(TicketType::Place, "6", 500, false, 0),
            ],
            vec![entry(2, 4, 5), entry(6, 6, 3), entry(9, 1, 1)],
        );

        let outcome = PickEngine::default().infer(&input).unwrap();
        assert_eq!(outcome.primary, Some(6));
        assert_eq!(outcome.secondary, Some(2));
    }

    #[test]
    fn test_exacta_then_trio_narrows_secondary() {
        // Exacta pass: 3 leads; 1 and 8 tie behind it.
        // Trio pass narrows the secondary pool to 8.
        let input = event(
            vec![
                ticket(TicketType::Exacta, "3-1", 400, false, 0),
                ticket(TicketType::Exacta, "3-8", 400, false, 0),
                ticket(TicketType::Trio, "3-8-11", 200, false, 0),
                ticket(TicketType::Trio, "3-1-8", 100, false, 0),
            ],
            field(),
        );

        let outcome = PickEngine::default().infer(&input).unwrap();
        assert_eq!(outcome.primary, Some(3));
        assert_eq!(outcome.secondary, Some(8));
    }

    #[test]
    fn test_primary_candidates_narrowed_by_later_pass() {
        // Win pass ties 5 and 7; exacta pass breaks the tie for 7,
        // then searches the secondary without 7.
        let input = event(
            vec![
                ticket(TicketType::Win, "5", 500, false, 0),
                ticket(TicketType::Win, "7", 500, false, 0),
                ticket(TicketType::Exacta, "7-5", 300, false, 0),
                ticket(TicketType::Exacta, "7-2", 300, false, 0),
            ],
            field(),
        );

        let outcome = PickEngine::default().infer(&input).unwrap();
        assert_eq!(outcome.primary, Some(7));
        // the win pass left no secondary; in the exacta pass 5 and 2 tie
        // behind 7 and popularity picks 2
        assert_eq!(outcome.secondary, Some(2));
    }

    #[test]
    fn test_bracket_quinella_ignored_alongside_horse_tickets() {
        let input = event(
            vec![
                ticket(TicketType::Place, "2", 500, false, 0),
                ticket(TicketType::BracketQuinella, "3-5", 2000, false, 0),
            ],
            field(),
        );
        let outcome = PickEngine::default().infer(&input).unwrap();
        assert_eq!(outcome.primary, Some(2));
        assert_eq!(outcome.secondary, None);
    }

    #[test]
    fn test_bracket_quinella_alone_still_votes() {
        let input = event(
            vec![
                ticket(TicketType::BracketQuinella, "3-5", 1000, false, 0),
                ticket(TicketType::BracketQuinella, "3-6", 500, false, 0),
            ],
            field(),
        );
        assert_eq!(input.voting_tickets().count(), 2);
        let outcome = PickEngine::default().infer(&input).unwrap();
        assert_eq!(outcome.primary, Some(3));
        assert_eq!(outcome.secondary, Some(5));
    }

    #[test]
    fn test_no_tickets_leaves_both_unresolved() {
        let input = event(Vec::new(), field());
        let outcome = PickEngine::default().infer(&input).unwrap();
        assert_eq!(outcome.primary, None);
        assert_eq!(outcome.secondary, None);
        assert_eq!(outcome.status, PickStatus::default());
    }

    #[test]
    fn test_inference_is_idempotent() {
        let mut input = event(
            vec![
                ticket(TicketType::Place, "2", 500, true, 150),
                ticket(TicketType::Place, "6", 500, false, 0),
                ticket(TicketType::TrioBox, "2,6,9", 100, false, 0),
            ],
            field(),
        );
        input.payouts.insert(
            crate::payout::PayoutResult::new(
                crate::ticket::BaseTicketType::Place,
                vec!["2".parse().unwrap()],
                vec!["150".to_string()],
                vec![1],
            )
            .unwrap(),
        );

        let engine = PickEngine::default();
        let first = engine.infer(&input).unwrap();
        let second = engine.infer(&input).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.matched_tickets.len(), 1);
    }

    #[test]
    fn test_ambiguity_is_surfaced() {
        // tied candidates that never appear in the race result
        let input = event(
            vec![
                ticket(TicketType::Place, "13", 500, false, 0),
                ticket(TicketType::Place, "14", 500, false, 0),
            ],
            field(),
        );
        let err = PickEngine::default().infer(&input).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::AmbiguousResolution {
                role: Role::Primary,
                ..
            }
        ));
    }
}
