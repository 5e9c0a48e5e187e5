//! Matching hit tickets to official odds and popularity.

use serde::Serialize;

use super::EventInput;
use crate::error::InferenceError;
use crate::ticket::{RaceTicket, TicketType};

/// A hit ticket with the settlement it was paid at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedTicket {
    #[serde(flatten)]
    pub ticket: RaceTicket,
    /// Official odds as printed, e.g. `"1520"`
    pub odds: String,
    pub popularity: u32,
}

/// Every hit ticket paired with each official winner it equals, in ticket
/// priority order. A hit that equals no winner is a data error.
pub fn match_winning_tickets(input: &EventInput) -> Result<Vec<MatchedTicket>, InferenceError> {
    let mut matched = Vec::new();

    for ticket_type in TicketType::PRIORITY {
        for race_ticket in input
            .tickets
            .iter()
            .filter(|t| t.ticket.ticket_type == ticket_type && t.ticket.hit)
        {
            let base = ticket_type.origin();
            let result = input
                .payouts
                .get(base)
                .ok_or_else(|| InferenceError::MissingPayout {
                    race_id: input.race.race_id.clone(),
                    base,
                })?;

            let before = matched.len();
            for (number, odds, popularity) in result.winners() {
                if *number == race_ticket.ticket.bet_number {
                    matched.push(MatchedTicket {
                        ticket: race_ticket.clone(),
                        odds: odds.to_string(),
                        popularity,
                    });
                }
            }
            if matched.len() == before {
                return Err(InferenceError::UnmatchedHit {
                    race_id: input.race.race_id.clone(),
                    ticket_type,
                    bet_number: race_ticket.ticket.bet_number.to_string(),
                });
            }
        }
    }

    Ok(matched)
}
