//! Keiba picks
//!
//! Expands condensed JRA bet-number notation and infers the bettor's primary
//! (本命) and secondary (対抗) pick for each race from the tickets bought.

pub mod bet_number;
pub mod cli;
pub mod config;
pub mod error;
pub mod expander;
pub mod inference;
pub mod loader;
pub mod payout;
pub mod race;
pub mod report;
pub mod ticket;

pub use bet_number::{BetNumber, HorseNumber, Order};
pub use error::{ExpandError, InferenceError};
pub use expander::Expander;
pub use inference::{EventInput, InferenceOutcome, PickEngine, PickStatus, Role, RoleStatus};
pub use payout::{PayoutIndex, PayoutResult};
pub use race::{RaceEntry, RaceResult};
pub use ticket::{BaseTicketType, RaceTicket, Ticket, TicketRecord, TicketType};
