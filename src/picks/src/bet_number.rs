//! Elementary bet numbers (馬番の組み合わせ).
//!
//! A `BetNumber` is the set of horses covered by one elementary bet. Ordered
//! bets (exacta, trifecta) keep finishing-position order; every other bet is
//! stored in ascending horse-number order so equal bets compare equal.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Horse number (馬番) or bracket number for bracket quinella.
pub type HorseNumber = u8;

/// Maximum number of horses in one elementary bet.
pub const MAX_HORSES: usize = 3;

/// Whether finishing order matters for a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Order {
    Ordered,
    Unordered,
}

impl Order {
    /// Separator used when displaying a bet of this order.
    pub fn separator(&self) -> char {
        match self {
            Order::Ordered => '-',
            Order::Unordered => '=',
        }
    }
}

/// Invariant violations when building a `BetNumber`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BetNumberError {
    #[error("bet number needs 1 to {MAX_HORSES} horses, got {0}")]
    Length(usize),

    #[error("horse number must be positive")]
    ZeroHorse,

    #[error("horse {0} appears more than once")]
    Duplicate(HorseNumber),

    #[error("invalid horse number: {0:?}")]
    Parse(String),
}

/// One elementary bet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BetNumber {
    horses: Vec<HorseNumber>,
    order: Order,
}

impl BetNumber {
    /// Build a bet number, canonicalizing unordered bets to ascending order.
    ///
    /// A single horse is always stored as unordered so a win ticket equals
    /// the official win result regardless of how it was built.
    pub fn new(mut horses: Vec<HorseNumber>, order: Order) -> Result<Self, BetNumberError> {
        if horses.is_empty() || horses.len() > MAX_HORSES {
            return Err(BetNumberError::Length(horses.len()));
        }
        if horses.contains(&0) {
            return Err(BetNumberError::ZeroHorse);
        }
        for (i, h) in horses.iter().enumerate() {
            if horses[i + 1..].contains(h) {
                return Err(BetNumberError::Duplicate(*h));
            }
        }

        let order = if horses.len() == 1 { Order::Unordered } else { order };
        if order == Order::Unordered {
            horses.sort_unstable();
        }

        Ok(Self { horses, order })
    }

    /// Bet on a single horse.
    pub fn single(horse: HorseNumber) -> Result<Self, BetNumberError> {
        Self::new(vec![horse], Order::Unordered)
    }

    /// Parse a displayed bet number with an explicit order.
    ///
    /// Accepts `-`, `=`, `,`, `→` and whitespace between horse numbers.
    pub fn parse_as(text: &str, order: Order) -> Result<Self, BetNumberError> {
        let horses = text
            .split(|c: char| matches!(c, '-' | '=' | ',' | '→') || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(|t| {
                t.parse::<HorseNumber>()
                    .map_err(|_| BetNumberError::Parse(t.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(horses, order)
    }

    pub fn horses(&self) -> &[HorseNumber] {
        &self.horses
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn len(&self) -> usize {
        self.horses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.horses.is_empty()
    }

    pub fn contains(&self, horse: HorseNumber) -> bool {
        self.horses.contains(&horse)
    }

    /// True when the two bets share at least one horse.
    pub fn overlaps(&self, other: &BetNumber) -> bool {
        self.horses.iter().any(|h| other.contains(*h))
    }

    /// Horses paired with their zero-based finishing position.
    pub fn positions(&self) -> impl Iterator<Item = (usize, HorseNumber)> + '_ {
        self.horses.iter().copied().enumerate()
    }
}

impl fmt::Display for BetNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = self.order.separator();
        for (i, h) in self.horses.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", sep)?;
            }
            write!(f, "{:02}", h)?;
        }
        Ok(())
    }
}

/// Parses the display form: `-` marks an ordered bet, anything else is
/// unordered.
impl FromStr for BetNumber {
    type Err = BetNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let order = if s.contains('-') || s.contains('→') {
            Order::Ordered
        } else {
            Order::Unordered
        };
        Self::parse_as(s, order)
    }
}

impl Serialize for BetNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
