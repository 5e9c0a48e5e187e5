//! Ticket types (券種) and purchased tickets.

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::bet_number::{BetNumber, Order};
use crate::error::ExpandError;
use crate::expander::Expander;
use crate::payout::PayoutIndex;

/// Underlying wager category, independent of how the ticket was encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseTicketType {
    Win,             // 単勝
    Place,           // 複勝
    BracketQuinella, // 枠連
    Quinella,        // 馬連
    Exacta,          // 馬単
    QuinellaPlace,   // ワイド
    Trio,            // 三連複
    Trifecta,        // 三連単
}

impl BaseTicketType {
    pub const ALL: [BaseTicketType; 8] = [
        BaseTicketType::Win,
        BaseTicketType::Place,
        BaseTicketType::BracketQuinella,
        BaseTicketType::Quinella,
        BaseTicketType::Exacta,
        BaseTicketType::QuinellaPlace,
        BaseTicketType::Trio,
        BaseTicketType::Trifecta,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BaseTicketType::Win => "win",
            BaseTicketType::Place => "place",
            BaseTicketType::BracketQuinella => "bracket-quinella",
            BaseTicketType::Quinella => "quinella",
            BaseTicketType::Exacta => "exacta",
            BaseTicketType::QuinellaPlace => "wide",
            BaseTicketType::Trio => "trio",
            BaseTicketType::Trifecta => "trifecta",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BaseTicketType::Win => "単勝",
            BaseTicketType::Place => "複勝",
            BaseTicketType::BracketQuinella => "枠連",
            BaseTicketType::Quinella => "馬連",
            BaseTicketType::Exacta => "馬単",
            BaseTicketType::QuinellaPlace => "ワイド",
            BaseTicketType::Trio => "三連複",
            BaseTicketType::Trifecta => "三連単",
        }
    }

    /// Number of horses in one elementary bet.
    pub fn arity(&self) -> usize {
        match self {
            BaseTicketType::Win | BaseTicketType::Place => 1,
            BaseTicketType::BracketQuinella
            | BaseTicketType::Quinella
            | BaseTicketType::Exacta
            | BaseTicketType::QuinellaPlace => 2,
            BaseTicketType::Trio | BaseTicketType::Trifecta => 3,
        }
    }

    pub fn is_ordered(&self) -> bool {
        matches!(self, BaseTicketType::Exacta | BaseTicketType::Trifecta)
    }

    pub fn order(&self) -> Order {
        if self.is_ordered() {
            Order::Ordered
        } else {
            Order::Unordered
        }
    }
}

impl fmt::Display for BaseTicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseTicketType {
    type Err = UnknownTicketType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_name(s);
        match key.as_str() {
            "tansho" => return Ok(BaseTicketType::Win),
            "fukusho" => return Ok(BaseTicketType::Place),
            "wakuren" => return Ok(BaseTicketType::BracketQuinella),
            "umaren" => return Ok(BaseTicketType::Quinella),
            "umatan" => return Ok(BaseTicketType::Exacta),
            "quinella-place" => return Ok(BaseTicketType::QuinellaPlace),
            "sanrenpuku" => return Ok(BaseTicketType::Trio),
            "sanrentan" => return Ok(BaseTicketType::Trifecta),
            _ => {}
        }
        BaseTicketType::ALL
            .into_iter()
            .find(|t| t.name() == key || t.label() == key)
            .ok_or_else(|| UnknownTicketType(s.to_string()))
    }
}

impl Serialize for BaseTicketType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// How a ticket's horses were written down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Straight,
    WheelOfFirst,
    WheelOfSecond,
    Formation,
    Multi { pivots: usize },
    Box,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Straight => f.write_str("straight"),
            Encoding::WheelOfFirst => f.write_str("wheel-first"),
            Encoding::WheelOfSecond => f.write_str("wheel-second"),
            Encoding::Formation => f.write_str("formation"),
            Encoding::Multi { pivots } => write!(f, "multi ({} pivot)", pivots),
            Encoding::Box => f.write_str("box"),
        }
    }
}

/// Ticket type as sold: base type plus encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TicketType {
    Win,
    Place,
    BracketQuinella,
    Quinella,
    QuinellaWheel,
    Exacta,
    ExactaWheelOfFirst,
    QuinellaPlace,
    QuinellaPlaceWheel,
    QuinellaPlaceFormation,
    Trio,
    TrioWheelOfFirst,
    TrioWheelOfSecond,
    TrioFormation,
    TrioBox,
    Trifecta,
    TrifectaWheelOfFirst,
    TrifectaWheelOfSecond,
    TrifectaFormation,
    TrifectaWheelOfFirstMulti,
    TrifectaWheelOfSecondMulti,
}

impl TicketType {
    /// Order in which ticket types are consulted when narrowing picks,
    /// most decisive first.
    pub const PRIORITY: [TicketType; 21] = [
        TicketType::Win,
        TicketType::Exacta,
        TicketType::ExactaWheelOfFirst,
        TicketType::Trifecta,
        TicketType::TrifectaWheelOfFirst,
        TicketType::TrifectaWheelOfSecond,
        TicketType::TrifectaFormation,
        TicketType::TrifectaWheelOfFirstMulti,
        TicketType::TrifectaWheelOfSecondMulti,
        TicketType::QuinellaWheel,
        TicketType::QuinellaPlaceWheel,
        TicketType::Quinella,
        TicketType::QuinellaPlace,
        TicketType::QuinellaPlaceFormation,
        TicketType::TrioWheelOfFirst,
        TicketType::TrioWheelOfSecond,
        TicketType::Trio,
        TicketType::TrioFormation,
        TicketType::TrioBox,
        TicketType::Place,
        TicketType::BracketQuinella,
    ];

    /// Base ticket type this variant settles as.
    pub fn origin(&self) -> BaseTicketType {
        match self {
            TicketType::Win => BaseTicketType::Win,
            TicketType::Place => BaseTicketType::Place,
            TicketType::BracketQuinella => BaseTicketType::BracketQuinella,
            TicketType::Quinella | TicketType::QuinellaWheel => BaseTicketType::Quinella,
            TicketType::Exacta | TicketType::ExactaWheelOfFirst => BaseTicketType::Exacta,
            TicketType::QuinellaPlace
            | TicketType::QuinellaPlaceWheel
            | TicketType::QuinellaPlaceFormation => BaseTicketType::QuinellaPlace,
            TicketType::Trio
            | TicketType::TrioWheelOfFirst
            | TicketType::TrioWheelOfSecond
            | TicketType::TrioFormation
            | TicketType::TrioBox => BaseTicketType::Trio,
            TicketType::Trifecta
            | TicketType::TrifectaWheelOfFirst
            | TicketType::TrifectaWheelOfSecond
            | TicketType::TrifectaFormation
            | TicketType::TrifectaWheelOfFirstMulti
            | TicketType::TrifectaWheelOfSecondMulti => BaseTicketType::Trifecta,
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            TicketType::Win
            | TicketType::Place
            | TicketType::BracketQuinella
            | TicketType::Quinella
            | TicketType::Exacta
            | TicketType::QuinellaPlace
            | TicketType::Trio
            | TicketType::Trifecta => Encoding::Straight,
            TicketType::QuinellaWheel
            | TicketType::ExactaWheelOfFirst
            | TicketType::QuinellaPlaceWheel
            | TicketType::TrioWheelOfFirst
            | TicketType::TrifectaWheelOfFirst => Encoding::WheelOfFirst,
            TicketType::TrioWheelOfSecond | TicketType::TrifectaWheelOfSecond => {
                Encoding::WheelOfSecond
            }
            TicketType::QuinellaPlaceFormation
            | TicketType::TrioFormation
            | TicketType::TrifectaFormation => Encoding::Formation,
            TicketType::TrifectaWheelOfFirstMulti => Encoding::Multi { pivots: 1 },
            TicketType::TrifectaWheelOfSecondMulti => Encoding::Multi { pivots: 2 },
            TicketType::TrioBox => Encoding::Box,
        }
    }

    pub fn is_ordered(&self) -> bool {
        self.origin().is_ordered()
    }

    pub fn name(&self) -> &'static str {
        match self {
            TicketType::Win => "win",
            TicketType::Place => "place",
            TicketType::BracketQuinella => "bracket-quinella",
            TicketType::Quinella => "quinella",
            TicketType::QuinellaWheel => "quinella-wheel",
            TicketType::Exacta => "exacta",
            TicketType::ExactaWheelOfFirst => "exacta-wheel-first",
            TicketType::QuinellaPlace => "wide",
            TicketType::QuinellaPlaceWheel => "wide-wheel",
            TicketType::QuinellaPlaceFormation => "wide-formation",
            TicketType::Trio => "trio",
            TicketType::TrioWheelOfFirst => "trio-wheel-first",
            TicketType::TrioWheelOfSecond => "trio-wheel-second",
            TicketType::TrioFormation => "trio-formation",
            TicketType::TrioBox => "trio-box",
            TicketType::Trifecta => "trifecta",
            TicketType::TrifectaWheelOfFirst => "trifecta-wheel-first",
            TicketType::TrifectaWheelOfSecond => "trifecta-wheel-second",
            TicketType::TrifectaFormation => "trifecta-formation",
            TicketType::TrifectaWheelOfFirstMulti => "trifecta-wheel-first-multi",
            TicketType::TrifectaWheelOfSecondMulti => "trifecta-wheel-second-multi",
        }
    }

    /// Name as printed on JRA purchase histories.
    pub fn label(&self) -> &'static str {
        match self {
            TicketType::Win => "単勝",
            TicketType::Place => "複勝",
            TicketType::BracketQuinella => "枠連",
            TicketType::Quinella => "馬連",
            TicketType::QuinellaWheel => "馬連ながし",
            TicketType::Exacta => "馬単",
            TicketType::ExactaWheelOfFirst => "馬単1着ながし",
            TicketType::QuinellaPlace => "ワイド",
            TicketType::QuinellaPlaceWheel => "ワイドながし",
            TicketType::QuinellaPlaceFormation => "ワイドフォーメーション",
            TicketType::Trio => "三連複",
            TicketType::TrioWheelOfFirst => "三連複1頭軸ながし",
            TicketType::TrioWheelOfSecond => "三連複2頭軸ながし",
            TicketType::TrioFormation => "三連複フォーメーション",
            TicketType::TrioBox => "三連複ボックス",
            TicketType::Trifecta => "三連単",
            TicketType::TrifectaWheelOfFirst => "三連単1着ながし",
            TicketType::TrifectaWheelOfSecond => "三連単1・2着ながし",
            TicketType::TrifectaFormation => "三連単フォーメーション",
            TicketType::TrifectaWheelOfFirstMulti => "三連単1頭軸ながしマルチ",
            TicketType::TrifectaWheelOfSecondMulti => "三連単2頭軸ながしマルチ",
        }
    }
}

impl fmt::Display for TicketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TicketType {
    type Err = UnknownTicketType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_name(s);
        if let Some(found) = TicketType::PRIORITY
            .into_iter()
            .find(|t| t.name() == key || t.label() == key)
        {
            return Ok(found);
        }

        // Romanized or long-form names of straight tickets
        let base = BaseTicketType::from_str(s)?;
        Ok(match base {
            BaseTicketType::Win => TicketType::Win,
            BaseTicketType::Place => TicketType::Place,
            BaseTicketType::BracketQuinella => TicketType::BracketQuinella,
            BaseTicketType::Quinella => TicketType::Quinella,
            BaseTicketType::Exacta => TicketType::Exacta,
            BaseTicketType::QuinellaPlace => TicketType::QuinellaPlace,
            BaseTicketType::Trio => TicketType::Trio,
            BaseTicketType::Trifecta => TicketType::Trifecta,
        })
    }
}

impl Serialize for TicketType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown ticket type: {0:?}")]
pub struct UnknownTicketType(pub String);

/// Lowercase, kebab-case, and 3連 spelled as 三連.
fn normalize_name(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(['_', ' '], "-")
        .replace("3連", "三連")
        .replace('１', "1")
        .replace('２', "2")
}

/// One elementary purchased bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub race_date: NaiveDate,
    pub racecourse: String,
    pub race_number: u8,
    pub bet_number: BetNumber,
    pub ticket_type: TicketType,
    pub hit: bool,
    pub payment: u64,
    pub payout: u64,
}

/// A ticket resolved to the race it was bought for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaceTicket {
    pub race_id: String,
    #[serde(flatten)]
    pub ticket: Ticket,
}

impl RaceTicket {
    pub fn new(race_id: impl Into<String>, ticket: Ticket) -> Self {
        Self {
            race_id: race_id.into(),
            ticket,
        }
    }
}

/// One row of a purchase history, before condensed notation is expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    pub race_date: NaiveDate,
    pub racecourse: String,
    pub race_number: u8,
    pub ticket_type: TicketType,
    /// Bet number as sold, possibly condensed (`03-05,07`).
    pub bet_number: String,
    pub hit: bool,
    /// Stake per elementary combination.
    pub stake: u64,
    pub payout: u64,
}

impl TicketRecord {
    /// Expand into elementary tickets.
    ///
    /// A hit on a condensed row is attributed to the combinations that match
    /// an official winning number; the payout is split evenly between them.
    /// When no combination matches, or the race has no result for the base
    /// type, every combination keeps the hit so settlement reports the
    /// inconsistency instead of losing the payout.
    pub fn expand(
        &self,
        expander: &Expander,
        payouts: Option<&PayoutIndex>,
    ) -> Result<Vec<Ticket>, ExpandError> {
        let bets = expander.expand(self.ticket_type, &self.bet_number)?;

        let winners: Vec<bool> = if !self.hit {
            vec![false; bets.len()]
        } else if bets.len() == 1 {
            vec![true]
        } else {
            let base = self.ticket_type.origin();
            let matched: Vec<bool> = bets
                .iter()
                .map(|bet| payouts.is_some_and(|p| p.is_winner(base, bet)))
                .collect();
            if matched.contains(&true) {
                matched
            } else {
                vec![true; bets.len()]
            }
        };

        let n_winners = winners.iter().filter(|w| **w).count() as u64;
        let (share, mut remainder) = if n_winners > 0 {
            (self.payout / n_winners, self.payout % n_winners)
        } else {
            (0, 0)
        };

        Ok(bets
            .into_iter()
            .zip(winners)
            .map(|(bet_number, hit)| {
                let payout = if hit {
                    let extra = std::mem::take(&mut remainder);
                    share + extra
                } else {
                    0
                };
                Ticket {
                    race_date: self.race_date,
                    racecourse: self.racecourse.clone(),
                    race_number: self.race_number,
                    bet_number,
                    ticket_type: self.ticket_type,
                    hit,
                    payment: self.stake,
                    payout,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payout::PayoutResult;

    fn record(ticket_type: TicketType, bet_number: &str, hit: bool, payout: u64) -> TicketRecord {
        TicketRecord {
            race_date: NaiveDate::from_ymd_opt(2024, 5, 26).unwrap(),
            racecourse: "東京".to_string(),
            race_number: 11,
            ticket_type,
            bet_number: bet_number.to_string(),
            hit,
            stake: 100,
            payout,
        }
    }

    #[test]
    fn test_every_variant_has_one_base() {
        for t in TicketType::PRIORITY {
            let base = t.origin();
            assert!(BaseTicketType::ALL.contains(&base));
            assert_eq!(t.is_ordered(), base.is_ordered());
        }
        assert_eq!(
            TicketType::TrifectaWheelOfFirstMulti.origin(),
            BaseTicketType::Trifecta
        );
        assert_eq!(TicketType::QuinellaPlaceWheel.origin(), BaseTicketType::QuinellaPlace);
    }

    #[test]
    fn test_priority_covers_all_variants_once() {
        let mut seen = std::collections::HashSet::new();
        for t in TicketType::PRIORITY {
            assert!(seen.insert(t), "{} listed twice", t);
        }
        assert_eq!(seen.len(), 21);
        assert_eq!(TicketType::PRIORITY[0], TicketType::Win);
        assert_eq!(TicketType::PRIORITY[20], TicketType::BracketQuinella);
    }

    #[test]
    fn test_ticket_type_parsing() {
        assert_eq!("win".parse::<TicketType>(), Ok(TicketType::Win));
        assert_eq!("単勝".parse::<TicketType>(), Ok(TicketType::Win));
        assert_eq!("umatan".parse::<TicketType>(), Ok(TicketType::Exacta));
        assert_eq!(
            "Trifecta_Wheel_First_Multi".parse::<TicketType>(),
            Ok(TicketType::TrifectaWheelOfFirstMulti)
        );
        assert_eq!(
            "3連複フォーメーション".parse::<TicketType>(),
            Ok(TicketType::TrioFormation)
        );
        assert_eq!("quinella-place".parse::<TicketType>(), Ok(TicketType::QuinellaPlace));
        assert!("pick-six".parse::<TicketType>().is_err());
    }

    #[test]
    fn test_encoding() {
        assert_eq!(TicketType::Trio.encoding(), Encoding::Straight);
        assert_eq!(
            TicketType::TrifectaWheelOfSecondMulti.encoding(),
            Encoding::Multi { pivots: 2 }
        );
        assert_eq!(TicketType::TrioBox.encoding(), Encoding::Box);
    }

    #[test]
    fn test_straight_record_keeps_hit() {
        let tickets = record(TicketType::Win, "5", true, 480)
            .expand(&Expander::default(), None)
            .unwrap();
        assert_eq!(tickets.len(), 1);
        assert!(tickets[0].hit);
        assert_eq!(tickets[0].payout, 480);
        assert_eq!(tickets[0].payment, 100);
    }

    #[test]
    fn test_condensed_hit_attributed_to_winning_combination() {
        let mut index = PayoutIndex::default();
        index.insert(
            PayoutResult::new(
                BaseTicketType::Exacta,
                vec!["03-07".parse().unwrap()],
                vec!["1520".to_string()],
                vec![4],
            )
            .unwrap(),
        );

        let tickets = record(TicketType::ExactaWheelOfFirst, "03-05,07,09", true, 1520)
            .expand(&Expander::default(), Some(&index))
            .unwrap();

        assert_eq!(tickets.len(), 3);
        let hits: Vec<_> = tickets.iter().filter(|t| t.hit).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].bet_number.to_string(), "03-07");
        assert_eq!(hits[0].payout, 1520);
        assert!(tickets.iter().all(|t| t.payment == 100));
    }

    #[test]
    fn test_condensed_hit_without_result_keeps_hit() {
        let tickets = record(TicketType::ExactaWheelOfFirst, "03-05,07", true, 1521)
            .expand(&Expander::default(), None)
            .unwrap();

        assert_eq!(tickets.len(), 2);
        assert!(tickets.iter().all(|t| t.hit));
        assert_eq!(tickets[0].payout, 761);
        assert_eq!(tickets[1].payout, 760);
    }

    #[test]
    fn test_condensed_hit_matching_no_winner_keeps_hit() {
        let mut index = PayoutIndex::default();
        index.insert(
            PayoutResult::new(
                BaseTicketType::Exacta,
                vec!["07-03".parse().unwrap()],
                vec!["2480".to_string()],
                vec![8],
            )
            .unwrap(),
        );

        let tickets = record(TicketType::ExactaWheelOfFirst, "03-05,07", true, 1520)
            .expand(&Expander::default(), Some(&index))
            .unwrap();
        assert!(tickets.iter().all(|t| t.hit));
        assert_eq!(tickets.iter().map(|t| t.payout).sum::<u64>(), 1520);
    }

    #[test]
    fn test_encoding_display() {
        assert_eq!(TicketType::TrioBox.encoding().to_string(), "box");
        assert_eq!(
            TicketType::TrifectaWheelOfFirstMulti.encoding().to_string(),
            "multi (1 pivot)"
        );
    }

    #[test]
    fn test_condensed_miss_has_no_payout() {
        let tickets = record(TicketType::TrioBox, "1,2,3,4", false, 0)
            .expand(&Expander::default(), None)
            .unwrap();
        assert_eq!(tickets.len(), 4);
        assert!(tickets.iter().all(|t| !t.hit && t.payout == 0));
    }
}
