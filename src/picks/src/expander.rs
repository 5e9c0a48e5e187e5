//! Expansion of condensed bet-number notation into elementary bets.
//!
//! Wheel (ながし), formation (フォーメーション), multi (マルチ) and box (ボックス)
//! tickets list their horses in groups. Groups are separated by the group
//! separator and values inside a group by the value separator, so with the
//! defaults a trifecta formation reads `01,02-02,03-03,04` and a wheel reads
//! `03-05,07` (pivot 3, challengers 5 and 7).

use std::collections::HashSet;

use crate::bet_number::{BetNumber, HorseNumber, Order};
use crate::error::ExpandError;
use crate::ticket::{BaseTicketType, TicketType};

type Result<T> = std::result::Result<T, ExpandError>;

/// Decodes condensed notation. Holds only the two separators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expander {
    group_separator: char,
    value_separator: char,
}

impl Default for Expander {
    fn default() -> Self {
        Self {
            group_separator: '-',
            value_separator: ',',
        }
    }
}

impl Expander {
    pub fn new(group_separator: char, value_separator: char) -> Self {
        Self {
            group_separator,
            value_separator,
        }
    }

    /// Expand a bet number of the given ticket type.
    pub fn expand(&self, ticket_type: TicketType, raw: &str) -> Result<Vec<BetNumber>> {
        match ticket_type {
            TicketType::Win
            | TicketType::Place
            | TicketType::BracketQuinella
            | TicketType::Quinella
            | TicketType::Exacta
            | TicketType::QuinellaPlace
            | TicketType::Trio
            | TicketType::Trifecta => Ok(vec![self.straight(ticket_type.origin(), raw)?]),
            TicketType::ExactaWheelOfFirst => self.exacta_wheel_of_first(raw),
            TicketType::QuinellaWheel | TicketType::QuinellaPlaceWheel => {
                self.quinella_place_wheel(raw)
            }
            TicketType::QuinellaPlaceFormation => self.quinella_place_formation(raw),
            TicketType::TrioWheelOfFirst => self.trio_wheel_of_first(raw),
            TicketType::TrioWheelOfSecond => self.trio_wheel_of_second(raw),
            TicketType::TrioFormation => self.trio_formation(raw),
            TicketType::TrioBox => self.trio_box(raw),
            TicketType::TrifectaWheelOfFirst => self.trifecta_wheel_of_first(raw),
            TicketType::TrifectaWheelOfSecond => self.trifecta_wheel_of_second(raw),
            TicketType::TrifectaFormation => self.trifecta_formation(raw),
            TicketType::TrifectaWheelOfFirstMulti | TicketType::TrifectaWheelOfSecondMulti => {
                self.trifecta_wheel_multi(raw)
            }
        }
    }

    /// A single elementary bet, written with either separator.
    pub fn straight(&self, base: BaseTicketType, raw: &str) -> Result<BetNumber> {
        let horses = raw
            .split([self.group_separator, self.value_separator])
            .map(|token| self.parse_value(token))
            .collect::<Result<Vec<_>>>()?;

        if horses.len() != base.arity() {
            return Err(ExpandError::unsupported(
                raw,
                format!("{} takes {} horses, got {}", base, base.arity(), horses.len()),
            ));
        }

        Ok(BetNumber::new(horses, base.order())?)
    }

    /// 馬単1着ながし: pivot first, each challenger second.
    pub fn exacta_wheel_of_first(&self, raw: &str) -> Result<Vec<BetNumber>> {
        let (pivot, challengers) = self.single_pivot(raw)?;
        challengers
            .iter()
            .map(|&c| {
                BetNumber::new(vec![pivot, c], Order::Ordered).map_err(ExpandError::from)
            })
            .collect()
    }

    /// ワイドながし / 馬連ながし: pivot paired with each challenger.
    pub fn quinella_place_wheel(&self, raw: &str) -> Result<Vec<BetNumber>> {
        let (pivot, challengers) = self.single_pivot(raw)?;
        challengers
            .iter()
            .map(|&c| {
                BetNumber::new(vec![pivot, c], Order::Unordered).map_err(ExpandError::from)
            })
            .collect()
    }

    /// ワイドフォーメーション: one horse from each of two groups.
    pub fn quinella_place_formation(&self, raw: &str) -> Result<Vec<BetNumber>> {
        let groups = self.groups_exact(raw, 2)?;

        let mut bets = Vec::new();
        let mut seen = HashSet::new();
        for &x in &groups[0] {
            for &y in &groups[1] {
                if x == y {
                    continue;
                }
                let bet = BetNumber::new(vec![x, y], Order::Unordered)?;
                if seen.insert(bet.clone()) {
                    bets.push(bet);
                }
            }
        }
        Ok(bets)
    }

    /// 三連複フォーメーション: one horse from each of three groups, as sets.
    pub fn trio_formation(&self, raw: &str) -> Result<Vec<BetNumber>> {
        self.formation(raw, Order::Unordered)
    }

    /// 三連複1頭軸ながし: pivot with every pair of challengers.
    pub fn trio_wheel_of_first(&self, raw: &str) -> Result<Vec<BetNumber>> {
        let (pivot, challengers) = self.single_pivot(raw)?;

        let mut bets = Vec::new();
        for i in 0..challengers.len() {
            for j in (i + 1)..challengers.len() {
                bets.push(BetNumber::new(
                    vec![pivot, challengers[i], challengers[j]],
                    Order::Unordered,
                )?);
            }
        }
        Ok(bets)
    }

    /// 三連複2頭軸ながし: both pivots with each challenger.
    pub fn trio_wheel_of_second(&self, raw: &str) -> Result<Vec<BetNumber>> {
        let ((first, second), challengers) = self.double_pivot(raw)?;
        challengers
            .iter()
            .map(|&c| {
                BetNumber::new(vec![first, second, c], Order::Unordered).map_err(ExpandError::from)
            })
            .collect()
    }

    /// 三連複ボックス: every three-horse set from one group.
    pub fn trio_box(&self, raw: &str) -> Result<Vec<BetNumber>> {
        let groups = self.groups_exact(raw, 1)?;
        let horses = &groups[0];
        if horses.len() < 3 {
            return Err(ExpandError::unsupported(raw, "box needs at least 3 horses"));
        }

        let mut bets = Vec::new();
        for i in 0..horses.len() {
            for j in (i + 1)..horses.len() {
                for k in (j + 1)..horses.len() {
                    bets.push(BetNumber::new(
                        vec![horses[i], horses[j], horses[k]],
                        Order::Unordered,
                    )?);
                }
            }
        }
        Ok(bets)
    }

    /// 三連単フォーメーション: one horse from each positional group, in order.
    pub fn trifecta_formation(&self, raw: &str) -> Result<Vec<BetNumber>> {
        self.formation(raw, Order::Ordered)
    }

    /// 三連単1着ながし: pivot first, every ordered challenger pair behind it.
    pub fn trifecta_wheel_of_first(&self, raw: &str) -> Result<Vec<BetNumber>> {
        let (pivot, challengers) = self.single_pivot(raw)?;

        let mut bets = Vec::new();
        for (i, &second) in challengers.iter().enumerate() {
            for (j, &third) in challengers.iter().enumerate() {
                if i == j {
                    continue;
                }
                bets.push(BetNumber::new(vec![pivot, second, third], Order::Ordered)?);
            }
        }
        Ok(bets)
    }

    /// 三連単1・2着ながし: pivots first and second, each challenger third.
    pub fn trifecta_wheel_of_second(&self, raw: &str) -> Result<Vec<BetNumber>> {
        let ((first, second), challengers) = self.double_pivot(raw)?;
        challengers
            .iter()
            .map(|&c| {
                BetNumber::new(vec![first, second, c], Order::Ordered).map_err(ExpandError::from)
            })
            .collect()
    }

    /// 三連単ながしマルチ with one or two pivots.
    ///
    /// One pivot: for each ordered challenger pair (c1, c2) the pivot takes
    /// each position once: (p, c1, c2), (c1, p, c2), (c2, c1, p).
    /// Two pivots: every permutation of {p1, p2, c} for each challenger.
    pub fn trifecta_wheel_multi(&self, raw: &str) -> Result<Vec<BetNumber>> {
        let groups = self.groups_exact(raw, 2)?;
        let (pivots, challengers) = (&groups[0], &groups[1]);

        let mut bets = Vec::new();
        match pivots.as_slice() {
            [p] => {
                let p = *p;
                for (i, &c1) in challengers.iter().enumerate() {
                    for (j, &c2) in challengers.iter().enumerate() {
                        if i == j {
                            continue;
                        }
                        for horses in [[p, c1, c2], [c1, p, c2], [c2, c1, p]] {
                            bets.push(BetNumber::new(horses.to_vec(), Order::Ordered)?);
                        }
                    }
                }
            }
            [p1, p2] => {
                let (p1, p2) = (*p1, *p2);
                for &c in challengers {
                    for horses in [
                        [p1, p2, c],
                        [p1, c, p2],
                        [p2, p1, c],
                        [p2, c, p1],
                        [c, p1, p2],
                        [c, p2, p1],
                    ] {
                        bets.push(BetNumber::new(horses.to_vec(), Order::Ordered)?);
                    }
                }
            }
            _ => {
                return Err(ExpandError::unsupported(
                    raw,
                    format!("multi takes 1 or 2 pivots, got {}", pivots.len()),
                ))
            }
        }
        Ok(bets)
    }

    /// Three-group formation with pairwise-distinct picks, deduplicated in
    /// first-seen order. Unordered bets dedup on their ascending form.
    fn formation(&self, raw: &str, order: Order) -> Result<Vec<BetNumber>> {
        let groups = self.groups_exact(raw, 3)?;

        let mut bets = Vec::new();
        let mut seen = HashSet::new();
        for &x in &groups[0] {
            for &y in &groups[1] {
                if y == x {
                    continue;
                }
                for &z in &groups[2] {
                    if z == x || z == y {
                        continue;
                    }
                    let bet = BetNumber::new(vec![x, y, z], order)?;
                    if seen.insert(bet.clone()) {
                        bets.push(bet);
                    }
                }
            }
        }
        Ok(bets)
    }

    fn single_pivot(&self, raw: &str) -> Result<(HorseNumber, Vec<HorseNumber>)> {
        let mut groups = self.groups_exact(raw, 2)?;
        let challengers = groups.pop().unwrap_or_default();
        match groups[0].as_slice() {
            [pivot] => Ok((*pivot, challengers)),
            pivots => Err(ExpandError::unsupported(
                raw,
                format!("expected 1 pivot, got {}", pivots.len()),
            )),
        }
    }

    fn double_pivot(&self, raw: &str) -> Result<((HorseNumber, HorseNumber), Vec<HorseNumber>)> {
        let mut groups = self.groups_exact(raw, 2)?;
        let challengers = groups.pop().unwrap_or_default();
        match groups[0].as_slice() {
            [first, second] => Ok(((*first, *second), challengers)),
            pivots => Err(ExpandError::unsupported(
                raw,
                format!("expected 2 pivots, got {}", pivots.len()),
            )),
        }
    }

    fn groups_exact(&self, raw: &str, expected: usize) -> Result<Vec<Vec<HorseNumber>>> {
        let groups = raw
            .split(self.group_separator)
            .map(|group| {
                group
                    .split(self.value_separator)
                    .map(|token| self.parse_value(token))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        if groups.len() != expected {
            return Err(ExpandError::unsupported(
                raw,
                format!("expected {} groups, got {}", expected, groups.len()),
            ));
        }
        Ok(groups)
    }

    fn parse_value(&self, token: &str) -> Result<HorseNumber> {
        match token.trim().parse::<HorseNumber>() {
            Ok(h) if h > 0 => Ok(h),
            _ => Err(ExpandError::Parse {
                token: token.to_string(),
            }),
        }
    }
}
