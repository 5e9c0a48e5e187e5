//! Narrowing state of the primary and secondary picks.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use crate::bet_number::HorseNumber;

/// Which pick is being narrowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,   // 本命
    Secondary, // 対抗
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => f.write_str("primary"),
            Role::Secondary => f.write_str("secondary"),
        }
    }
}

/// State of one pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "horses", rename_all = "lowercase")]
pub enum RoleStatus {
    #[default]
    Unresolved,
    Candidates(BTreeSet<HorseNumber>),
    Resolved(HorseNumber),
}

impl RoleStatus {
    /// State after scoring: no horse, one horse, or a tie.
    pub fn from_candidates(candidates: BTreeSet<HorseNumber>) -> Self {
        let mut iter = candidates.iter();
        match (iter.next(), iter.next()) {
            (None, _) => RoleStatus::Unresolved,
            (Some(&only), None) => RoleStatus::Resolved(only),
            _ => RoleStatus::Candidates(candidates),
        }
    }

    pub fn resolved(&self) -> Option<HorseNumber> {
        match self {
            RoleStatus::Resolved(h) => Some(*h),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, RoleStatus::Resolved(_))
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, RoleStatus::Unresolved)
    }

    /// Add horses demoted from the other pick to this pool.
    ///
    /// A resolved pick is left alone; an unresolved one becomes a candidate
    /// pool even when only one horse is added.
    pub fn absorb(&mut self, horses: impl IntoIterator<Item = HorseNumber>) {
        let horses: BTreeSet<HorseNumber> = horses.into_iter().collect();
        if horses.is_empty() {
            return;
        }
        match self {
            RoleStatus::Resolved(_) => {}
            RoleStatus::Unresolved => *self = RoleStatus::Candidates(horses),
            RoleStatus::Candidates(pool) => pool.extend(horses),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoleStatus::Unresolved => "unresolved",
            RoleStatus::Candidates(_) => "candidates",
            RoleStatus::Resolved(_) => "resolved",
        }
    }
}

/// Combined state of both picks for one race.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PickStatus {
    pub primary: RoleStatus,
    pub secondary: RoleStatus,
}

impl PickStatus {
    pub fn is_complete(&self) -> bool {
        self.primary.is_resolved() && self.secondary.is_resolved()
    }

    pub fn is_untouched(&self) -> bool {
        self.primary.is_unresolved() && self.secondary.is_unresolved()
    }
}

impl fmt::Display for PickStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.primary.label(), self.secondary.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_candidates() {
        assert_eq!(RoleStatus::from_candidates(BTreeSet::new()), RoleStatus::Unresolved);
        assert_eq!(
            RoleStatus::from_candidates(BTreeSet::from([7])),
            RoleStatus::Resolved(7)
        );
        assert_eq!(
            RoleStatus::from_candidates(BTreeSet::from([2, 6])),
            RoleStatus::Candidates(BTreeSet::from([2, 6]))
        );
    }

    #[test]
    fn test_absorb() {
        let mut status = RoleStatus::Unresolved;
        status.absorb([4]);
        assert_eq!(status, RoleStatus::Candidates(BTreeSet::from([4])));

        status.absorb([1, 4]);
        assert_eq!(status, RoleStatus::Candidates(BTreeSet::from([1, 4])));

        let mut resolved = RoleStatus::Resolved(3);
        resolved.absorb([5]);
        assert_eq!(resolved, RoleStatus::Resolved(3));

        let mut untouched = RoleStatus::Unresolved;
        untouched.absorb([]);
        assert!(untouched.is_unresolved());
    }

    #[test]
    fn test_pick_status() {
        let mut status = PickStatus::default();
        assert!(status.is_untouched());
        assert!(!status.is_complete());

        status.primary = RoleStatus::Resolved(5);
        assert!(!status.is_untouched());
        status.secondary = RoleStatus::Resolved(3);
        assert!(status.is_complete());
        assert_eq!(status.secondary.resolved(), Some(3));
        assert_eq!(status.to_string(), "resolved/resolved");
    }
}
