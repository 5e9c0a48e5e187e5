//! Race results: entrants, finishing order and popularity.

use chrono::NaiveDate;

use crate::bet_number::HorseNumber;

/// One entrant of a finished race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceEntry {
    pub horse_number: HorseNumber,
    pub horse_name: String,
    pub jockey_name: Option<String>,
    /// None for scratched or non-finishing horses
    pub finish_position: Option<u8>,
    pub popularity: Option<u8>,
}

/// Result of one race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceResult {
    pub race_id: String,
    pub race_date: NaiveDate,
    pub racecourse: String,
    pub race_number: u8,
    pub entries: Vec<RaceEntry>,
}

impl RaceResult {
    pub fn entry(&self, horse: HorseNumber) -> Option<&RaceEntry> {
        self.entries.iter().find(|e| e.horse_number == horse)
    }

    /// Horse numbers by ascending popularity rank.
    ///
    /// Unranked horses come last; ties fall back to finishing position and
    /// then horse number, so the order never depends on input order.
    pub fn popularity_order(&self) -> Vec<HorseNumber> {
        let mut entries: Vec<&RaceEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| {
            (
                e.popularity.unwrap_or(u8::MAX),
                e.finish_position.unwrap_or(u8::MAX),
                e.horse_number,
            )
        });
        entries.into_iter().map(|e| e.horse_number).collect()
    }

    /// Horse numbers in finishing order; non-finishers are left out.
    pub fn finishing_order(&self) -> Vec<HorseNumber> {
        let mut finishers: Vec<&RaceEntry> = self
            .entries
            .iter()
            .filter(|e| e.finish_position.is_some())
            .collect();
        finishers.sort_by_key(|e| (e.finish_position, e.horse_number));
        finishers.into_iter().map(|e| e.horse_number).collect()
    }
}

#[cfg(test)]
pub(crate) fn entry(horse_number: HorseNumber, finish: u8, popularity: u8) -> RaceEntry {
    RaceEntry {
        horse_number,
        horse_name: format!("Horse {}", horse_number),
        jockey_name: Some(format!("Jockey {}", horse_number)),
        finish_position: Some(finish),
        popularity: Some(popularity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn race() -> RaceResult {
        RaceResult {
            race_id: "202405020811".to_string(),
            race_date: NaiveDate::from_ymd_opt(2024, 5, 26).unwrap(),
            racecourse: "東京".to_string(),
            race_number: 11,
            entries: vec![
                entry(2, 1, 3),
                entry(6, 3, 1),
                entry(9, 2, 2),
                RaceEntry {
                    horse_number: 4,
                    horse_name: "Scratched".to_string(),
                    jockey_name: None,
                    finish_position: None,
                    popularity: None,
                },
            ],
        }
    }

    #[test]
    fn test_popularity_order() {
        assert_eq!(race().popularity_order(), vec![6, 9, 2, 4]);
    }

    #[test]
    fn test_finishing_order() {
        assert_eq!(race().finishing_order(), vec![2, 9, 6]);
    }

    #[test]
    fn test_entry_lookup() {
        let race = race();
        assert_eq!(race.entry(9).unwrap().horse_name, "Horse 9");
        assert!(race.entry(13).is_none());
    }
}
