//! CSV loading of race results, payouts and ticket history.
//!
//! Every column is read as a string and parsed here, so a stray value in one
//! row is reported with its row number instead of failing dtype inference.

use anyhow::{anyhow, bail, Context};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

use crate::bet_number::{BetNumber, HorseNumber};
use crate::expander::Expander;
use crate::inference::EventInput;
use crate::payout::{PayoutIndex, PayoutResult};
use crate::race::{RaceEntry, RaceResult};
use crate::ticket::{BaseTicketType, RaceTicket, TicketRecord, TicketType};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn read_csv(path: &Path) -> anyhow::Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .with_context(|| format!("failed to read {}", path.display()))
}

fn column<'a>(df: &'a DataFrame, name: &str) -> anyhow::Result<&'a StringChunked> {
    let col = df
        .column(name)
        .with_context(|| format!("missing column `{}`", name))?;
    Ok(col.str()?)
}

fn cell(col: &StringChunked, i: usize) -> &str {
    col.get(i).map(str::trim).unwrap_or("")
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("invalid date `{}`", s))
}

fn parse_number<T: std::str::FromStr>(s: &str, what: &str) -> anyhow::Result<T> {
    s.parse()
        .map_err(|_| anyhow!("invalid {} `{}`", what, s))
}

/// Blank or non-numeric cells (取消, 中止, ...) read as None.
fn parse_optional(s: &str) -> Option<u8> {
    s.parse().ok().filter(|v| *v > 0)
}

fn parse_flag(s: &str) -> anyhow::Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "的中" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => bail!("invalid hit flag `{}`", other),
    }
}

/// Load race results, one row per entrant.
///
/// Expected columns: race_id, race_date, racecourse, race_number,
/// horse_number, horse_name, jockey_name, finish_position, popularity
///
/// Races are returned ordered by date, racecourse and race number.
pub fn load_race_results<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<RaceResult>> {
    let path = path.as_ref();
    let df = read_csv(path)?;

    let race_ids = column(&df, "race_id")?;
    let dates = column(&df, "race_date")?;
    let courses = column(&df, "racecourse")?;
    let race_numbers = column(&df, "race_number")?;
    let horse_numbers = column(&df, "horse_number")?;
    let horse_names = column(&df, "horse_name")?;
    let jockeys = column(&df, "jockey_name")?;
    let finishes = column(&df, "finish_position")?;
    let popularities = column(&df, "popularity")?;

    let mut races: HashMap<String, RaceResult> = HashMap::new();

    for i in 0..df.height() {
        let row = || format!("{} row {}", path.display(), i + 1);
        let race_id = cell(race_ids, i);
        if race_id.is_empty() {
            bail!("{}: empty race_id", row());
        }

        let horse_number: HorseNumber =
            parse_number(cell(horse_numbers, i), "horse number").with_context(row)?;
        let jockey = cell(jockeys, i);
        let entry = RaceEntry {
            horse_number,
            horse_name: cell(horse_names, i).to_string(),
            jockey_name: (!jockey.is_empty()).then(|| jockey.to_string()),
            finish_position: parse_optional(cell(finishes, i)),
            popularity: parse_optional(cell(popularities, i)),
        };

        if let Some(race) = races.get_mut(race_id) {
            race.entries.push(entry);
            continue;
        }

        let race = RaceResult {
            race_id: race_id.to_string(),
            race_date: parse_date(cell(dates, i)).with_context(row)?,
            racecourse: cell(courses, i).to_string(),
            race_number: parse_number(cell(race_numbers, i), "race number").with_context(row)?,
            entries: vec![entry],
        };
        races.insert(race.race_id.clone(), race);
    }

    let mut races: Vec<RaceResult> = races.into_values().collect();
    races.sort_by(|a, b| {
        (a.race_date, &a.racecourse, a.race_number, &a.race_id).cmp(&(
            b.race_date,
            &b.racecourse,
            b.race_number,
            &b.race_id,
        ))
    });

    info!("Loaded {} races from {}", races.len(), path.display());
    Ok(races)
}

#[derive(Default)]
struct PayoutColumns {
    numbers: Vec<BetNumber>,
    odds: Vec<String>,
    popularity: Vec<u32>,
}

/// Load official payouts, one row per winning combination.
///
/// Expected columns: race_id, ticket_type, bet_number, odds, popularity
pub fn load_payouts<P: AsRef<Path>>(path: P) -> anyhow::Result<HashMap<String, PayoutIndex>> {
    let path = path.as_ref();
    let df = read_csv(path)?;

    let race_ids = column(&df, "race_id")?;
    let ticket_types = column(&df, "ticket_type")?;
    let bet_numbers = column(&df, "bet_number")?;
    let odds = column(&df, "odds")?;
    let popularities = column(&df, "popularity")?;

    // race_id -> base -> parallel columns, in file order
    let mut grouped: HashMap<String, HashMap<BaseTicketType, PayoutColumns>> = HashMap::new();

    for i in 0..df.height() {
        let row = || format!("{} row {}", path.display(), i + 1);
        let base: BaseTicketType = cell(ticket_types, i).parse().with_context(row)?;
        let number = BetNumber::parse_as(cell(bet_numbers, i), base.order()).with_context(row)?;
        if number.len() != base.arity() {
            bail!("{}: {} is not a {} number", row(), number, base);
        }

        let columns = grouped
            .entry(cell(race_ids, i).to_string())
            .or_default()
            .entry(base)
            .or_default();
        columns.numbers.push(number);
        columns.odds.push(cell(odds, i).to_string());
        columns
            .popularity
            .push(parse_number(cell(popularities, i), "popularity").with_context(row)?);
    }

    let mut indexes = HashMap::with_capacity(grouped.len());
    for (race_id, by_base) in grouped {
        let mut index = PayoutIndex::default();
        for (base, columns) in by_base {
            let result =
                PayoutResult::new(base, columns.numbers, columns.odds, columns.popularity)
                    .with_context(|| format!("race {}", race_id))?;
            index.insert(result);
        }
        indexes.insert(race_id, index);
    }

    info!("Loaded payouts for {} races from {}", indexes.len(), path.display());
    Ok(indexes)
}

/// Load the ticket history as sold.
///
/// Expected columns: race_date, racecourse, race_number, ticket_type,
/// bet_number, hit, stake, payout
///
/// Malformed rows are skipped with a warning.
pub fn load_ticket_records<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<TicketRecord>> {
    let path = path.as_ref();
    let df = read_csv(path)?;

    let dates = column(&df, "race_date")?;
    let courses = column(&df, "racecourse")?;
    let race_numbers = column(&df, "race_number")?;
    let ticket_types = column(&df, "ticket_type")?;
    let bet_numbers = column(&df, "bet_number")?;
    let hits = column(&df, "hit")?;
    let stakes = column(&df, "stake")?;
    let payouts = column(&df, "payout")?;

    let mut records = Vec::with_capacity(df.height());

    for i in 0..df.height() {
        let parsed = (|| -> anyhow::Result<TicketRecord> {
            let ticket_type: TicketType = cell(ticket_types, i).parse()?;
            let payout = cell(payouts, i);
            Ok(TicketRecord {
                race_date: parse_date(cell(dates, i))?,
                racecourse: cell(courses, i).to_string(),
                race_number: parse_number(cell(race_numbers, i), "race number")?,
                ticket_type,
                bet_number: cell(bet_numbers, i).to_string(),
                hit: parse_flag(cell(hits, i))?,
                stake: parse_number(cell(stakes, i), "stake")?,
                payout: if payout.is_empty() {
                    0
                } else {
                    parse_number(payout, "payout")?
                },
            })
        })();

        match parsed {
            Ok(record) => records.push(record),
            Err(e) => warn!("{} row {}: skipped: {:#}", path.display(), i + 1, e),
        }
    }

    info!("Loaded {} ticket rows from {}", records.len(), path.display());
    Ok(records)
}

/// Assemble one event per race that has tickets.
///
/// Ticket rows are matched to races by date, racecourse and race number and
/// expanded into elementary tickets. Rows that match no race or fail to
/// expand are skipped with a warning.
pub fn build_events(
    races: Vec<RaceResult>,
    mut payouts: HashMap<String, PayoutIndex>,
    records: &[TicketRecord],
    expander: &Expander,
) -> Vec<EventInput> {
    let keys: HashMap<(NaiveDate, &str, u8), &str> = races
        .iter()
        .map(|r| {
            (
                (r.race_date, r.racecourse.as_str(), r.race_number),
                r.race_id.as_str(),
            )
        })
        .collect();

    let mut tickets: HashMap<String, Vec<RaceTicket>> = HashMap::new();
    for record in records {
        let key = (
            record.race_date,
            record.racecourse.as_str(),
            record.race_number,
        );
        let Some(&race_id) = keys.get(&key) else {
            warn!(
                "No race for {} {} {}R; ticket {} {} skipped",
                record.race_date,
                record.racecourse,
                record.race_number,
                record.ticket_type,
                record.bet_number
            );
            continue;
        };

        match record.expand(expander, payouts.get(race_id)) {
            Ok(expanded) => tickets
                .entry(race_id.to_string())
                .or_default()
                .extend(expanded.into_iter().map(|t| RaceTicket::new(race_id, t))),
            Err(e) => warn!(
                race_id,
                "Ticket {} {} skipped: {}", record.ticket_type, record.bet_number, e
            ),
        }
    }

    let events: Vec<EventInput> = races
        .into_iter()
        .filter_map(|race| {
            let tickets = tickets.remove(&race.race_id)?;
            let payouts = payouts.remove(&race.race_id).unwrap_or_default();
            Some(EventInput {
                race,
                payouts,
                tickets,
            })
        })
        .collect();

    info!("Built {} events", events.len());
    events
}

/// Load all three sources and build events.
pub fn load_events(
    races: &Path,
    payouts: &Path,
    tickets: &Path,
    expander: &Expander,
) -> anyhow::Result<Vec<EventInput>> {
    let races = load_race_results(races)?;
    let payouts = load_payouts(payouts)?;
    let records = load_ticket_records(tickets)?;
    Ok(build_events(races, payouts, &records, expander))
}
