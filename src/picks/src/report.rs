//! Per-race report rows built from inference outcomes.

use chrono::NaiveDate;
use serde::Serialize;

use crate::bet_number::HorseNumber;
use crate::error::InferenceError;
use crate::inference::{EventInput, InferenceOutcome};
use crate::race::RaceResult;

/// One reporting row per race.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRow {
    pub race_id: String,
    pub race_date: NaiveDate,
    pub racecourse: String,
    pub race_number: u8,
    /// Horse that finished first
    pub winner: Option<HorseNumber>,
    pub primary_number: Option<HorseNumber>,
    pub primary_name: Option<String>,
    pub primary_jockey: Option<String>,
    pub secondary_number: Option<HorseNumber>,
    pub secondary_name: Option<String>,
    pub secondary_jockey: Option<String>,
    pub ticket_count: usize,
    pub total_payment: u64,
    pub total_payout: u64,
    pub matched_tickets: usize,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EventRow {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    pub fn is_complete(&self) -> bool {
        self.primary_number.is_some() && self.secondary_number.is_some()
    }
}

fn describe(race: &RaceResult, horse: Option<HorseNumber>) -> (Option<String>, Option<String>) {
    match horse.and_then(|h| race.entry(h)) {
        Some(entry) => (Some(entry.horse_name.clone()), entry.jockey_name.clone()),
        None => (None, None),
    }
}

/// Build the row for one race. A failed inference yields a row with the
/// error and no picks.
pub fn build_row(
    input: &EventInput,
    outcome: &Result<InferenceOutcome, InferenceError>,
) -> EventRow {
    let race = &input.race;
    let (primary, secondary, matched, status, error) = match outcome {
        Ok(outcome) => (
            outcome.primary,
            outcome.secondary,
            outcome.matched_tickets.len(),
            outcome.status.to_string(),
            None,
        ),
        Err(e) => (None, None, 0, "error".to_string(), Some(e.to_string())),
    };
    let (primary_name, primary_jockey) = describe(race, primary);
    let (secondary_name, secondary_jockey) = describe(race, secondary);

    EventRow {
        race_id: race.race_id.clone(),
        race_date: race.race_date,
        racecourse: race.racecourse.clone(),
        race_number: race.race_number,
        winner: race.finishing_order().first().copied(),
        primary_number: primary,
        primary_name,
        primary_jockey,
        secondary_number: secondary,
        secondary_name,
        secondary_jockey,
        ticket_count: input.tickets.len(),
        total_payment: input.total_payment(),
        total_payout: input.total_payout(),
        matched_tickets: matched,
        status,
        error,
    }
}

/// Totals over all rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub events: usize,
    pub complete: usize,
    pub failed: usize,
    pub primary_won: usize,
    pub total_payment: u64,
    pub total_payout: u64,
}

impl Summary {
    pub fn from_rows(rows: &[EventRow]) -> Self {
        let mut summary = Summary {
            events: rows.len(),
            ..Default::default()
        };
        for row in rows {
            if row.is_failed() {
                summary.failed += 1;
            } else if row.is_complete() {
                summary.complete += 1;
            }
            if row.primary_number.is_some() && row.primary_number == row.winner {
                summary.primary_won += 1;
            }
            summary.total_payment += row.total_payment;
            summary.total_payout += row.total_payout;
        }
        summary
    }

    /// Payout over payment; 0 when nothing was staked
    pub fn return_rate(&self) -> f64 {
        if self.total_payment == 0 {
            0.0
        } else {
            self.total_payout as f64 / self.total_payment as f64
        }
    }
}

/// Rows plus summary, the JSON output shape.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub rows: Vec<EventRow>,
    pub summary: Summary,
}

impl Report {
    pub fn new(rows: Vec<EventRow>) -> Self {
        let summary = Summary::from_rows(&rows);
        Self { rows, summary }
    }
}

fn pick_cell(number: Option<HorseNumber>, name: &Option<String>) -> String {
    match (number, name) {
        (Some(h), Some(name)) => format!("{:02} {}", h, name),
        (Some(h), None) => format!("{:02}", h),
        (None, _) => "-".to_string(),
    }
}

pub fn print_report_table(report: &Report) {
    println!("=== Pick Inference ===");
    println!();
    println!(
        "  {:14} {:10} {:6} {:>3} {:>3}  {:20} {:20} {:>5} {:>9} {:>9} {:>4}  {}",
        "Race",
        "Date",
        "Course",
        "R",
        "1st",
        "本命",
        "対抗",
        "Bets",
        "Payment",
        "Payout",
        "Hits",
        "Status"
    );
    println!("  {}", "-".repeat(128));
    for row in &report.rows {
        let status = match &row.error {
            Some(e) => format!("error: {}", e),
            None => row.status.clone(),
        };
        println!(
            "  {:14} {:10} {:6} {:>3} {:>3}  {:20} {:20} {:>5} {:>9} {:>9} {:>4}  {}",
            row.race_id,
            row.race_date.to_string(),
            row.racecourse,
            row.race_number,
            row.winner.map(|h| h.to_string()).unwrap_or_else(|| "-".into()),
            pick_cell(row.primary_number, &row.primary_name),
            pick_cell(row.secondary_number, &row.secondary_name),
            row.ticket_count,
            row.total_payment,
            row.total_payout,
            row.matched_tickets,
            status
        );
    }
    println!();

    let summary = &report.summary;
    println!("Summary:");
    println!("  Events:        {}", summary.events);
    println!("  Complete:      {}", summary.complete);
    println!("  Failed:        {}", summary.failed);
    println!("  Primary Won:   {}", summary.primary_won);
    println!("  Total Bet:     ¥{}", summary.total_payment);
    println!("  Total Return:  ¥{}", summary.total_payout);
    println!("  Return Rate:   {:.2}%", summary.return_rate() * 100.0);
}
