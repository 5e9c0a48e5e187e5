//! CLI commands for keiba-picks.
//!
//! `expand` decodes one condensed bet number; `infer` runs pick inference
//! over CSV exports of races, payouts and ticket history.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::inference::PickEngine;
use crate::loader::load_events;
use crate::report::{build_row, print_report_table, Report};
use crate::ticket::TicketType;

#[derive(Parser)]
#[command(name = "keiba-picks")]
#[command(version, about = "Keiba picks: infer 本命/対抗 from betting history", long_about = None)]
pub struct Cli {
    /// Config file (defaults to ./config.* when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Expand a condensed bet number into elementary bets
    Expand {
        /// Ticket type (e.g. trio-box, 三連単フォーメーション)
        #[arg(value_name = "TICKET_TYPE")]
        ticket_type: String,

        /// Bet number as printed (e.g. 01,02-02,03-03,04)
        #[arg(value_name = "NOTATION")]
        notation: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Infer primary and secondary picks for every race with tickets
    Infer {
        /// Race results CSV
        #[arg(long)]
        races: PathBuf,

        /// Payouts CSV
        #[arg(long)]
        payouts: PathBuf,

        /// Ticket history CSV
        #[arg(long)]
        tickets: PathBuf,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Low-confidence threshold override for lone win tickets
        #[arg(long)]
        threshold: Option<f64>,
    },
}

/// Print the elementary bets of one ticket.
pub fn run_expand(
    config: &AppConfig,
    ticket_type: String,
    notation: String,
    format: String,
) -> anyhow::Result<()> {
    let ticket_type: TicketType = ticket_type.parse()?;
    let bets = config
        .notation
        .expander()
        .expand(ticket_type, &notation)
        .with_context(|| format!("cannot expand {} {}", ticket_type, notation))?;

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&bets)?),
        "text" => {
            eprintln!(
                "{} ({}, {}): {} combinations",
                ticket_type.label(),
                ticket_type.origin(),
                ticket_type.encoding(),
                bets.len()
            );
            for bet in &bets {
                println!("{}", bet);
            }
        }
        _ => bail!("Unknown format: {}", format),
    }
    Ok(())
}

/// Run inference over CSV inputs and print the report.
pub fn run_infer(
    mut config: AppConfig,
    races: PathBuf,
    payouts: PathBuf,
    tickets: PathBuf,
    format: String,
    threshold: Option<f64>,
) -> anyhow::Result<()> {
    // Override with CLI args
    if let Some(t) = threshold {
        config.inference.low_confidence_ratio = t;
        config.validate()?;
    }

    let expander = config.notation.expander();
    let events = load_events(&races, &payouts, &tickets, &expander)?;
    let engine = PickEngine::new(&config.inference);

    let rows = events
        .iter()
        .map(|event| {
            let outcome = engine.infer(event);
            if let Err(e) = &outcome {
                warn!(race_id = event.race_id(), "Inference failed: {}", e);
            }
            build_row(event, &outcome)
        })
        .collect();
    let report = Report::new(rows);
    info!(
        events = report.summary.events,
        complete = report.summary.complete,
        failed = report.summary.failed,
        "Inference finished"
    );

    match format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "table" => print_report_table(&report),
        _ => {
            eprintln!("Unknown format: {}. Using JSON.", format);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expand() {
        let cli = Cli::try_parse_from(["keiba-picks", "expand", "trio-box", "1,2,3,4"]).unwrap();
        match cli.command {
            Commands::Expand {
                ticket_type,
                notation,
                format,
            } => {
                assert_eq!(ticket_type, "trio-box");
                assert_eq!(notation, "1,2,3,4");
                assert_eq!(format, "text");
            }
            _ => panic!("expected expand"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_infer() {
        let cli = Cli::try_parse_from([
            "keiba-picks",
            "infer",
            "--races",
            "races.csv",
            "--payouts",
            "payouts.csv",
            "--tickets",
            "tickets.csv",
            "--threshold",
            "0.2",
            "--config",
            "picks.toml",
        ])
        .unwrap();
        match cli.command {
            Commands::Infer {
                races, threshold, format, ..
            } => {
                assert_eq!(races, PathBuf::from("races.csv"));
                assert_eq!(threshold, Some(0.2));
                assert_eq!(format, "table");
            }
            _ => panic!("expected infer"),
        }
        assert_eq!(cli.config, Some(PathBuf::from("picks.toml")));
    }

    #[test]
    fn test_infer_requires_inputs() {
        assert!(Cli::try_parse_from(["keiba-picks", "infer", "--races", "r.csv"]).is_err());
    }

    #[test]
    fn test_run_expand_rejects_unknown_type() {
        let config = AppConfig::default();
        let err = run_expand(&config, "pick6".into(), "1".into(), "text".into()).unwrap_err();
        assert!(err.to_string().contains("pick6"));
    }

    #[test]
    fn test_run_expand_text() {
        let config = AppConfig::default();
        assert!(run_expand(&config, "三連複ボックス".into(), "1,2,3,4".into(), "text".into()).is_ok());
        assert!(run_expand(&config, "trio-box".into(), "1,2".into(), "text".into()).is_err());
    }

    #[test]
    fn test_run_infer_rejects_bad_threshold() {
        let err = run_infer(
            AppConfig::default(),
            "races.csv".into(),
            "payouts.csv".into(),
            "tickets.csv".into(),
            "table".into(),
            Some(2.0),
        )
        .unwrap_err();
        assert!(err.to_string().contains("low_confidence_ratio"));
    }
}
