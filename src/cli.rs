use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use tabled::{Table, Tabled};

use authscope::analyzer;
use authscope::config::Config;
use authscope::database::Database;
use authscope::export::{self, TimeUnit};
use authscope::models::{EventKind, Histogram, ParsedLog, Severity};
use authscope::parser::LogParser;

#[derive(Parser)]
#[command(name = "authscope")]
#[command(author, version, about = "SSH auth.log security analyzer")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a log and print the severity-tier summary
    Summary {
        /// Log file (defaults to the configured path)
        file: Option<PathBuf>,
    },

    /// Rank the top offending source IPs
    Offenders {
        file: Option<PathBuf>,

        /// Maximum number of IPs to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print one event kind's histogram
    Histogram {
        file: Option<PathBuf>,

        /// Event kind, e.g. failed_password
        #[arg(short, long)]
        kind: String,

        /// Bucket granularity
        #[arg(long, value_enum, default_value_t = Unit::Hour)]
        by: Unit,
    },

    /// Contrast accepted vs failed password logins
    Logins {
        file: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Unit::Hour)]
        by: Unit,
    },

    /// Write per-kind dataset JSON files
    Export {
        file: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = Unit::Hour)]
        by: Unit,

        /// Output directory (defaults to the configured path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a log and store its events in the database
    Import {
        file: Option<PathBuf>,
    },

    /// Summarize the events currently in the database
    Report,

    /// Delete all stored events
    Reset {
        /// Confirm the action
        #[arg(long)]
        yes: bool,
    },

    /// Generate default configuration file
    GenConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Unit {
    Hour,
    Date,
}

impl From<Unit> for TimeUnit {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Hour => TimeUnit::Hour,
            Unit::Date => TimeUnit::Date,
        }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Event")]
    event: String,
    #[tabled(rename = "Count")]
    count: u64,
}

#[derive(Tabled)]
struct OffenderRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Source IP")]
    ip: String,
    #[tabled(rename = "Events")]
    count: u64,
}

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Bucket")]
    bucket: String,
    #[tabled(rename = "Count")]
    count: u64,
}

#[derive(Tabled)]
struct LoginRow {
    #[tabled(rename = "Bucket")]
    bucket: String,
    #[tabled(rename = "Accepted")]
    accepted: u64,
    #[tabled(rename = "Failed")]
    failed: u64,
}

pub fn run_command(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };

    match cli.command {
        Commands::Summary { file } => {
            let (log, parser) = parse(&config, file)?;
            print_summary(&log);
            print_skipped(&parser);
        }

        Commands::Offenders { file, limit } => {
            let (log, _) = parse(&config, file)?;
            let limit = limit.unwrap_or(config.general.top_offenders_limit);
            let ranked = analyzer::top_offenders(&log, limit);

            if ranked.is_empty() {
                println!("No high-severity events with a source IP found");
                return Ok(());
            }

            let rows: Vec<OffenderRow> = ranked
                .into_iter()
                .enumerate()
                .map(|(i, o)| OffenderRow {
                    rank: i + 1,
                    ip: o.ip,
                    count: o.count,
                })
                .collect();
            println!("{}", format!("Top {} offending IPs", rows.len()).red().bold());
            println!("{}", Table::new(rows));
        }

        Commands::Histogram { file, kind, by } => {
            let Some(kind) = EventKind::from_slug(&kind) else {
                let known: Vec<&str> = EventKind::ALL.iter().map(|k| k.slug()).collect();
                bail!("Unknown event kind '{}'. Known kinds: {}", kind, known.join(", "));
            };

            let (log, parser) = parse(&config, file)?;
            let histograms = match by {
                Unit::Hour => analyzer::events_by_hour(&log),
                Unit::Date => analyzer::events_by_date(&log, parser.date_range())?,
            };

            let hist = &histograms[&kind];
            println!("{}", format!("{} by {}", kind, TimeUnit::from(by)).bold());
            println!("{}", Table::new(bucket_rows(hist)));
        }

        Commands::Logins { file, by } => {
            let (log, parser) = parse(&config, file)?;
            let histograms = match by {
                Unit::Hour => analyzer::login_patterns_by_hour(&log),
                Unit::Date => analyzer::login_patterns_by_date(&log, parser.date_range())?,
            };

            let accepted = &histograms[&EventKind::AcceptedPassword];
            let failed = &histograms[&EventKind::FailedPassword];
            let rows: Vec<LoginRow> = accepted
                .iter()
                .map(|(bucket, &count)| LoginRow {
                    bucket: bucket.clone(),
                    accepted: count,
                    failed: failed.get(bucket).copied().unwrap_or(0),
                })
                .collect();
            println!("{}", "Login patterns".bold());
            println!("{}", Table::new(rows));
        }

        Commands::Export { file, by, output } => {
            let (log, parser) = parse(&config, file)?;
            let unit = TimeUnit::from(by);
            let histograms = match by {
                Unit::Hour => analyzer::events_by_hour(&log),
                Unit::Date => analyzer::events_by_date(&log, parser.date_range())?,
            };

            let dir = output.unwrap_or_else(|| PathBuf::from(&config.export.output_dir));
            let written = export::write_datasets(&histograms, unit, &dir)?;
            println!(
                "{} {} dataset files to {}",
                "Wrote".green().bold(),
                written.len(),
                dir.display()
            );
        }

        Commands::Import { file } => {
            let (log, parser) = parse(&config, file)?;
            let db = Database::open(config.db_path())?;
            let inserted = db.insert_events(&log)?;
            println!("{} {} events", "Imported".green().bold(), inserted);
            print_skipped(&parser);
        }

        Commands::Report => {
            let db = Database::open(config.db_path())?;
            let log = db.rebuild_log().context("Failed to rebuild stored events")?;

            if log.total() == 0 {
                println!("No stored events; run `authscope import` first");
                return Ok(());
            }

            if let Some((first, last)) = db.date_bounds()? {
                println!("Stored events span {} .. {}", first, last);
            }
            print_summary(&log);

            let ranked = analyzer::top_offenders(&log, config.general.top_offenders_limit);
            if !ranked.is_empty() {
                let rows: Vec<OffenderRow> = ranked
                    .into_iter()
                    .enumerate()
                    .map(|(i, o)| OffenderRow {
                        rank: i + 1,
                        ip: o.ip,
                        count: o.count,
                    })
                    .collect();
                println!("{}", "Top offending IPs".red().bold());
                println!("{}", Table::new(rows));
            }
        }

        Commands::Reset { yes } => {
            if !yes {
                println!(
                    "{}",
                    "WARNING: this will delete ALL stored events!".red().bold()
                );
                println!("Run again with --yes to confirm");
                return Ok(());
            }

            let db = Database::open(config.db_path())?;
            let removed = db.delete_all()?;
            println!("{} {} stored events", "Removed".yellow().bold(), removed);
        }

        Commands::GenConfig { output } => {
            let content = toml::to_string_pretty(&Config::default())?;
            match output {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("{} {}", "Wrote".green().bold(), path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn parse(config: &Config, file: Option<PathBuf>) -> Result<(ParsedLog, LogParser)> {
    let path = file.unwrap_or_else(|| PathBuf::from(&config.general.log_path));
    let mut parser = LogParser::new(config.general.assumed_year)?;
    let log = parser
        .read_file(&path)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok((log, parser))
}

fn print_summary(log: &ParsedLog) {
    let summary = analyzer::summarize(log);

    for severity in Severity::ALL {
        let header = format!("{} ({} events)", severity, summary.tier_total(severity));
        let header = match severity {
            Severity::High => header.red().bold(),
            Severity::Medium => header.yellow().bold(),
            Severity::Operational => header.green().bold(),
        };
        println!("{}", header);

        let rows: Vec<SummaryRow> = summary
            .tier(severity)
            .into_iter()
            .map(|(kind, count)| SummaryRow {
                event: kind.label().to_string(),
                count,
            })
            .collect();
        println!("{}", Table::new(rows));
    }
}

fn print_skipped(parser: &LogParser) {
    if parser.skipped_lines() > 0 {
        println!(
            "{} {} lines matched a pattern but could not be extracted",
            "Note:".yellow().bold(),
            parser.skipped_lines()
        );
    }
}

fn bucket_rows(hist: &Histogram) -> Vec<BucketRow> {
    hist.iter()
        .map(|(bucket, &count)| BucketRow {
            bucket: bucket.clone(),
            count,
        })
        .collect()
}
