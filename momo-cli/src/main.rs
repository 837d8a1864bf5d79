use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use momo_core::{Category, StatsSnapshot, TransactionType};
use momo_etl::{
    DashboardJson, DirDeadLetterSink, MemoryDeadLetterSink, PersistenceWriter, Pipeline,
    RunReport, SqliteStore, TransactionFilter, TransactionsCsv,
};
use momo_ingest::sample::{SampleConfig, write_sample_xml};
use momo_ingest::{SmsExtractor, read_messages};

mod config;
mod logging;

use config::Config;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("MOMO_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "momo", version, long_version = LONG_VERSION, about = "MoMo SMS transaction ETL")]
struct Cli {
    /// Config file (default: ./momo.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract transactions from an SMS export and persist them with run stats
    Process {
        /// XML backup or JSON export (overrides config/XML_INPUT_PATH)
        #[arg(long)]
        input: Option<PathBuf>,

        /// SQLite database (overrides config/DATABASE_URL)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Dashboard JSON output
        #[arg(long)]
        dashboard: Option<PathBuf>,

        /// Also write a CSV of the extracted transactions
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Directory for dead-letter files
        #[arg(long)]
        dead_letter_dir: Option<PathBuf>,

        /// Extract and aggregate only; write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the persisted stats table
    Stats {
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// List persisted transactions, newest first
    List {
        #[arg(long)]
        db: Option<PathBuf>,

        /// CASH_IN, CASH_OUT or OTHER
        #[arg(long = "type")]
        kind: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Monthly transaction counts and amounts
    Trends {
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Write a sample SMS backup for testing
    Generate {
        /// Number of messages (default: 100)
        #[arg(long, short = 'n', default_value_t = 100)]
        count: usize,

        /// Output file (default: data/raw/generated_sms_data.xml)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Manage momo.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,

    /// Print the effective config (file + environment)
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg_path = config::config_path(cli.config.as_deref());
    let mut cfg = config::load_config(&cfg_path)?;
    if let Some(level) = cli.log_level {
        cfg.logging.level = level;
    }

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(&cfg_path)?,
            ConfigCommand::Show => print!("{}", toml::to_string_pretty(&cfg)?),
        },

        Command::Process {
            input,
            db,
            dashboard,
            csv,
            dead_letter_dir,
            dry_run,
        } => {
            logging::setup_logging(&cfg.logging.level, cfg.logging.file.as_deref())?;
            if let Some(p) = input {
                cfg.input.path = p;
            }
            if let Some(p) = db {
                cfg.output.database = p;
            }
            if let Some(p) = dashboard {
                cfg.output.dashboard_json = Some(p);
            }
            if let Some(p) = csv {
                cfg.output.transactions_csv = Some(p);
            }
            if let Some(p) = dead_letter_dir {
                cfg.output.dead_letter_dir = p;
            }

            let report = process(&cfg, dry_run)?;
            println!("{report}");
        }

        Command::Stats { db } => {
            logging::setup_logging(&cfg.logging.level, None)?;
            let store = open_store(&cfg, db)?;
            let stats = store.load_stats()?;
            if stats.is_empty() {
                println!("No stats yet (run: momo process)");
            }
            for s in &stats {
                println!("{:<32} {:>16}   (updated {})", s.name, s.value, s.updated_at);
            }
        }

        Command::List {
            db,
            kind,
            category,
            limit,
        } => {
            logging::setup_logging(&cfg.logging.level, None)?;
            let filter = TransactionFilter {
                kind: kind.as_deref().map(str::parse::<TransactionType>).transpose()?,
                category: category.as_deref().map(str::parse::<Category>).transpose()?,
                limit: Some(limit),
            };
            let store = open_store(&cfg, db)?;
            for row in store.list_transactions(&filter)? {
                let t = &row.transaction;
                println!(
                    "#{:<5} {} | {:<8} | {:<13} | RWF {:>12.2} | {}",
                    row.id,
                    t.date.format(momo_core::transaction::DATE_FORMAT),
                    t.kind,
                    t.category,
                    t.amount,
                    t.reference.as_deref().unwrap_or("-")
                );
            }
        }

        Command::Trends { db } => {
            logging::setup_logging(&cfg.logging.level, None)?;
            let store = open_store(&cfg, db)?;
            for m in store.monthly_totals()? {
                println!("{} | count={:<6} | total=RWF {:.2}", m.month, m.count, m.amount);
            }
        }

        Command::Generate { count, out, seed } => {
            logging::setup_logging(&cfg.logging.level, None)?;
            let out = out.unwrap_or_else(|| PathBuf::from("data/raw/generated_sms_data.xml"));
            let mut sample = SampleConfig::new(count, cfg.timezone()?);
            sample.seed = seed;
            let n = write_sample_xml(&out, &sample)?;
            println!("Generated {} sample messages and saved to {}", n, out.display());
        }
    }

    Ok(())
}

fn open_store(cfg: &Config, db: Option<PathBuf>) -> Result<SqliteStore> {
    let path = db.unwrap_or_else(|| cfg.output.database.clone());
    if !path.exists() {
        bail!("Database not found: {} (pass --db <path>)", path.display());
    }
    SqliteStore::open(&path, cfg.timezone()?)
}

/// One full run. Store and input failures abort before anything is written.
fn process(cfg: &Config, dry_run: bool) -> Result<RunReport> {
    let tz = cfg.timezone()?;
    let input = &cfg.input.path;
    if !input.exists() {
        bail!("Input file not found: {} (pass --input <path>)", input.display());
    }
    let extractor = SmsExtractor::new(cfg.categorizer(), tz)?;

    if dry_run {
        let messages = read_messages(input)?;
        let mut pipeline = Pipeline::new(extractor, MemoryDeadLetterSink::default());
        let outcome = pipeline.run(messages);
        print_stats(&outcome.stats);
        for dead in &pipeline.sink().records {
            println!("dead letter: {} (address {:?})", dead.error, dead.message.address);
        }
        return Ok(outcome.report());
    }

    let mut store = SqliteStore::open(&cfg.output.database, tz)?;
    let messages = read_messages(input)?;
    let sink = DirDeadLetterSink::new(&cfg.output.dead_letter_dir)?;
    let mut pipeline = Pipeline::new(extractor, sink);
    let outcome = pipeline.run(messages);

    store
        .write_run(&outcome.transactions, &outcome.stats)
        .with_context(|| format!("saving run to {}", cfg.output.database.display()))?;

    let mut exports: Vec<Box<dyn PersistenceWriter>> = Vec::new();
    if let Some(p) = &cfg.output.dashboard_json {
        exports.push(Box::new(DashboardJson::new(p, tz)));
    }
    if let Some(p) = &cfg.output.transactions_csv {
        exports.push(Box::new(TransactionsCsv::new(p)));
    }
    for export in &mut exports {
        export.write_run(&outcome.transactions, &outcome.stats)?;
    }

    info!("processing completed successfully");
    Ok(outcome.report())
}

fn print_stats(stats: &StatsSnapshot) {
    for (name, value) in stats.iter() {
        println!("{name:<32} {value:>16}");
    }
}
