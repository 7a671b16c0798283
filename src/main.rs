use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod aggregate;
mod clock;
mod config;
mod drilldown;
mod error;
mod filter;
mod models;
mod normalize;
mod pipeline;
mod ranking;
mod report;
mod risk;
mod segment;
mod workbook;

use clock::{Clock, FixedClock, SystemClock};
use config::Config;
use filter::MaterialSelection;
use models::Ledger;

#[derive(Parser)]
#[command(name = "hose-loss-ledger")]
#[command(about = "Hose issue/return reconciliation and loss risk by manager", long_about = None)]
struct Cli {
    /// Show debug logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LedgerArgs {
    /// Inventory workbook (.xlsx, one sheet per manager) or a single-sheet .csv
    #[arg(long)]
    input: PathBuf,

    /// Hose item to include; repeat for several. Defaults to every hose item
    #[arg(long = "item")]
    items: Vec<String>,

    /// Evaluate staleness as of this date instead of now
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Configuration file (defaults to .hose-ledger.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Manager table with stock, risk and the overall figures
    Summary {
        #[command(flatten)]
        ledger: LedgerArgs,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Movements, origin breakdown and advisories for one manager
    Detail {
        #[command(flatten)]
        ledger: LedgerArgs,
        #[arg(long)]
        manager: String,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Managers ranked by outstanding stock
    Ranking {
        #[command(flatten)]
        ledger: LedgerArgs,
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// List the hose items available for --item
    Items {
        #[command(flatten)]
        ledger: LedgerArgs,
    },
    /// Generate a markdown report
    Report {
        #[command(flatten)]
        ledger: LedgerArgs,
        #[arg(long, default_value = "hose_report.md")]
        out: PathBuf,
    },
    /// Export the manager table as CSV
    Export {
        #[command(flatten)]
        ledger: LedgerArgs,
        #[arg(long, default_value = "managers.csv")]
        out: PathBuf,
    },
    /// Write a default .hose-ledger.toml
    InitConfig,
}

struct Session {
    config: Config,
    ledger: Ledger,
    clock: Box<dyn Clock>,
}

impl Session {
    fn open(args: &LedgerArgs) -> anyhow::Result<Self> {
        let config = Config::resolve(args.config.as_deref())?;
        let sheets = workbook::read_sheets(&args.input, config.ledger.header_row)?;
        let ledger = normalize::build_ledger(&sheets, &config)?;
        info!(
            "Ledger has {} records ({} sheet(s) skipped)",
            ledger.records.len(),
            ledger.skipped_sheets.len()
        );

        let clock: Box<dyn Clock> = match args.as_of {
            Some(date) => Box::new(FixedClock::on(date)),
            None => Box::new(SystemClock),
        };

        Ok(Self {
            config,
            ledger,
            clock,
        })
    }

    fn selection(&self, items: &[String]) -> anyhow::Result<MaterialSelection> {
        let selection = if items.is_empty() {
            pipeline::default_selection(&self.ledger, &self.config)?
        } else {
            MaterialSelection::new(items.iter().cloned())?
        };
        debug!("Selected items: {:?}", selection.items().collect::<Vec<_>>());
        Ok(selection)
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.quiet {
        tracing::Level::ERROR
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")
}

fn init_config() -> anyhow::Result<()> {
    let path = Path::new(config::DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!(
            "{} already exists. Remove it first or edit it manually.",
            path.display()
        );
    }

    std::fs::write(path, Config::default_toml()?)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Created {} with default settings.", path.display());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match cli.command {
        Commands::InitConfig => init_config()?,
        Commands::Summary { ledger, format } => {
            let session = Session::open(&ledger)?;
            let selection = session.selection(&ledger.items)?;
            let analysis = pipeline::analyze(
                &session.ledger,
                &selection,
                session.clock.as_ref(),
                &session.config,
            )?;
            match format {
                Format::Text => print!("{}", report::render_summary(&analysis)),
                Format::Json => println!("{}", report::to_json(&analysis)?),
            }
        }
        Commands::Detail {
            ledger,
            manager,
            format,
        } => {
            let session = Session::open(&ledger)?;
            let selection = session.selection(&ledger.items)?;
            let detail = pipeline::detail(
                &session.ledger,
                &selection,
                &manager,
                session.clock.as_ref(),
                &session.config,
            )?;
            match format {
                Format::Text => print!("{}", report::render_detail(&detail)),
                Format::Json => println!("{}", report::to_json(&detail)?),
            }
        }
        Commands::Ranking { ledger, format } => {
            let session = Session::open(&ledger)?;
            let selection = session.selection(&ledger.items)?;
            let analysis = pipeline::analyze(
                &session.ledger,
                &selection,
                session.clock.as_ref(),
                &session.config,
            )?;
            match format {
                Format::Text => print!("{}", report::render_ranking(&analysis)),
                Format::Json => println!("{}", report::to_json(&analysis.ranking)?),
            }
        }
        Commands::Items { ledger } => {
            let session = Session::open(&ledger)?;
            let items = filter::available_items(
                &session.ledger.records,
                &session.config.ledger.material_pattern,
            );
            if items.is_empty() {
                println!("No hose items found.");
            }
            for item in items {
                println!("{item}");
            }
        }
        Commands::Report { ledger, out } => {
            let session = Session::open(&ledger)?;
            let selection = session.selection(&ledger.items)?;
            let clock = session.clock.as_ref();
            let analysis = pipeline::analyze(&session.ledger, &selection, clock, &session.config)?;
            let details =
                pipeline::all_details(&session.ledger, &selection, clock, &session.config)?;
            let report = report::build_report(
                &ledger.input.display().to_string(),
                &analysis,
                &details,
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { ledger, out } => {
            let session = Session::open(&ledger)?;
            let selection = session.selection(&ledger.items)?;
            let analysis = pipeline::analyze(
                &session.ledger,
                &selection,
                session.clock.as_ref(),
                &session.config,
            )?;
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            report::write_summary_csv(&analysis.summaries, file)?;
            println!(
                "Exported {} managers to {}.",
                analysis.summaries.len(),
                out.display()
            );
        }
    }

    Ok(())
}
