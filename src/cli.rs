//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::png_chart_adapter::PngChartAdapter;
use crate::adapters::yahoo_adapter::YahooAdapter;
use crate::domain::analysis::FluctuationThreshold;
use crate::domain::error::StockDataError;
use crate::domain::query::{parse_date, Query};
use crate::domain::settings::{ProviderSource, Settings};
use crate::driver::{run_interactive, write_analysis, Console, Session, FAREWELL};
use crate::ports::data_port::MarketDataPort;

#[derive(Parser, Debug)]
#[command(
    name = "stockscope",
    version,
    about = "Fetch, analyse and chart daily stock prices"
)]
pub struct Cli {
    /// INI configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive session (the default)
    Run,
    /// Analyse one ticker without prompting
    Fetch(FetchArgs),
    /// Check a ticker against the data provider
    Validate {
        #[arg(short, long)]
        ticker: String,
    },
    /// List chart styles
    Styles,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    #[arg(short, long)]
    pub ticker: String,
    /// Provider period token such as 5d, 1mo, ytd
    #[arg(short, long)]
    pub period: Option<String>,
    /// First date (YYYY-MM-DD), inclusive
    #[arg(long)]
    pub start: Option<String>,
    /// Last date (YYYY-MM-DD), exclusive
    #[arg(long)]
    pub end: Option<String>,
    /// Report days whose close moved at least this many percent
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Write the enriched table to this CSV file
    #[arg(long)]
    pub export: Option<PathBuf>,
    #[arg(long)]
    pub style: Option<String>,
    #[arg(long)]
    pub no_chart: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    init_tracing(&cli.log_level);

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data = match build_data_port(&settings) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let chart = PngChartAdapter::new(settings.chart.width, settings.chart.height);
    let session = Session::new(data.as_ref(), &chart, &settings);

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            spawn_interrupt_watcher();
            let stdin = io::stdin();
            let mut console = Console::new(stdin.lock(), io::stdout());
            run_interactive(&session, &mut console)
        }
        Command::Fetch(args) => report(fetch(&session, &args, &mut io::stdout()).map(|_| ())),
        Command::Validate { ticker } => report(validate(&session, &ticker, &mut io::stdout())),
        Command::Styles => report(list_styles(&session, &mut io::stdout())),
    }
}

fn report(result: Result<(), StockDataError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

/// Settings from `path`, or defaults when no file is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, StockDataError> {
    match path {
        Some(p) => {
            info!(path = %p.display(), "loading config");
            Settings::from_config(&FileConfigAdapter::from_file(p)?)
        }
        None => Settings::from_config(&FileConfigAdapter::empty()),
    }
}

pub fn build_data_port(settings: &Settings) -> Result<Box<dyn MarketDataPort>, StockDataError> {
    match settings.provider.source {
        ProviderSource::Yahoo => Ok(Box::new(YahooAdapter::new(&settings.provider)?)),
        ProviderSource::Csv => Ok(Box::new(CsvAdapter::new(
            settings.provider.csv_dir.clone(),
        ))),
    }
}

/// Wait for Ctrl-C on a separate thread and end the process with the
/// farewell message. Prompts block on stdin, so the main thread cannot poll.
fn spawn_interrupt_watcher() {
    let spawned = std::thread::Builder::new()
        .name("ctrl-c".into())
        .spawn(|| {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    warn!(error = %e, "interrupt handler unavailable");
                    return;
                }
            };
            if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
                println!();
                println!("{}", FAREWELL);
                std::process::exit(130);
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "failed to start interrupt watcher");
    }
}

/// Non-interactive analysis. Returns the chart path when one was written.
pub fn fetch<W: Write>(
    session: &Session<'_>,
    args: &FetchArgs,
    out: &mut W,
) -> Result<Option<PathBuf>, StockDataError> {
    let start = args.start.as_deref().map(parse_date).transpose()?;
    let end = args.end.as_deref().map(parse_date).transpose()?;
    let query = Query::new(&args.ticker, args.period.as_deref(), start, end)?;
    let threshold = args.threshold.map(FluctuationThreshold::new).transpose()?;

    let style = match &args.style {
        Some(s) if session.styles().contains(s) => s.clone(),
        Some(s) => {
            return Err(StockDataError::configuration(format!(
                "unknown chart style '{}'",
                s
            )));
        }
        None => session.default_style().to_string(),
    };

    session.check(query.ticker())?;
    let analysis = session.analyze(&query, threshold)?;
    write_analysis(out, &analysis)?;

    if let Some(path) = &args.export {
        session.export(&analysis, path)?;
        writeln!(out, "Data exported to {}", path.display())?;
    }

    if args.no_chart {
        return Ok(None);
    }
    let chart_path = session.render_chart(&analysis, &style)?;
    writeln!(out, "Chart saved as {}", chart_path.display())?;
    Ok(Some(chart_path))
}

pub fn validate<W: Write>(
    session: &Session<'_>,
    ticker: &str,
    out: &mut W,
) -> Result<(), StockDataError> {
    let ticker = ticker.trim().to_uppercase();
    session.check(&ticker)?;
    writeln!(out, "{} is a valid ticker", ticker)?;
    Ok(())
}

pub fn list_styles<W: Write>(session: &Session<'_>, out: &mut W) -> Result<(), StockDataError> {
    for (i, style) in session.styles().iter().enumerate() {
        let marker = if style == session.default_style() {
            " (default)"
        } else {
            ""
        };
        writeln!(out, "{}: {}{}", i + 1, style, marker)?;
    }
    Ok(())
}
