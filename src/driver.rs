//! Interactive session and the analysis pipeline it drives.
//!
//! The pipeline functions (`analyze`, `export`, `render_chart`) take their
//! inputs explicitly so the non-interactive `fetch` command and tests can
//! call them without a console.

use crate::adapters::csv_export::export_csv;
use crate::domain::analysis::{
    detect_fluctuations, summarize, Fluctuation, FluctuationThreshold, PriceSummary,
};
use crate::domain::error::StockDataError;
use crate::domain::indicator::enrich;
use crate::domain::market_data::{check_ticker, fetch_query};
use crate::domain::query::{parse_date, Query, COMMON_PERIODS};
use crate::domain::series::TimeSeriesTable;
use crate::domain::settings::Settings;
use crate::domain::style::{available_styles, format_menu, select_style};
use crate::ports::chart_port::{ChartPort, ChartRequest};
use crate::ports::data_port::MarketDataPort;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, warn};

pub const FAREWELL: &str = "Program stopped by user.";
pub const EXAMPLE_TICKERS: &str =
    "AAPL (Apple Inc), GOOGL (Alphabet Inc), MSFT (Microsoft Corporation), AMZN (Amazon.com Inc), TSLA (Tesla Inc)";

/// Line-oriented prompt/answer channel.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: &str) -> Result<(), StockDataError> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }

    /// Print `question` and read one trimmed answer. End of input aborts.
    pub fn prompt(&mut self, question: &str) -> Result<String, StockDataError> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(StockDataError::UserAbort);
        }
        Ok(line.trim().to_string())
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

/// Result of one fetch-and-enrich run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub query: Query,
    pub table: TimeSeriesTable,
    pub threshold: Option<FluctuationThreshold>,
    pub fluctuations: Vec<Fluctuation>,
    pub summary: PriceSummary,
}

/// What a completed interactive session produced.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub analysis: Analysis,
    pub style: String,
    pub export_path: Option<PathBuf>,
    pub chart_path: PathBuf,
}

pub struct Session<'a> {
    data: &'a dyn MarketDataPort,
    chart: &'a dyn ChartPort,
    settings: &'a Settings,
}

impl<'a> Session<'a> {
    pub fn new(
        data: &'a dyn MarketDataPort,
        chart: &'a dyn ChartPort,
        settings: &'a Settings,
    ) -> Self {
        Self {
            data,
            chart,
            settings,
        }
    }

    /// Fetch the series and add every indicator column, then run the
    /// fluctuation scan and summary.
    pub fn analyze(
        &self,
        query: &Query,
        threshold: Option<FluctuationThreshold>,
    ) -> Result<Analysis, StockDataError> {
        let mut table = fetch_query(self.data, query)?;

        let indicators = &self.settings.indicators;
        debug!(
            ma_window = indicators.ma_window,
            rsi_window = indicators.rsi_window,
            macd = ?(indicators.macd_short, indicators.macd_long, indicators.macd_signal),
            "enriching table"
        );
        enrich(&mut table, indicators)?;

        let fluctuations = detect_fluctuations(&table, threshold);
        let summary = summarize(&table)?;

        Ok(Analysis {
            query: query.clone(),
            table,
            threshold,
            fluctuations,
            summary,
        })
    }

    pub fn export(&self, analysis: &Analysis, path: &Path) -> Result<(), StockDataError> {
        export_csv(&analysis.table, path)
    }

    /// Render to `{output_dir}/{stem}.{ext}` and return the path written.
    pub fn render_chart(
        &self,
        analysis: &Analysis,
        style: &str,
    ) -> Result<PathBuf, StockDataError> {
        let path = self.chart_path(&analysis.query);
        let label = analysis.query.period_label();
        self.chart.render(&ChartRequest {
            table: &analysis.table,
            ticker: analysis.query.ticker(),
            period_label: &label,
            output_path: &path,
            style,
        })?;
        Ok(path)
    }

    pub fn chart_path(&self, query: &Query) -> PathBuf {
        self.settings.chart.output_dir.join(query.chart_file_name())
    }

    pub fn styles(&self) -> Vec<String> {
        available_styles(&self.chart.available_styles())
    }

    pub fn default_style(&self) -> &str {
        &self.settings.chart.default_style
    }

    pub fn check(&self, ticker: &str) -> Result<(), StockDataError> {
        check_ticker(self.data, ticker)
    }

    pub fn run<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> Result<SessionReport, StockDataError> {
        console.say("Welcome to the stock data retrieval and charting tool.")?;
        console.say(&format!(
            "Here are some example tickers you might consider: {}.",
            EXAMPLE_TICKERS
        ))?;

        let ticker = self.ask_ticker(console)?;

        console.say(&format!(
            "Common periods for the data include: {}.",
            COMMON_PERIODS.join(", ")
        ))?;
        let query = self.ask_range(console, &ticker)?;
        let style = self.ask_style(console)?;
        let threshold = ask_threshold(console)?;

        let analysis = self.analyze(&query, threshold)?;

        write_analysis(console.output(), &analysis)?;

        let answer =
            console.prompt("Enter a filename to export the data to (e.g. 'stock_data.csv'): ")?;
        let export_path = if answer.is_empty() {
            console.say("No export file was created.")?;
            None
        } else {
            let path = PathBuf::from(answer);
            self.export(&analysis, &path)?;
            console.say(&format!("Data exported to {}", path.display()))?;
            Some(path)
        };

        let chart_path = self.render_chart(&analysis, &style)?;
        console.say(&format!("Chart saved as {}", chart_path.display()))?;

        Ok(SessionReport {
            analysis,
            style,
            export_path,
            chart_path,
        })
    }

    fn ask_ticker<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> Result<String, StockDataError> {
        loop {
            let ticker = console
                .prompt("Enter a stock ticker (e.g. 'AAPL' for Apple Inc): ")?
                .to_uppercase();
            if ticker.is_empty() {
                console.say("Ticker cannot be empty. Please enter a valid ticker.")?;
                continue;
            }
            match self.check(&ticker) {
                Ok(()) => return Ok(ticker),
                Err(StockDataError::InvalidTicker { .. }) => {
                    console.say("Invalid ticker. Please enter a valid ticker.")?;
                }
                Err(e) => {
                    warn!(ticker, error = %e, "ticker validation failed");
                    console.say(&format!("An error occurred: {}. Please try again.", e))?;
                }
            }
        }
    }

    fn ask_range<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        ticker: &str,
    ) -> Result<Query, StockDataError> {
        let answer = console.prompt("Would you like to use specific start and end dates? (y/n): ")?;
        let use_dates = matches!(answer.to_lowercase().as_str(), "y" | "yes");

        loop {
            let query = if use_dates {
                let start = console.prompt("Enter the start date (YYYY-MM-DD): ")?;
                let end = console.prompt("Enter the end date (YYYY-MM-DD): ")?;
                parse_date(&start)
                    .and_then(|s| parse_date(&end).map(|e| (s, e)))
                    .and_then(|(s, e)| Query::dates(ticker, s, e))
            } else {
                let period =
                    console.prompt("Enter the period for the data (e.g. '1mo' for one month): ")?;
                Query::period(ticker, &period)
            };

            match query {
                Ok(q) => return Ok(q),
                Err(e) => console.say(&format!("{}. Please try again.", e))?,
            }
        }
    }

    fn ask_style<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
    ) -> Result<String, StockDataError> {
        let styles = self.styles();
        console.say("Available chart styles:")?;
        console.say(&format_menu(&styles))?;

        let answer = console.prompt("Choose a chart style number: ")?;
        let default = self.default_style();
        let choice = select_style(&answer, &styles, default);
        if choice.fell_back {
            console.say(&format!("Invalid choice. Using the '{}' style.", default))?;
        }
        Ok(choice.style)
    }
}

fn ask_threshold<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
) -> Result<Option<FluctuationThreshold>, StockDataError> {
    loop {
        let answer = console.prompt("Enter a fluctuation alert threshold (percent): ")?;
        if answer.is_empty() {
            console.say("No threshold entered, fluctuation alerts are off.")?;
            return Ok(None);
        }
        match answer
            .parse::<f64>()
            .ok()
            .and_then(|v| FluctuationThreshold::new(v).ok())
        {
            Some(t) => return Ok(Some(t)),
            None => console.say("Please enter a non-negative number, or leave it empty.")?,
        }
    }
}

/// Print the fluctuation report, average close and summary.
pub fn write_analysis<W: Write>(out: &mut W, analysis: &Analysis) -> Result<(), StockDataError> {
    let summary = &analysis.summary;

    if let Some(threshold) = analysis.threshold {
        if analysis.fluctuations.is_empty() {
            writeln!(
                out,
                "No daily price change reached {:.2}%.",
                threshold.pct()
            )?;
        } else {
            writeln!(
                out,
                "Strong price fluctuations (threshold {:.2}%):",
                threshold.pct()
            )?;
            for f in &analysis.fluctuations {
                writeln!(out, "  {}: {:+.2}%", f.date, f.pct_change)?;
            }
        }
    }

    writeln!(out, "Average closing price: {:.2}", summary.average_close)?;
    writeln!(
        out,
        "{} rows from {} to {}, close range {:.2} to {:.2}",
        summary.rows, summary.first_date, summary.last_date, summary.min_close, summary.max_close
    )?;
    if let Some(change) = summary.total_change_pct {
        writeln!(out, "Change over the range: {:+.2}%", change)?;
    }
    writeln!(out, "Latest RSI: {}", reading(summary.latest_rsi))?;
    writeln!(
        out,
        "Latest MACD: {}  Signal line: {}",
        reading(summary.latest_macd),
        reading(summary.latest_signal)
    )?;
    Ok(())
}

fn reading(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "n/a".to_string())
}

/// Run one interactive session, reporting any failure on the console.
pub fn run_reported<R: BufRead, W: Write>(
    session: &Session<'_>,
    console: &mut Console<R, W>,
) -> Result<SessionReport, StockDataError> {
    let result = session.run(console);
    match &result {
        Ok(report) => {
            info!(
                ticker = report.analysis.query.ticker(),
                chart = %report.chart_path.display(),
                "session finished"
            );
        }
        Err(StockDataError::UserAbort) => {
            let _ = console.say("");
            let _ = console.say(FAREWELL);
        }
        Err(e) => {
            let _ = console.say(&format!("error: {}", e));
        }
    }
    result
}

pub fn run_interactive<R: BufRead, W: Write>(
    session: &Session<'_>,
    console: &mut Console<R, W>,
) -> ExitCode {
    match run_reported(session, console) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => (&e).into(),
    }
}
