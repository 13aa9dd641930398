//! Domain error types.

/// Top-level error type for stockscope.
#[derive(Debug, thiserror::Error)]
pub enum StockDataError {
    #[error("configuration error: {reason}")]
    Configuration { reason: String },

    #[error("invalid ticker: {ticker}")]
    InvalidTicker { ticker: String },

    #[error("no data available for {ticker}: {reason}")]
    DataUnavailable { ticker: String, reason: String },

    #[error("no rows to compute statistics on")]
    EmptyData,

    #[error("provider error: {reason}")]
    Provider { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("chart rendering failed: {reason}")]
    Render { reason: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("stopped by user")]
    UserAbort,
}

impl StockDataError {
    pub fn configuration(reason: impl Into<String>) -> Self {
        StockDataError::Configuration {
            reason: reason.into(),
        }
    }

    pub fn render(reason: impl Into<String>) -> Self {
        StockDataError::Render {
            reason: reason.into(),
        }
    }

    pub fn data_unavailable(ticker: &str, reason: impl Into<String>) -> Self {
        StockDataError::DataUnavailable {
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}

impl StockDataError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            StockDataError::Io(_) | StockDataError::Csv(_) | StockDataError::Render { .. } => 1,
            StockDataError::Configuration { .. }
            | StockDataError::ConfigParse { .. }
            | StockDataError::ConfigInvalid { .. } => 2,
            StockDataError::InvalidTicker { .. }
            | StockDataError::DataUnavailable { .. }
            | StockDataError::Provider { .. } => 3,
            StockDataError::EmptyData => 4,
            StockDataError::UserAbort => 130,
        }
    }
}

impl From<&StockDataError> for std::process::ExitCode {
    fn from(err: &StockDataError) -> Self {
        std::process::ExitCode::from(err.exit_code())
    }
}
