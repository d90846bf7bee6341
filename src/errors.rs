/// All application errors, categorized by domain.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ── Data / Import ──
    #[error("Invalid CSV format: {0}")]
    InvalidCsvFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    FileRead(String),

    #[error("Failed to write file: {0}")]
    FileWrite(String),

    #[error("CSV parse error at row {row}: {message}")]
    CsvParseError { row: usize, message: String },

    // ── Series ──
    #[error("Input series contains no bars")]
    EmptySeries,

    // ── Permutation ──
    #[error("Restart probability must be in (0, 1], got {0}")]
    InvalidProbability(f64),

    #[error("No resampling pool: start index {start_index} leaves nothing beyond the kept prefix in a series of {bars} bars")]
    NoResamplePool { start_index: usize, bars: usize },

    // ── Strategy ──
    #[error("Indicator lookback must be at least 1, got {0}")]
    InvalidLookback(usize),

    #[error("Buy threshold {buy} must be below sell threshold {sell}")]
    InvalidThresholds { buy: f64, sell: f64 },

    // ── Monte Carlo ──
    #[error("Trial count must be at least 1, got {0}")]
    InvalidTrialCount(usize),

    // ── Serialization ──
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// ── Conversions from external errors ──

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::FileRead(err.to_string())
    }
}

impl From<csv::Error> for AppError {
    fn from(err: csv::Error) -> Self {
        AppError::InvalidCsvFormat(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}
