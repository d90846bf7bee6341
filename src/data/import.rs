use std::path::Path;

use tracing::info;

use crate::errors::AppError;
use crate::models::bar::Bar;

/// Read OHLC bars from a CSV file.
///
/// Headers are matched case-insensitively after trimming, so files from
/// different fetchers ("Date,Open,High,Low,Close,Volume,..." and
/// "timestamp,open,high,low,close" alike) load without configuration.
/// Extra columns are ignored. Bars are returned in file order; the
/// engine assumes chronological input.
pub fn read_bars_csv(path: &Path) -> Result<Vec<Bar>, AppError> {
    if !path.exists() {
        return Err(AppError::FileNotFound(path.display().to_string()));
    }

    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| AppError::FileRead(format!("Cannot open CSV: {}", e)))?;

    let headers = reader.headers()?.clone();
    let normalized: Vec<String> = headers
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();

    let find = |names: &[&str]| -> Option<usize> {
        normalized
            .iter()
            .position(|h| names.contains(&h.as_str()))
    };

    let datetime_col = find(&["date", "datetime", "timestamp"]).ok_or_else(|| {
        AppError::InvalidCsvFormat("missing date/datetime/timestamp column".into())
    })?;
    let open_col = find(&["open"])
        .ok_or_else(|| AppError::InvalidCsvFormat("missing open column".into()))?;
    let high_col = find(&["high"])
        .ok_or_else(|| AppError::InvalidCsvFormat("missing high column".into()))?;
    let low_col = find(&["low"])
        .ok_or_else(|| AppError::InvalidCsvFormat("missing low column".into()))?;
    let close_col = find(&["close"])
        .ok_or_else(|| AppError::InvalidCsvFormat("missing close column".into()))?;

    let mut bars = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::CsvParseError {
            row: row + 1,
            message: e.to_string(),
        })?;

        let field = |col: usize, name: &str| -> Result<f64, AppError> {
            let raw = record.get(col).unwrap_or("");
            let value: f64 = raw.trim().parse().map_err(|_| AppError::CsvParseError {
                row: row + 1,
                message: format!("cannot parse {} value '{}'", name, raw),
            })?;
            if value <= 0.0 {
                return Err(AppError::CsvParseError {
                    row: row + 1,
                    message: format!("{} price must be positive, got {}", name, value),
                });
            }
            Ok(value)
        };

        bars.push(Bar {
            datetime: record.get(datetime_col).unwrap_or("").trim().to_string(),
            open: field(open_col, "open")?,
            high: field(high_col, "high")?,
            low: field(low_col, "low")?,
            close: field(close_col, "close")?,
        });
    }

    if bars.is_empty() {
        return Err(AppError::EmptySeries);
    }

    info!("Loaded {} bars from {}", bars.len(), path.display());
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_yfinance_style_headers() {
        let file = write_csv(
            "Date,Open,High,Low,Close,Volume,Dividends,Stock Splits\n\
             2024-01-01,100.0,102.0,99.0,101.0,1000,0,0\n\
             2024-01-02,101.0,103.0,100.0,102.5,1200,0,0\n",
        );
        let bars = read_bars_csv(file.path()).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].datetime, "2024-01-01");
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[1].close, 102.5);
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let file = write_csv(
            "TIMESTAMP,OPEN,high,Low,cLoSe\n\
             2024-01-01,100,101,99,100.5\n",
        );
        let bars = read_bars_csv(file.path()).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 100.5);
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let file = write_csv("Date,Open,High,Low\n2024-01-01,1,2,3\n");
        assert!(matches!(
            read_bars_csv(file.path()),
            Err(AppError::InvalidCsvFormat(_))
        ));
    }

    #[test]
    fn test_bad_price_reports_row() {
        let file = write_csv(
            "Date,Open,High,Low,Close\n\
             2024-01-01,100,102,99,101\n\
             2024-01-02,abc,103,100,102\n",
        );
        match read_bars_csv(file.path()) {
            Err(AppError::CsvParseError { row, .. }) => assert_eq!(row, 2),
            other => panic!("expected CsvParseError, got {:?}", other.map(|b| b.len())),
        }
    }

    #[test]
    fn test_non_positive_price_is_rejected() {
        let file = write_csv("Date,Open,High,Low,Close\n2024-01-01,100,102,-1,101\n");
        assert!(matches!(
            read_bars_csv(file.path()),
            Err(AppError::CsvParseError { row: 1, .. })
        ));
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let file = write_csv("Date,Open,High,Low,Close\n");
        assert!(matches!(
            read_bars_csv(file.path()),
            Err(AppError::EmptySeries)
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_bars_csv(Path::new("/nonexistent/bars.csv")),
            Err(AppError::FileNotFound(_))
        ));
    }
}
