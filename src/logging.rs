use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::errors::AppError;

/// Initialize per-run file logging and return the run's job id.
///
/// Each run gets its own file under `log_dir`, named with the local
/// timestamp and a short job id so concurrent runs never collide.
pub fn init_run_logging(log_dir: &Path) -> Result<String, AppError> {
    fs::create_dir_all(log_dir).map_err(|e| AppError::FileWrite(e.to_string()))?;

    let job_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
    let timestamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    let path = log_dir.join(format!("log_{}_{}.txt", timestamp, job_id));

    let file = fs::File::create(&path).map_err(|e| AppError::FileWrite(e.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();

    info!("Run {} started, logging to {}", job_id, path.display());
    Ok(job_id)
}
