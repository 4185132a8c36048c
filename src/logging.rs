use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Set up the tracing subscriber.
///
/// The terminal belongs to the UI, so records only go to a file, and only
/// when `TARS_LOG_FILE` names one. `RUST_LOG` controls the filter (default
/// `info`).
pub fn init() -> Result<()> {
    let Some(path) = std::env::var_os("TARS_LOG_FILE") else {
        return Ok(());
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
