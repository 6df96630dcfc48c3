use std::io;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Set up console logging plus daily-rotated JSON files under `logs/`.
///
/// The returned guard owns the background writer for the log files; drop it
/// and buffered lines are lost, so `main` holds it until exit.
pub fn init() -> WorkerGuard {
    let _ = std::fs::create_dir_all("logs");
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily("logs", "scraper.log"));

    tracing_subscriber::registry()
        .with(base_filter())
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_writer(io::stdout))
        .init();

    guard
}

fn base_filter() -> EnvFilter {
    EnvFilter::from_default_env()
        .add_directive("sxodim_scraper=info".parse().expect("valid directive"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_enables_crate_logs() {
        assert!(base_filter().to_string().contains("sxodim_scraper=info"));
    }
}
