//! Console + best-effort file logging
//!
//! The console layer always comes up. The rolling file layer is best-effort:
//! if the log directory cannot be created or written, file logging is skipped
//! with a warning and startup proceeds on console only.

use tracing_subscriber::EnvFilter;

pub fn init_logging(log_dir: &str) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,edgex_grid=debug"));

    // `tracing_appender::rolling::daily` panics if it can't create the
    // initial log file, so preflight writability first.
    let file_layer = if std::fs::create_dir_all(log_dir).is_ok() {
        let test_path = std::path::Path::new(log_dir).join(".edgex_grid_write_test");
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&test_path)
        {
            Ok(_) => {
                let _ = std::fs::remove_file(&test_path);

                let file_appender = tracing_appender::rolling::daily(log_dir, "edgex-grid.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

                // Keep the guard alive for the process lifetime
                Box::leak(Box::new(guard));

                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(e) => {
                eprintln!(
                    "Warning: could not write to log directory {} ({}), file logging disabled",
                    log_dir, e
                );
                None
            }
        }
    } else {
        eprintln!(
            "Warning: could not create log directory {}, file logging disabled",
            log_dir
        );
        None
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let file_logging_enabled = file_layer.is_some();
    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    if file_logging_enabled {
        eprintln!("Logging to: {}/edgex-grid.log", log_dir);
    }
}
