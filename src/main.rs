use std::env;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use dual_logger::{bridge, for_dev, for_ops, LogError, Logger};
use log::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Small driver: `dual_logger [config.json] [file-prefix] [seconds]`.
///
/// Logs a heartbeat every second so config edits and midnight rotation can
/// be watched live.
fn main() -> Result<(), LogError> {
    // `set_global_default` rather than `init`: the `log` facade is claimed
    // by the bridge below, not by tracing-log.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("tracing subscriber not installed: {err}");
    }

    let mut args = env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let file_prefix = args.next();
    let seconds = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(5);

    let logger = Logger::builder().build()?;
    logger.configure(config_path.as_deref(), file_prefix.as_deref())?;
    bridge::install(logger.clone(), LevelFilter::Trace)?;

    for_ops!(logger, "dual_logger demo running for {}s", seconds);
    for tick in 0..seconds {
        for_ops!(logger, "heartbeat {}", tick);
        for_dev!(logger, "DB", "pool size {} after {} ticks", 4 + tick % 3, tick);
        log::debug!("facade heartbeat {}", tick);
        thread::sleep(Duration::from_secs(1));
    }

    logger.shutdown();
    Ok(())
}
