use log::LevelFilter;
use std::io::Write;

/// Initialize env_logger with timestamped output on stderr.
///
/// Level comes from `RUST_LOG` when set, otherwise info (debug with
/// `--verbose`). Safe to call more than once; later calls are no-ops.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(default_level);

    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .try_init();

    log::debug!("[logging] initialized: level={level}");
}
