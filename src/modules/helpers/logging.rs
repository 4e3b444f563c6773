use fern::Dispatch;
use log::LevelFilter;

/// # level filter
/// `OFF|ERROR|WARN|INFO|DEBUG|TRACE`, anything else is INFO
pub fn level_filter(verbosity: &str) -> LevelFilter {
    match verbosity.trim().to_uppercase().as_str() {
        "OFF" => LevelFilter::Off,
        "ERROR" => LevelFilter::Error,
        "WARN" => LevelFilter::Warn,
        "DEBUG" => LevelFilter::Debug,
        "TRACE" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// # setup logging
/// log to stdout and to `log_file`.
///
/// ## Arguments
/// * `verbosity` - the configured level name
/// * `log_file` - path of the log file, appended to
pub fn setup_logging(verbosity: &str, log_file: &str) -> Result<(), fern::InitError> {
    let base_config = Dispatch::new()
        .level(level_filter(verbosity))
        // rocket's own request logging is noisy at info
        .level_for("rocket", LevelFilter::Warn)
        .level_for("_", LevelFilter::Warn);

    let formatted = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .chain(std::io::stdout())
        .chain(fern::log_file(log_file)?);

    base_config.chain(formatted).apply()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_levels_fall_back_to_info() {
        assert_eq!(level_filter("warn"), LevelFilter::Warn);
        assert_eq!(level_filter("TRACE"), LevelFilter::Trace);
        assert_eq!(level_filter("verbose"), LevelFilter::Info);
        assert_eq!(level_filter(""), LevelFilter::Info);
    }
}
