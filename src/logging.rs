use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::errors::LoggingError;

const PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l}):<5} {t} - {m}{n}";

/// Builds the logger configuration, a file appender and optionally a console appender
///
/// # Arguments
///
/// * 'log_path' - path to the log file, missing directories are created
/// * 'level' - maximum level to log
/// * 'log_to_stdout' - whether to also log to stdout
pub fn logger_config(log_path: &str, level: LevelFilter, log_to_stdout: bool) -> Result<Config, LoggingError> {
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build(log_path)?;

    let mut builder = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file)));
    let mut root = Root::builder().appender("file");

    if log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    Ok(builder.build(root.build(level))?)
}

/// Installs the global logger
///
/// # Arguments
///
/// * 'log_path' - path to the log file
/// * 'level' - maximum level to log
/// * 'log_to_stdout' - whether to also log to stdout
pub fn setup_logger(log_path: &str, level: LevelFilter, log_to_stdout: bool) -> Result<(), LoggingError> {
    let config = logger_config(log_path, level, log_to_stdout)?;
    log4rs::init_config(config)?;

    Ok(())
}
