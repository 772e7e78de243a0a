//! Logging bootstrap.
//!
//! Library code only uses the `log` macros. Applications embedding the editor
//! call [`init_logging`] once at startup to route those records through
//! `flexi_logger`, either to stderr or to size-rotated files.
//!
//! Log lines carry ids, counts and offsets only. Document and note text are
//! never logged.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use thiserror::Error;

const LOG_FILE_BASENAME: &str = "annotation-graph";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoggingError {
    #[error("unsupported log level `{0}`; expected trace|debug|info|warn|error")]
    UnsupportedLevel(String),
    #[error("log directory must be an absolute path, got `{0}`")]
    RelativeDirectory(PathBuf),
    #[error("failed to create log directory `{path}`: {reason}")]
    CreateDirectory { path: PathBuf, reason: String },
    #[error("failed to start logger: {0}")]
    Backend(String),
    #[error("logging already initialized ({active}); refusing to switch to {requested}")]
    Conflict { active: String, requested: String },
}

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    Directory(PathBuf),
}

impl LogTarget {
    fn describe(&self, level: &str) -> String {
        match self {
            Self::Stderr => format!("level `{level}` to stderr"),
            Self::Directory(dir) => format!("level `{level}` in `{}`", dir.display()),
        }
    }
}

struct LoggingState {
    level: &'static str,
    target: LogTarget,
    _logger: LoggerHandle,
}

/// Start logging at `level`, to files under `log_dir` or to stderr when no
/// directory is given.
///
/// Calling again with the same level and target is a no-op; a different
/// level or target is rejected. Never panics.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<(), LoggingError> {
    let level = normalize_level(level)?;
    let target = match log_dir {
        None => LogTarget::Stderr,
        Some(dir) if dir.is_absolute() => LogTarget::Directory(dir.to_path_buf()),
        Some(dir) => return Err(LoggingError::RelativeDirectory(dir.to_path_buf())),
    };

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, target.clone()))?;
    if state.level != level || state.target != target {
        return Err(LoggingError::Conflict {
            active: state.target.describe(state.level),
            requested: target.describe(level),
        });
    }
    Ok(())
}

fn start_logger(level: &'static str, target: LogTarget) -> Result<LoggingState, LoggingError> {
    let logger = Logger::try_with_str(level).map_err(|err| LoggingError::Backend(err.to_string()))?;
    let logger = match &target {
        LogTarget::Stderr => logger.log_to_stderr().format(flexi_logger::detailed_format),
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| LoggingError::CreateDirectory {
                path: dir.clone(),
                reason: err.to_string(),
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir.as_path()).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
        }
    };
    let handle = logger.start().map_err(|err| LoggingError::Backend(err.to_string()))?;

    info!(
        "logging started: {} version={}",
        target.describe(level),
        env!("CARGO_PKG_VERSION")
    );
    Ok(LoggingState {
        level,
        target,
        _logger: handle,
    })
}

/// Active `(level, target)`, or `None` before [`init_logging`] succeeded.
pub fn logging_status() -> Option<(&'static str, LogTarget)> {
    LOGGING_STATE
        .get()
        .map(|state| (state.level, state.target.clone()))
}

/// `debug` in debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn normalize_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}
