//! Process logging bootstrap.
//!
//! # Responsibility
//! - Start one `flexi_logger` backend per process, writing either to
//!   size-rotated files or to stderr.
//! - Route panics through the logger as single-line events.
//!
//! # Invariants
//! - A second init with the same level and destination is a no-op.
//! - A second init asking for anything else is rejected, never applied.
//! - Initialization does not panic.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "profilemap";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

/// Where log records are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    Stderr,
    /// Absolute directory holding `profilemap*.log` files.
    Directory(PathBuf),
}

impl Display for LogDestination {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => write!(f, "stderr"),
            Self::Directory(dir) => write!(f, "{}", dir.display()),
        }
    }
}

/// Logging setup failure.
#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    InvalidLogDir(String),
    CreateLogDir { dir: PathBuf, source: std::io::Error },
    Backend(String),
    /// Logging is already running with another level or destination.
    Conflict {
        active: String,
        requested: String,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::InvalidLogDir(reason) => write!(f, "invalid log directory: {reason}"),
            Self::CreateLogDir { dir, source } => write!(
                f,
                "failed to create log directory `{}`: {source}",
                dir.display()
            ),
            Self::Backend(reason) => write!(f, "failed to start logger: {reason}"),
            Self::Conflict { active, requested } => write!(
                f,
                "logging already running as `{active}`; refusing to switch to `{requested}`"
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateLogDir { source, .. } => Some(source),
            _ => None,
        }
    }
}

struct ActiveLogger {
    level: &'static str,
    destination: LogDestination,
    _handle: LoggerHandle,
}

impl ActiveLogger {
    fn label(level: &str, destination: &LogDestination) -> String {
        format!("{level}@{destination}")
    }

    fn ensure_matches(
        &self,
        level: &'static str,
        destination: &LogDestination,
    ) -> Result<(), LoggingError> {
        if self.level == level && &self.destination == destination {
            return Ok(());
        }
        Err(LoggingError::Conflict {
            active: Self::label(self.level, &self.destination),
            requested: Self::label(level, destination),
        })
    }
}

/// Starts process logging.
///
/// `log_dir` selects rotated files in that absolute directory; `None` logs
/// to stderr.
///
/// # Errors
/// - `UnsupportedLevel` / `InvalidLogDir` for bad arguments.
/// - `CreateLogDir` / `Backend` when the backend cannot start.
/// - `Conflict` when logging already runs with other settings.
pub fn init_logging(level: &str, log_dir: Option<&str>) -> Result<(), LoggingError> {
    let level = parse_level(level)?;
    let destination = match log_dir {
        Some(dir) => LogDestination::Directory(parse_log_dir(dir)?),
        None => LogDestination::Stderr,
    };

    if let Some(active) = ACTIVE.get() {
        return active.ensure_matches(level, &destination);
    }

    let active = ACTIVE.get_or_try_init(|| start_backend(level, destination.clone()))?;
    active.ensure_matches(level, &destination)
}

fn start_backend(
    level: &'static str,
    destination: LogDestination,
) -> Result<ActiveLogger, LoggingError> {
    let logger =
        Logger::try_with_str(level).map_err(|err| LoggingError::Backend(err.to_string()))?;

    let started = match &destination {
        LogDestination::Directory(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateLogDir {
                dir: dir.clone(),
                source,
            })?;
            logger
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
        }
        LogDestination::Stderr => logger
            .log_to_stderr()
            .format_for_stderr(flexi_logger::detailed_format)
            .start(),
    };
    let handle = started.map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook();
    info!(
        "event=logging_init module=core status=ok level={level} destination={destination} version={}",
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        destination,
        _handle: handle,
    })
}

/// Returns the running level and destination, if logging was started.
pub fn logging_status() -> Option<(&'static str, LogDestination)> {
    ACTIVE
        .get()
        .map(|active| (active.level, active.destination.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn parse_level(level: &str) -> Result<&'static str, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn parse_log_dir(log_dir: &str) -> Result<PathBuf, LoggingError> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err(LoggingError::InvalidLogDir("path is empty".to_string()));
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(LoggingError::InvalidLogDir(format!(
            "`{trimmed}` is not absolute"
        )));
    }
    Ok(path.to_path_buf())
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned());
        error!(
            "event=panic module=core status=error location={location} payload={}",
            panic_summary(payload.as_deref())
        );
        previous(info);
    }));
}

/// One-line, length-capped rendering of a panic payload.
///
/// Payloads can carry user text such as profile descriptions.
fn panic_summary(payload: Option<&str>) -> String {
    let Some(payload) = payload else {
        return "<non-string payload>".to_string();
    };
    let single_line: String = payload
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if single_line.chars().count() <= MAX_PANIC_PAYLOAD_CHARS {
        return single_line;
    }
    let mut capped: String = single_line.chars().take(MAX_PANIC_PAYLOAD_CHARS).collect();
    capped.push_str("...");
    capped
}
