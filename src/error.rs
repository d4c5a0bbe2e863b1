use std::error::Error;
use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::config::ConfigError;
use crate::report::ReportError;

/// Represents all the ways a generation run can fail before or while
/// handing work to the compiler.
///
/// Problems the compiler itself reports (bad proto syntax, a missing
/// output directory) are not represented here; they surface through the
/// compiler's own exit status.
#[derive(Debug)]
pub enum GenerationError {
    /// The anchor directory could not be resolved
    Resolve { path: PathBuf, source: io::Error },
    /// The proto directory could not be listed
    Expand { dir: PathBuf, source: io::Error },
    /// The compiler process could not be started
    Spawn { program: String, source: io::Error },
    /// An output directory could not be created
    CreateDir { dir: PathBuf, source: io::Error },
    /// Configuration could not be loaded
    Config(ConfigError),
    /// The generation report could not be produced
    Report(ReportError),
}

impl GenerationError {
    /// Process exit code used when this error ends the run.
    ///
    /// Spawn failures follow the shell's conventions so that callers see the
    /// same codes a `protoc: command not found` would have produced.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenerationError::Spawn { source, .. } => match source.kind() {
                io::ErrorKind::NotFound => 127,
                io::ErrorKind::PermissionDenied => 126,
                _ => 1,
            },
            _ => 1,
        }
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Resolve { path, source } => {
                write!(f, "Cannot resolve directory of {}: {}", path.display(), source)
            }
            GenerationError::Expand { dir, source } => {
                write!(f, "Cannot list proto directory {}: {}", dir.display(), source)
            }
            GenerationError::Spawn { program, source } => {
                write!(f, "Cannot run compiler '{}': {}", program, source)
            }
            GenerationError::CreateDir { dir, source } => {
                write!(f, "Cannot create output directory {}: {}", dir.display(), source)
            }
            GenerationError::Config(err) => write!(f, "Configuration error: {}", err),
            GenerationError::Report(err) => write!(f, "Report error: {}", err),
        }
    }
}

impl Error for GenerationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GenerationError::Resolve { source, .. } => Some(source),
            GenerationError::Expand { source, .. } => Some(source),
            GenerationError::Spawn { source, .. } => Some(source),
            GenerationError::CreateDir { source, .. } => Some(source),
            GenerationError::Config(err) => Some(err),
            GenerationError::Report(err) => Some(err),
        }
    }
}

impl From<ConfigError> for GenerationError {
    fn from(err: ConfigError) -> Self {
        GenerationError::Config(err)
    }
}

impl From<ReportError> for GenerationError {
    fn from(err: ReportError) -> Self {
        GenerationError::Report(err)
    }
}

/// A Result type specialized for generation runs
pub type GenerationResult<T> = Result<T, GenerationError>;
