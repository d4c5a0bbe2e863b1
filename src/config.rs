use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::protoc::pattern::FilePattern;
use crate::resolver::ScriptDir;

/// Config file looked up in the anchor directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "protoc-python.json";

/// Configuration for a generation run
///
/// Every field has a default, so an empty JSON object (or no file at all)
/// yields the stock layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Directory holding the `.proto` sources, relative to the anchor
    #[serde(default = "default_proto_dir")]
    pub proto_dir: String,

    /// Output directory for `.pyi` stubs, relative to the anchor
    #[serde(default = "default_output_dir")]
    pub stub_out: String,

    /// Output directory for `.py` sources, relative to the anchor
    #[serde(default = "default_output_dir")]
    pub python_out: String,

    /// Shell-style pattern selecting proto files inside `proto_dir`
    #[serde(default = "default_pattern")]
    pub pattern: String,

    /// Compiler program; the `PROTOC` variable and `--protoc` take precedence
    #[serde(default)]
    pub protoc: Option<String>,

    /// Whether to create output directories before running the compiler
    #[serde(default)]
    pub create_dirs: bool,

    /// Extra compiler arguments, placed before the file list
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// The three fixed offsets beneath the anchor directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub proto_dir: PathBuf,
    pub stub_out: PathBuf,
    pub python_out: PathBuf,
}

impl Layout {
    /// Absolute proto directory for `script_dir`
    pub fn proto_dir_in(&self, script_dir: &ScriptDir) -> PathBuf {
        script_dir.join(&self.proto_dir)
    }

    pub fn stub_out_in(&self, script_dir: &ScriptDir) -> PathBuf {
        script_dir.join(&self.stub_out)
    }

    pub fn python_out_in(&self, script_dir: &ScriptDir) -> PathBuf {
        script_dir.join(&self.python_out)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Config::default().layout()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            proto_dir: default_proto_dir(),
            stub_out: default_output_dir(),
            python_out: default_output_dir(),
            pattern: default_pattern(),
            protoc: None,
            create_dirs: false,
            extra_args: Vec::new(),
        }
    }
}

// Default helper functions
fn default_proto_dir() -> String {
    "protos".to_string()
}

fn default_output_dir() -> String {
    "generated".to_string()
}

fn default_pattern() -> String {
    "*.proto".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.file_pattern()?;

        Ok(config)
    }

    /// Load the configuration for a run anchored at `script_dir`.
    ///
    /// An explicit path must exist. Without one, `DEFAULT_CONFIG_FILE` in
    /// the anchor is used when present and the defaults otherwise.
    pub fn load(script_dir: &ScriptDir, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            info!("Loading configuration from {}", path.display());
            return Self::from_file(path);
        }

        let candidate = script_dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            info!("Loading configuration from {}", candidate.display());
            Self::from_file(candidate)
        } else {
            debug!("No {} in {}, using defaults", DEFAULT_CONFIG_FILE, script_dir.path().display());
            Ok(Config::default())
        }
    }

    /// Get the directory layout described by this configuration
    pub fn layout(&self) -> Layout {
        Layout {
            proto_dir: PathBuf::from(&self.proto_dir),
            stub_out: PathBuf::from(&self.stub_out),
            python_out: PathBuf::from(&self.python_out),
        }
    }

    /// Compile the proto file pattern
    pub fn file_pattern(&self) -> Result<FilePattern, ConfigError> {
        FilePattern::new(&self.pattern).map_err(ConfigError::Pattern)
    }
}

/// Error type for configuration operations
#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    Parse(serde_json::Error),
    Pattern(regex::Error),
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "I/O error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
            ConfigError::Pattern(err) => write!(f, "Invalid file pattern: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Pattern(err) => Some(err),
        }
    }
}
