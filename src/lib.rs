//! Protobuf to Python code generation
//!
//! This library drives `protoc` to turn a directory of `.proto` definitions
//! into Python modules (`*_pb2.py`) and type stubs (`*_pb2.pyi`). All paths
//! are fixed offsets beneath an anchor directory, by default the directory
//! holding the running program, so the result does not depend on the
//! caller's working directory.
//!
//! A run has three steps: [`Workspace::locate`] resolves the anchor and
//! loads configuration, [`Workspace::plan`] lists the proto files and builds
//! the command line without touching the output directories, and
//! [`Plan::execute`] runs the compiler.

use std::env;
use std::path::PathBuf;
use std::process::ExitStatus;

use log::{debug, warn};
use tempfile::NamedTempFile;

pub mod config;
pub mod error;
pub mod protoc;
pub mod report;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_support;


pub use config::{Config, ConfigError, Layout};
pub use error::{GenerationError, GenerationResult};
pub use protoc::{exit_code, ProtocInvocation};
pub use report::{GenerationReport, ReportError, ReportWriter};
pub use resolver::ScriptDir;

/// Knobs a caller may turn; the default reproduces a bare invocation
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Anchor directory; the executable's directory when `None`
    pub root: Option<PathBuf>,
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Compiler program, overriding `PROTOC` and the config file
    pub protoc: Option<String>,
    /// Where to write a generation report, if anywhere
    pub report: Option<PathBuf>,
}

/// Everything needed to run the compiler once
#[derive(Debug)]
pub struct Plan {
    workspace: Workspace,
    invocation: ProtocInvocation,
    report: Option<ReportRequest>,
}

#[derive(Debug)]
struct ReportRequest {
    destination: PathBuf,
    descriptor_set: NamedTempFile,
}

/// Result of a completed compiler run
#[derive(Debug)]
pub struct Outcome {
    pub status: ExitStatus,
    pub report: Option<GenerationReport>,
}

impl Outcome {
    /// Exit code to hand back to our own caller
    pub fn exit_code(&self) -> i32 {
        exit_code(self.status)
    }
}

/// Anchor directory and configuration, known before any file is listed
#[derive(Debug, Clone)]
pub struct Workspace {
    script_dir: ScriptDir,
    config: Config,
}

impl Workspace {
    /// Resolve the anchor and load its configuration
    pub fn locate(options: &Options) -> GenerationResult<Self> {
        let script_dir = match &options.root {
            Some(root) => ScriptDir::from_dir(root)?,
            None => ScriptDir::current()?,
        };
        debug!("Anchor directory: {}", script_dir.path().display());

        let config = Config::load(&script_dir, options.config.as_deref())?;
        Ok(Workspace { script_dir, config })
    }

    pub fn script_dir(&self) -> &ScriptDir {
        &self.script_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Absolute directory the proto files are read from
    pub fn proto_dir(&self) -> PathBuf {
        self.config.layout().proto_dir_in(&self.script_dir)
    }

    /// Expand the proto files and build the compiler command.
    ///
    /// Any failure here is fatal and happens before the compiler is started.
    pub fn plan(self, options: &Options) -> GenerationResult<Plan> {
        let program = protoc::select_program(
            options.protoc.as_deref(),
            env::var_os(protoc::PROTOC_ENV),
            &self.config,
        );

        let mut invocation = ProtocInvocation::build(&self.script_dir, &self.config, program)?;

        let report = match &options.report {
            Some(destination) => {
                let descriptor_set = NamedTempFile::new().map_err(ReportError::from)?;
                invocation = invocation.with_descriptor_set_out(descriptor_set.path());
                Some(ReportRequest {
                    destination: destination.clone(),
                    descriptor_set,
                })
            }
            None => None,
        };

        Ok(Plan {
            workspace: self,
            invocation,
            report,
        })
    }
}

/// Locate the workspace and build the compiler command in one step
pub fn prepare(options: &Options) -> GenerationResult<Plan> {
    Workspace::locate(options)?.plan(options)
}

impl Plan {
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn invocation(&self) -> &ProtocInvocation {
        &self.invocation
    }

    /// Run the compiler, then build the report if one was requested and the
    /// run succeeded.
    pub fn execute(self) -> GenerationResult<Outcome> {
        if self.workspace.config.create_dirs {
            self.invocation.create_output_dirs()?;
        }

        let status = self.invocation.run()?;

        let report = match self.report {
            Some(request) if status.success() => {
                Some(write_report(&self.invocation, &request)?)
            }
            Some(_) => {
                warn!("Skipping report, compiler exited with {}", status);
                None
            }
            None => None,
        };

        Ok(Outcome { status, report })
    }
}

fn write_report(
    invocation: &ProtocInvocation,
    request: &ReportRequest,
) -> GenerationResult<GenerationReport> {
    let set = report::read_descriptor_set(request.descriptor_set.path())?;
    let generated =
        GenerationReport::from_descriptor_set(&set, invocation.python_out(), invocation.stub_out());

    for missing in generated.missing_modules() {
        warn!("Expected generated module not found: {}", missing.display());
    }

    ReportWriter::new(&request.destination).write_report(&generated)?;
    Ok(generated)
}

/// Convenience wrapper: prepare and execute in one go
pub fn generate(options: &Options) -> GenerationResult<Outcome> {
    prepare(options)?.execute()
}
