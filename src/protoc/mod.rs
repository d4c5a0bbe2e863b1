//! Compiler dispatch
//!
//! Builds the fixed `protoc` command line for a Python build and runs it
//! synchronously. Stdio is inherited: whatever the compiler prints is what
//! the caller sees, and its exit status becomes ours.

pub mod pattern;


use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use log::{debug, info, warn};

use crate::config::Config;
use crate::error::{GenerationError, GenerationResult};
use crate::resolver::ScriptDir;

/// Compiler used when nothing else is configured
pub const DEFAULT_PROTOC: &str = "protoc";

/// Environment variable naming the compiler, as honoured by prost-build
pub const PROTOC_ENV: &str = "PROTOC";

/// Pick the compiler program.
///
/// Precedence: command-line flag, then `PROTOC`, then the config file, then
/// `protoc` on `PATH`.
pub fn select_program(
    flag: Option<&str>,
    env_value: Option<OsString>,
    config: &Config,
) -> OsString {
    if let Some(program) = flag {
        return OsString::from(program);
    }
    if let Some(program) = env_value.filter(|value| !value.is_empty()) {
        return program;
    }
    match &config.protoc {
        Some(program) => OsString::from(program),
        None => OsString::from(DEFAULT_PROTOC),
    }
}

/// A fully built compiler command line
#[derive(Debug, Clone)]
pub struct ProtocInvocation {
    program: OsString,
    args: Vec<OsString>,
    proto_files: Vec<PathBuf>,
    stub_out: PathBuf,
    python_out: PathBuf,
}

impl ProtocInvocation {
    /// Derive the layout paths beneath `script_dir`, expand the proto
    /// pattern and assemble the argument list:
    ///
    /// `--pyi_out=<stubs> --python_out=<sources> -I<protos> [extra...] <protos>/*.proto`
    pub fn build(
        script_dir: &ScriptDir,
        config: &Config,
        program: OsString,
    ) -> GenerationResult<Self> {
        let layout = config.layout();
        let proto_dir = layout.proto_dir_in(script_dir);
        let stub_out = layout.stub_out_in(script_dir);
        let python_out = layout.python_out_in(script_dir);

        let pattern = config.file_pattern()?;
        let proto_files = pattern
            .expand(&proto_dir)
            .map_err(|source| GenerationError::Expand {
                dir: proto_dir.clone(),
                source,
            })?;

        if proto_files.is_empty() {
            warn!(
                "No files matching {} in {}",
                pattern.as_str(),
                proto_dir.display()
            );
        } else {
            debug!("Matched {} proto files in {}", proto_files.len(), proto_dir.display());
        }

        let mut args = Vec::with_capacity(3 + config.extra_args.len() + proto_files.len());
        args.push(flag_with_path("--pyi_out=", &stub_out));
        args.push(flag_with_path("--python_out=", &python_out));
        args.push(flag_with_path("-I", &proto_dir));
        args.extend(config.extra_args.iter().map(OsString::from));
        args.extend(proto_files.iter().map(|path| path.as_os_str().to_os_string()));

        Ok(ProtocInvocation {
            program,
            args,
            proto_files,
            stub_out,
            python_out,
        })
    }

    /// Ask the compiler to also write a `FileDescriptorSet` to `path`.
    ///
    /// The flag goes ahead of the file list so the files stay last.
    pub fn with_descriptor_set_out<P: AsRef<Path>>(mut self, path: P) -> Self {
        let position = self.args.len() - self.proto_files.len();
        self.args
            .insert(position, flag_with_path("--descriptor_set_out=", path.as_ref()));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn proto_files(&self) -> &[PathBuf] {
        &self.proto_files
    }

    pub fn stub_out(&self) -> &Path {
        &self.stub_out
    }

    pub fn python_out(&self) -> &Path {
        &self.python_out
    }

    /// Render the command line for display, quoting arguments with spaces
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|arg| {
                let arg = arg.to_string_lossy();
                if arg.is_empty() || arg.contains(char::is_whitespace) {
                    format!("'{}'", arg.replace('\'', "'\\''"))
                } else {
                    arg.into_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Create both output directories if they are missing
    pub fn create_output_dirs(&self) -> GenerationResult<()> {
        for dir in [&self.stub_out, &self.python_out] {
            if !dir.is_dir() {
                fs::create_dir_all(dir).map_err(|source| GenerationError::CreateDir {
                    dir: dir.clone(),
                    source,
                })?;
                info!("Created output directory: {}", dir.display());
            }
        }
        Ok(())
    }

    /// Run the compiler and wait for it.
    ///
    /// No retry, no timeout, no capture. A non-zero exit is not an error
    /// here; it is returned for the caller to surface.
    pub fn run(&self) -> GenerationResult<ExitStatus> {
        info!("Running {}", self.command_line());

        let status = Command::new(&self.program)
            .args(&self.args)
            .status()
            .map_err(|source| GenerationError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        if status.success() {
            info!("Compiled {} proto files", self.proto_files.len());
        } else {
            warn!("Compiler exited with {}", status);
        }
        Ok(status)
    }
}

fn flag_with_path(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path.as_os_str());
    arg
}

/// Exit code a shell would report for `status`
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
