use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{App, Arg, ArgMatches};
use log::{error, info};

use protobuf_to_python::{Options, Workspace};

fn cli() -> App<'static, 'static> {
    App::new("protobuf-to-python")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generate Python modules and type stubs from .proto files with protoc")
        .arg(
            Arg::with_name("root")
                .long("root")
                .value_name("DIR")
                .takes_value(true)
                .help("Anchor directory (defaults to the directory of this executable)"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .value_name("FILE")
                .takes_value(true)
                .help("JSON configuration file"),
        )
        .arg(
            Arg::with_name("protoc")
                .long("protoc")
                .value_name("PATH")
                .takes_value(true)
                .help("Compiler to run (overrides PROTOC)"),
        )
        .arg(
            Arg::with_name("report")
                .long("report")
                .value_name("FILE")
                .takes_value(true)
                .help("Write a JSON report of the generated modules"),
        )
        .arg(
            Arg::with_name("dry-run")
                .long("dry-run")
                .help("Print the compiler command line without running it"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .conflicts_with("quiet")
                .help("Enable debug logging"),
        )
        .arg(
            Arg::with_name("quiet")
                .short("q")
                .long("quiet")
                .help("Only log warnings and errors"),
        )
}

fn init_logging(matches: &ArgMatches) {
    let default_filter = if matches.is_present("verbose") {
        "debug"
    } else if matches.is_present("quiet") {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn options_from(matches: &ArgMatches) -> Options {
    Options {
        root: matches.value_of("root").map(PathBuf::from),
        config: matches.value_of("config").map(PathBuf::from),
        protoc: matches.value_of("protoc").map(str::to_string),
        report: matches.value_of("report").map(PathBuf::from),
    }
}

/// Print the anchor and proto directories, one per line
fn announce<W: Write>(out: &mut W, workspace: &Workspace) -> io::Result<()> {
    writeln!(out, "{}", workspace.script_dir().path().display())?;
    writeln!(out, "{}", workspace.proto_dir().display())?;
    out.flush()
}

fn run<W: Write>(matches: &ArgMatches, out: &mut W) -> i32 {
    let options = options_from(matches);

    let workspace = match Workspace::locate(&options) {
        Ok(workspace) => workspace,
        Err(e) => {
            error!("{}", e);
            return e.exit_code();
        }
    };

    if let Err(e) = announce(out, &workspace) {
        error!("Cannot write to stdout: {}", e);
        return 1;
    }

    let plan = match workspace.plan(&options) {
        Ok(plan) => plan,
        Err(e) => {
            error!("{}", e);
            return e.exit_code();
        }
    };

    if matches.is_present("dry-run") {
        return match writeln!(out, "{}", plan.invocation().command_line()) {
            Ok(()) => 0,
            Err(e) => {
                error!("Cannot write to stdout: {}", e);
                1
            }
        };
    }

    match plan.execute() {
        Ok(outcome) => {
            if let Some(report) = &outcome.report {
                info!("Report covers {} proto files", report.files.len());
            }
            outcome.exit_code()
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    }
}

fn main() {
    let matches = cli().get_matches();
    init_logging(&matches);

    let code = run(&matches, &mut io::stdout());
    process::exit(code);
}
