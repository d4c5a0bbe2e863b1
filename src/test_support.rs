//! Shared fixtures for tests that run a stand-in compiler

use lazy_static::lazy_static;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

lazy_static! {
    // Serializes tests that write and then exec scripts (ETXTBSY)
    static ref PROCESS_LOCK: Mutex<()> = Mutex::new(());
}

pub fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// File the fake compiler records its arguments in, one per line
pub const ARGS_FILE: &str = "args.txt";

/// File the fake compiler copies to `--descriptor_set_out` when present
pub const DESCRIPTOR_FILE: &str = "descriptor.bin";

/// Write a shell script into `dir` that behaves enough like protoc for our
/// purposes: it records its arguments, writes `<stem>_pb2.py` and
/// `<stem>_pb2.pyi` for every `.proto` argument, and exits with `exit_code`.
#[cfg(unix)]
pub fn fake_protoc(dir: &Path, exit_code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r##"#!/bin/sh
here="$(dirname "$0")"
: > "$here/{args}"
py_out=""
pyi_out=""
descriptor_out=""
for arg in "$@"; do
  printf '%s\n' "$arg" >> "$here/{args}"
  case "$arg" in
    --python_out=*) py_out="${{arg#--python_out=}}" ;;
    --pyi_out=*) pyi_out="${{arg#--pyi_out=}}" ;;
    --descriptor_set_out=*) descriptor_out="${{arg#--descriptor_set_out=}}" ;;
  esac
done
if [ {code} -ne 0 ]; then
  echo "fake protoc: failing with {code}" >&2
  exit {code}
fi
for arg in "$@"; do
  case "$arg" in
    -*) ;;
    *.proto)
      stem="$(basename "$arg" .proto)"
      echo "# source for $stem" > "$py_out/${{stem}}_pb2.py" || exit 1
      echo "# stub for $stem" > "$pyi_out/${{stem}}_pb2.pyi" || exit 1
      ;;
  esac
done
if [ -n "$descriptor_out" ] && [ -f "$here/{descriptor}" ]; then
  cp "$here/{descriptor}" "$descriptor_out" || exit 1
fi
exit 0
"##,
        args = ARGS_FILE,
        descriptor = DESCRIPTOR_FILE,
        code = exit_code,
    );

    let path = dir.join("fake-protoc");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Arguments the fake compiler received on its last run
pub fn recorded_args(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join(ARGS_FILE))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

/// Lay out an anchor directory with `protos/` holding the given files and
/// empty `generated/` output
pub fn anchor_with_protos(root: &Path, names: &[&str]) {
    let protos = root.join("protos");
    fs::create_dir_all(&protos).unwrap();
    fs::create_dir_all(root.join("generated")).unwrap();
    for name in names {
        fs::write(
            protos.join(name),
            "syntax = \"proto3\";\n\nmessage Task {\n  string id = 1;\n}\n",
        )
        .unwrap();
    }
}
