//! Generation report
//!
//! When asked, the compiler also emits a `FileDescriptorSet` describing the
//! files it compiled. This module decodes that set and lines each proto file
//! up with the Python modules the compiler should have produced for it.

pub mod writer;

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use log::debug;
use prost::Message;
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use serde::{Deserialize, Serialize};

pub use writer::ReportWriter;

/// Suffix protoc's Python generator appends to module names
const MODULE_SUFFIX: &str = "_pb2";

/// Expected generated module paths for a proto file name, relative to the
/// source and stub output directories: `a/b.proto` gives `a/b_pb2.py` and
/// `a/b_pb2.pyi`.
pub fn expected_outputs(proto_name: &str) -> (PathBuf, PathBuf) {
    let stem = proto_name.strip_suffix(".proto").unwrap_or(proto_name);
    let module = format!("{}{}", stem, MODULE_SUFFIX);
    (
        PathBuf::from(format!("{}.py", module)),
        PathBuf::from(format!("{}.pyi", module)),
    )
}

/// Decode a serialized `FileDescriptorSet`
pub fn decode_descriptor_set(buffer: Bytes) -> Result<FileDescriptorSet, ReportError> {
    let set = FileDescriptorSet::decode(buffer)?;
    debug!("Decoded descriptor set with {} files", set.file.len());
    Ok(set)
}

/// Read and decode a descriptor set written by the compiler
pub fn read_descriptor_set<P: AsRef<Path>>(path: P) -> Result<FileDescriptorSet, ReportError> {
    let buffer = fs::read(path)?;
    decode_descriptor_set(Bytes::from(buffer))
}

/// One generated module and whether it is on disk
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleReport {
    pub path: PathBuf,
    pub exists: bool,
}

impl ModuleReport {
    fn probe(path: PathBuf) -> Self {
        let exists = path.is_file();
        ModuleReport { path, exists }
    }
}

/// What was generated for a single proto file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProtoReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    pub messages: Vec<String>,
    pub enums: Vec<String>,
    pub services: Vec<String>,
    pub source: ModuleReport,
    pub stub: ModuleReport,
}

impl ProtoReport {
    fn from_descriptor(file: &FileDescriptorProto, python_out: &Path, stub_out: &Path) -> Self {
        let name = file.name().to_string();
        let (source, stub) = expected_outputs(&name);

        ProtoReport {
            package: file.package.clone().filter(|package| !package.is_empty()),
            messages: file.message_type.iter().map(|m| m.name().to_string()).collect(),
            enums: file.enum_type.iter().map(|e| e.name().to_string()).collect(),
            services: file.service.iter().map(|s| s.name().to_string()).collect(),
            source: ModuleReport::probe(python_out.join(source)),
            stub: ModuleReport::probe(stub_out.join(stub)),
            name,
        }
    }
}

/// Report over every file in a compiler run
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerationReport {
    pub files: Vec<ProtoReport>,
}

impl GenerationReport {
    pub fn from_descriptor_set(set: &FileDescriptorSet, python_out: &Path, stub_out: &Path) -> Self {
        GenerationReport {
            files: set
                .file
                .iter()
                .map(|file| ProtoReport::from_descriptor(file, python_out, stub_out))
                .collect(),
        }
    }

    /// Generated modules expected but not found on disk
    pub fn missing_modules(&self) -> Vec<&Path> {
        self.files
            .iter()
            .flat_map(|file| [&file.source, &file.stub])
            .filter(|module| !module.exists)
            .map(|module| module.path.as_path())
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Error type for report operations
#[derive(Debug)]
pub enum ReportError {
    Io(io::Error),
    Decode(prost::DecodeError),
    Serialize(serde_json::Error),
}

impl From<io::Error> for ReportError {
    fn from(err: io::Error) -> Self {
        ReportError::Io(err)
    }
}

impl From<prost::DecodeError> for ReportError {
    fn from(err: prost::DecodeError) -> Self {
        ReportError::Decode(err)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialize(err)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Io(err) => write!(f, "I/O error: {}", err),
            ReportError::Decode(err) => write!(f, "Invalid descriptor set: {}", err),
            ReportError::Serialize(err) => write!(f, "Serialization error: {}", err),
        }
    }
}

impl Error for ReportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReportError::Io(err) => Some(err),
            ReportError::Decode(err) => Some(err),
            ReportError::Serialize(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::{DescriptorProto, EnumDescriptorProto, ServiceDescriptorProto};
    use tempfile::tempdir;

    fn sample_set() -> FileDescriptorSet {
        FileDescriptorSet {
            file: vec![FileDescriptorProto {
                name: Some("msg.proto".to_string()),
                package: Some("pipeline.v1".to_string()),
                message_type: vec![
                    DescriptorProto {
                        name: Some("IndexRequest".to_string()),
                        ..Default::default()
                    },
                    DescriptorProto {
                        name: Some("IndexOutput".to_string()),
                        ..Default::default()
                    },
                ],
                enum_type: vec![EnumDescriptorProto {
                    name: Some("Status".to_string()),
                    ..Default::default()
                }],
                service: vec![ServiceDescriptorProto {
                    name: Some("Indexer".to_string()),
                    ..Default::default()
                }],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_expected_outputs() {
        assert_eq!(
            expected_outputs("msg.proto"),
            (PathBuf::from("msg_pb2.py"), PathBuf::from("msg_pb2.pyi"))
        );
        assert_eq!(
            expected_outputs("nested/dir/task.proto"),
            (
                PathBuf::from("nested/dir/task_pb2.py"),
                PathBuf::from("nested/dir/task_pb2.pyi")
            )
        );
    }

    #[test]
    fn test_decode_encoded_set() {
        let encoded = Bytes::from(sample_set().encode_to_vec());
        let decoded = decode_descriptor_set(encoded).unwrap();
        assert_eq!(decoded, sample_set());
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result = decode_descriptor_set(Bytes::from_static(&[0x0a, 0xff, 0xff]));
        assert!(matches!(result, Err(ReportError::Decode(_))));
    }

    #[test]
    fn test_report_probes_outputs() {
        let temp_dir = tempdir().unwrap();
        let python_out = temp_dir.path().join("py");
        let stub_out = temp_dir.path().join("pyi");
        fs::create_dir_all(&python_out).unwrap();
        fs::create_dir_all(&stub_out).unwrap();
        fs::write(python_out.join("msg_pb2.py"), "").unwrap();

        let report = GenerationReport::from_descriptor_set(&sample_set(), &python_out, &stub_out);

        assert_eq!(report.files.len(), 1);
        let file = &report.files[0];
        assert_eq!(file.name, "msg.proto");
        assert_eq!(file.package.as_deref(), Some("pipeline.v1"));
        assert_eq!(file.messages, vec!["IndexRequest", "IndexOutput"]);
        assert_eq!(file.enums, vec!["Status"]);
        assert_eq!(file.services, vec!["Indexer"]);
        assert!(file.source.exists);
        assert!(!file.stub.exists);
        assert_eq!(report.missing_modules(), vec![stub_out.join("msg_pb2.pyi").as_path()]);
    }

    #[test]
    fn test_json_omits_empty_package() {
        let mut set = sample_set();
        set.file[0].package = None;
        let report = GenerationReport::from_descriptor_set(&set, Path::new("py"), Path::new("pyi"));

        let json = report.to_json().unwrap();
        assert!(!json.contains("\"package\""));
        assert!(json.contains("\"IndexRequest\""));
    }
}
