use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Boxed error surfaced by an external runtime.
pub type RuntimeError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    /// A caller-supplied argument was malformed or out of range.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// The runtime rejected a graph or session request.
    #[error("{context} | {source}")]
    RuntimeFailure {
        context: String,
        #[source]
        source: RuntimeError,
    },

    #[error("{} not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn runtime(context: impl Into<String>, source: impl Into<RuntimeError>) -> Self {
        Error::RuntimeFailure {
            context: context.into(),
            source: source.into(),
        }
    }

    /// Maps an I/O error on `path`, splitting out a missing file.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_runtime_failure(&self) -> bool {
        matches!(self, Error::RuntimeFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = Error::io(
            Path::new("labels.txt"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "labels.txt not found");

        let err = Error::io(
            Path::new("labels.txt"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn runtime_failure_keeps_source() {
        let err = Error::runtime("error loading graph model.onnx", "protobuf parse failed");
        assert!(err.is_runtime_failure());
        assert_eq!(
            err.to_string(),
            "error loading graph model.onnx | protobuf parse failed"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("protobuf parse failed"));
    }
}
