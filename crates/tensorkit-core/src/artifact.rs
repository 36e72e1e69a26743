use std::path::{Path, PathBuf};

/// Where a serialized graph is read from.
#[derive(Clone, Debug)]
pub enum GraphSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl GraphSource {
    /// Human-readable origin, used in log lines and error contexts.
    pub fn describe(&self) -> String {
        match self {
            GraphSource::Path(path) => path.display().to_string(),
            GraphSource::Bytes(bytes) => format!("<{} bytes in memory>", bytes.len()),
        }
    }
}

impl From<PathBuf> for GraphSource {
    fn from(path: PathBuf) -> Self {
        GraphSource::Path(path)
    }
}

impl From<&Path> for GraphSource {
    fn from(path: &Path) -> Self {
        GraphSource::Path(path.to_path_buf())
    }
}
