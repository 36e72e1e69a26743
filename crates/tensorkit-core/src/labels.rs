use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, error};

use crate::{Error, Result};

/// Label lists are padded to a multiple of this many entries.
pub const LABEL_PADDING: usize = 16;

/// Reads one label per line from `path`, padded with empty strings to a
/// multiple of [`LABEL_PADDING`].
pub fn load_labels(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        let err = Error::io(path, e);
        error!(path = %path.display(), error = %err, "failed to open labels file");
        err
    })?;

    let labels = read_labels(BufReader::new(file)).map_err(|e| match e {
        Error::Io { source, .. } => Error::io(path, source),
        other => other,
    })?;
    debug!(path = %path.display(), count = labels.len(), "loaded labels");
    Ok(labels)
}

/// Same as [`load_labels`] for an already-open reader.
pub fn read_labels<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut labels = reader
        .lines()
        .collect::<std::io::Result<Vec<String>>>()
        .map_err(|source| Error::Io {
            path: "<reader>".into(),
            source,
        })?;

    let padded = labels.len().next_multiple_of(LABEL_PADDING);
    labels.resize(padded, String::new());
    Ok(labels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_to_sixteen() {
        let labels = read_labels("a\nb\nc\nd\ne\n".as_bytes()).unwrap();
        assert_eq!(labels.len(), 16);
        assert_eq!(&labels[..5], ["a", "b", "c", "d", "e"]);
        assert!(labels[5..].iter().all(String::is_empty));
    }

    #[test]
    fn exact_multiple_is_not_padded() {
        let text = (0..32).map(|i| format!("label{i}\n")).collect::<String>();
        let labels = read_labels(text.as_bytes()).unwrap();
        assert_eq!(labels.len(), 32);
        assert_eq!(labels[31], "label31");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(read_labels("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn crlf_and_missing_trailing_newline() {
        let labels = read_labels("tench\r\ngoldfish".as_bytes()).unwrap();
        assert_eq!(&labels[..2], ["tench", "goldfish"]);
        assert_eq!(labels.len(), 16);
    }
}
