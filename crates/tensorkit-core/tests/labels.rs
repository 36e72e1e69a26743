use std::io::Write;

use anyhow::Result;
use tensorkit_core::{load_labels, Error, LABEL_PADDING};

#[test]
fn five_line_file_is_padded() -> Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(file, "background\nperson\nbicycle\ncar\nmotorcycle\n")?;

    let labels = load_labels(file.path())?;
    assert_eq!(labels.len(), LABEL_PADDING);
    assert_eq!(
        &labels[..5],
        ["background", "person", "bicycle", "car", "motorcycle"]
    );
    assert!(labels[5..].iter().all(String::is_empty));
    Ok(())
}

#[test]
fn missing_file_is_not_found() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("labels.txt");

    let err = load_labels(&path).unwrap_err();
    match err {
        Error::NotFound { path: missing } => assert_eq!(missing, path),
        other => panic!("expected NotFound, got {other:?}"),
    }
    Ok(())
}
