use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::ast::Program;

/// Read the parser's JSON hand-off: one file, or every `.json` file of a
/// directory merged in file-name order.
pub fn load_program(path: &Path) -> Result<Program> {
    if path.is_file() {
        return read_document(path);
    }
    if !path.is_dir() {
        bail!("Input not found: {}", path.display());
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(path).with_context(|| format!("Failed to list {}", path.display()))? {
        let file = entry
            .with_context(|| format!("Failed to read an entry of {}", path.display()))?
            .path();
        if file.is_file() && file.extension().is_some_and(|ext| ext == "json") {
            files.push(file);
        }
    }
    files.sort();

    let mut program = Program::default();
    for file in &files {
        program.merge(read_document(file)?);
    }
    log::debug!("Loaded {} document(s) from {}", files.len(), path.display());
    Ok(program)
}

fn read_document(path: &Path) -> Result<Program> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merges_directory_documents_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), r#"{"units": [{"path": "b.php"}]}"#).unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"units": [{"path": "a.php"}]}"#).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let program = load_program(dir.path()).unwrap();
        let paths: Vec<_> = program.units.iter().map(|u| u.path.as_str()).collect();
        assert_eq!(paths, ["a.php", "b.php"]);
    }

    #[test]
    fn reports_the_failing_file() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{").unwrap();
        let err = load_program(&bad).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.json"));
    }
}
