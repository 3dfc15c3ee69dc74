use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Output flavour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmitTarget {
    /// C++ against the runtime library
    #[default]
    Cpp,
    /// Calls printed back in source form
    Source,
    /// Source form with dynamic function names routed through `dynamic_load`
    Trimmed,
}

/// Identifier prefixes of generated C++ symbols.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Prefixes {
    pub function: String,
    pub class: String,
    pub method: String,
    pub variable: String,
    pub class_statics: String,
    pub object_static: String,
}

impl Default for Prefixes {
    fn default() -> Self {
        Self {
            function: "f_".into(),
            class: "c_".into(),
            method: "t_".into(),
            variable: "v_".into(),
            class_statics: "cw_".into(),
            object_static: "os_".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodegenOptions {
    pub prefixes: Prefixes,
    /// Worker threads per phase.
    pub jobs: usize,
    pub optimize_iterations: usize,
    pub emit: EmitTarget,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            prefixes: Prefixes::default(),
            jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            optimize_iterations: 4,
            emit: EmitTarget::default(),
        }
    }
}

impl CodegenOptions {
    /// Read options from a JSON file; missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid options file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_files_keep_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"prefixes": {{"function": "fn_"}}, "emit": "trimmed"}}"#).unwrap();

        let options = CodegenOptions::load(file.path()).unwrap();
        assert_eq!(options.prefixes.function, "fn_");
        assert_eq!(options.prefixes.method, "t_");
        assert_eq!(options.emit, EmitTarget::Trimmed);
        assert_eq!(options.optimize_iterations, 4);
    }

    #[test]
    fn rejects_malformed_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = CodegenOptions::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid options file"));
    }
}
