use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    BindingError,
    ArgumentError,
    NameError,
    SyntaxError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::BindingError => write!(f, "BindingError"),
            ErrorCategory::ArgumentError => write!(f, "ArgumentError"),
            ErrorCategory::NameError => write!(f, "NameError"),
            ErrorCategory::SyntaxError => write!(f, "SyntaxError"),
        }
    }
}

#[derive(Debug, Error)]
#[error("{category}: {message}")]
pub struct CompileError {
    pub category: ErrorCategory,
    pub message: String,
    pub file: String,
    pub line: usize,
    pub source_line: Option<String>,
    pub function_name: Option<String>,
    /// How to fix it, printed after the excerpt.
    pub help: Option<String>,
}

pub fn print_error(file: &Path, err: &anyhow::Error) {
    if let Some(ce) = err.chain().find_map(|e| e.downcast_ref::<CompileError>()) {
        print_compile_error(ce);
    } else {
        let message = err.root_cause().to_string();
        eprintln!("error: {}", message);
        eprintln!("  --> {}", file.display());
    }
}

fn print_compile_error(ce: &CompileError) {
    let line_num = ce.line.to_string();
    let pad = line_num.len();

    eprintln!("{}: {}", ce.category, ce.message);

    eprint!(" {:>pad$} --> ", "", pad = pad);
    eprint!("{}:{}", ce.file, ce.line);
    if let Some(ref func) = ce.function_name {
        eprint!(", in {}", func);
    }
    eprintln!();

    if let Some(ref src) = ce.source_line {
        let trimmed = src.trim();
        if !trimmed.is_empty() {
            eprintln!(" {:>pad$} |", "", pad = pad);
            eprintln!(" {} |   {}", line_num, trimmed);
            eprintln!(" {:>pad$} |", "", pad = pad);
        }
    }

    if let Some(ref help) = ce.help {
        eprintln!(" {:>pad$} = help: {}", "", help, pad = pad);
    }
}
