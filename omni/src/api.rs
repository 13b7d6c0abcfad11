//! Rust API for compiling Omni code.
//!
//! The single compile entry point accepts a configuration record; the
//! CLI driver (an external collaborator) maps flags onto it and turns
//! the returned aggregate into process exit codes.

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::mir::printer::print_module;
use crate::pipeline::{compile_file, compile_str};

/// Code generation backend. Only the VM backend is handled here; native
/// backends are external collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Vm,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vm" => Ok(Backend::Vm),
            other => Err(format!("unsupported backend: {}", other)),
        }
    }
}

/// What to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emit {
    #[default]
    Mir,
}

impl FromStr for Emit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mir" => Ok(Emit::Mir),
            other => Err(format!("unsupported emit: {}", other)),
        }
    }
}

/// Side-effect dumps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dump {
    Mir,
}

impl FromStr for Dump {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mir" => Ok(Dump::Mir),
            other => Err(format!("unsupported dump: {}", other)),
        }
    }
}

/// The compile configuration record.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub input_path: PathBuf,
    /// Derived from `input_path` and `emit` when absent.
    pub output_path: Option<PathBuf>,
    pub backend: Backend,
    pub emit: Emit,
    pub dump: Option<Dump>,
    /// Additional module search paths after the input's directory.
    pub search_paths: Vec<PathBuf>,
}

impl CompileOptions {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: None,
            backend: Backend::Vm,
            emit: Emit::Mir,
            dump: None,
            search_paths: Vec::new(),
        }
    }
}

/// Compile failure, aggregated for the caller.
#[derive(Debug)]
pub enum CompileError {
    /// Bad configuration values.
    InvalidOptions(String),
    /// The aggregated diagnostic text; the only content the CLI writes
    /// to its error stream.
    Diagnostics(String),
    /// Output could not be written.
    Io(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileError::InvalidOptions(message) => write!(f, "{}", message),
            CompileError::Diagnostics(text) => write!(f, "{}", text),
            CompileError::Io(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for CompileError {}

/// A successful compilation's artifacts.
#[derive(Debug)]
pub struct CompileOutput {
    pub mir_text: String,
    pub output_path: PathBuf,
}

/// Compile a root file per the options: verify, print, write the `.mir`
/// text file, and optionally dump the MIR to standard output.
pub fn compile(options: &CompileOptions) -> Result<CompileOutput, CompileError> {
    let output_path = match &options.output_path {
        Some(path) => {
            if path.extension().is_none() {
                return Err(CompileError::InvalidOptions(format!(
                    "output path '{}' must have an extension",
                    path.display()
                )));
            }
            path.clone()
        }
        None => options.input_path.with_extension("mir"),
    };

    let compilation = compile_file(&options.input_path, &options.search_paths)
        .map_err(|diags| CompileError::Diagnostics(diags.render_all()))?;

    let mir_text = print_module(&compilation.mir);

    if options.dump == Some(Dump::Mir) {
        println!("{}", mir_text);
    }

    // The persisted layout is the printer's output plus a trailing
    // newline.
    fs::write(&output_path, format!("{}\n", mir_text)).map_err(|e| {
        CompileError::Io(format!(
            "could not write '{}': {}",
            output_path.display(),
            e
        ))
    })?;

    Ok(CompileOutput {
        mir_text,
        output_path,
    })
}

/// Compile source text to the canonical MIR text (no files involved).
pub fn compile_to_mir_str(source: &str) -> Result<String, String> {
    compile_str(source)
        .map(|compilation| print_module(&compilation.mir))
        .map_err(|diags| diags.render_all())
}

/// Compile source text to the MIR module serialized as JSON.
pub fn compile_to_json(source: &str) -> Option<String> {
    let compilation = compile_str(source).ok()?;
    serde_json::to_string(&compilation.mir).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_enums_reject_unknown_values() {
        assert_eq!(
            Backend::from_str("llvm").unwrap_err(),
            "unsupported backend: llvm"
        );
        assert_eq!(Emit::from_str("asm").unwrap_err(), "unsupported emit: asm");
        assert_eq!(Dump::from_str("ast").unwrap_err(), "unsupported dump: ast");
        assert_eq!(Backend::from_str("vm").unwrap(), Backend::Vm);
    }

    #[test]
    fn test_output_path_requires_extension() {
        let mut options = CompileOptions::new("main.omni");
        options.output_path = Some(PathBuf::from("out"));
        match compile(&options) {
            Err(CompileError::InvalidOptions(message)) => {
                assert!(message.contains("extension"));
            }
            other => panic!("expected InvalidOptions, got {:?}", other),
        }
    }

    #[test]
    fn test_compile_to_mir_str_constant_return() {
        let mir = compile_to_mir_str("func fortyTwo():int => 42").unwrap();
        assert_eq!(
            mir,
            "func fortyTwo():int\n  block entry:\n    %0 = const.int 42:int\n    ret %0"
        );
    }
}
