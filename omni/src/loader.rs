//! Module loader.
//!
//! Resolves dotted import paths to `.omni` files using an ordered
//! search-path list, with a compile-unit-level cache keyed by the dotted
//! path string. Cycles are implicitly broken by the cache: already-loaded
//! modules are returned without reparsing.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use omni_parser::ast::Module;
use omni_parser::{parse_source, ParseError};

/// A module resolved, read and parsed by the loader.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub name: String,
    pub path: PathBuf,
    pub source: String,
    pub module: Module,
}

/// Loader failure variants.
#[derive(Debug)]
pub enum LoadError {
    /// No search path contained the module.
    ModuleNotFound {
        module: String,
        searched: Vec<PathBuf>,
    },
    IoError {
        module: String,
        path: PathBuf,
        message: String,
    },
    /// The module's source failed to lex.
    LexFailed {
        module: String,
        path: PathBuf,
        errors: Vec<ParseError>,
    },
    /// The module's source failed to parse.
    ParseFailed {
        module: String,
        path: PathBuf,
        errors: Vec<ParseError>,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::ModuleNotFound { module, searched } => {
                write!(f, "module '{}' not found; searched:", module)?;
                for path in searched {
                    write!(f, " {}", path.display())?;
                }
                Ok(())
            }
            LoadError::IoError {
                module,
                path,
                message,
            } => write!(
                f,
                "could not read module '{}' at {}: {}",
                module,
                path.display(),
                message
            ),
            LoadError::LexFailed {
                module,
                path,
                errors,
            } => write!(
                f,
                "module '{}' at {} failed to lex: {}",
                module,
                path.display(),
                errors
                    .first()
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            ),
            LoadError::ParseFailed {
                module,
                path,
                errors,
            } => write!(
                f,
                "module '{}' at {} failed to parse: {}",
                module,
                path.display(),
                errors
                    .first()
                    .map(|e| e.to_string())
                    .unwrap_or_default()
            ),
        }
    }
}

impl std::error::Error for LoadError {}

impl LoadError {
    /// A fix-it hint for the import diagnostic, when one applies.
    pub fn hint(&self) -> Option<String> {
        match self {
            LoadError::ModuleNotFound { module, .. } => Some(format!(
                "create '{}.omni' in a search path or fix the import",
                module.rsplit('.').next().unwrap_or(module)
            )),
            _ => None,
        }
    }
}

/// Module loader with an insertion-ordered cache.
#[derive(Debug, Default)]
pub struct ModuleLoader {
    search_paths: Vec<PathBuf>,
    cache: HashMap<String, LoadedModule>,
    /// Insertion order of cache keys, for deterministic iteration.
    load_order: Vec<String>,
}

impl ModuleLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            cache: HashMap::new(),
            load_order: Vec::new(),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Modules in the order they were first loaded.
    pub fn loaded(&self) -> impl Iterator<Item = &LoadedModule> {
        self.load_order.iter().filter_map(|k| self.cache.get(k))
    }

    /// Load a module by its dotted import path.
    pub fn load(&mut self, dotted: &str) -> Result<&LoadedModule, LoadError> {
        if self.cache.contains_key(dotted) {
            return Ok(&self.cache[dotted]);
        }

        let (path, searched) = self.resolve(dotted);
        let Some(path) = path else {
            return Err(LoadError::ModuleNotFound {
                module: dotted.to_string(),
                searched,
            });
        };

        let source = fs::read_to_string(&path).map_err(|e| LoadError::IoError {
            module: dotted.to_string(),
            path: path.clone(),
            message: e.to_string(),
        })?;

        let (module, errors) = match parse_source(&source) {
            Ok(result) => result,
            Err(lex_errors) => {
                return Err(LoadError::LexFailed {
                    module: dotted.to_string(),
                    path,
                    errors: lex_errors,
                })
            }
        };
        if !errors.is_empty() {
            return Err(LoadError::ParseFailed {
                module: dotted.to_string(),
                path,
                errors: errors.take(),
            });
        }

        let loaded = LoadedModule {
            name: dotted.to_string(),
            path,
            source,
            module,
        };
        self.cache.insert(dotted.to_string(), loaded);
        self.load_order.push(dotted.to_string());
        Ok(&self.cache[dotted])
    }

    /// Candidate relative paths for a dotted import.
    ///
    /// `std.<name>` maps to `std/<name>/<name>.omni` with the historical
    /// exception `std.io → std/io/print.omni`; a bare `std` maps to
    /// `std/std.omni`. Anything else resolves by its last segment.
    fn candidates(dotted: &str) -> Vec<PathBuf> {
        if dotted == "std" {
            return vec![PathBuf::from("std/std.omni")];
        }
        if let Some(rest) = dotted.strip_prefix("std.") {
            if rest == "io" {
                return vec![PathBuf::from("std/io/print.omni")];
            }
            return vec![PathBuf::from(format!("std/{0}/{0}.omni", rest))];
        }
        let last = dotted.rsplit('.').next().unwrap_or(dotted);
        vec![PathBuf::from(format!("{}.omni", last))]
    }

    /// Resolve a dotted path against the search paths, returning the
    /// first hit and the full list of locations searched.
    fn resolve(&self, dotted: &str) -> (Option<PathBuf>, Vec<PathBuf>) {
        let mut searched = Vec::new();
        for dir in &self.search_paths {
            for candidate in Self::candidates(dotted) {
                let full = dir.join(candidate);
                if full.is_file() {
                    return (Some(full), searched);
                }
                searched.push(full);
            }
        }
        (None, searched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidates_for_std_modules() {
        assert_eq!(
            ModuleLoader::candidates("std.math"),
            vec![PathBuf::from("std/math/math.omni")]
        );
        assert_eq!(
            ModuleLoader::candidates("std.io"),
            vec![PathBuf::from("std/io/print.omni")]
        );
        assert_eq!(
            ModuleLoader::candidates("std"),
            vec![PathBuf::from("std/std.omni")]
        );
    }

    #[test]
    fn test_candidates_use_last_segment() {
        assert_eq!(
            ModuleLoader::candidates("foo.bar.util"),
            vec![PathBuf::from("util.omni")]
        );
    }

    #[test]
    fn test_missing_module_lists_searched_paths() {
        let mut loader = ModuleLoader::new(vec![PathBuf::from("/nonexistent-a"), PathBuf::from("/nonexistent-b")]);
        let err = loader.load("util").unwrap_err();
        match err {
            LoadError::ModuleNotFound { searched, .. } => {
                assert_eq!(searched.len(), 2);
            }
            other => panic!("expected ModuleNotFound, got {:?}", other),
        }
    }
}
