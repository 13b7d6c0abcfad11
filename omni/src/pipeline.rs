//! Pipeline logic for one compilation.
//!
//! Control flow: module loader reads the root file → lexer → token
//! rewriter → parser → (local imports: loader → lexer → parser; imported
//! function declarations are cloned into the root module with namespaced
//! names) → type checker → MIR builder → verifier → passes.
//!
//! Diagnostics from the parser and the type checker are accumulated and
//! returned as a single aggregate; later passes do not run once an
//! earlier pass has produced errors.

use std::fs;
use std::path::{Path, PathBuf};

use omni_parser::ast::{Decl, Module as AstModule};
use omni_parser::{rewrite_generics, tokenize, Parser, Span};

use crate::check::{check_module, CheckOutput};
use crate::diagnostics::{Category, DiagnosticContext, DiagnosticList};
use crate::loader::ModuleLoader;
use crate::mir;
use crate::mir::builder::build_module;
use crate::mir::passes::run_default_passes;
use crate::mir::verify::verify_module;

/// The result of a successful compilation.
#[derive(Debug)]
pub struct Compilation {
    pub file: String,
    pub mir: mir::Module,
    pub tables: CheckOutput,
}

/// Compile a root `.omni` file.
pub fn compile_file(
    input: &Path,
    extra_search_paths: &[PathBuf],
) -> Result<Compilation, DiagnosticList> {
    let file = input.display().to_string();
    let source = match fs::read_to_string(input) {
        Ok(source) => source,
        Err(e) => {
            let ctx = DiagnosticContext::new(file.clone(), "");
            let mut diags = DiagnosticList::new();
            diags.push(ctx.error(
                Category::Import,
                Span::default(),
                format!("could not read '{}': {}", file, e),
            ));
            return Err(diags);
        }
    };

    // The root file's directory leads the search-path list.
    let mut search_paths: Vec<PathBuf> = Vec::new();
    if let Some(parent) = input.parent() {
        search_paths.push(parent.to_path_buf());
    }
    search_paths.extend(extra_search_paths.iter().cloned());

    let mut loader = ModuleLoader::new(search_paths);
    compile_source(&file, &source, &mut loader)
}

/// Compile source text directly (used pervasively by tests). Imports
/// resolve against the current directory.
pub fn compile_str(source: &str) -> Result<Compilation, DiagnosticList> {
    let mut loader = ModuleLoader::new(vec![PathBuf::from(".")]);
    compile_source("<input>", source, &mut loader)
}

/// The shared pipeline body.
pub fn compile_source(
    file: &str,
    source: &str,
    loader: &mut ModuleLoader,
) -> Result<Compilation, DiagnosticList> {
    let ctx = DiagnosticContext::new(file, source);
    let mut diags = DiagnosticList::new();

    // Lexing: errors abort the pipeline; no AST is built.
    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(errors) => {
            for e in &errors {
                diags.push(ctx.from_parse_error(e));
            }
            return Err(diags);
        }
    };
    let tokens = rewrite_generics(tokens);

    // Parsing: accumulate diagnostics, keep the best-effort AST.
    let (mut module, parse_errors) = Parser::new(tokens).parse();
    for e in &parse_errors {
        diags.push(ctx.from_parse_error(e));
    }

    merge_local_imports(&mut module, loader, &ctx, &mut diags);

    // The type checker always gets a chance to add its own diagnostics.
    let (tables, check_diags) = check_module(&module, &ctx, loader);
    diags.extend(check_diags);
    if diags.has_errors() {
        return Err(diags);
    }

    // MIR build.
    let (mut mir_module, build_diags) = build_module(&module, &tables, &ctx);
    diags.extend(build_diags);
    if diags.has_errors() {
        return Err(diags);
    }

    // Verification failures are hard errors.
    if let Err(errors) = verify_module(&mir_module) {
        for e in errors {
            diags.push(ctx.error(Category::Verify, Span::default(), e.to_string()));
        }
        return Err(diags);
    }

    run_default_passes(&mut mir_module);

    Ok(Compilation {
        file: file.to_string(),
        mir: mir_module,
        tables,
    })
}

/// Clone each local import's function declarations into the root module
/// under namespaced names (`alias.func`). The type checker registers the
/// namespaced signatures without re-checking their bodies' origin.
fn merge_local_imports(
    module: &mut AstModule,
    loader: &mut ModuleLoader,
    ctx: &DiagnosticContext,
    diags: &mut DiagnosticList,
) {
    let mut merged: Vec<Decl> = Vec::new();

    for import in &module.imports {
        if import.is_std() {
            continue;
        }
        let binding = import.binding_name().to_string();
        let dotted = import.dotted();

        match loader.load(&dotted) {
            Ok(loaded) => {
                for decl in &loaded.module.decls {
                    if let Decl::Func(func) = decl {
                        if func.name.contains('.') {
                            continue;
                        }
                        let mut cloned = func.clone();
                        cloned.name = format!("{}.{}", binding, func.name);
                        merged.push(Decl::Func(cloned));
                    }
                }
            }
            Err(e) => {
                let mut diag = ctx.error(Category::Import, import.span, e.to_string());
                diag.hint = e.hint();
                diags.push(diag);
            }
        }
    }

    module.decls.extend(merged);
}
