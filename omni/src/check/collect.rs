//! Collection phases run before any declaration is checked.
//!
//! Order matters: builtins, then type declarations, then top-level
//! symbols, then imports, then merged-function signatures.

use omni_parser::ast::{Decl, FuncDecl, Module};

use super::{Checker, FuncSig, Symbol};
use crate::types::{self, INFER, MODULE};

impl<'a> Checker<'a> {
    /// Phase 1: primitive names, the builtin generics, and `len`.
    pub(crate) fn register_builtins(&mut self) {
        for name in [
            "int", "long", "byte", "float", "double", "bool", "char", "string", "void",
        ] {
            self.known_types.insert(name.to_string());
        }
        for name in ["array", "map", "Promise"] {
            self.known_types.insert(name.to_string());
        }

        // `len` accepts any array and returns its length.
        self.functions.insert(
            "len".to_string(),
            FuncSig {
                name: "len".to_string(),
                type_params: Vec::new(),
                params: vec![("value".to_string(), INFER.to_string())],
                ret: types::INT.to_string(),
                is_async: false,
            },
        );
    }

    /// Phase 2: populate known-types, struct field tables, struct
    /// type-parameter tables, enum variants, and alias targets.
    pub(crate) fn collect_type_decls(&mut self, module: &Module) {
        // First register every name so fields can refer to later decls.
        for decl in &module.decls {
            match decl {
                Decl::Struct(s) => {
                    if !self.known_types.insert(s.name.clone()) {
                        self.error(s.span, format!("duplicate type name '{}'", s.name));
                        continue;
                    }
                    self.struct_params.insert(
                        s.name.clone(),
                        s.type_params.iter().map(|p| p.name.clone()).collect(),
                    );
                }
                Decl::Enum(e) => {
                    if !self.known_types.insert(e.name.clone()) {
                        self.error(e.span, format!("duplicate type name '{}'", e.name));
                        continue;
                    }
                    let mut variants = Vec::new();
                    for variant in &e.variants {
                        if variants.contains(&variant.name) {
                            self.error(
                                variant.span,
                                format!(
                                    "duplicate variant '{}' in enum '{}'",
                                    variant.name, e.name
                                ),
                            );
                            continue;
                        }
                        variants.push(variant.name.clone());
                    }
                    self.enums.insert(e.name.clone(), variants);
                }
                Decl::TypeAlias(a) => {
                    if !self.known_types.insert(a.name.clone()) {
                        self.error(a.span, format!("duplicate type name '{}'", a.name));
                        continue;
                    }
                    self.aliases
                        .insert(a.name.clone(), (a.type_params.clone(), a.ty.clone()));
                }
                _ => {}
            }
        }

        // Then resolve struct field spellings with the struct's own
        // type parameters active.
        for decl in &module.decls {
            if let Decl::Struct(s) = decl {
                self.push_type_params(s.type_params.iter().map(|p| p.name.clone()));
                let mut fields: Vec<(String, String)> = Vec::new();
                for field in &s.fields {
                    if fields.iter().any(|(n, _)| n == &field.name) {
                        self.error(
                            field.span,
                            format!("duplicate field '{}' in struct '{}'", field.name, s.name),
                        );
                        continue;
                    }
                    let ty = self.resolve_type(&field.ty);
                    fields.push((field.name.clone(), ty));
                }
                self.pop_type_params();
                self.struct_fields.insert(s.name.clone(), fields);
            }
        }

        // Validate alias targets eagerly so unused aliases still report.
        for decl in &module.decls {
            if let Decl::TypeAlias(a) = decl {
                self.push_type_params(a.type_params.clone());
                let _ = self.resolve_type(&a.ty);
                self.pop_type_params();
            }
        }
    }

    /// Phase 3: globals and function signatures. Names containing `.`
    /// denote already-merged imported functions and are skipped here.
    pub(crate) fn register_top_level(&mut self, module: &Module) {
        for decl in &module.decls {
            match decl {
                Decl::Binding(binding) => {
                    let ty = binding
                        .ty
                        .as_ref()
                        .map(|t| self.resolve_type(t))
                        .unwrap_or_else(|| INFER.to_string());
                    if self
                        .scopes
                        .declare(
                            &binding.name,
                            Symbol {
                                ty: ty.clone(),
                                mutable: binding.mutable,
                            },
                        )
                        .is_err()
                    {
                        self.error_with_hint(
                            binding.span,
                            format!("redeclaration of '{}' in the same scope", binding.name),
                            "shadowing is only allowed in an inner scope".to_string(),
                        );
                    }
                    self.globals.insert(binding.name.clone(), ty);
                }
                Decl::Func(func) if !func.name.contains('.') => {
                    if self.functions.contains_key(&func.name) {
                        self.error(
                            func.span,
                            format!("duplicate function '{}'", func.name),
                        );
                        continue;
                    }
                    let sig = self.build_signature(func);
                    self.functions.insert(func.name.clone(), sig);
                }
                _ => {}
            }
        }
    }

    /// Phase 4: imports. `std.*` modules are loaded and their exported
    /// signatures registered under both qualified and bare names; local
    /// imports only bind a `module` symbol (their functions arrive
    /// pre-merged from the pipeline).
    pub(crate) fn process_imports(&mut self, module: &Module) {
        for import in &module.imports {
            let binding = import.binding_name().to_string();
            let dotted = import.dotted();

            if import.is_std() {
                self.load_std_module(&dotted, import.span);
            }

            if self
                .scopes
                .declare(
                    &binding,
                    Symbol {
                        ty: MODULE.to_string(),
                        mutable: false,
                    },
                )
                .is_err()
            {
                self.error(
                    import.span,
                    format!("import binding '{}' collides with an existing symbol", binding),
                );
            }
            self.module_bindings.insert(binding, dotted);
        }
    }

    fn load_std_module(&mut self, dotted: &str, span: omni_parser::Span) {
        if !self.loaded_std.insert(dotted.to_string()) {
            return;
        }

        let loaded = match self.loader.load(dotted) {
            Ok(loaded) => loaded.module.clone(),
            Err(e) => {
                let mut diag = self.ctx.error(
                    crate::diagnostics::Category::Import,
                    span,
                    e.to_string(),
                );
                diag.hint = e.hint();
                self.diags.push(diag);
                return;
            }
        };

        // Struct names first so signatures can mention them.
        for decl in &loaded.decls {
            if let Decl::Struct(s) = decl {
                self.known_types.insert(s.name.clone());
                self.known_types.insert(format!("{}.{}", dotted, s.name));
                self.struct_params.insert(
                    s.name.clone(),
                    s.type_params.iter().map(|p| p.name.clone()).collect(),
                );
            }
        }
        for decl in &loaded.decls {
            match decl {
                Decl::Struct(s) => {
                    self.push_type_params(s.type_params.iter().map(|p| p.name.clone()));
                    let fields: Vec<(String, String)> = s
                        .fields
                        .iter()
                        .map(|f| (f.name.clone(), self.resolve_type(&f.ty)))
                        .collect();
                    self.pop_type_params();
                    self.struct_fields
                        .insert(format!("{}.{}", dotted, s.name), fields.clone());
                    self.struct_fields.insert(s.name.clone(), fields);
                }
                Decl::Func(func) => {
                    let mut sig = self.build_signature(func);
                    // Loaded modules are registered without checking
                    // their bodies, so an unannotated return is void.
                    if sig.ret == INFER {
                        sig.ret = types::VOID.to_string();
                    }
                    let qualified = format!("{}.{}", dotted, func.name);
                    self.functions.insert(qualified.clone(), FuncSig {
                        name: qualified,
                        ..sig.clone()
                    });
                    self.functions.entry(func.name.clone()).or_insert(sig);
                }
                _ => {}
            }
        }

        // Recurse through the imported module's own std imports.
        let nested: Vec<(String, omni_parser::Span)> = loaded
            .imports
            .iter()
            .filter(|i| i.is_std())
            .map(|i| (i.dotted(), i.span))
            .collect();
        for (nested_dotted, nested_span) in nested {
            self.load_std_module(&nested_dotted, nested_span);
        }
    }

    /// Phase 5: register every declaration whose name contains a `.`
    /// (local-module functions cloned in by the pipeline).
    pub(crate) fn register_merged_functions(&mut self, module: &Module) {
        for decl in &module.decls {
            if let Decl::Func(func) = decl {
                if func.name.contains('.') {
                    let sig = self.build_signature(func);
                    self.functions.insert(func.name.clone(), sig);
                }
            }
        }
    }

    /// Build a signature from a declaration; async functions are recorded
    /// with a `Promise<T>` return.
    pub(crate) fn build_signature(&mut self, func: &FuncDecl) -> FuncSig {
        self.push_type_params(func.type_params.iter().map(|p| p.name.clone()));
        let params: Vec<(String, String)> = func
            .params
            .iter()
            .map(|p| (p.name.clone(), self.resolve_type(&p.ty)))
            .collect();
        let inner = func
            .return_type
            .as_ref()
            .map(|t| self.resolve_type(t))
            .unwrap_or_else(|| INFER.to_string());
        self.pop_type_params();

        let ret = if func.is_async && inner != INFER {
            types::make_promise(&inner)
        } else {
            inner
        };

        FuncSig {
            name: func.name.clone(),
            type_params: func.type_params.iter().map(|p| p.name.clone()).collect(),
            params,
            ret,
            is_async: func.is_async,
        }
    }
}
