//! Lowering from the typed AST to MIR.
//!
//! Within a function the builder maintains a current-block write cursor
//! (None once control flow has fully transferred), an environment from
//! source names to SSA values, the signature tables copied from the type
//! checker, and a monotonically increasing block-name counter. Mutation
//! is modeled with an explicit `assign` pseudo-instruction that produces
//! a new SSA id; φ-insertion is left to later passes.

mod expr;

use std::collections::{HashMap, HashSet};

use omni_parser::ast::{self, Decl, Expr, ForStmt, FuncBody, Stmt};
use omni_parser::Span;

use crate::check::CheckOutput;
use crate::diagnostics::{Category, Diagnostic, DiagnosticContext};
use crate::mir::{BasicBlock, Function, Instruction, Module, Operand, Terminator};
use crate::types::{self, ERROR, INFER};

/// An SSA value paired with its canonical type.
pub(crate) type Val = (usize, String);

#[derive(Debug, Clone)]
pub(crate) struct VarBinding {
    pub value: usize,
    pub ty: String,
    pub mutable: bool,
}

#[derive(Debug, Clone)]
struct LoopTargets {
    continue_target: String,
    break_target: String,
}

/// Lower every function of a checked module.
pub fn build_module(
    module: &ast::Module,
    tables: &CheckOutput,
    ctx: &DiagnosticContext,
) -> (Module, Vec<Diagnostic>) {
    let mut functions = Vec::new();
    let mut diags = Vec::new();

    for decl in &module.decls {
        if let Decl::Func(func) = decl {
            functions.push(lower_function(func, tables, ctx, &mut diags));
        }
    }

    (Module { functions }, diags)
}

fn lower_function(
    decl: &ast::FuncDecl,
    tables: &CheckOutput,
    ctx: &DiagnosticContext,
    diags: &mut Vec<Diagnostic>,
) -> Function {
    let sig = tables.functions.get(&decl.name);
    let (params, table_ret) = match sig {
        Some(sig) => (sig.params.clone(), sig.ret.clone()),
        None => (
            decl.params
                .iter()
                .map(|p| (p.name.clone(), p.ty.canonical()))
                .collect(),
            decl.return_type
                .as_ref()
                .map(|t| t.canonical())
                .unwrap_or_else(|| types::VOID.to_string()),
        ),
    };

    // Async functions lower their body against the inner type; the
    // backend wraps the produced value into the promise.
    let return_type = if decl.is_async {
        types::promise_inner(&table_ret).unwrap_or(table_ret)
    } else {
        table_ret
    };
    let return_type = if return_type == INFER {
        types::VOID.to_string()
    } else {
        return_type
    };

    let func = Function::new(decl.name.clone(), return_type, params);
    let mut lower = FuncLower {
        tables,
        ctx,
        diags,
        env: func
            .params
            .iter()
            .map(|p| {
                (
                    p.name.clone(),
                    VarBinding {
                        value: p.value,
                        ty: p.ty.clone(),
                        mutable: false,
                    },
                )
            })
            .collect(),
        func,
        current: Some(0),
        loops: Vec::new(),
        counter: 0,
        hidden: 0,
    };

    match &decl.body {
        FuncBody::Expr(expr) => {
            // Expression-bodied functions produce a single block ending
            // in `ret <value>`.
            let ret_hint = lower.func.return_type.clone();
            match lower.lower_expr(expr, Some(ret_hint.as_str())) {
                Some((id, ty)) => lower.terminate(Terminator::Ret(Some(Operand::value(id, ty)))),
                None => lower.terminate(Terminator::Ret(None)),
            }
        }
        FuncBody::Block(block) => {
            lower.lower_block(block);
            if lower.current.is_some() {
                if lower.func.return_type == types::VOID
                    || lower.func.return_type == ERROR
                {
                    lower.terminate(Terminator::Ret(None));
                } else {
                    let ret = lower.func.return_type.clone();
                    let name = lower.func.name.clone();
                    lower.error(
                        decl.span,
                        format!("missing return in function '{}' returning '{}'", name, ret),
                    );
                    // Close the block anyway so verification of other
                    // functions is not drowned out.
                    lower.terminate(Terminator::Ret(None));
                }
            }
        }
    }

    lower.func
}

/// Per-function lowering state.
pub(crate) struct FuncLower<'a> {
    pub(crate) tables: &'a CheckOutput,
    pub(crate) ctx: &'a DiagnosticContext,
    pub(crate) diags: &'a mut Vec<Diagnostic>,
    pub(crate) func: Function,
    pub(crate) current: Option<usize>,
    pub(crate) env: HashMap<String, VarBinding>,
    loops: Vec<LoopTargets>,
    /// Block-name counter, shared by all prefixes.
    counter: usize,
    /// Counter for hidden loop-index names.
    hidden: usize,
}

impl<'a> std::fmt::Debug for FuncLower<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FuncLower")
            .field("function", &self.func.name)
            .field("current", &self.current)
            .finish()
    }
}

impl<'a> FuncLower<'a> {
    pub(crate) fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diags.push(self.ctx.error(Category::Mir, span, message));
    }

    /// Append an instruction to the current block. Returns `None` when
    /// control flow has already transferred (unreachable code is
    /// silently dropped).
    pub(crate) fn emit(&mut self, op: impl Into<String>, ty: impl Into<String>, operands: Vec<Operand>) -> Option<usize> {
        let idx = self.current?;
        let id = self.func.alloc_value();
        self.func.blocks[idx].instructions.push(Instruction {
            id,
            op: op.into(),
            ty: ty.into(),
            operands,
        });
        Some(id)
    }

    /// Close the current block. Writes after this are dropped until the
    /// cursor moves to another block.
    pub(crate) fn terminate(&mut self, term: Terminator) {
        if let Some(idx) = self.current.take() {
            if self.func.blocks[idx].is_open() {
                self.func.blocks[idx].terminator = Some(term);
            }
        }
    }

    /// Create a block named `<prefix>_<n>` with the shared counter.
    fn new_block(&mut self, prefix: &str) -> usize {
        let name = format!("{}_{}", prefix, self.counter);
        self.counter += 1;
        self.func.blocks.push(BasicBlock::new(name));
        self.func.blocks.len() - 1
    }

    fn block_name(&self, idx: usize) -> String {
        self.func.blocks[idx].name.clone()
    }

    fn switch_to(&mut self, idx: usize) {
        self.current = Some(idx);
    }

    // ==================== Statements ====================

    /// Lower the statements of a source block. Names declared inside are
    /// dropped afterwards; updates to outer names persist.
    pub(crate) fn lower_block(&mut self, block: &ast::Block) {
        let outer: HashSet<String> = self.env.keys().cloned().collect();
        for stmt in &block.stmts {
            self.lower_stmt(stmt);
        }
        self.env.retain(|name, _| outer.contains(name));
    }

    pub(crate) fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.lower_block(block),

            Stmt::Expr(expr) => {
                let _ = self.lower_expr(expr, None);
            }

            Stmt::Return { value, .. } => {
                let ret_hint = self.func.return_type.clone();
                let operand = match value {
                    Some(expr) => self
                        .lower_expr(expr, Some(ret_hint.as_str()))
                        .map(|(id, ty)| Operand::value(id, ty)),
                    None => None,
                };
                self.terminate(Terminator::Ret(operand));
            }

            Stmt::Binding {
                name,
                mutable,
                ty,
                value,
                ..
            } => {
                let hint = ty.as_ref().map(|t| t.canonical());
                let Some((id, vty)) = self.lower_expr(value, hint.as_deref()) else {
                    return;
                };
                let final_ty = hint.unwrap_or(vty);
                self.env.insert(
                    name.clone(),
                    VarBinding {
                        value: id,
                        ty: final_ty,
                        mutable: *mutable,
                    },
                );
            }

            Stmt::ShortVarDecl { name, value, .. } => {
                let Some((id, vty)) = self.lower_expr(value, None) else {
                    return;
                };
                self.env.insert(
                    name.clone(),
                    VarBinding {
                        value: id,
                        ty: vty,
                        mutable: true,
                    },
                );
            }

            Stmt::Assign {
                target,
                value,
                span,
            } => {
                let hint = self.target_type_hint(target);
                let Some(val) = self.lower_expr(value, hint.as_deref()) else {
                    return;
                };
                let _ = self.lower_assign_to(target, val, *span);
            }

            Stmt::Increment {
                target,
                is_increment,
                span,
            } => {
                let _ = self.lower_increment(target, *is_increment, *span);
            }

            Stmt::If {
                cond,
                then_block,
                else_branch,
                ..
            } => self.lower_if(cond, then_block, else_branch.as_deref()),

            Stmt::While { cond, body, .. } => self.lower_while(cond, body),

            Stmt::For(for_stmt) => match for_stmt {
                ForStmt::Classic {
                    init,
                    cond,
                    post,
                    body,
                    ..
                } => self.lower_classic_for(
                    init.as_deref(),
                    cond.as_ref(),
                    post.as_deref(),
                    body,
                ),
                ForStmt::Range {
                    var, iter, body, ..
                } => self.lower_range_for(var, iter, body),
            },

            Stmt::Break { span } => {
                if let Some(targets) = self.loops.last().cloned() {
                    self.terminate(Terminator::Br {
                        target: targets.break_target,
                    });
                } else {
                    self.error(*span, "'break' outside of a loop");
                }
            }

            Stmt::Continue { span } => {
                if let Some(targets) = self.loops.last().cloned() {
                    self.terminate(Terminator::Br {
                        target: targets.continue_target,
                    });
                } else {
                    self.error(*span, "'continue' outside of a loop");
                }
            }

            Stmt::Throw { value, .. } => {
                if let Some((id, ty)) = self.lower_expr(value, None) {
                    let _ = self.emit("throw", types::VOID, vec![Operand::value(id, ty)]);
                }
            }

            Stmt::Try {
                body,
                catch,
                finally,
                ..
            } => self.lower_try(body, catch.as_ref(), finally.as_ref()),
        }
    }

    /// The declared type of an assignment target, as a lowering hint.
    fn target_type_hint(&self, target: &Expr) -> Option<String> {
        match target {
            Expr::Ident { name, .. } => self
                .env
                .get(name)
                .map(|b| b.ty.clone())
                .or_else(|| self.tables.globals.get(name).cloned()),
            _ => None,
        }
    }

    // ==================== Control flow ====================

    fn lower_if(&mut self, cond: &Expr, then_block: &ast::Block, else_branch: Option<&Stmt>) {
        let Some((cond_id, cond_ty)) = self.lower_expr(cond, Some(types::BOOL)) else {
            return;
        };
        let cond_op = Operand::value(cond_id, cond_ty);

        if let Some(else_stmt) = else_branch {
            let then_idx = self.new_block("then");
            let else_idx = self.new_block("else");
            self.terminate(Terminator::Cbr {
                cond: cond_op,
                then_block: self.block_name(then_idx),
                else_block: self.block_name(else_idx),
            });

            let mut merge: Option<usize> = None;

            // Each branch arm gets a copy of the environment.
            self.switch_to(then_idx);
            let saved = self.env.clone();
            self.lower_block(then_block);
            self.env = saved;
            if self.current.is_some() {
                let m = *merge.get_or_insert_with(|| {
                    let name = format!("merge_{}", self.counter);
                    self.counter += 1;
                    self.func.blocks.push(BasicBlock::new(name));
                    self.func.blocks.len() - 1
                });
                let target = self.block_name(m);
                self.terminate(Terminator::Br { target });
            }

            self.switch_to(else_idx);
            let saved = self.env.clone();
            self.lower_stmt(else_stmt);
            self.env = saved;
            if self.current.is_some() {
                let m = *merge.get_or_insert_with(|| {
                    let name = format!("merge_{}", self.counter);
                    self.counter += 1;
                    self.func.blocks.push(BasicBlock::new(name));
                    self.func.blocks.len() - 1
                });
                let target = self.block_name(m);
                self.terminate(Terminator::Br { target });
            }

            // If both arms terminated, the merge block is omitted and
            // the cursor stays transferred.
            match merge {
                Some(m) => self.switch_to(m),
                None => self.current = None,
            }
        } else {
            let then_idx = self.new_block("then");
            let merge_idx = self.new_block("merge");
            self.terminate(Terminator::Cbr {
                cond: cond_op,
                then_block: self.block_name(then_idx),
                else_block: self.block_name(merge_idx),
            });

            self.switch_to(then_idx);
            let saved = self.env.clone();
            self.lower_block(then_block);
            self.env = saved;
            if self.current.is_some() {
                let target = self.block_name(merge_idx);
                self.terminate(Terminator::Br { target });
            }
            self.switch_to(merge_idx);
        }
    }

    fn lower_while(&mut self, cond: &Expr, body: &ast::Block) {
        let header_idx = self.new_block("loop_header");
        let header = self.block_name(header_idx);
        self.terminate(Terminator::Br {
            target: header.clone(),
        });

        self.switch_to(header_idx);
        let Some((cond_id, cond_ty)) = self.lower_expr(cond, Some(types::BOOL)) else {
            return;
        };
        let body_idx = self.new_block("loop_body");
        let exit_idx = self.new_block("loop_exit");
        self.terminate(Terminator::Cbr {
            cond: Operand::value(cond_id, cond_ty),
            then_block: self.block_name(body_idx),
            else_block: self.block_name(exit_idx),
        });

        self.loops.push(LoopTargets {
            continue_target: header.clone(),
            break_target: self.block_name(exit_idx),
        });
        self.switch_to(body_idx);
        self.lower_block(body);
        if self.current.is_some() {
            self.terminate(Terminator::Br { target: header });
        }
        self.loops.pop();

        self.switch_to(exit_idx);
    }

    fn lower_classic_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        post: Option<&Stmt>,
        body: &ast::Block,
    ) {
        let outer: HashSet<String> = self.env.keys().cloned().collect();

        if let Some(init) = init {
            self.lower_stmt(init);
        }

        let header_idx = self.new_block("loop_header");
        let header = self.block_name(header_idx);
        self.terminate(Terminator::Br {
            target: header.clone(),
        });

        self.switch_to(header_idx);
        let body_idx;
        let exit_idx;
        match cond {
            Some(cond) => {
                let Some((cond_id, cond_ty)) = self.lower_expr(cond, Some(types::BOOL)) else {
                    return;
                };
                body_idx = self.new_block("loop_body");
                exit_idx = self.new_block("loop_exit");
                self.terminate(Terminator::Cbr {
                    cond: Operand::value(cond_id, cond_ty),
                    then_block: self.block_name(body_idx),
                    else_block: self.block_name(exit_idx),
                });
            }
            None => {
                // No condition: the header branches unconditionally to
                // the body; only `break` reaches the exit.
                body_idx = self.new_block("loop_body");
                exit_idx = self.new_block("loop_exit");
                let target = self.block_name(body_idx);
                self.terminate(Terminator::Br { target });
            }
        }

        self.loops.push(LoopTargets {
            continue_target: header.clone(),
            break_target: self.block_name(exit_idx),
        });
        self.switch_to(body_idx);
        self.lower_block(body);
        if self.current.is_some() {
            // The body falls through into the post update, then back to
            // the header.
            if let Some(post) = post {
                self.lower_stmt(post);
            }
            self.terminate(Terminator::Br { target: header });
        }
        self.loops.pop();

        self.switch_to(exit_idx);
        self.env.retain(|name, _| outer.contains(name));
    }

    fn lower_range_for(&mut self, var: &str, iter: &Expr, body: &ast::Block) {
        let Some((iter_id, iter_ty)) = self.lower_expr(iter, None) else {
            return;
        };
        let elem = types::array_element(&iter_ty).unwrap_or_else(|| ERROR.to_string());

        // Hidden loop index and the runtime length intrinsic.
        let idx_name = format!("$idx{}", self.hidden);
        self.hidden += 1;
        let Some(zero) = self.emit(
            "const.int",
            types::INT,
            vec![Operand::literal("0", types::INT)],
        ) else {
            return;
        };
        let Some(len) = self.emit(
            "len",
            types::INT,
            vec![Operand::value(iter_id, iter_ty.clone())],
        ) else {
            return;
        };
        self.env.insert(
            idx_name.clone(),
            VarBinding {
                value: zero,
                ty: types::INT.to_string(),
                mutable: true,
            },
        );

        let header_idx = self.new_block("loop_header");
        let header = self.block_name(header_idx);
        self.terminate(Terminator::Br {
            target: header.clone(),
        });

        self.switch_to(header_idx);
        let idx_cur = self.env[&idx_name].value;
        let Some(cmp) = self.emit(
            "cmp.lt",
            types::BOOL,
            vec![
                Operand::value(idx_cur, types::INT),
                Operand::value(len, types::INT),
            ],
        ) else {
            return;
        };
        let body_idx = self.new_block("loop_body");
        let exit_idx = self.new_block("loop_exit");
        self.terminate(Terminator::Cbr {
            cond: Operand::value(cmp, types::BOOL),
            then_block: self.block_name(body_idx),
            else_block: self.block_name(exit_idx),
        });

        self.loops.push(LoopTargets {
            continue_target: header.clone(),
            break_target: self.block_name(exit_idx),
        });
        self.switch_to(body_idx);

        // Extract the element into the loop variable.
        let outer: HashSet<String> = self.env.keys().cloned().collect();
        if let Some(elem_id) = self.emit(
            "index",
            elem.clone(),
            vec![
                Operand::value(iter_id, iter_ty.clone()),
                Operand::value(self.env[&idx_name].value, types::INT),
            ],
        ) {
            self.env.insert(
                var.to_string(),
                VarBinding {
                    value: elem_id,
                    ty: elem,
                    mutable: false,
                },
            );
        }

        for stmt in &body.stmts {
            self.lower_stmt(stmt);
        }

        if self.current.is_some() {
            // Increment the hidden index and loop.
            if let Some(one) = self.emit(
                "const.int",
                types::INT,
                vec![Operand::literal("1", types::INT)],
            ) {
                let old = self.env[&idx_name].clone();
                if let Some(next) = self.emit(
                    "add",
                    types::INT,
                    vec![
                        Operand::value(old.value, types::INT),
                        Operand::value(one, types::INT),
                    ],
                ) {
                    if let Some(assigned) = self.emit(
                        "assign",
                        types::INT,
                        vec![
                            Operand::value(old.value, types::INT),
                            Operand::value(next, types::INT),
                        ],
                    ) {
                        if let Some(binding) = self.env.get_mut(&idx_name) {
                            binding.value = assigned;
                        }
                    }
                }
            }
            self.terminate(Terminator::Br { target: header });
        }
        self.loops.pop();
        self.env.retain(|name, _| outer.contains(name));
        self.env.remove(&idx_name);

        self.switch_to(exit_idx);
    }

    fn lower_try(
        &mut self,
        body: &ast::Block,
        catch: Option<&ast::CatchClause>,
        finally: Option<&ast::Block>,
    ) {
        // Exception dispatch is left to the backend: the protected body
        // lowers inline, the catch body lowers into its own (unreached)
        // block, and finally code runs on the fall-through path.
        self.lower_block(body);

        if let Some(catch) = catch {
            let merge_idx = self.new_block("try_merge");
            let merge = self.block_name(merge_idx);
            self.terminate(Terminator::Br {
                target: merge.clone(),
            });

            let catch_idx = self.new_block("catch");
            self.switch_to(catch_idx);
            let saved = self.env.clone();
            if let Some(name) = &catch.name {
                if let Some(id) = self.emit(
                    "const.string",
                    types::STRING,
                    vec![Operand::literal("\"\"", types::STRING)],
                ) {
                    self.env.insert(
                        name.clone(),
                        VarBinding {
                            value: id,
                            ty: types::STRING.to_string(),
                            mutable: false,
                        },
                    );
                }
            }
            self.lower_block(&catch.body);
            self.env = saved;
            if self.current.is_some() {
                self.terminate(Terminator::Br { target: merge });
            }
            self.switch_to(merge_idx);
        }

        if let Some(finally) = finally {
            self.lower_block(finally);
        }
    }
}
