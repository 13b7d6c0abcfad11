//! Statement checking.

use omni_parser::ast::{Block, Expr, ForStmt, Stmt};

use super::{Checker, Symbol};
use crate::types::{self, ERROR, NULL};

impl<'a> Checker<'a> {
    /// Check the statements of a block inside a fresh scope.
    pub(crate) fn check_block_stmts(&mut self, block: &Block) {
        self.scopes.enter_scope();
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.scopes.leave_scope();
    }

    pub(crate) fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.check_block_stmts(block),

            Stmt::Expr(expr) => {
                let _ = self.check_expr(expr, None);
            }

            Stmt::Return { value, span } => {
                let vty = match value {
                    Some(expr) => self.check_expr(expr, None),
                    None => types::VOID.to_string(),
                };
                self.note_return(*span, vty);
            }

            Stmt::If {
                cond,
                then_block,
                else_branch,
                ..
            } => {
                self.check_condition(cond);
                self.check_block_stmts(then_block);
                if let Some(else_stmt) = else_branch {
                    self.check_stmt(else_stmt);
                }
            }

            Stmt::While { cond, body, .. } => {
                self.check_condition(cond);
                self.enter_loop();
                self.check_block_stmts(body);
                self.leave_loop();
            }

            Stmt::For(for_stmt) => self.check_for(for_stmt),

            Stmt::Break { span } => {
                if !self.in_loop() {
                    self.error(*span, "'break' outside of a loop");
                }
            }

            Stmt::Continue { span } => {
                if !self.in_loop() {
                    self.error(*span, "'continue' outside of a loop");
                }
            }

            Stmt::Binding {
                name,
                mutable,
                ty,
                value,
                span,
            } => {
                let annotated = ty.as_ref().map(|t| self.resolve_type(t));
                let vty = self.check_expr(value, annotated.as_deref());
                let final_ty = match annotated {
                    Some(ann) => {
                        if !self.assignable(&vty, &ann) {
                            self.error_with_hint(
                                value.span(),
                                format!("type mismatch: cannot assign '{}' to '{}'", vty, ann),
                                format!(
                                    "convert the value or change the annotation to '{}'",
                                    vty
                                ),
                            );
                        }
                        ann
                    }
                    None => vty,
                };
                self.declare_binding(name, final_ty, *mutable, *span);
            }

            Stmt::ShortVarDecl { name, value, span } => {
                let vty = self.check_expr(value, None);
                self.declare_binding(name, vty, true, *span);
            }

            Stmt::Assign {
                target,
                value,
                span,
            } => {
                let _ = self.check_assignment(target, value, *span);
            }

            Stmt::Increment {
                target,
                is_increment,
                span,
            } => {
                let _ = self.check_increment(target, *is_increment, *span);
            }

            Stmt::Try {
                body,
                catch,
                finally,
                ..
            } => {
                self.check_block_stmts(body);
                if let Some(catch) = catch {
                    self.scopes.enter_scope();
                    if let Some(name) = &catch.name {
                        // The caught value is the thrown message.
                        let _ = self.scopes.declare(
                            name,
                            Symbol {
                                ty: types::STRING.to_string(),
                                mutable: false,
                            },
                        );
                    }
                    for stmt in &catch.body.stmts {
                        self.check_stmt(stmt);
                    }
                    self.scopes.leave_scope();
                }
                if let Some(finally) = finally {
                    self.check_block_stmts(finally);
                }
            }

            Stmt::Throw { value, .. } => {
                let _ = self.check_expr(value, None);
            }
        }
    }

    fn check_for(&mut self, for_stmt: &ForStmt) {
        match for_stmt {
            ForStmt::Classic {
                init,
                cond,
                post,
                body,
                ..
            } => {
                self.scopes.enter_scope();
                if let Some(init) = init {
                    self.check_stmt(init);
                }
                if let Some(cond) = cond {
                    self.check_condition(cond);
                }
                if let Some(post) = post {
                    self.check_stmt(post);
                }
                self.enter_loop();
                self.check_block_stmts(body);
                self.leave_loop();
                self.scopes.leave_scope();
            }

            ForStmt::Range {
                var,
                iter,
                body,
                span,
            } => {
                let iter_ty = self.check_expr(iter, None);
                let elem = if iter_ty == ERROR {
                    ERROR.to_string()
                } else {
                    match types::array_element(&iter_ty) {
                        Some(elem) => elem,
                        None => {
                            self.error_with_hint(
                                iter.span(),
                                format!("range-for requires an array, found '{}'", iter_ty),
                                "iterate with a classic 'for i = 0; i < n; i++' instead"
                                    .to_string(),
                            );
                            ERROR.to_string()
                        }
                    }
                };

                self.scopes.enter_scope();
                if self
                    .scopes
                    .declare(
                        var,
                        Symbol {
                            ty: elem,
                            mutable: false,
                        },
                    )
                    .is_err()
                {
                    self.error(*span, format!("redeclaration of '{}' in the same scope", var));
                }
                self.enter_loop();
                self.check_block_stmts(body);
                self.leave_loop();
                self.scopes.leave_scope();
            }
        }
    }

    fn check_condition(&mut self, cond: &Expr) {
        let ty = self.check_expr(cond, Some(types::BOOL));
        if ty != ERROR && ty != types::BOOL {
            self.error_with_hint(
                cond.span(),
                format!("condition must be 'bool', found '{}'", ty),
                "compare the value explicitly, e.g. '!= 0'".to_string(),
            );
        }
    }

    fn declare_binding(&mut self, name: &str, ty: String, mutable: bool, span: omni_parser::Span) {
        if ty == NULL {
            self.warning(
                span,
                format!("'{}' is inferred as 'null'; annotate an optional type instead", name),
            );
        }
        if self
            .scopes
            .declare(name, Symbol { ty, mutable })
            .is_err()
        {
            self.error_with_hint(
                span,
                format!("redeclaration of '{}' in the same scope", name),
                "shadowing is only allowed in an inner scope".to_string(),
            );
        }
    }
}
