//! Structural MIR verifier.
//!
//! Enforced invariants: every block ends in exactly one terminator;
//! every `Value` operand refers to an id produced earlier in the same
//! function (or a parameter); `cbr` conditions are `bool`; branch
//! targets exist; `ret` operand types match the declared return.

use std::collections::HashSet;
use std::fmt;

use super::{Function, Module, Operand, Terminator};
use crate::types;

/// A verification failure. These are hard errors.
#[derive(Debug, Clone, PartialEq)]
pub enum VerifyError {
    MissingTerminator {
        function: String,
        block: String,
    },
    DanglingValue {
        function: String,
        block: String,
        id: usize,
    },
    NonBoolCondition {
        function: String,
        block: String,
        found: String,
    },
    UnknownBlockTarget {
        function: String,
        block: String,
        target: String,
    },
    ReturnTypeMismatch {
        function: String,
        expected: String,
        found: String,
    },
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::MissingTerminator { function, block } => {
                write!(f, "{}: block '{}' has no terminator", function, block)
            }
            VerifyError::DanglingValue {
                function,
                block,
                id,
            } => write!(
                f,
                "{}: block '{}' references %{} before it is produced",
                function, block, id
            ),
            VerifyError::NonBoolCondition {
                function,
                block,
                found,
            } => write!(
                f,
                "{}: block '{}' has a cbr condition of type '{}'",
                function, block, found
            ),
            VerifyError::UnknownBlockTarget {
                function,
                block,
                target,
            } => write!(
                f,
                "{}: block '{}' branches to unknown block '{}'",
                function, block, target
            ),
            VerifyError::ReturnTypeMismatch {
                function,
                expected,
                found,
            } => write!(
                f,
                "{}: ret of type '{}' does not match declared return '{}'",
                function, found, expected
            ),
        }
    }
}

impl std::error::Error for VerifyError {}

/// Verify a whole module.
pub fn verify_module(module: &Module) -> Result<(), Vec<VerifyError>> {
    let mut errors = Vec::new();
    for func in &module.functions {
        verify_function(func, &mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn verify_function(func: &Function, errors: &mut Vec<VerifyError>) {
    let block_names: HashSet<&str> = func.blocks.iter().map(|b| b.name.as_str()).collect();
    let mut defined: HashSet<usize> = func.params.iter().map(|p| p.value).collect();

    let check_target = |block: &str, target: &str, errors: &mut Vec<VerifyError>| {
        if !block_names.contains(target) {
            errors.push(VerifyError::UnknownBlockTarget {
                function: func.name.clone(),
                block: block.to_string(),
                target: target.to_string(),
            });
        }
    };

    for block in &func.blocks {
        for inst in &block.instructions {
            for operand in &inst.operands {
                if let Operand::Value { id, .. } = operand {
                    if !defined.contains(id) {
                        errors.push(VerifyError::DanglingValue {
                            function: func.name.clone(),
                            block: block.name.clone(),
                            id: *id,
                        });
                    }
                }
            }
            defined.insert(inst.id);
        }

        match &block.terminator {
            None => errors.push(VerifyError::MissingTerminator {
                function: func.name.clone(),
                block: block.name.clone(),
            }),
            Some(Terminator::Ret(operand)) => {
                let found = operand
                    .as_ref()
                    .map(|o| o.ty().to_string())
                    .unwrap_or_else(|| types::VOID.to_string());
                if let Some(Operand::Value { id, .. }) = operand {
                    if !defined.contains(id) {
                        errors.push(VerifyError::DanglingValue {
                            function: func.name.clone(),
                            block: block.name.clone(),
                            id: *id,
                        });
                    }
                }
                let matches = found == func.return_type
                    || found == types::ERROR
                    || func.return_type == types::ERROR
                    || types::is_assignable(&found, &func.return_type, &HashSet::new());
                if !matches {
                    errors.push(VerifyError::ReturnTypeMismatch {
                        function: func.name.clone(),
                        expected: func.return_type.clone(),
                        found,
                    });
                }
            }
            Some(Terminator::Br { target }) => check_target(&block.name, target, errors),
            Some(Terminator::Cbr {
                cond,
                then_block,
                else_block,
            }) => {
                if let Operand::Value { id, .. } = cond {
                    if !defined.contains(id) {
                        errors.push(VerifyError::DanglingValue {
                            function: func.name.clone(),
                            block: block.name.clone(),
                            id: *id,
                        });
                    }
                }
                if cond.ty() != types::BOOL && cond.ty() != types::ERROR {
                    errors.push(VerifyError::NonBoolCondition {
                        function: func.name.clone(),
                        block: block.name.clone(),
                        found: cond.ty().to_string(),
                    });
                }
                check_target(&block.name, then_block, errors);
                check_target(&block.name, else_block, errors);
            }
        }
    }
}
