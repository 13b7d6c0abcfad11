//! Constant folding.
//!
//! Rewrites arithmetic, comparison and logic instructions whose operands
//! are all known constants into fresh `const` instructions. The folded
//! instruction keeps its SSA id, so no use rewriting is needed; dead
//! constants are left for a later elimination pass.

use std::collections::HashMap;

use super::passes::MirPass;
use super::{Function, Instruction, Operand};

/// A constant known at fold time.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Known {
    Int(i64),
    Bool(bool),
}

/// The constant-folding pass.
#[derive(Debug)]
pub struct ConstantFolding;

impl MirPass for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant-folding"
    }

    fn run_function(&self, func: &mut Function) -> bool {
        // Ids rewritten by an `assign` are loop-varying under the
        // deferred-φ model: their defining `const` must not be trusted.
        let reassigned = reassigned_ids(func);

        let mut known: HashMap<usize, Known> = HashMap::new();
        let mut changed = false;

        for block in &mut func.blocks {
            for inst in &mut block.instructions {
                if reassigned.contains(&inst.id) {
                    continue;
                }
                if let Some(value) = parse_const(inst) {
                    known.insert(inst.id, value);
                    continue;
                }
                let Some(folded) = fold(inst, &known) else {
                    continue;
                };
                known.insert(inst.id, folded);
                rewrite_to_const(inst, folded);
                changed = true;
            }
        }
        changed
    }
}

/// Every id appearing as the old-value operand of an `assign`, plus the
/// assign results themselves.
fn reassigned_ids(func: &Function) -> std::collections::HashSet<usize> {
    let mut ids = std::collections::HashSet::new();
    for block in &func.blocks {
        for inst in &block.instructions {
            if inst.op == "assign" {
                ids.insert(inst.id);
                if let Some(Operand::Value { id, .. }) = inst.operands.first() {
                    ids.insert(*id);
                }
            }
        }
    }
    ids
}

/// Read a `const.int`/`const.bool` instruction's value.
fn parse_const(inst: &Instruction) -> Option<Known> {
    let Operand::Literal { text, .. } = inst.operands.first()? else {
        return None;
    };
    match inst.op.as_str() {
        "const.int" => {
            let value = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                i64::from_str_radix(hex, 16).ok()?
            } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
                i64::from_str_radix(bin, 2).ok()?
            } else {
                text.parse().ok()?
            };
            Some(Known::Int(value))
        }
        "const.bool" => match text.as_str() {
            "true" => Some(Known::Bool(true)),
            "false" => Some(Known::Bool(false)),
            _ => None,
        },
        _ => None,
    }
}

/// Fold one instruction against the known constants, if possible.
fn fold(inst: &Instruction, known: &HashMap<usize, Known>) -> Option<Known> {
    let operand_value = |operand: &Operand| -> Option<Known> {
        match operand {
            Operand::Value { id, .. } => known.get(id).copied(),
            Operand::Literal { .. } => None,
        }
    };

    match inst.op.as_str() {
        "neg" => match operand_value(inst.operands.first()?)? {
            Known::Int(v) => Some(Known::Int(v.checked_neg()?)),
            Known::Bool(_) => None,
        },
        "not" => match operand_value(inst.operands.first()?)? {
            Known::Bool(v) => Some(Known::Bool(!v)),
            Known::Int(_) => None,
        },
        "add" | "sub" | "mul" | "div" | "mod" | "cmp.eq" | "cmp.neq" | "cmp.lt" | "cmp.lte"
        | "cmp.gt" | "cmp.gte" | "and" | "or" => {
            let lhs = operand_value(inst.operands.first()?)?;
            let rhs = operand_value(inst.operands.get(1)?)?;
            fold_binary(&inst.op, lhs, rhs)
        }
        _ => None,
    }
}

fn fold_binary(op: &str, lhs: Known, rhs: Known) -> Option<Known> {
    match (lhs, rhs) {
        (Known::Int(a), Known::Int(b)) => match op {
            "add" => a.checked_add(b).map(Known::Int),
            "sub" => a.checked_sub(b).map(Known::Int),
            "mul" => a.checked_mul(b).map(Known::Int),
            // Division by zero is left for the runtime to report.
            "div" => a.checked_div(b).map(Known::Int),
            "mod" => a.checked_rem(b).map(Known::Int),
            "cmp.eq" => Some(Known::Bool(a == b)),
            "cmp.neq" => Some(Known::Bool(a != b)),
            "cmp.lt" => Some(Known::Bool(a < b)),
            "cmp.lte" => Some(Known::Bool(a <= b)),
            "cmp.gt" => Some(Known::Bool(a > b)),
            "cmp.gte" => Some(Known::Bool(a >= b)),
            _ => None,
        },
        (Known::Bool(a), Known::Bool(b)) => match op {
            "and" => Some(Known::Bool(a && b)),
            "or" => Some(Known::Bool(a || b)),
            "cmp.eq" => Some(Known::Bool(a == b)),
            "cmp.neq" => Some(Known::Bool(a != b)),
            _ => None,
        },
        _ => None,
    }
}

fn rewrite_to_const(inst: &mut Instruction, value: Known) {
    let (op, text, ty) = match value {
        Known::Int(v) => ("const.int", v.to_string(), "int"),
        Known::Bool(v) => ("const.bool", v.to_string(), "bool"),
    };
    inst.op = op.to_string();
    inst.ty = ty.to_string();
    inst.operands = vec![Operand::literal(text, ty)];
}
