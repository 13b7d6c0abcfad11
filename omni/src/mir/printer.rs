//! Canonical textual form of MIR, used by golden tests.
//!
//! ```text
//! func <name>(<p1>:<t1>, ...):<ret>
//!   block <bname>:
//!     %<id> = <op> <op1>, <op2>:<t>
//!     ...
//!     <term> <ops>
//! ```
//!
//! Literal operands render as their source lexeme; value operands render
//! as `%<id>:<type>` inside instructions and as bare `%<id>` inside
//! terminators.

use super::{Function, Instruction, Module, Operand, Terminator};

/// Print a whole module; functions are separated by a blank line. The
/// output carries no trailing newline — emission appends one.
pub fn print_module(module: &Module) -> String {
    module
        .functions
        .iter()
        .map(print_function)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Print one function.
pub fn print_function(func: &Function) -> String {
    let params = func
        .params
        .iter()
        .map(|p| format!("{}:{}", p.name, p.ty))
        .collect::<Vec<_>>()
        .join(", ");
    let mut out = format!("func {}({}):{}", func.name, params, func.return_type);

    for block in &func.blocks {
        out.push_str(&format!("\n  block {}:", block.name));
        for inst in &block.instructions {
            out.push_str(&format!("\n    {}", print_instruction(inst)));
        }
        if let Some(term) = &block.terminator {
            out.push_str(&format!("\n    {}", print_terminator(term)));
        }
    }
    out
}

fn print_instruction(inst: &Instruction) -> String {
    let operands = inst
        .operands
        .iter()
        .map(instruction_operand)
        .collect::<Vec<_>>()
        .join(", ");
    if operands.is_empty() {
        format!("%{} = {}:{}", inst.id, inst.op, inst.ty)
    } else {
        format!("%{} = {} {}:{}", inst.id, inst.op, operands, inst.ty)
    }
}

fn instruction_operand(operand: &Operand) -> String {
    match operand {
        Operand::Value { id, ty } => format!("%{}:{}", id, ty),
        Operand::Literal { text, .. } => text.clone(),
    }
}

fn terminator_operand(operand: &Operand) -> String {
    match operand {
        Operand::Value { id, .. } => format!("%{}", id),
        Operand::Literal { text, .. } => text.clone(),
    }
}

fn print_terminator(term: &Terminator) -> String {
    match term {
        Terminator::Ret(None) => "ret".to_string(),
        Terminator::Ret(Some(operand)) => format!("ret {}", terminator_operand(operand)),
        Terminator::Br { target } => format!("br {}", target),
        Terminator::Cbr {
            cond,
            then_block,
            else_block,
        } => format!(
            "cbr {}, {}, {}",
            terminator_operand(cond),
            then_block,
            else_block
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mir::BasicBlock;

    #[test]
    fn test_print_constant_return() {
        let mut func = Function::new("fortyTwo", "int", Vec::new());
        let id = func.alloc_value();
        func.blocks[0].instructions.push(Instruction {
            id,
            op: "const.int".to_string(),
            ty: "int".to_string(),
            operands: vec![Operand::literal("42", "int")],
        });
        func.blocks[0].terminator = Some(Terminator::Ret(Some(Operand::value(id, "int"))));

        assert_eq!(
            print_function(&func),
            "func fortyTwo():int\n  block entry:\n    %0 = const.int 42:int\n    ret %0"
        );
    }

    #[test]
    fn test_print_add_params() {
        let mut func = Function::new(
            "add",
            "int",
            vec![
                ("a".to_string(), "int".to_string()),
                ("b".to_string(), "int".to_string()),
            ],
        );
        let id = func.alloc_value();
        func.blocks[0].instructions.push(Instruction {
            id,
            op: "add".to_string(),
            ty: "int".to_string(),
            operands: vec![Operand::value(0, "int"), Operand::value(1, "int")],
        });
        func.blocks[0].terminator = Some(Terminator::Ret(Some(Operand::value(id, "int"))));

        assert_eq!(
            print_function(&func),
            "func add(a:int, b:int):int\n  block entry:\n    %2 = add %0:int, %1:int:int\n    ret %2"
        );
    }

    #[test]
    fn test_print_branches() {
        let mut func = Function::new("f", "void", Vec::new());
        func.blocks[0].terminator = Some(Terminator::Cbr {
            cond: Operand::value(0, "bool"),
            then_block: "then_0".to_string(),
            else_block: "merge_1".to_string(),
        });
        func.blocks.push(BasicBlock::new("then_0"));
        func.blocks[1].terminator = Some(Terminator::Br {
            target: "merge_1".to_string(),
        });

        let text = print_function(&func);
        assert!(text.contains("cbr %0, then_0, merge_1"));
        assert!(text.contains("br merge_1"));
    }
}
