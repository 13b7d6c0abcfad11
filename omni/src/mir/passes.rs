//! Sequential MIR pass runner.

use super::{Function, Module};

/// An optimization pass over MIR functions.
pub trait MirPass: std::fmt::Debug {
    /// Name of this pass.
    fn name(&self) -> &'static str;

    /// Run the pass on one function; returns whether it changed anything.
    fn run_function(&self, func: &mut Function) -> bool;

    /// Run the pass over a module, returning the number of changed
    /// functions.
    fn run_module(&self, module: &mut Module) -> usize {
        let mut changed = 0;
        for func in &mut module.functions {
            if self.run_function(func) {
                changed += 1;
            }
        }
        changed
    }
}

/// Run the default pass pipeline in order.
pub fn run_default_passes(module: &mut Module) -> usize {
    let passes: Vec<Box<dyn MirPass>> = vec![Box::new(super::fold::ConstantFolding)];
    let mut changed = 0;
    for pass in passes {
        changed += pass.run_module(module);
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mir::{Instruction, Operand, Terminator};

    #[derive(Debug)]
    struct CountingPass;

    impl MirPass for CountingPass {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn run_function(&self, func: &mut Function) -> bool {
            !func.blocks.is_empty()
        }
    }

    #[test]
    fn test_run_module_counts_changed_functions() {
        let mut module = Module {
            functions: vec![
                Function::new("a", "void", Vec::new()),
                Function::new("b", "void", Vec::new()),
            ],
        };
        assert_eq!(CountingPass.run_module(&mut module), 2);
    }

    #[test]
    fn test_default_pipeline_folds_constants() {
        let mut func = Function::new("f", "int", Vec::new());
        let a = func.alloc_value();
        let b = func.alloc_value();
        let c = func.alloc_value();
        func.blocks[0].instructions.extend([
            Instruction {
                id: a,
                op: "const.int".to_string(),
                ty: "int".to_string(),
                operands: vec![Operand::literal("2", "int")],
            },
            Instruction {
                id: b,
                op: "const.int".to_string(),
                ty: "int".to_string(),
                operands: vec![Operand::literal("3", "int")],
            },
            Instruction {
                id: c,
                op: "add".to_string(),
                ty: "int".to_string(),
                operands: vec![Operand::value(a, "int"), Operand::value(b, "int")],
            },
        ]);
        func.blocks[0].terminator = Some(Terminator::Ret(Some(Operand::value(c, "int"))));

        let mut module = Module {
            functions: vec![func],
        };
        assert_eq!(run_default_passes(&mut module), 1);
        let folded = &module.functions[0].blocks[0].instructions[2];
        assert_eq!(folded.op, "const.int");
        assert_eq!(folded.operands, vec![Operand::literal("5", "int")]);
    }
}
