//! Mid-level IR: typed SSA functions composed of basic blocks.
//!
//! SSA values are plain integers local to a function; parameters take
//! the first ids `0..n-1`. A block is closed once its terminator is set.

pub mod builder;
pub mod fold;
pub mod passes;
pub mod printer;
pub mod verify;

use serde::{Deserialize, Serialize};

/// A compiled module: just its functions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Module {
    pub functions: Vec<Function>,
}

/// A lowered function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: String,
    pub params: Vec<FuncParam>,
    pub blocks: Vec<BasicBlock>,
    /// The next SSA id; every id below this is unique in the function.
    pub next_value_id: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuncParam {
    pub name: String,
    pub ty: String,
    pub value: usize,
}

impl Function {
    /// Create a function whose parameters occupy ids `0..n-1`, with an
    /// open `entry` block.
    pub fn new(name: impl Into<String>, return_type: impl Into<String>, params: Vec<(String, String)>) -> Self {
        let params: Vec<FuncParam> = params
            .into_iter()
            .enumerate()
            .map(|(value, (name, ty))| FuncParam { name, ty, value })
            .collect();
        let next_value_id = params.len();
        Self {
            name: name.into(),
            return_type: return_type.into(),
            params,
            blocks: vec![BasicBlock::new("entry")],
            next_value_id,
        }
    }

    /// Allocate a fresh SSA id.
    pub fn alloc_value(&mut self) -> usize {
        let id = self.next_value_id;
        self.next_value_id += 1;
        id
    }

    pub fn block(&self, index: usize) -> &BasicBlock {
        &self.blocks[index]
    }

    pub fn block_mut(&mut self, index: usize) -> &mut BasicBlock {
        &mut self.blocks[index]
    }

    pub fn block_by_name(&self, name: &str) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }
}

/// A straight-line instruction sequence plus one terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub name: String,
    pub instructions: Vec<Instruction>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
            terminator: None,
        }
    }

    /// Whether the block is still open for writing.
    pub fn is_open(&self) -> bool {
        self.terminator.is_none()
    }
}

/// One SSA instruction. The op is an open set of mnemonic strings:
/// `const.<type>`, `add`, `cmp.lt`, `strcat`, `call`, `assign`, …, and
/// `op.<literal>` for operators without a dedicated mnemonic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub id: usize,
    pub op: String,
    pub ty: String,
    pub operands: Vec<Operand>,
}

/// Block terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Terminator {
    Ret(Option<Operand>),
    Br {
        target: String,
    },
    Cbr {
        cond: Operand,
        then_block: String,
        else_block: String,
    },
}

/// Instruction operand: an SSA value or a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Value { id: usize, ty: String },
    Literal { text: String, ty: String },
}

impl Operand {
    pub fn value(id: usize, ty: impl Into<String>) -> Self {
        Operand::Value { id, ty: ty.into() }
    }

    pub fn literal(text: impl Into<String>, ty: impl Into<String>) -> Self {
        Operand::Literal {
            text: text.into(),
            ty: ty.into(),
        }
    }

    pub fn ty(&self) -> &str {
        match self {
            Operand::Value { ty, .. } => ty,
            Operand::Literal { ty, .. } => ty,
        }
    }
}
