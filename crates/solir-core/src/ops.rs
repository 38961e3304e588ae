use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    Sol,
    Func,
    Arith,
    MemRef,
    Llvm,
}

impl Dialect {
    pub fn namespace(&self) -> &'static str {
        match self {
            Dialect::Sol => "sol",
            Dialect::Func => "func",
            Dialect::Arith => "arith",
            Dialect::MemRef => "memref",
            Dialect::Llvm => "llvm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolOp {
    Contract,
    Object,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuncOp {
    Func,
    Return,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    Constant,
    AddI,
    MulI,
    AndI,
    CmpI,
    ExtSI,
    ExtUI,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemRefOp {
    Alloca,
    Load,
    Store,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LlvmOp {
    Func,
    Global,
    AddressOf,
    Load,
    Store,
    Alloca,
    Constant,
    Add,
    Mul,
    And,
    LShr,
    SExt,
    ZExt,
    ICmp,
    PtrToInt,
    IntToPtr,
    GetElementPtr,
    Call,
    Return,
    Unreachable,
    CondBr,
    Br,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Sol(SolOp),
    Func(FuncOp),
    Arith(ArithOp),
    MemRef(MemRefOp),
    Llvm(LlvmOp),
}

impl OpKind {
    pub fn dialect(&self) -> Dialect {
        match self {
            OpKind::Sol(_) => Dialect::Sol,
            OpKind::Func(_) => Dialect::Func,
            OpKind::Arith(_) => Dialect::Arith,
            OpKind::MemRef(_) => Dialect::MemRef,
            OpKind::Llvm(_) => Dialect::Llvm,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpKind::Sol(op) => match op {
                SolOp::Contract => "contract",
                SolOp::Object => "object",
                SolOp::Return => "return",
            },
            OpKind::Func(op) => match op {
                FuncOp::Func => "func",
                FuncOp::Return => "return",
                FuncOp::Call => "call",
            },
            OpKind::Arith(op) => match op {
                ArithOp::Constant => "constant",
                ArithOp::AddI => "addi",
                ArithOp::MulI => "muli",
                ArithOp::AndI => "andi",
                ArithOp::CmpI => "cmpi",
                ArithOp::ExtSI => "extsi",
                ArithOp::ExtUI => "extui",
            },
            OpKind::MemRef(op) => match op {
                MemRefOp::Alloca => "alloca",
                MemRefOp::Load => "load",
                MemRefOp::Store => "store",
            },
            OpKind::Llvm(op) => match op {
                LlvmOp::Func => "func",
                LlvmOp::Global => "mlir.global",
                LlvmOp::AddressOf => "mlir.addressof",
                LlvmOp::Load => "load",
                LlvmOp::Store => "store",
                LlvmOp::Alloca => "alloca",
                LlvmOp::Constant => "mlir.constant",
                LlvmOp::Add => "add",
                LlvmOp::Mul => "mul",
                LlvmOp::And => "and",
                LlvmOp::LShr => "lshr",
                LlvmOp::SExt => "sext",
                LlvmOp::ZExt => "zext",
                LlvmOp::ICmp => "icmp",
                LlvmOp::PtrToInt => "ptrtoint",
                LlvmOp::IntToPtr => "inttoptr",
                LlvmOp::GetElementPtr => "getelementptr",
                LlvmOp::Call => "call",
                LlvmOp::Return => "return",
                LlvmOp::Unreachable => "unreachable",
                LlvmOp::CondBr => "cond_br",
                LlvmOp::Br => "br",
            },
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            OpKind::Sol(SolOp::Return)
                | OpKind::Func(FuncOp::Return)
                | OpKind::Llvm(LlvmOp::Return)
                | OpKind::Llvm(LlvmOp::Unreachable)
                | OpKind::Llvm(LlvmOp::CondBr)
                | OpKind::Llvm(LlvmOp::Br)
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(self, OpKind::Func(FuncOp::Func) | OpKind::Llvm(LlvmOp::Func))
    }

    /// Containers group functions and code under a symbol name.
    pub fn is_container(&self) -> bool {
        matches!(self, OpKind::Sol(SolOp::Contract) | OpKind::Sol(SolOp::Object))
    }

    pub fn is_symbol(&self) -> bool {
        self.is_function() || self.is_container() || matches!(self, OpKind::Llvm(LlvmOp::Global))
    }

    /// Regions of these ops introduce a new symbol scope.
    pub fn is_symbol_table(&self) -> bool {
        self.is_container()
    }

    /// Bodies may not reference values defined outside of the op.
    pub fn is_isolated_from_above(&self) -> bool {
        self.is_function() || self.is_container()
    }

    pub fn is_call(&self) -> bool {
        matches!(self, OpKind::Func(FuncOp::Call) | OpKind::Llvm(LlvmOp::Call))
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.dialect().namespace(), self.mnemonic())
    }
}
