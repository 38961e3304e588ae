use serde::{Deserialize, Serialize};
use std::fmt;

/// Word width of the EraVM target, in bits.
pub const WORD_BITS: u16 = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// Signless integer. Signedness lives in the source type system only.
    Int(u16),
    /// Opaque pointer in the given address space.
    Ptr(u32),
    /// Single-element addressable cell.
    MemRef(Box<Type>),
    Array(Box<Type>, u64),
    Function(Box<FunctionType>),
}

impl Type {
    pub fn i1() -> Self {
        Type::Int(1)
    }

    pub fn i256() -> Self {
        Type::Int(WORD_BITS)
    }

    pub fn memref(elem: Type) -> Self {
        Type::MemRef(Box::new(elem))
    }

    pub fn array(elem: Type, len: u64) -> Self {
        Type::Array(Box::new(elem), len)
    }

    pub fn function(inputs: Vec<Type>, results: Vec<Type>) -> Self {
        Type::Function(Box::new(FunctionType { inputs, results }))
    }

    pub fn int_width(&self) -> Option<u16> {
        match self {
            Type::Int(bits) => Some(*bits),
            _ => None,
        }
    }

    pub fn is_int(&self) -> bool {
        matches!(self, Type::Int(_))
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, Type::Ptr(_))
    }

    pub fn memref_element(&self) -> Option<&Type> {
        match self {
            Type::MemRef(elem) => Some(elem),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionType> {
        match self {
            Type::Function(func) => Some(func),
            _ => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int(bits) => write!(f, "i{}", bits),
            Type::Ptr(0) => write!(f, "!llvm.ptr"),
            Type::Ptr(space) => write!(f, "!llvm.ptr<{}>", space),
            Type::MemRef(elem) => write!(f, "memref<{}>", elem),
            Type::Array(elem, len) => write!(f, "!llvm.array<{} x {}>", len, elem),
            Type::Function(func) => write!(f, "{}", func),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionType {
    pub inputs: Vec<Type>,
    pub results: Vec<Type>,
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs = self
            .inputs
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "({}) -> ", inputs)?;
        match self.results.as_slice() {
            [single] => write!(f, "{}", single),
            results => write!(
                f,
                "({})",
                results
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}
