use crate::types::Type;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SYM_NAME: &str = "sym_name";
pub const FUNCTION_TYPE: &str = "function_type";
pub const CALLEE: &str = "callee";
pub const VALUE: &str = "value";
pub const PREDICATE: &str = "predicate";
pub const ELEM_TYPE: &str = "elem_type";
pub const GLOBAL_TYPE: &str = "global_type";
pub const GLOBAL_NAME: &str = "global_name";
pub const LINKAGE: &str = "linkage";
pub const IS_RUNTIME: &str = "is_runtime";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    Integer { value: BigInt, ty: Type },
    String(String),
    Bool(bool),
    Symbol(String),
    Type(Type),
    /// Every element of an aggregate set to zero.
    ZeroSplat(Type),
}

impl Attribute {
    pub fn integer(value: impl Into<BigInt>, ty: Type) -> Self {
        Attribute::Integer {
            value: value.into(),
            ty,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Attribute::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Attribute::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Attribute::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<(&BigInt, &Type)> {
        match self {
            Attribute::Integer { value, ty } => Some((value, ty)),
            _ => None,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Integer { value, ty } => write!(f, "{} : {}", value, ty),
            Attribute::String(s) => write!(f, "\"{}\"", s.escape_default()),
            Attribute::Bool(b) => write!(f, "{}", b),
            Attribute::Symbol(s) => write!(f, "@{}", s),
            Attribute::Type(ty) => write!(f, "{}", ty),
            Attribute::ZeroSplat(ty) => write!(f, "dense<0> : {}", ty),
        }
    }
}

/// Integer comparison predicates shared by `arith.cmpi` and `llvm.icmp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CmpPredicate {
    Eq,
    Ne,
    Slt,
    Sle,
    Sgt,
    Sge,
    Ult,
    Ule,
    Ugt,
    Uge,
}

impl CmpPredicate {
    pub fn as_str(&self) -> &'static str {
        match self {
            CmpPredicate::Eq => "eq",
            CmpPredicate::Ne => "ne",
            CmpPredicate::Slt => "slt",
            CmpPredicate::Sle => "sle",
            CmpPredicate::Sgt => "sgt",
            CmpPredicate::Sge => "sge",
            CmpPredicate::Ult => "ult",
            CmpPredicate::Ule => "ule",
            CmpPredicate::Ugt => "ugt",
            CmpPredicate::Uge => "uge",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "eq" => CmpPredicate::Eq,
            "ne" => CmpPredicate::Ne,
            "slt" => CmpPredicate::Slt,
            "sle" => CmpPredicate::Sle,
            "sgt" => CmpPredicate::Sgt,
            "sge" => CmpPredicate::Sge,
            "ult" => CmpPredicate::Ult,
            "ule" => CmpPredicate::Ule,
            "ugt" => CmpPredicate::Ugt,
            "uge" => CmpPredicate::Uge,
            _ => return None,
        })
    }
}

impl From<CmpPredicate> for Attribute {
    fn from(pred: CmpPredicate) -> Self {
        Attribute::String(pred.as_str().to_string())
    }
}
