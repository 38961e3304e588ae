/*! Core IR for the solir compiler backend.
 *
 * Programs are represented as nested operations: every operation carries typed SSA operands and
 * results, attributes, a source location, and may own regions of blocks. The same arena hosts both
 * the high-level `sol`/`func`/`arith`/`memref` form produced from the AST and the low-level `llvm`
 * form produced by legalization, so a single verifier and printer serve both stages.
 */

pub mod attributes;
pub mod builder;
pub mod conversion;
pub mod entities;
pub mod module;
pub mod ops;
pub mod pass;
pub mod rewrite;
pub mod source_location;
pub mod types;
pub mod verifier;

pub use attributes::{Attribute, CmpPredicate};
pub use builder::{InsertPoint, InstBuilder, InstBuilderBase, OpBuilder};
pub use conversion::{apply_full_conversion, ConversionPattern, ConversionStats, ConversionTarget};
pub use entities::{BlockId, OpId, RegionId, ValueId};
pub use module::{BlockData, Module, OpData, RegionData, ValueData, ValueDef};
pub use ops::{ArithOp, Dialect, FuncOp, LlvmOp, MemRefOp, OpKind, SolOp};
pub use pass::{Pass, PassManager, PassStatistics};
pub use source_location::{Location, SourceBuffer, SourceLocationError};
pub use types::{FunctionType, Type};
pub use verifier::{verify, VerifyError};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IrError {
    #[error("Type error: {0}")]
    TypeError(String),
    #[error("Invalid instruction: {0}")]
    InvalidInstruction(String),
    #[error("Builder error: {0}")]
    BuilderError(String),
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),
    #[error("Conversion did not converge after {0} iterations")]
    ConversionLimit(usize),
    #[error("Failed to legalize operations: {}", .0.join(", "))]
    IllegalOperations(Vec<String>),
}

pub type Result<T> = std::result::Result<T, IrError>;

#[cfg(test)]
mod tests;
