/*! Lower the resolved Solidity AST into the high-level solir dialects.
 *
 * Contracts become `sol.contract` containers and functions become `func.func` ops. Source variables
 * live in `memref` cells so the SSA form never has to track reassignment, and integer arithmetic is
 * emitted in `arith` after both operands are widened to the operation's type. The result is verified
 * before it is handed to legalization.
 */

mod cast;
mod context;
mod expression_transformer;
mod function_transformer;
mod structural_transformer;
mod type_resolver;

use crate::ast::Contract;
use crate::errors::Result;
use solir_core::{verify, Module, SourceBuffer};
use tracing::{debug, info_span};

pub use cast::CastGenerator;
pub use context::{Cell, MemoryCells};
pub use structural_transformer::StructuralTransformer;
pub use type_resolver::TypeResolver;

/// Lowers every contract into a fresh module and verifies it.
pub fn transform_contracts_to_ir(contracts: &[Contract], source: &SourceBuffer) -> Result<Module> {
    let _span = info_span!("solidity_to_ir", source = source.name()).entered();

    let mut module = Module::new(source.location(0)?);
    for contract in contracts {
        StructuralTransformer::transform_contract(&mut module, source, contract)?;
    }

    verify(&module)?;
    debug!(contracts = contracts.len(), ops = module.walk().len(), "high-level module verified");
    Ok(module)
}

#[cfg(test)]
mod tests;
