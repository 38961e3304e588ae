use super::function_transformer::FunctionTransformer;
use crate::ast::Contract;
use crate::errors::{Result, TransformError};
use solir_core::{builder::OpBuilder, InstBuilder, Module, OpId, SolOp, SourceBuffer};
use std::collections::HashSet;
use tracing::debug;

pub struct StructuralTransformer;

impl StructuralTransformer {
    /// Creates `sol.contract @<name>` and lowers its functions into it in
    /// declaration order.
    pub fn transform_contract(
        module: &mut Module,
        source: &SourceBuffer,
        contract: &Contract,
    ) -> Result<OpId> {
        let location = source.location(contract.src.start)?;

        let mut seen = HashSet::new();
        for function in &contract.functions {
            if !seen.insert(function.name.as_str()) {
                return Err(TransformError::unsupported(
                    format!(
                        "overloaded function '{}' in contract '{}'",
                        function.name, contract.name
                    ),
                    &source.location(function.src.start)?,
                ));
            }
        }

        let mut builder = OpBuilder::new(module);
        builder.set_location(location);
        let (op, body) = builder.container(SolOp::Contract, &contract.name)?;

        for function in &contract.functions {
            FunctionTransformer::transform_function(OpBuilder::at_end(module, body), source, function)?;
        }

        debug!(
            contract = %contract.name,
            functions = contract.functions.len(),
            "lowered contract"
        );
        Ok(op)
    }
}
