use super::context::FunctionContext;
use super::expression_transformer::ExpressionTransformer;
use super::type_resolver::TypeResolver;
use crate::ast::{Function, Statement};
use crate::errors::Result;
use solir_core::{builder::OpBuilder, FunctionType, InstBuilder, OpId, SourceBuffer};
use tracing::debug;

pub struct FunctionTransformer;

impl FunctionTransformer {
    /// Lowers `function` into a `func.func` at the builder's insertion point.
    ///
    /// Every parameter is spilled into its own memory cell on entry, so later
    /// reads always go through a load of that cell.
    pub fn transform_function(
        builder: OpBuilder<'_>,
        source: &SourceBuffer,
        function: &Function,
    ) -> Result<OpId> {
        let mut ctx = FunctionContext::new(builder, source);
        let location = ctx.at(function.src)?;

        let mut inputs = Vec::with_capacity(function.parameters.len());
        let mut param_locations = Vec::with_capacity(function.parameters.len());
        for param in &function.parameters {
            let param_location = ctx.locate(param.src)?;
            inputs.push(TypeResolver::lower_type(&param.ty, &param_location)?);
            param_locations.push(param_location);
        }

        let mut results = Vec::with_capacity(function.return_parameters.len());
        for param in &function.return_parameters {
            results.push(TypeResolver::lower_type(&param.ty, &ctx.locate(param.src)?)?);
        }
        if function.return_parameters.len() > 1 {
            return Err(ctx.unsupported(format!(
                "function '{}' returns {} values",
                function.name,
                function.return_parameters.len()
            )));
        }
        let return_type = function.return_parameters.first().map(|p| p.ty.clone());

        ctx.builder.set_location(location);
        let (func, entry) = ctx.builder.func(
            &function.name,
            FunctionType {
                inputs: inputs.clone(),
                results,
            },
        )?;
        ctx.builder.set_insertion_point_to_end(entry);

        let args = ctx.builder.block_args(entry);
        for ((param, arg), (ty, param_location)) in function
            .parameters
            .iter()
            .zip(args)
            .zip(inputs.into_iter().zip(param_locations))
        {
            ctx.builder.set_location(param_location);
            let cell = ctx.builder.alloca_cell(ty)?;
            ctx.builder.store_cell(arg, cell)?;
            ctx.cells.bind(param.declaration, cell, param.ty.clone());
        }

        let mut returned = false;
        for statement in &function.body {
            ctx.at(statement.src())?;
            if returned {
                return Err(ctx.unsupported(format!(
                    "{} after return in '{}'",
                    statement.kind_name(),
                    function.name
                )));
            }
            match statement {
                Statement::Return { expression, .. } => {
                    match (&return_type, expression) {
                        (None, None) => {}
                        (None, Some(_)) => {
                            return Err(ctx.unsupported(format!(
                                "returning a value from '{}' which declares no return value",
                                function.name
                            )))
                        }
                        (Some(_), None) => {
                            return Err(ctx.unsupported(format!(
                                "return without a value in '{}'",
                                function.name
                            )))
                        }
                        (Some(ty), Some(expr)) => {
                            let value =
                                ExpressionTransformer::transform_expression(&mut ctx, expr, Some(ty))?;
                            ctx.at(statement.src())?;
                            ctx.builder.func_return(vec![value])?;
                        }
                    }
                    returned = true;
                }
                other => {
                    return Err(ctx.unsupported(format!(
                        "{} in '{}'",
                        other.kind_name(),
                        function.name
                    )));
                }
            }
        }

        match return_type {
            None => {
                ctx.at(function.src)?;
                ctx.builder.func_return(vec![])?;
            }
            Some(_) if !returned => {
                ctx.at(function.src)?;
                return Err(ctx.unsupported(format!(
                    "'{}' can reach its end without returning a value",
                    function.name
                )));
            }
            Some(_) => {}
        }

        debug!(
            function = %function.name,
            cells = ctx.cells.len(),
            "lowered function"
        );
        Ok(func)
    }
}
