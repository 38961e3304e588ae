use super::cast::CastGenerator;
use super::context::FunctionContext;
use super::type_resolver::TypeResolver;
use crate::ast::{BinaryOperator, Expression, SemanticType, SourceRange};
use crate::errors::Result;
use solir_core::{InstBuilder, ValueId};
use tracing::trace;

pub struct ExpressionTransformer;

impl ExpressionTransformer {
    /// Lowers `expr` to an SSA value. When `expected` is given and differs from
    /// the expression's own type, the value is cast to it last.
    pub fn transform_expression(
        ctx: &mut FunctionContext<'_, '_>,
        expr: &Expression,
        expected: Option<&SemanticType>,
    ) -> Result<ValueId> {
        let (value, own) = match expr {
            Expression::Literal { value, ty, src } => {
                ctx.at(*src)?;
                // A literal that fits the expected integer type is emitted in it directly.
                let target = match expected {
                    Some(wanted @ SemanticType::Integer { .. })
                        if ty.literal_value().is_some_and(|v| wanted.holds(&v)) =>
                    {
                        wanted
                    }
                    _ => ty,
                };
                (Self::transform_literal(ctx, value, ty, target)?, target.clone())
            }
            Expression::Identifier {
                name,
                referenced_declaration,
                src,
                ..
            } => {
                ctx.at(*src)?;
                let cell = ctx.cells.lookup(*referenced_declaration).cloned().ok_or_else(|| {
                    ctx.unsupported(format!(
                        "reference to '{}' which is not a parameter of this function",
                        name
                    ))
                })?;
                (ctx.builder.load_cell(cell.cell)?, cell.ty)
            }
            Expression::BinaryOperation {
                operator,
                left_expression,
                right_expression,
                ty,
                src,
            } => (
                Self::transform_binary(ctx, *operator, left_expression, right_expression, ty, *src)?,
                ty.clone(),
            ),
        };

        match expected {
            Some(expected) if *expected != own => {
                ctx.at(expr.src())?;
                CastGenerator::cast(&mut ctx.builder, value, &own, expected)
            }
            _ => Ok(value),
        }
    }

    fn transform_literal(
        ctx: &mut FunctionContext<'_, '_>,
        text: &str,
        ty: &SemanticType,
        target: &SemanticType,
    ) -> Result<ValueId> {
        let location = ctx.builder.location().clone();
        let lowered = TypeResolver::lower_type(target, &location)?;
        let value = ty
            .literal_value()
            .ok_or_else(|| ctx.unsupported(format!("literal '{}' of type '{}'", text, ty)))?;
        trace!(literal = text, %value, ty = %lowered, "constant");
        Ok(ctx.builder.constant(value, lowered)?)
    }

    fn transform_binary(
        ctx: &mut FunctionContext<'_, '_>,
        operator: BinaryOperator,
        lhs: &Expression,
        rhs: &Expression,
        ty: &SemanticType,
        src: SourceRange,
    ) -> Result<ValueId> {
        if !matches!(operator, BinaryOperator::Add | BinaryOperator::Mul) {
            ctx.at(src)?;
            return Err(ctx.unsupported(format!("binary operator '{}'", operator)));
        }
        let lhs = Self::transform_expression(ctx, lhs, Some(ty))?;
        let rhs = Self::transform_expression(ctx, rhs, Some(ty))?;
        ctx.at(src)?;
        if operator == BinaryOperator::Add {
            Ok(ctx.builder.addi(lhs, rhs)?)
        } else {
            Ok(ctx.builder.muli(lhs, rhs)?)
        }
    }
}
