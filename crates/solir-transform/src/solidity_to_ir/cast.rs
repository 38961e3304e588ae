use super::type_resolver::TypeResolver;
use crate::ast::SemanticType;
use crate::errors::{Result, TransformError};
use solir_core::{builder::OpBuilder, InstBuilder, ValueId};
use tracing::trace;

pub struct CastGenerator;

impl CastGenerator {
    /// Converts `value` of type `from` to `to`, widening with a sign or zero
    /// extension chosen by the signedness of `to`.
    pub fn cast(
        builder: &mut OpBuilder<'_>,
        value: ValueId,
        from: &SemanticType,
        to: &SemanticType,
    ) -> Result<ValueId> {
        if Self::is_identity(from, to) {
            return Ok(value);
        }

        let location = builder.location().clone();
        let (Some(src), Some(dst)) = (from.integer_interpretation(), to.integer_interpretation())
        else {
            return Err(TransformError::unsupported(
                format!("cast from '{}' to '{}'", from, to),
                &location,
            ));
        };

        if dst.bits <= src.bits {
            return Err(TransformError::unsupported(
                format!("narrowing cast from '{}' to '{}'", from, to),
                &location,
            ));
        }

        let target = TypeResolver::lower_type(to, &location)?;
        trace!(%from, %to, "widening cast");
        let widened = if dst.signed {
            builder.extsi(value, target)?
        } else {
            builder.extui(value, target)?
        };
        Ok(widened)
    }

    /// Casting a type to itself emits nothing. A number literal whose integer
    /// interpretation is the destination type is already of that type.
    pub fn is_identity(from: &SemanticType, to: &SemanticType) -> bool {
        if from == to {
            return true;
        }
        match to {
            SemanticType::Integer { .. } if from.is_rational() && !from.is_fractional() => {
                from.integer_interpretation().map(SemanticType::from).as_ref() == Some(to)
            }
            _ => false,
        }
    }
}
