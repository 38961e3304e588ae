use crate::ast::SemanticType;
use crate::errors::{Result, TransformError};
use solir_core::{Location, Type};

pub struct TypeResolver;

impl TypeResolver {
    /// IR type of a semantic type. Integers keep their width and lose their signedness.
    pub fn lower_type(ty: &SemanticType, location: &Location) -> Result<Type> {
        match ty {
            SemanticType::Integer { bits, .. } => Self::integer(*bits, ty, location),
            SemanticType::RationalNumber { .. } => {
                if ty.is_fractional() {
                    return Err(TransformError::unsupported(
                        format!("fractional number type '{}'", ty),
                        location,
                    ));
                }
                let interpretation = ty.integer_interpretation().ok_or_else(|| {
                    TransformError::unsupported(
                        format!("number literal '{}' does not fit in 256 bits", ty),
                        location,
                    )
                })?;
                Ok(Type::Int(interpretation.bits))
            }
            SemanticType::Bool | SemanticType::Address => Err(TransformError::unsupported(
                format!("type '{}'", ty),
                location,
            )),
        }
    }

    fn integer(bits: u16, ty: &SemanticType, location: &Location) -> Result<Type> {
        if bits == 0 || bits > solir_core::types::WORD_BITS || bits % 8 != 0 {
            return Err(TransformError::unsupported(
                format!("integer width of '{}'", ty),
                location,
            ));
        }
        Ok(Type::Int(bits))
    }
}
