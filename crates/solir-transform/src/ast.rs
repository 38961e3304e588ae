/*! Resolved AST handed over by the Solidity front end.
 *
 * The front end parses and type-checks; this crate only reads the result. Every expression and
 * declaration arrives with its semantic type already assigned, and every node carries the byte range
 * it was parsed from so diagnostics can point back into the source buffer.
 */

use num_bigint::{BigInt, Sign};
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable handle of a declaration, assigned by the front end.
pub type DeclarationId = u64;

/// Byte range of a node in the source buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRange {
    pub start: usize,
    #[serde(default)]
    pub length: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub name: String,
    #[serde(default)]
    pub functions: Vec<Function>,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub return_parameters: Vec<Parameter>,
    #[serde(default)]
    pub body: Vec<Statement>,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub declaration: DeclarationId,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SemanticType,
    #[serde(default)]
    pub src: SourceRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "camelCase")]
pub enum Statement {
    #[serde(rename = "Return")]
    Return {
        #[serde(default)]
        expression: Option<Expression>,
        #[serde(default)]
        src: SourceRange,
    },
    #[serde(rename = "Block")]
    Block {
        #[serde(default)]
        statements: Vec<Statement>,
        #[serde(default)]
        src: SourceRange,
    },
    #[serde(rename = "ExpressionStatement")]
    ExpressionStatement {
        expression: Expression,
        #[serde(default)]
        src: SourceRange,
    },
    #[serde(rename = "VariableDeclarationStatement")]
    VariableDeclaration {
        #[serde(default)]
        src: SourceRange,
    },
    #[serde(rename = "IfStatement")]
    If {
        #[serde(default)]
        src: SourceRange,
    },
    #[serde(rename = "WhileStatement")]
    While {
        #[serde(default)]
        src: SourceRange,
    },
    #[serde(rename = "Break")]
    Break {
        #[serde(default)]
        src: SourceRange,
    },
    #[serde(rename = "Continue")]
    Continue {
        #[serde(default)]
        src: SourceRange,
    },
}

impl Statement {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::Return { .. } => "return",
            Statement::Block { .. } => "block",
            Statement::ExpressionStatement { .. } => "expression statement",
            Statement::VariableDeclaration { .. } => "variable declaration",
            Statement::If { .. } => "if statement",
            Statement::While { .. } => "while statement",
            Statement::Break { .. } => "break",
            Statement::Continue { .. } => "continue",
        }
    }

    pub fn src(&self) -> SourceRange {
        match self {
            Statement::Return { src, .. }
            | Statement::Block { src, .. }
            | Statement::ExpressionStatement { src, .. }
            | Statement::VariableDeclaration { src }
            | Statement::If { src }
            | Statement::While { src }
            | Statement::Break { src }
            | Statement::Continue { src } => *src,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "camelCase")]
pub enum Expression {
    #[serde(rename = "Literal", rename_all = "camelCase")]
    Literal {
        #[serde(default)]
        value: String,
        #[serde(rename = "type")]
        ty: SemanticType,
        #[serde(default)]
        src: SourceRange,
    },
    #[serde(rename = "Identifier", rename_all = "camelCase")]
    Identifier {
        #[serde(default)]
        name: String,
        referenced_declaration: DeclarationId,
        #[serde(rename = "type")]
        ty: SemanticType,
        #[serde(default)]
        src: SourceRange,
    },
    #[serde(rename = "BinaryOperation", rename_all = "camelCase")]
    BinaryOperation {
        operator: BinaryOperator,
        left_expression: Box<Expression>,
        right_expression: Box<Expression>,
        #[serde(rename = "type")]
        ty: SemanticType,
        #[serde(default)]
        src: SourceRange,
    },
}

impl Expression {
    /// The type the checker resolved for this expression.
    pub fn ty(&self) -> &SemanticType {
        match self {
            Expression::Literal { ty, .. }
            | Expression::Identifier { ty, .. }
            | Expression::BinaryOperation { ty, .. } => ty,
        }
    }

    pub fn src(&self) -> SourceRange {
        match self {
            Expression::Literal { src, .. }
            | Expression::Identifier { src, .. }
            | Expression::BinaryOperation { src, .. } => *src,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "**")]
    Exp,
    #[serde(rename = "&")]
    BitAnd,
    #[serde(rename = "|")]
    BitOr,
    #[serde(rename = "^")]
    BitXor,
    #[serde(rename = "<<")]
    Shl,
    #[serde(rename = ">>")]
    Shr,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Exp => "**",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Le => "<=",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntegerType {
    pub bits: u16,
    pub signed: bool,
}

impl fmt::Display for IntegerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.signed { "int" } else { "uint" };
        write!(f, "{}{}", prefix, self.bits)
    }
}

/// Semantic types assigned by the type checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SemanticType {
    Integer {
        bits: u16,
        signed: bool,
    },
    /// Type of a number literal, carrying the literal's exact value.
    RationalNumber {
        #[serde(with = "decimal")]
        numerator: BigInt,
        #[serde(with = "decimal", default = "BigInt::one")]
        denominator: BigInt,
    },
    Bool,
    Address,
}

impl SemanticType {
    pub fn uint(bits: u16) -> Self {
        SemanticType::Integer {
            bits,
            signed: false,
        }
    }

    pub fn int(bits: u16) -> Self {
        SemanticType::Integer { bits, signed: true }
    }

    pub fn rational(value: impl Into<BigInt>) -> Self {
        SemanticType::RationalNumber {
            numerator: value.into(),
            denominator: BigInt::one(),
        }
    }

    /// True for a rational whose value is not a whole number.
    pub fn is_fractional(&self) -> bool {
        match self {
            SemanticType::RationalNumber {
                numerator,
                denominator,
            } => denominator.is_zero() || !(numerator % denominator).is_zero(),
            _ => false,
        }
    }

    /// Whole-number value of a non-fractional rational.
    pub fn literal_value(&self) -> Option<BigInt> {
        match self {
            SemanticType::RationalNumber {
                numerator,
                denominator,
            } if !self.is_fractional() => Some(numerator / denominator),
            _ => None,
        }
    }

    /// The integer type a value of this type is interpreted as.
    ///
    /// A rational maps to the smallest multiple-of-8 width holding its value, signed when the
    /// value is negative. Values needing more than 256 bits have no interpretation.
    pub fn integer_interpretation(&self) -> Option<IntegerType> {
        match self {
            SemanticType::Integer { bits, signed } => Some(IntegerType {
                bits: *bits,
                signed: *signed,
            }),
            SemanticType::RationalNumber { .. } => {
                let value = self.literal_value()?;
                let negative = value.sign() == Sign::Minus;
                let magnitude = if negative {
                    (-value - BigInt::one()) << 1usize
                } else {
                    value
                };
                let used = magnitude.bits();
                if used > u64::from(solir_core::types::WORD_BITS) {
                    return None;
                }
                let bytes = ((used + 7) / 8).max(1);
                Some(IntegerType {
                    bits: (bytes * 8) as u16,
                    signed: negative,
                })
            }
            SemanticType::Bool | SemanticType::Address => None,
        }
    }

    /// True when `value` is in the range of this integer type.
    pub fn holds(&self, value: &BigInt) -> bool {
        let SemanticType::Integer { bits, signed } = *self else {
            return false;
        };
        if bits == 0 {
            return false;
        }
        let (min, max) = if signed {
            let half = BigInt::one() << usize::from(bits - 1);
            (-half.clone(), half - 1)
        } else {
            (BigInt::zero(), (BigInt::one() << usize::from(bits)) - 1)
        };
        *value >= min && *value <= max
    }

    pub fn is_rational(&self) -> bool {
        matches!(self, SemanticType::RationalNumber { .. })
    }
}

impl From<IntegerType> for SemanticType {
    fn from(ty: IntegerType) -> Self {
        SemanticType::Integer {
            bits: ty.bits,
            signed: ty.signed,
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Integer { bits, signed } => write!(
                f,
                "{}",
                IntegerType {
                    bits: *bits,
                    signed: *signed,
                }
            ),
            SemanticType::RationalNumber {
                numerator,
                denominator,
            } => {
                if denominator.is_one() {
                    write!(f, "int_const {}", numerator)
                } else {
                    write!(f, "rational_const {} / {}", numerator, denominator)
                }
            }
            SemanticType::Bool => f.write_str("bool"),
            SemanticType::Address => f.write_str("address"),
        }
    }
}

/// Reads a list of contracts from the front end's JSON export.
pub fn contracts_from_json(json: &str) -> serde_json::Result<Vec<Contract>> {
    serde_json::from_str(json)
}

/// Arbitrary-precision integers travel as decimal strings.
mod decimal {
    use num_bigint::BigInt;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let text = String::deserialize(deserializer)?;
        BigInt::parse_bytes(text.trim().as_bytes(), 10)
            .ok_or_else(|| D::Error::custom(format!("invalid decimal integer '{}'", text)))
    }
}
