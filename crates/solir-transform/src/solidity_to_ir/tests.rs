use super::*;
use crate::ast::{
    contracts_from_json, BinaryOperator, Expression, Function, Parameter, SemanticType,
    SourceRange, Statement,
};
use crate::errors::TransformError;
use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use solir_core::{
    attributes, ArithOp, Attribute, FuncOp, Location, MemRefOp, OpId, OpKind, SolOp, Type,
};

const SOURCE: &str = "contract C {
    function f(uint8 a) public returns (uint8) {
        return a + 1;
    }
}
";

fn source() -> SourceBuffer {
    SourceBuffer::new("C.sol", SOURCE.to_string()).unwrap()
}

fn at(needle: &str) -> SourceRange {
    SourceRange {
        start: SOURCE.find(needle).unwrap(),
        length: needle.len(),
    }
}

fn param(declaration: u64, name: &str, ty: SemanticType) -> Parameter {
    Parameter {
        declaration,
        name: name.to_string(),
        ty,
        src: SourceRange::default(),
    }
}

fn ident(declaration: u64, name: &str, ty: SemanticType) -> Expression {
    Expression::Identifier {
        name: name.to_string(),
        referenced_declaration: declaration,
        ty,
        src: SourceRange::default(),
    }
}

fn lit(value: impl Into<BigInt>) -> Expression {
    let value = value.into();
    Expression::Literal {
        value: value.to_string(),
        ty: SemanticType::rational(value),
        src: SourceRange::default(),
    }
}

fn binary(operator: BinaryOperator, lhs: Expression, rhs: Expression, ty: SemanticType) -> Expression {
    Expression::BinaryOperation {
        operator,
        left_expression: Box::new(lhs),
        right_expression: Box::new(rhs),
        ty,
        src: SourceRange::default(),
    }
}

fn ret(expression: Option<Expression>) -> Statement {
    Statement::Return {
        expression,
        src: SourceRange::default(),
    }
}

fn function(
    name: &str,
    parameters: Vec<Parameter>,
    returns: Vec<SemanticType>,
    body: Vec<Statement>,
) -> Function {
    Function {
        name: name.to_string(),
        parameters,
        return_parameters: returns
            .into_iter()
            .enumerate()
            .map(|(i, ty)| param(1000 + i as u64, "", ty))
            .collect(),
        body,
        src: SourceRange::default(),
    }
}

fn lower(functions: Vec<Function>) -> Result<Module> {
    let contract = Contract {
        name: "C".to_string(),
        functions,
        src: SourceRange::default(),
    };
    transform_contracts_to_ir(&[contract], &source())
}

/// `function f(<ty> a) returns (<ret>) { return a; }`
fn pass_through(ty: SemanticType, ret_ty: SemanticType) -> Result<Module> {
    lower(vec![function(
        "f",
        vec![param(1, "a", ty.clone())],
        vec![ret_ty],
        vec![ret(Some(ident(1, "a", ty)))],
    )])
}

fn func(module: &Module, name: &str) -> OpId {
    module
        .ops_of_kind(OpKind::Func(FuncOp::Func))
        .into_iter()
        .find(|&op| module.sym_name(op) == Some(name))
        .unwrap_or_else(|| panic!("no function @{}", name))
}

fn body_kinds(module: &Module, name: &str) -> Vec<OpKind> {
    let body = module.entry_block(func(module, name)).unwrap();
    module.block(body).ops.iter().map(|&op| module.kind(op)).collect()
}

fn constants(module: &Module) -> Vec<(BigInt, Type)> {
    module
        .ops_of_kind(OpKind::Arith(ArithOp::Constant))
        .into_iter()
        .map(|op| {
            let (value, ty) = module.attr(op, attributes::VALUE).unwrap().as_integer().unwrap();
            (value.clone(), ty.clone())
        })
        .collect()
}

fn unsupported_message(result: Result<Module>) -> String {
    match result {
        Err(TransformError::Unsupported { message, .. }) => message,
        Err(other) => panic!("expected an unsupported construct, got {}", other),
        Ok(_) => panic!("expected an unsupported construct, lowering succeeded"),
    }
}

#[test]
fn test_increment_round_trip() {
    let module = lower(vec![function(
        "f",
        vec![param(1, "a", SemanticType::uint(8))],
        vec![SemanticType::uint(8)],
        vec![ret(Some(binary(
            BinaryOperator::Add,
            ident(1, "a", SemanticType::uint(8)),
            lit(1),
            SemanticType::uint(8),
        )))],
    )])
    .unwrap();

    assert_eq!(
        body_kinds(&module, "f"),
        vec![
            OpKind::MemRef(MemRefOp::Alloca),
            OpKind::MemRef(MemRefOp::Store),
            OpKind::MemRef(MemRefOp::Load),
            OpKind::Arith(ArithOp::Constant),
            OpKind::Arith(ArithOp::AddI),
            OpKind::Func(FuncOp::Return),
        ]
    );
    assert_eq!(constants(&module), vec![(BigInt::from(1), Type::Int(8))]);

    let f = func(&module, "f");
    let signature = module.function_type(f).unwrap();
    assert_eq!(signature.inputs, vec![Type::Int(8)]);
    assert_eq!(signature.results, vec![Type::Int(8)]);

    let contract = module.parent_op(f).unwrap();
    assert_eq!(module.kind(contract), OpKind::Sol(SolOp::Contract));
    assert_eq!(module.sym_name(contract), Some("C"));
}

#[test]
fn test_parameters_live_in_cells() {
    let module = lower(vec![function(
        "g",
        vec![
            param(1, "a", SemanticType::uint(8)),
            param(2, "b", SemanticType::uint(8)),
        ],
        vec![SemanticType::uint(8)],
        vec![ret(Some(binary(
            BinaryOperator::Mul,
            ident(2, "b", SemanticType::uint(8)),
            ident(1, "a", SemanticType::uint(8)),
            SemanticType::uint(8),
        )))],
    )])
    .unwrap();

    assert_eq!(module.ops_of_kind(OpKind::MemRef(MemRefOp::Alloca)).len(), 2);
    assert_eq!(module.ops_of_kind(OpKind::MemRef(MemRefOp::Load)).len(), 2);
    assert_eq!(module.ops_of_kind(OpKind::Arith(ArithOp::MulI)).len(), 1);
    let alloca = module.ops_of_kind(OpKind::MemRef(MemRefOp::Alloca))[0];
    let cell = module.result(alloca, 0).unwrap();
    assert_eq!(module.value_type(cell), &Type::memref(Type::Int(8)));
}

#[test]
fn test_unsigned_widening_zero_extends() {
    let module = pass_through(SemanticType::uint(8), SemanticType::uint(16)).unwrap();
    assert_eq!(
        body_kinds(&module, "f"),
        vec![
            OpKind::MemRef(MemRefOp::Alloca),
            OpKind::MemRef(MemRefOp::Store),
            OpKind::MemRef(MemRefOp::Load),
            OpKind::Arith(ArithOp::ExtUI),
            OpKind::Func(FuncOp::Return),
        ]
    );
}

#[test]
fn test_signed_widening_sign_extends() {
    let module = pass_through(SemanticType::int(8), SemanticType::int(32)).unwrap();
    let ext = module.ops_of_kind(OpKind::Arith(ArithOp::ExtSI));
    assert_eq!(ext.len(), 1);
    let widened = module.result(ext[0], 0).unwrap();
    assert_eq!(module.value_type(widened), &Type::Int(32));
}

#[test]
fn test_identity_cast_emits_nothing() {
    let module = pass_through(SemanticType::uint(256), SemanticType::uint(256)).unwrap();
    assert_eq!(
        body_kinds(&module, "f"),
        vec![
            OpKind::MemRef(MemRefOp::Alloca),
            OpKind::MemRef(MemRefOp::Store),
            OpKind::MemRef(MemRefOp::Load),
            OpKind::Func(FuncOp::Return),
        ]
    );
}

#[test]
fn test_narrowing_cast_is_unsupported() {
    let message = unsupported_message(pass_through(SemanticType::uint(16), SemanticType::uint(8)));
    assert_eq!(message, "narrowing cast from 'uint16' to 'uint8'");
}

#[test]
fn test_sign_change_at_same_width_is_unsupported() {
    let message = unsupported_message(pass_through(SemanticType::uint(8), SemanticType::int(8)));
    assert!(message.starts_with("narrowing cast"), "{}", message);
}

#[test]
fn test_literal_fitting_signed_type() {
    let module = lower(vec![function(
        "f",
        vec![param(1, "a", SemanticType::int(8))],
        vec![SemanticType::int(8)],
        vec![ret(Some(binary(
            BinaryOperator::Add,
            ident(1, "a", SemanticType::int(8)),
            lit(1),
            SemanticType::int(8),
        )))],
    )])
    .unwrap();
    assert_eq!(constants(&module), vec![(BigInt::from(1), Type::Int(8))]);
    assert!(module.ops_of_kind(OpKind::Arith(ArithOp::ExtSI)).is_empty());
}

#[test]
fn test_literal_value_is_exact() {
    let big = BigInt::from(1) << 200usize;
    let module = lower(vec![function(
        "f",
        vec![],
        vec![SemanticType::uint(256)],
        vec![ret(Some(lit(big.clone())))],
    )])
    .unwrap();
    assert_eq!(constants(&module), vec![(big, Type::Int(256))]);
}

#[test]
fn test_negative_literal_is_signed() {
    let module = lower(vec![function(
        "f",
        vec![],
        vec![SemanticType::int(16)],
        vec![ret(Some(lit(-129)))],
    )])
    .unwrap();
    assert_eq!(constants(&module), vec![(BigInt::from(-129), Type::Int(16))]);
}

#[test]
fn test_literal_out_of_range_is_unsupported() {
    let message = unsupported_message(lower(vec![function(
        "f",
        vec![],
        vec![SemanticType::uint(8)],
        vec![ret(Some(lit(300)))],
    )]));
    assert_eq!(message, "narrowing cast from 'int_const 300' to 'uint8'");
}

#[test]
fn test_fractional_literal_is_unsupported() {
    let half = Expression::Literal {
        value: "0.5".to_string(),
        ty: SemanticType::RationalNumber {
            numerator: BigInt::from(1),
            denominator: BigInt::from(2),
        },
        src: SourceRange::default(),
    };
    let message = unsupported_message(lower(vec![function(
        "f",
        vec![],
        vec![SemanticType::uint(8)],
        vec![ret(Some(half))],
    )]));
    assert_eq!(message, "fractional number type 'rational_const 1 / 2'");
}

#[test]
fn test_unsupported_operator() {
    let message = unsupported_message(lower(vec![function(
        "f",
        vec![param(1, "a", SemanticType::uint(8))],
        vec![SemanticType::uint(8)],
        vec![ret(Some(binary(
            BinaryOperator::Sub,
            ident(1, "a", SemanticType::uint(8)),
            lit(1),
            SemanticType::uint(8),
        )))],
    )]));
    assert_eq!(message, "binary operator '-'");
}

#[test]
fn test_unsupported_types() {
    let message = unsupported_message(pass_through(SemanticType::Bool, SemanticType::Bool));
    assert_eq!(message, "type 'bool'");

    let message = unsupported_message(pass_through(SemanticType::uint(12), SemanticType::uint(12)));
    assert_eq!(message, "integer width of 'uint12'");
}

#[test]
fn test_multiple_return_values_are_unsupported() {
    let message = unsupported_message(lower(vec![function(
        "f",
        vec![],
        vec![SemanticType::uint(8), SemanticType::uint(8)],
        vec![],
    )]));
    assert_eq!(message, "function 'f' returns 2 values");
}

#[test]
fn test_statement_after_return_is_unsupported() {
    let message = unsupported_message(lower(vec![function(
        "f",
        vec![],
        vec![SemanticType::uint(8)],
        vec![ret(Some(lit(1))), ret(Some(lit(2)))],
    )]));
    assert_eq!(message, "return after return in 'f'");
}

#[test]
fn test_missing_return_is_unsupported() {
    let message = unsupported_message(lower(vec![function(
        "f",
        vec![],
        vec![SemanticType::uint(8)],
        vec![],
    )]));
    assert_eq!(message, "'f' can reach its end without returning a value");
}

#[test]
fn test_return_value_from_void_function_is_unsupported() {
    let message =
        unsupported_message(lower(vec![function("f", vec![], vec![], vec![ret(Some(lit(1)))])]));
    assert!(message.starts_with("returning a value from 'f'"), "{}", message);
}

#[test]
fn test_control_flow_is_unsupported() {
    let message = unsupported_message(lower(vec![function(
        "f",
        vec![],
        vec![],
        vec![Statement::If {
            src: SourceRange::default(),
        }],
    )]));
    assert_eq!(message, "if statement in 'f'");
}

#[test]
fn test_unknown_identifier_is_unsupported() {
    let message = unsupported_message(lower(vec![function(
        "f",
        vec![],
        vec![SemanticType::uint(8)],
        vec![ret(Some(ident(7, "x", SemanticType::uint(8))))],
    )]));
    assert!(message.contains("'x'"), "{}", message);
}

#[test]
fn test_void_function() {
    let module = lower(vec![
        function("f", vec![], vec![], vec![]),
        function("g", vec![], vec![], vec![ret(None)]),
    ])
    .unwrap();
    assert_eq!(body_kinds(&module, "f"), vec![OpKind::Func(FuncOp::Return)]);
    assert_eq!(body_kinds(&module, "g"), vec![OpKind::Func(FuncOp::Return)]);
    let signature = module.function_type(func(&module, "f")).unwrap();
    assert!(signature.inputs.is_empty() && signature.results.is_empty());
}

#[test]
fn test_overloaded_functions_are_unsupported() {
    let message = unsupported_message(lower(vec![
        function("f", vec![], vec![], vec![]),
        function("f", vec![param(1, "a", SemanticType::uint(8))], vec![], vec![]),
    ]));
    assert_eq!(message, "overloaded function 'f' in contract 'C'");
}

#[test]
fn test_duplicate_contracts_fail_verification() {
    let contract = Contract {
        name: "C".to_string(),
        functions: vec![],
        src: SourceRange::default(),
    };
    let err = transform_contracts_to_ir(&[contract.clone(), contract], &source()).unwrap_err();
    assert!(matches!(err, TransformError::Verification(_)), "{}", err);
}

#[test]
fn test_locations_follow_source_ranges() {
    let mut f = function(
        "f",
        vec![param(1, "a", SemanticType::uint(8))],
        vec![SemanticType::uint(8)],
        vec![Statement::Return {
            expression: Some(ident(1, "a", SemanticType::uint(8))),
            src: at("return a"),
        }],
    );
    f.src = at("function f");
    let module = lower(vec![f]).unwrap();

    let func_op = func(&module, "f");
    assert_eq!(module.op(func_op).location, Location::file_line_col("C.sol", 2, 5));
    let ret_op = module.ops_of_kind(OpKind::Func(FuncOp::Return))[0];
    assert_eq!(module.op(ret_op).location, Location::file_line_col("C.sol", 3, 9));
}

#[test]
fn test_source_range_outside_buffer_is_rejected() {
    let mut f = function("f", vec![], vec![], vec![]);
    f.src = SourceRange {
        start: SOURCE.len() + 10,
        length: 1,
    };
    let err = lower(vec![f]).unwrap_err();
    assert!(matches!(err, TransformError::Source(_)), "{}", err);
}

#[test]
fn test_contracts_from_json() {
    let json = r#"[{
        "name": "C",
        "src": { "start": 0, "length": 60 },
        "functions": [{
            "name": "f",
            "parameters": [
                { "declaration": 3, "name": "a", "type": { "kind": "integer", "bits": 8, "signed": false } }
            ],
            "returnParameters": [
                { "declaration": 4, "type": { "kind": "integer", "bits": 8, "signed": false } }
            ],
            "body": [{
                "nodeType": "Return",
                "expression": {
                    "nodeType": "BinaryOperation",
                    "operator": "+",
                    "leftExpression": {
                        "nodeType": "Identifier",
                        "name": "a",
                        "referencedDeclaration": 3,
                        "type": { "kind": "integer", "bits": 8, "signed": false }
                    },
                    "rightExpression": {
                        "nodeType": "Literal",
                        "value": "1",
                        "type": { "kind": "rationalNumber", "numerator": "1" }
                    },
                    "type": { "kind": "integer", "bits": 8, "signed": false }
                }
            }]
        }]
    }]"#;

    let contracts = contracts_from_json(json).unwrap();
    assert_eq!(contracts.len(), 1);
    assert_eq!(contracts[0].functions[0].return_parameters.len(), 1);
    match &contracts[0].functions[0].body[0] {
        Statement::Return {
            expression: Some(Expression::BinaryOperation { operator, .. }),
            ..
        } => assert_eq!(*operator, BinaryOperator::Add),
        other => panic!("unexpected statement {:?}", other),
    }

    let module = transform_contracts_to_ir(&contracts, &source()).unwrap();
    assert_eq!(constants(&module), vec![(BigInt::from(1), Type::Int(8))]);
    assert_eq!(
        module
            .attr(func(&module, "f"), attributes::SYM_NAME)
            .and_then(Attribute::as_str),
        Some("f")
    );
}

#[test]
fn test_integer_interpretation_of_literals() {
    let cases = [
        (0, 8, false),
        (255, 8, false),
        (256, 16, false),
        (-1, 8, true),
        (-128, 8, true),
        (-129, 16, true),
    ];
    for (value, bits, signed) in cases {
        let ty = SemanticType::rational(value).integer_interpretation().unwrap();
        assert_eq!((ty.bits, ty.signed), (bits, signed), "literal {}", value);
    }
    let too_big = SemanticType::rational(BigInt::from(1) << 256usize);
    assert!(too_big.integer_interpretation().is_none());
}
