use super::build_increment;
use crate::builder::{InstBuilder, InstBuilderBase, OpBuilder};
use crate::ops::{ArithOp, FuncOp, LlvmOp, MemRefOp, OpKind, SolOp};
use crate::{verify, FunctionType, IrError, Location, Module, Type};
use num_bigint::BigInt;
use pretty_assertions::assert_eq;

#[test]
fn test_contract_with_function() {
    let mut module = Module::default();
    let (contract, func) = build_increment(&mut module);

    assert_eq!(module.top_level_ops(), &[contract]);
    assert_eq!(module.parent_op(func), Some(contract));
    assert_eq!(module.sym_name(contract), Some("C"));
    assert_eq!(module.sym_name(func), Some("inc"));

    let entry = module.entry_block(func).unwrap();
    let kinds: Vec<OpKind> = module
        .block(entry)
        .ops
        .iter()
        .map(|&op| module.kind(op))
        .collect();
    assert_eq!(
        kinds,
        vec![
            OpKind::MemRef(MemRefOp::Alloca),
            OpKind::MemRef(MemRefOp::Store),
            OpKind::MemRef(MemRefOp::Load),
            OpKind::Arith(ArithOp::Constant),
            OpKind::Arith(ArithOp::AddI),
            OpKind::Func(FuncOp::Return),
        ]
    );

    verify(&module).unwrap();
}

#[test]
fn test_op_names() {
    assert_eq!(OpKind::Sol(SolOp::Contract).to_string(), "sol.contract");
    assert_eq!(OpKind::Arith(ArithOp::ExtSI).to_string(), "arith.extsi");
    assert_eq!(OpKind::Llvm(LlvmOp::Global).to_string(), "llvm.mlir.global");
    assert_eq!(OpKind::Llvm(LlvmOp::GetElementPtr).to_string(), "llvm.getelementptr");
}

#[test]
fn test_type_display() {
    assert_eq!(Type::Int(8).to_string(), "i8");
    assert_eq!(Type::Ptr(3).to_string(), "!llvm.ptr<3>");
    assert_eq!(Type::memref(Type::i256()).to_string(), "memref<i256>");
    assert_eq!(
        Type::array(Type::i256(), 10).to_string(),
        "!llvm.array<10 x i256>"
    );
    assert_eq!(
        Type::function(vec![Type::Int(8), Type::Int(16)], vec![Type::Int(8)]).to_string(),
        "(i8, i16) -> i8"
    );
    assert_eq!(Type::function(vec![], vec![]).to_string(), "() -> ()");
}

#[test]
fn test_addi_rejects_mismatched_widths() {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    let (_, entry) = b.func("f", FunctionType { inputs: vec![], results: vec![] }).unwrap();
    b.set_insertion_point_to_end(entry);
    let a = b.int_const(1, Type::Int(8)).unwrap();
    let c = b.int_const(2, Type::Int(16)).unwrap();

    let err = b.addi(a, c).unwrap_err();
    assert!(matches!(err, IrError::TypeError(_)));
    assert_eq!(b.module().block(entry).ops.len(), 2);
}

#[test]
fn test_extension_must_widen() {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    let (_, entry) = b.func("f", FunctionType { inputs: vec![], results: vec![] }).unwrap();
    b.set_insertion_point_to_end(entry);
    let a = b.int_const(1, Type::Int(16)).unwrap();

    assert!(b.extsi(a, Type::Int(8)).is_err());
    assert!(b.extui(a, Type::Int(16)).is_err());
    let wide = b.extui(a, Type::Int(32)).unwrap();
    assert_eq!(b.value_type(wide), Type::Int(32));
}

#[test]
fn test_store_type_mismatch() {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    let (_, entry) = b.func("f", FunctionType { inputs: vec![], results: vec![] }).unwrap();
    b.set_insertion_point_to_end(entry);
    let cell = b.alloca_cell(Type::Int(8)).unwrap();
    let wide = b.int_const(7, Type::Int(32)).unwrap();

    assert!(matches!(b.store_cell(wide, cell), Err(IrError::TypeError(_))));
    assert!(matches!(b.load_cell(wide), Err(IrError::TypeError(_))));
}

#[test]
fn test_insertion_point_before_keeps_order() {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    let (_, entry) = b.func("f", FunctionType { inputs: vec![], results: vec![] }).unwrap();
    b.set_insertion_point_to_end(entry);
    let ret = b.func_return(vec![]).unwrap();

    b.set_insertion_point_before(ret).unwrap();
    b.int_const(1, Type::Int(8)).unwrap();
    b.int_const(2, Type::Int(8)).unwrap();

    let ops = module.block(entry).ops.clone();
    assert_eq!(ops.len(), 3);
    assert_eq!(ops[2], ret);
    let values: Vec<String> = ops[..2]
        .iter()
        .map(|&op| module.attr(op, "value").unwrap().to_string())
        .collect();
    assert_eq!(values, vec!["1 : i8", "2 : i8"]);
}

#[test]
fn test_builder_stamps_location() {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    b.set_location(Location::file_line_col("a.sol", 3, 5));
    let (func, _) = b.func("f", FunctionType { inputs: vec![], results: vec![] }).unwrap();

    assert_eq!(
        module.op(func).location,
        Location::file_line_col("a.sol", 3, 5)
    );
}

#[test]
fn test_cond_br_requires_i1() {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    let (func, entry) = b
        .llvm_func("f", FunctionType { inputs: vec![], results: vec![] }, "external", true)
        .unwrap();
    let entry = entry.unwrap();
    let then_block = b.append_block(func, 0, vec![]).unwrap();
    let else_block = b.append_block(func, 0, vec![]).unwrap();
    b.set_insertion_point_to_end(entry);
    let wide = b.llvm_constant(BigInt::from(1), Type::Int(8)).unwrap();

    assert!(b.llvm_cond_br(wide, then_block, else_block).is_err());
}

#[test]
fn test_symbol_lookup_walks_outward() {
    let mut module = Module::default();
    let (contract, func) = build_increment(&mut module);

    let mut b = OpBuilder::new(&mut module);
    let (helper, _) = b
        .llvm_func("helper", FunctionType { inputs: vec![], results: vec![] }, "external", false)
        .unwrap();

    let entry = module.entry_block(func).unwrap();
    let first = module.block(entry).ops[0];
    assert_eq!(module.lookup_symbol(first, "inc"), Some(func));
    assert_eq!(module.lookup_symbol(first, "helper"), Some(helper));
    assert_eq!(module.lookup_symbol(first, "C"), Some(contract));
    assert_eq!(module.lookup_symbol(first, "missing"), None);
}
