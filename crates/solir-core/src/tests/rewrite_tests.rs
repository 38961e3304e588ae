use super::{build_increment, def_op};
use crate::builder::{InstBuilder, OpBuilder};
use crate::ops::{ArithOp, OpKind, SolOp};
use crate::{verify, IrError, Module, Type};

#[test]
fn test_erase_rejects_used_results() {
    let mut module = Module::default();
    let (_, func) = build_increment(&mut module);
    let entry = module.entry_block(func).unwrap();
    let constant = module.block(entry).ops[3];

    let err = module.erase_op(constant).unwrap_err();
    assert!(matches!(err, IrError::InvalidInstruction(_)));
    assert!(module.is_attached(constant));
}

#[test]
fn test_replace_op_rewires_users() {
    let mut module = Module::default();
    let (_, func) = build_increment(&mut module);
    let entry = module.entry_block(func).unwrap();
    let ops = module.block(entry).ops.clone();
    let (load, constant, add) = (ops[2], ops[3], ops[4]);
    let loaded = module.op(load).results[0];

    // x + 1 becomes x + x.
    module.replace_op(constant, &[loaded]).unwrap();

    assert!(!module.is_attached(constant));
    assert_eq!(module.op(add).operands, vec![loaded, loaded]);
    verify(&module).unwrap();
}

#[test]
fn test_replace_op_arity_mismatch() {
    let mut module = Module::default();
    let (_, func) = build_increment(&mut module);
    let entry = module.entry_block(func).unwrap();
    let constant = module.block(entry).ops[3];

    assert!(module.replace_op(constant, &[]).is_err());
}

#[test]
fn test_erase_nested_ops_together() {
    let mut module = Module::default();
    let (contract, func) = build_increment(&mut module);

    module.erase_op(contract).unwrap();

    assert!(module.top_level_ops().is_empty());
    assert!(!module.is_attached(func));
    assert!(module.walk().is_empty());
}

#[test]
fn test_move_ops_where_preserves_order() {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    let (_, source) = b.container(SolOp::Object, "Source").unwrap();
    let (_, dest) = b.container(SolOp::Object, "Dest").unwrap();
    b.set_insertion_point_to_end(source);
    let first = b.int_const(1, Type::i256()).unwrap();
    let second = b.int_const(2, Type::i256()).unwrap();
    b.sol_return(first, second).unwrap();

    let moved = module.move_ops_where(source, dest, |m, op| {
        m.kind(op) == OpKind::Arith(ArithOp::Constant)
    });

    assert_eq!(moved, vec![def_op(&module, first), def_op(&module, second)]);
    assert_eq!(module.block(dest).ops, moved);
    assert_eq!(module.block(source).ops.len(), 1);
    // The return now reads values from another container.
    assert!(verify(&module).is_err());
}

#[test]
fn test_take_region_blocks() {
    let mut module = Module::default();
    let mut b = OpBuilder::new(&mut module);
    let (old, old_body) = b.container(SolOp::Object, "Old").unwrap();
    let (new, new_body) = b.container(SolOp::Object, "New").unwrap();
    b.set_insertion_point_to_end(old_body);
    let zero = b.int_const(0, Type::i256()).unwrap();
    b.sol_return(zero, zero).unwrap();

    let from = module.op(old).regions[0];
    let to = module.op(new).regions[0];
    module.take_region_blocks(from, to);

    assert_eq!(module.region(to).blocks, vec![new_body, old_body]);
    assert_eq!(module.block_region(old_body), Some(to));
    assert!(module.region(from).blocks.is_empty());
}
