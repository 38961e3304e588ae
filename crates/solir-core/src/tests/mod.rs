/*! Unit tests for the IR core: builders, verifier, rewriter, conversion driver and pass manager. */

mod builder_tests;
mod rewrite_tests;

use crate::builder::{InstBuilder, OpBuilder};
use crate::{FunctionType, Module, OpId, SolOp, Type, ValueDef, ValueId};

/// `sol.contract @C { func.func @inc(i8) -> i8 }` returning its argument plus one.
pub(crate) fn build_increment(module: &mut Module) -> (OpId, OpId) {
    let mut b = OpBuilder::new(module);
    let (contract, body) = b.container(SolOp::Contract, "C").unwrap();
    b.set_insertion_point_to_end(body);
    let (func, entry) = b
        .func(
            "inc",
            FunctionType {
                inputs: vec![Type::Int(8)],
                results: vec![Type::Int(8)],
            },
        )
        .unwrap();
    b.set_insertion_point_to_end(entry);
    let arg = b.block_args(entry)[0];
    let cell = b.alloca_cell(Type::Int(8)).unwrap();
    b.store_cell(arg, cell).unwrap();
    let loaded = b.load_cell(cell).unwrap();
    let one = b.int_const(1, Type::Int(8)).unwrap();
    let sum = b.addi(loaded, one).unwrap();
    b.func_return(vec![sum]).unwrap();
    (contract, func)
}

pub(crate) fn def_op(module: &Module, value: ValueId) -> OpId {
    match module.value(value).def {
        ValueDef::OpResult { op, .. } => op,
        ValueDef::BlockArg { .. } => panic!("{} is a block argument", value),
    }
}
