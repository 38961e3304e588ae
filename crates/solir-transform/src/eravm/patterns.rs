use super::constants::{
    AddrSpace, RetForwardPageType, BYTE_LEN_FIELD, HEAP_AUX_OFFSET_CTOR_RET_DATA, RETURN_FUNC,
};
use super::{CodeContext, LegalizeContext};
use crate::errors::{Result, TransformError};
use solir_core::{
    attributes, builder::OpBuilder, ArithOp, Attribute, ConversionPattern, FuncOp, InstBuilder,
    LlvmOp, MemRefOp, Module, OpId, OpKind, SolOp, Type, ValueId,
};
use tracing::warn;

pub type Pattern = dyn ConversionPattern<LegalizeContext, TransformError>;

/// Every pattern needed to bring the high-level dialects down to `llvm`.
pub fn lowering_patterns() -> Vec<Box<Pattern>> {
    let renames = [
        ("func-return", OpKind::Func(FuncOp::Return), LlvmOp::Return),
        ("func-call", OpKind::Func(FuncOp::Call), LlvmOp::Call),
        ("arith-constant", OpKind::Arith(ArithOp::Constant), LlvmOp::Constant),
        ("arith-addi", OpKind::Arith(ArithOp::AddI), LlvmOp::Add),
        ("arith-muli", OpKind::Arith(ArithOp::MulI), LlvmOp::Mul),
        ("arith-andi", OpKind::Arith(ArithOp::AndI), LlvmOp::And),
        ("arith-cmpi", OpKind::Arith(ArithOp::CmpI), LlvmOp::ICmp),
        ("arith-extsi", OpKind::Arith(ArithOp::ExtSI), LlvmOp::SExt),
        ("arith-extui", OpKind::Arith(ArithOp::ExtUI), LlvmOp::ZExt),
        ("memref-load", OpKind::MemRef(MemRefOp::Load), LlvmOp::Load),
        ("memref-store", OpKind::MemRef(MemRefOp::Store), LlvmOp::Store),
    ];

    let mut patterns: Vec<Box<Pattern>> = vec![
        Box::new(ReturnOpLowering),
        Box::new(FuncOpLowering),
        Box::new(AllocaOpLowering),
    ];
    patterns.extend(
        renames
            .into_iter()
            .map(|(name, from, to)| Box::new(OneToOneLowering { name, from, to }) as Box<Pattern>),
    );
    patterns
}

/// Ops whose `llvm` counterpart takes the same operands, results and
/// attributes only change their kind.
pub struct OneToOneLowering {
    pub name: &'static str,
    pub from: OpKind,
    pub to: LlvmOp,
}

impl ConversionPattern<LegalizeContext, TransformError> for OneToOneLowering {
    fn name(&self) -> &'static str {
        self.name
    }

    fn root(&self) -> OpKind {
        self.from
    }

    fn match_and_rewrite(&self, module: &mut Module, op: OpId, _: &LegalizeContext) -> Result<bool> {
        module.op_mut(op).kind = OpKind::Llvm(self.to);
        Ok(true)
    }
}

pub struct FuncOpLowering;

impl ConversionPattern<LegalizeContext, TransformError> for FuncOpLowering {
    fn name(&self) -> &'static str {
        "func-func"
    }

    fn root(&self) -> OpKind {
        OpKind::Func(FuncOp::Func)
    }

    fn match_and_rewrite(&self, module: &mut Module, op: OpId, _: &LegalizeContext) -> Result<bool> {
        module.op_mut(op).kind = OpKind::Llvm(LlvmOp::Func);
        if module.attr(op, attributes::LINKAGE).is_none() {
            module.set_attr(op, attributes::LINKAGE, Attribute::String("external".to_string()));
        }
        Ok(true)
    }
}

/// A memory cell becomes a stack slot holding its element type.
pub struct AllocaOpLowering;

impl ConversionPattern<LegalizeContext, TransformError> for AllocaOpLowering {
    fn name(&self) -> &'static str {
        "memref-alloca"
    }

    fn root(&self) -> OpKind {
        OpKind::MemRef(MemRefOp::Alloca)
    }

    fn match_and_rewrite(&self, module: &mut Module, op: OpId, _: &LegalizeContext) -> Result<bool> {
        let Some(result) = module.result(op, 0) else {
            return Ok(false);
        };
        let Some(elem) = module.value_type(result).memref_element().cloned() else {
            return Ok(false);
        };
        module.set_value_type(result, AddrSpace::Stack.ptr());
        module.set_attr(op, attributes::ELEM_TYPE, Attribute::Type(elem));
        module.op_mut(op).kind = OpKind::Llvm(LlvmOp::Alloca);
        Ok(true)
    }
}

/// Lowers `sol.return` to a `__return` call followed by `llvm.unreachable`.
pub struct ReturnOpLowering;

impl ConversionPattern<LegalizeContext, TransformError> for ReturnOpLowering {
    fn name(&self) -> &'static str {
        "sol-return"
    }

    fn root(&self) -> OpKind {
        OpKind::Sol(SolOp::Return)
    }

    fn match_and_rewrite(&self, module: &mut Module, op: OpId, ctx: &LegalizeContext) -> Result<bool> {
        let location = module.op(op).location.clone();
        let context = ctx.context_of(module, op).ok_or_else(|| {
            TransformError::InternalInvariant(format!(
                "sol.return at {} is neither in deploy nor in runtime code",
                location
            ))
        })?;
        let (offset, length) = match module.op(op).operands[..] {
            [offset, length] => (offset, length),
            _ => {
                return Err(TransformError::InternalInvariant(format!(
                    "sol.return at {} does not have two operands",
                    location
                )))
            }
        };

        let mut b = OpBuilder::new(module);
        b.set_insertion_point_before(op)?;
        b.set_location(location);
        match context {
            CodeContext::Runtime => {
                let mode = b.int_const(RetForwardPageType::UseHeap as i64, Type::i256())?;
                b.func_call(RETURN_FUNC, vec![offset, length, mode], vec![])?;
            }
            CodeContext::Deploy => deploy_return(&mut b)?,
        }
        b.llvm_unreachable()?;

        module.erase_op(op)?;
        Ok(true)
    }
}

/// Size in bytes of the immutables section returned by a constructor.
pub fn immutables_size() -> i64 {
    // TODO: derive from the immutable state variables once they are lowered.
    warn!("immutables are not supported yet, returning an empty immutables section");
    0
}

/// Writes the constructor return header to the auxiliary heap and returns it.
fn deploy_return(b: &mut OpBuilder<'_>) -> Result<()> {
    let word = Type::i256();
    let aux_ptr = AddrSpace::HeapAuxiliary.ptr();

    let marker_offset = b.int_const(HEAP_AUX_OFFSET_CTOR_RET_DATA, word.clone())?;
    let marker_ptr = b.llvm_inttoptr(marker_offset, aux_ptr.clone())?;
    let field = b.int_const(BYTE_LEN_FIELD, word.clone())?;
    b.llvm_store(field, marker_ptr)?;

    let size = immutables_size();
    let count_offset = b.int_const(HEAP_AUX_OFFSET_CTOR_RET_DATA + BYTE_LEN_FIELD, word.clone())?;
    let count_ptr = b.llvm_inttoptr(count_offset, aux_ptr)?;
    let count = b.int_const(size / BYTE_LEN_FIELD, word.clone())?;
    b.llvm_store(count, count_ptr)?;

    let length = return_data_length(b, size)?;
    let offset = b.int_const(HEAP_AUX_OFFSET_CTOR_RET_DATA, word.clone())?;
    let mode = b.int_const(RetForwardPageType::UseAuxHeap as i64, word)?;
    b.func_call(RETURN_FUNC, vec![offset, length, mode], vec![])?;
    Ok(())
}

/// `size * 2 + 2 * BYTE_LEN_FIELD`, emitted as IR.
fn return_data_length(b: &mut OpBuilder<'_>, size: i64) -> Result<ValueId> {
    let word = Type::i256();
    let size = b.int_const(size, word.clone())?;
    let two = b.int_const(2, word.clone())?;
    let doubled = b.muli(size, two)?;
    let header = b.int_const(BYTE_LEN_FIELD * 2, word)?;
    Ok(b.addi(doubled, header)?)
}
