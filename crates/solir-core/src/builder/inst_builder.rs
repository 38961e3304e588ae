use crate::{
    attributes::{self, Attribute, CmpPredicate},
    entities::{BlockId, OpId, ValueId},
    module::Module,
    ops::{ArithOp, FuncOp, LlvmOp, MemRefOp, OpKind, SolOp},
    types::{FunctionType, Type},
    IrError, Result,
};
use indexmap::IndexMap;
use num_bigint::BigInt;

pub trait InstBuilderBase {
    fn module(&self) -> &Module;

    fn module_mut(&mut self) -> &mut Module;

    fn build_op(
        &mut self,
        kind: OpKind,
        operands: Vec<ValueId>,
        result_types: Vec<Type>,
        attrs: IndexMap<String, Attribute>,
        num_regions: usize,
    ) -> Result<OpId>;
}

fn attrs<const N: usize>(entries: [(&str, Attribute); N]) -> IndexMap<String, Attribute> {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub trait InstBuilder: InstBuilderBase {
    fn value_type(&self, value: ValueId) -> Type {
        self.module().value_type(value).clone()
    }

    fn build_value(
        &mut self,
        kind: OpKind,
        operands: Vec<ValueId>,
        ty: Type,
        attrs: IndexMap<String, Attribute>,
    ) -> Result<ValueId> {
        let op = self.build_op(kind, operands, vec![ty], attrs, 0)?;
        Ok(self.module().op(op).results[0])
    }

    fn same_int_operands(&self, kind: OpKind, lhs: ValueId, rhs: ValueId) -> Result<Type> {
        let lhs_ty = self.value_type(lhs);
        let rhs_ty = self.value_type(rhs);
        if !lhs_ty.is_int() || lhs_ty != rhs_ty {
            return Err(IrError::TypeError(format!(
                "{} expects two integers of the same width, got {} and {}",
                kind, lhs_ty, rhs_ty
            )));
        }
        Ok(lhs_ty)
    }

    fn widening_target(&self, kind: OpKind, value: ValueId, to: &Type) -> Result<()> {
        let from = self.value_type(value);
        match (from.int_width(), to.int_width()) {
            (Some(src), Some(dst)) if dst > src => Ok(()),
            _ => Err(IrError::TypeError(format!(
                "{} must widen an integer, got {} to {}",
                kind, from, to
            ))),
        }
    }

    // sol

    /// Creates a `sol.contract` or `sol.object` with an empty body block.
    fn container(&mut self, op: SolOp, name: &str) -> Result<(OpId, BlockId)> {
        let kind = OpKind::Sol(op);
        if !kind.is_container() {
            return Err(IrError::InvalidInstruction(format!("{} is not a container", kind)));
        }
        let container = self.build_op(
            kind,
            vec![],
            vec![],
            attrs([(attributes::SYM_NAME, Attribute::String(name.to_string()))]),
            1,
        )?;
        let region = self.module().op(container).regions[0];
        let body = self.module_mut().append_block(region, vec![]);
        Ok((container, body))
    }

    fn sol_return(&mut self, offset: ValueId, length: ValueId) -> Result<OpId> {
        let kind = OpKind::Sol(SolOp::Return);
        self.same_int_operands(kind, offset, length)?;
        self.build_op(kind, vec![offset, length], vec![], IndexMap::new(), 0)
    }

    // func

    /// Creates a `func.func` whose entry block arguments match the inputs.
    fn func(&mut self, name: &str, signature: FunctionType) -> Result<(OpId, BlockId)> {
        let inputs = signature.inputs.clone();
        let func = self.build_op(
            OpKind::Func(FuncOp::Func),
            vec![],
            vec![],
            attrs([
                (attributes::SYM_NAME, Attribute::String(name.to_string())),
                (
                    attributes::FUNCTION_TYPE,
                    Attribute::Type(Type::Function(Box::new(signature))),
                ),
            ]),
            1,
        )?;
        let region = self.module().op(func).regions[0];
        let entry = self.module_mut().append_block(region, inputs);
        Ok((func, entry))
    }

    fn func_return(&mut self, values: Vec<ValueId>) -> Result<OpId> {
        self.build_op(OpKind::Func(FuncOp::Return), values, vec![], IndexMap::new(), 0)
    }

    fn func_call(
        &mut self,
        callee: &str,
        args: Vec<ValueId>,
        result_types: Vec<Type>,
    ) -> Result<OpId> {
        self.build_op(
            OpKind::Func(FuncOp::Call),
            args,
            result_types,
            attrs([(attributes::CALLEE, Attribute::Symbol(callee.to_string()))]),
            0,
        )
    }

    // arith

    fn constant(&mut self, value: BigInt, ty: Type) -> Result<ValueId> {
        if !ty.is_int() {
            return Err(IrError::TypeError(format!("constant of non-integer type {}", ty)));
        }
        self.build_value(
            OpKind::Arith(ArithOp::Constant),
            vec![],
            ty.clone(),
            attrs([(attributes::VALUE, Attribute::Integer { value, ty })]),
        )
    }

    fn int_const(&mut self, value: i64, ty: Type) -> Result<ValueId> {
        self.constant(BigInt::from(value), ty)
    }

    fn addi(&mut self, lhs: ValueId, rhs: ValueId) -> Result<ValueId> {
        self.arith_binary(ArithOp::AddI, lhs, rhs)
    }

    fn muli(&mut self, lhs: ValueId, rhs: ValueId) -> Result<ValueId> {
        self.arith_binary(ArithOp::MulI, lhs, rhs)
    }

    fn andi(&mut self, lhs: ValueId, rhs: ValueId) -> Result<ValueId> {
        self.arith_binary(ArithOp::AndI, lhs, rhs)
    }

    fn arith_binary(&mut self, op: ArithOp, lhs: ValueId, rhs: ValueId) -> Result<ValueId> {
        let kind = OpKind::Arith(op);
        let ty = self.same_int_operands(kind, lhs, rhs)?;
        self.build_value(kind, vec![lhs, rhs], ty, IndexMap::new())
    }

    fn cmpi(&mut self, predicate: CmpPredicate, lhs: ValueId, rhs: ValueId) -> Result<ValueId> {
        let kind = OpKind::Arith(ArithOp::CmpI);
        self.same_int_operands(kind, lhs, rhs)?;
        self.build_value(
            kind,
            vec![lhs, rhs],
            Type::i1(),
            attrs([(attributes::PREDICATE, predicate.into())]),
        )
    }

    fn extsi(&mut self, value: ValueId, to: Type) -> Result<ValueId> {
        let kind = OpKind::Arith(ArithOp::ExtSI);
        self.widening_target(kind, value, &to)?;
        self.build_value(kind, vec![value], to, IndexMap::new())
    }

    fn extui(&mut self, value: ValueId, to: Type) -> Result<ValueId> {
        let kind = OpKind::Arith(ArithOp::ExtUI);
        self.widening_target(kind, value, &to)?;
        self.build_value(kind, vec![value], to, IndexMap::new())
    }

    // memref

    fn alloca_cell(&mut self, elem: Type) -> Result<ValueId> {
        self.build_value(
            OpKind::MemRef(MemRefOp::Alloca),
            vec![],
            Type::memref(elem),
            IndexMap::new(),
        )
    }

    fn load_cell(&mut self, cell: ValueId) -> Result<ValueId> {
        let cell_ty = self.value_type(cell);
        let elem = cell_ty.memref_element().cloned().ok_or_else(|| {
            IrError::TypeError(format!("memref.load from non-memref {}", cell_ty))
        })?;
        self.build_value(OpKind::MemRef(MemRefOp::Load), vec![cell], elem, IndexMap::new())
    }

    fn store_cell(&mut self, value: ValueId, cell: ValueId) -> Result<OpId> {
        let cell_ty = self.value_type(cell);
        let value_ty = self.value_type(value);
        if cell_ty.memref_element() != Some(&value_ty) {
            return Err(IrError::TypeError(format!(
                "memref.store of {} into {}",
                value_ty, cell_ty
            )));
        }
        self.build_op(
            OpKind::MemRef(MemRefOp::Store),
            vec![value, cell],
            vec![],
            IndexMap::new(),
            0,
        )
    }

    // llvm

    /// Creates an `llvm.func`. Declarations get no body block.
    fn llvm_func(
        &mut self,
        name: &str,
        signature: FunctionType,
        linkage: &str,
        with_body: bool,
    ) -> Result<(OpId, Option<BlockId>)> {
        let inputs = signature.inputs.clone();
        let func = self.build_op(
            OpKind::Llvm(LlvmOp::Func),
            vec![],
            vec![],
            attrs([
                (attributes::SYM_NAME, Attribute::String(name.to_string())),
                (
                    attributes::FUNCTION_TYPE,
                    Attribute::Type(Type::Function(Box::new(signature))),
                ),
                (attributes::LINKAGE, Attribute::String(linkage.to_string())),
            ]),
            1,
        )?;
        if !with_body {
            return Ok((func, None));
        }
        let region = self.module().op(func).regions[0];
        let entry = self.module_mut().append_block(region, inputs);
        Ok((func, Some(entry)))
    }

    fn llvm_global(
        &mut self,
        name: &str,
        ty: Type,
        linkage: &str,
        init: Option<Attribute>,
    ) -> Result<OpId> {
        let mut map = attrs([
            (attributes::SYM_NAME, Attribute::String(name.to_string())),
            (attributes::GLOBAL_TYPE, Attribute::Type(ty)),
            (attributes::LINKAGE, Attribute::String(linkage.to_string())),
        ]);
        if let Some(init) = init {
            map.insert(attributes::VALUE.to_string(), init);
        }
        self.build_op(OpKind::Llvm(LlvmOp::Global), vec![], vec![], map, 0)
    }

    fn llvm_address_of(&mut self, global: &str, ptr_ty: Type) -> Result<ValueId> {
        self.build_value(
            OpKind::Llvm(LlvmOp::AddressOf),
            vec![],
            ptr_ty,
            attrs([(attributes::GLOBAL_NAME, Attribute::Symbol(global.to_string()))]),
        )
    }

    fn llvm_constant(&mut self, value: BigInt, ty: Type) -> Result<ValueId> {
        if !ty.is_int() {
            return Err(IrError::TypeError(format!("constant of non-integer type {}", ty)));
        }
        self.build_value(
            OpKind::Llvm(LlvmOp::Constant),
            vec![],
            ty.clone(),
            attrs([(attributes::VALUE, Attribute::Integer { value, ty })]),
        )
    }

    fn llvm_binary(&mut self, op: LlvmOp, lhs: ValueId, rhs: ValueId) -> Result<ValueId> {
        let kind = OpKind::Llvm(op);
        if !matches!(op, LlvmOp::Add | LlvmOp::Mul | LlvmOp::And | LlvmOp::LShr) {
            return Err(IrError::InvalidInstruction(format!("{} is not a binary op", kind)));
        }
        let ty = self.same_int_operands(kind, lhs, rhs)?;
        self.build_value(kind, vec![lhs, rhs], ty, IndexMap::new())
    }

    fn llvm_icmp(&mut self, predicate: CmpPredicate, lhs: ValueId, rhs: ValueId) -> Result<ValueId> {
        let kind = OpKind::Llvm(LlvmOp::ICmp);
        self.same_int_operands(kind, lhs, rhs)?;
        self.build_value(
            kind,
            vec![lhs, rhs],
            Type::i1(),
            attrs([(attributes::PREDICATE, predicate.into())]),
        )
    }

    fn llvm_ext(&mut self, op: LlvmOp, value: ValueId, to: Type) -> Result<ValueId> {
        let kind = OpKind::Llvm(op);
        if !matches!(op, LlvmOp::SExt | LlvmOp::ZExt) {
            return Err(IrError::InvalidInstruction(format!("{} is not an extension", kind)));
        }
        self.widening_target(kind, value, &to)?;
        self.build_value(kind, vec![value], to, IndexMap::new())
    }

    fn llvm_alloca(&mut self, elem: Type) -> Result<ValueId> {
        self.build_value(
            OpKind::Llvm(LlvmOp::Alloca),
            vec![],
            Type::Ptr(0),
            attrs([(attributes::ELEM_TYPE, Attribute::Type(elem))]),
        )
    }

    fn llvm_load(&mut self, ptr: ValueId, ty: Type) -> Result<ValueId> {
        let ptr_ty = self.value_type(ptr);
        if !ptr_ty.is_ptr() {
            return Err(IrError::TypeError(format!("llvm.load from non-pointer {}", ptr_ty)));
        }
        self.build_value(OpKind::Llvm(LlvmOp::Load), vec![ptr], ty, IndexMap::new())
    }

    fn llvm_store(&mut self, value: ValueId, ptr: ValueId) -> Result<OpId> {
        let ptr_ty = self.value_type(ptr);
        if !ptr_ty.is_ptr() {
            return Err(IrError::TypeError(format!("llvm.store to non-pointer {}", ptr_ty)));
        }
        self.build_op(
            OpKind::Llvm(LlvmOp::Store),
            vec![value, ptr],
            vec![],
            IndexMap::new(),
            0,
        )
    }

    fn llvm_ptrtoint(&mut self, ptr: ValueId, to: Type) -> Result<ValueId> {
        let ptr_ty = self.value_type(ptr);
        if !ptr_ty.is_ptr() || !to.is_int() {
            return Err(IrError::TypeError(format!(
                "llvm.ptrtoint from {} to {}",
                ptr_ty, to
            )));
        }
        self.build_value(OpKind::Llvm(LlvmOp::PtrToInt), vec![ptr], to, IndexMap::new())
    }

    fn llvm_inttoptr(&mut self, value: ValueId, to: Type) -> Result<ValueId> {
        let value_ty = self.value_type(value);
        if !value_ty.is_int() || !to.is_ptr() {
            return Err(IrError::TypeError(format!(
                "llvm.inttoptr from {} to {}",
                value_ty, to
            )));
        }
        self.build_value(OpKind::Llvm(LlvmOp::IntToPtr), vec![value], to, IndexMap::new())
    }

    /// Address arithmetic on `base`; the result stays in its address space.
    fn llvm_gep(&mut self, base: ValueId, indices: Vec<ValueId>, elem: Type) -> Result<ValueId> {
        let base_ty = self.value_type(base);
        if !base_ty.is_ptr() {
            return Err(IrError::TypeError(format!(
                "llvm.getelementptr on non-pointer {}",
                base_ty
            )));
        }
        let mut operands = vec![base];
        operands.extend(indices);
        self.build_value(
            OpKind::Llvm(LlvmOp::GetElementPtr),
            operands,
            base_ty,
            attrs([(attributes::ELEM_TYPE, Attribute::Type(elem))]),
        )
    }

    fn llvm_call(
        &mut self,
        callee: &str,
        args: Vec<ValueId>,
        result_types: Vec<Type>,
    ) -> Result<OpId> {
        self.build_op(
            OpKind::Llvm(LlvmOp::Call),
            args,
            result_types,
            attrs([(attributes::CALLEE, Attribute::Symbol(callee.to_string()))]),
            0,
        )
    }

    fn llvm_return(&mut self, values: Vec<ValueId>) -> Result<OpId> {
        self.build_op(OpKind::Llvm(LlvmOp::Return), values, vec![], IndexMap::new(), 0)
    }

    fn llvm_unreachable(&mut self) -> Result<OpId> {
        self.build_op(OpKind::Llvm(LlvmOp::Unreachable), vec![], vec![], IndexMap::new(), 0)
    }

    fn llvm_cond_br(
        &mut self,
        condition: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<OpId> {
        let cond_ty = self.value_type(condition);
        if cond_ty != Type::i1() {
            return Err(IrError::TypeError(format!(
                "llvm.cond_br condition must be i1, got {}",
                cond_ty
            )));
        }
        let op = self.build_op(
            OpKind::Llvm(LlvmOp::CondBr),
            vec![condition],
            vec![],
            IndexMap::new(),
            0,
        )?;
        self.module_mut().op_mut(op).successors = vec![then_block, else_block];
        Ok(op)
    }

    fn llvm_br(&mut self, dest: BlockId) -> Result<OpId> {
        let op = self.build_op(OpKind::Llvm(LlvmOp::Br), vec![], vec![], IndexMap::new(), 0)?;
        self.module_mut().op_mut(op).successors = vec![dest];
        Ok(op)
    }
}

impl<T: InstBuilderBase> InstBuilder for T {}
