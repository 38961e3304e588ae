use crate::{
    attributes::{self, Attribute, CmpPredicate},
    entities::{BlockId, OpId, RegionId, ValueId},
    module::{Module, ValueDef},
    ops::{ArithOp, FuncOp, LlvmOp, MemRefOp, OpKind, SolOp},
    types::{FunctionType, Type},
};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("'{op}' {location}: {message}")]
    InvalidOp {
        op: String,
        location: String,
        message: String,
    },
    #[error("'{op}' {location}: terminator is not the last operation in its block")]
    MisplacedTerminator { op: String, location: String },
    #[error("block {block} in '{parent}' does not end with a terminator")]
    MissingTerminator { parent: String, block: String },
    #[error("'{op}' {location}: operand #{index} does not dominate this use")]
    Dominance {
        op: String,
        location: String,
        index: usize,
    },
    #[error("redefinition of symbol '@{0}'")]
    DuplicateSymbol(String),
    #[error("'{op}' {location}: reference to undefined symbol '@{symbol}'")]
    UndefinedSymbol {
        op: String,
        location: String,
        symbol: String,
    },
}

pub type Result<T> = std::result::Result<T, VerifyError>;

/// Structural well-formedness check over every attached operation.
pub fn verify(module: &Module) -> Result<()> {
    let verifier = Verifier { module };
    verifier.verify_symbol_table(module.body_region())?;
    let ops = module.walk();
    // Every op's placement is checked before any body's termination.
    for &op in &ops {
        verifier.verify_placement(op)?;
    }
    for op in ops {
        verifier.verify_op(op)?;
        verifier.verify_operands_dominate(op)?;
    }
    Ok(())
}

struct Verifier<'a> {
    module: &'a Module,
}

impl<'a> Verifier<'a> {
    fn fail(&self, op: OpId, message: impl Into<String>) -> VerifyError {
        VerifyError::InvalidOp {
            op: self.module.kind(op).to_string(),
            location: self.module.op(op).location.to_string(),
            message: message.into(),
        }
    }

    fn ty(&self, value: ValueId) -> &Type {
        self.module.value_type(value)
    }

    fn verify_placement(&self, op: OpId) -> Result<()> {
        if !self.module.kind(op).is_terminator() {
            return Ok(());
        }
        let block = self.module.parent_block(op);
        let last = block.and_then(|b| self.module.block(b).ops.last().copied());
        if last != Some(op) {
            return Err(VerifyError::MisplacedTerminator {
                op: self.module.kind(op).to_string(),
                location: self.module.op(op).location.to_string(),
            });
        }
        Ok(())
    }

    fn verify_symbol_table(&self, region: RegionId) -> Result<()> {
        let mut seen = HashSet::new();
        for (_, name) in self.module.symbols_in(region) {
            if !seen.insert(name) {
                return Err(VerifyError::DuplicateSymbol(name.to_string()));
            }
        }
        Ok(())
    }

    fn expect_counts(&self, op: OpId, operands: usize, results: usize, regions: usize) -> Result<()> {
        let data = self.module.op(op);
        if data.operands.len() != operands {
            return Err(self.fail(
                op,
                format!("expected {} operands, got {}", operands, data.operands.len()),
            ));
        }
        if data.results.len() != results {
            return Err(self.fail(
                op,
                format!("expected {} results, got {}", results, data.results.len()),
            ));
        }
        if data.regions.len() != regions {
            return Err(self.fail(
                op,
                format!("expected {} regions, got {}", regions, data.regions.len()),
            ));
        }
        Ok(())
    }

    fn verify_op(&self, op: OpId) -> Result<()> {
        let kind = self.module.kind(op);
        match kind {
            OpKind::Sol(SolOp::Contract) | OpKind::Sol(SolOp::Object) => self.verify_container(op),
            OpKind::Sol(SolOp::Return) => {
                self.expect_counts(op, 2, 0, 0)?;
                for &operand in &self.module.op(op).operands {
                    if *self.ty(operand) != Type::i256() {
                        return Err(self.fail(op, format!("operands must be i256, got {}", self.ty(operand))));
                    }
                }
                Ok(())
            }
            OpKind::Func(FuncOp::Func) => self.verify_function(op, true),
            OpKind::Llvm(LlvmOp::Func) => self.verify_function(op, false),
            OpKind::Func(FuncOp::Return) => self.verify_return(op, OpKind::Func(FuncOp::Func)),
            OpKind::Llvm(LlvmOp::Return) => self.verify_return(op, OpKind::Llvm(LlvmOp::Func)),
            OpKind::Func(FuncOp::Call) | OpKind::Llvm(LlvmOp::Call) => self.verify_call(op),
            OpKind::Arith(ArithOp::Constant) | OpKind::Llvm(LlvmOp::Constant) => {
                self.expect_counts(op, 0, 1, 0)?;
                let result_ty = self.ty(self.module.op(op).results[0]);
                match self.module.attr(op, attributes::VALUE).and_then(Attribute::as_integer) {
                    Some((_, ty)) if ty == result_ty && ty.is_int() => Ok(()),
                    Some((_, ty)) => Err(self.fail(
                        op,
                        format!("value type {} does not match result type {}", ty, result_ty),
                    )),
                    None => Err(self.fail(op, "requires an integer 'value' attribute")),
                }
            }
            OpKind::Arith(ArithOp::AddI | ArithOp::MulI | ArithOp::AndI)
            | OpKind::Llvm(LlvmOp::Add | LlvmOp::Mul | LlvmOp::And | LlvmOp::LShr) => {
                self.expect_counts(op, 2, 1, 0)?;
                let data = self.module.op(op);
                let (lhs, rhs, res) = (
                    self.ty(data.operands[0]),
                    self.ty(data.operands[1]),
                    self.ty(data.results[0]),
                );
                if !lhs.is_int() || lhs != rhs || lhs != res {
                    return Err(self.fail(
                        op,
                        format!("operand and result types differ: {}, {} -> {}", lhs, rhs, res),
                    ));
                }
                Ok(())
            }
            OpKind::Arith(ArithOp::CmpI) | OpKind::Llvm(LlvmOp::ICmp) => {
                self.expect_counts(op, 2, 1, 0)?;
                let data = self.module.op(op);
                let (lhs, rhs) = (self.ty(data.operands[0]), self.ty(data.operands[1]));
                if !lhs.is_int() || lhs != rhs {
                    return Err(self.fail(op, format!("cannot compare {} with {}", lhs, rhs)));
                }
                if *self.ty(data.results[0]) != Type::i1() {
                    return Err(self.fail(op, "result must be i1"));
                }
                let predicate = self
                    .module
                    .attr(op, attributes::PREDICATE)
                    .and_then(Attribute::as_str)
                    .and_then(CmpPredicate::parse);
                if predicate.is_none() {
                    return Err(self.fail(op, "missing or unknown predicate"));
                }
                Ok(())
            }
            OpKind::Arith(ArithOp::ExtSI | ArithOp::ExtUI)
            | OpKind::Llvm(LlvmOp::SExt | LlvmOp::ZExt) => {
                self.expect_counts(op, 1, 1, 0)?;
                let data = self.module.op(op);
                let (from, to) = (self.ty(data.operands[0]), self.ty(data.results[0]));
                match (from.int_width(), to.int_width()) {
                    (Some(src), Some(dst)) if dst > src => Ok(()),
                    _ => Err(self.fail(op, format!("must widen, got {} to {}", from, to))),
                }
            }
            OpKind::MemRef(MemRefOp::Alloca) => {
                self.expect_counts(op, 0, 1, 0)?;
                if self.ty(self.module.op(op).results[0]).memref_element().is_none() {
                    return Err(self.fail(op, "result must be a memref"));
                }
                Ok(())
            }
            OpKind::MemRef(MemRefOp::Load) => {
                self.expect_counts(op, 1, 1, 0)?;
                let data = self.module.op(op);
                let cell = self.ty(data.operands[0]);
                if cell.memref_element() != Some(self.ty(data.results[0])) {
                    return Err(self.fail(
                        op,
                        format!("cannot load {} from {}", self.ty(data.results[0]), cell),
                    ));
                }
                Ok(())
            }
            OpKind::MemRef(MemRefOp::Store) => {
                self.expect_counts(op, 2, 0, 0)?;
                let data = self.module.op(op);
                let (value, cell) = (self.ty(data.operands[0]), self.ty(data.operands[1]));
                if cell.memref_element() != Some(value) {
                    return Err(self.fail(op, format!("cannot store {} into {}", value, cell)));
                }
                Ok(())
            }
            OpKind::Llvm(LlvmOp::Global) => {
                self.expect_counts(op, 0, 0, 0)?;
                let ty = self
                    .module
                    .attr(op, attributes::GLOBAL_TYPE)
                    .and_then(Attribute::as_type)
                    .ok_or_else(|| self.fail(op, "requires a 'global_type' attribute"))?;
                if self.module.sym_name(op).is_none() {
                    return Err(self.fail(op, "requires a symbol name"));
                }
                match self.module.attr(op, attributes::VALUE) {
                    None => Ok(()),
                    Some(Attribute::ZeroSplat(init)) | Some(Attribute::Integer { ty: init, .. })
                        if init == ty =>
                    {
                        Ok(())
                    }
                    Some(other) => Err(self.fail(
                        op,
                        format!("initializer {} does not match global type {}", other, ty),
                    )),
                }
            }
            OpKind::Llvm(LlvmOp::AddressOf) => {
                self.expect_counts(op, 0, 1, 0)?;
                if !self.ty(self.module.op(op).results[0]).is_ptr() {
                    return Err(self.fail(op, "result must be a pointer"));
                }
                let name = self
                    .module
                    .attr(op, attributes::GLOBAL_NAME)
                    .and_then(Attribute::as_symbol)
                    .ok_or_else(|| self.fail(op, "requires a 'global_name' attribute"))?;
                match self.module.lookup_symbol(op, name) {
                    Some(global) if self.module.kind(global) == OpKind::Llvm(LlvmOp::Global) => Ok(()),
                    _ => Err(self.undefined(op, name)),
                }
            }
            OpKind::Llvm(LlvmOp::Load) => {
                self.expect_counts(op, 1, 1, 0)?;
                self.expect_ptr(op, 0)
            }
            OpKind::Llvm(LlvmOp::Store) => {
                self.expect_counts(op, 2, 0, 0)?;
                self.expect_ptr(op, 1)
            }
            OpKind::Llvm(LlvmOp::Alloca) => {
                self.expect_counts(op, 0, 1, 0)?;
                if self.module.attr(op, attributes::ELEM_TYPE).and_then(Attribute::as_type).is_none() {
                    return Err(self.fail(op, "requires an 'elem_type' attribute"));
                }
                if !self.ty(self.module.op(op).results[0]).is_ptr() {
                    return Err(self.fail(op, "result must be a pointer"));
                }
                Ok(())
            }
            OpKind::Llvm(LlvmOp::PtrToInt) => {
                self.expect_counts(op, 1, 1, 0)?;
                self.expect_ptr(op, 0)?;
                if !self.ty(self.module.op(op).results[0]).is_int() {
                    return Err(self.fail(op, "result must be an integer"));
                }
                Ok(())
            }
            OpKind::Llvm(LlvmOp::IntToPtr) => {
                self.expect_counts(op, 1, 1, 0)?;
                let data = self.module.op(op);
                if !self.ty(data.operands[0]).is_int() || !self.ty(data.results[0]).is_ptr() {
                    return Err(self.fail(op, "converts an integer to a pointer"));
                }
                Ok(())
            }
            OpKind::Llvm(LlvmOp::GetElementPtr) => {
                let data = self.module.op(op);
                if data.operands.is_empty() || data.results.len() != 1 {
                    return Err(self.fail(op, "expects a base pointer and one result"));
                }
                self.expect_ptr(op, 0)?;
                if self.ty(data.results[0]) != self.ty(data.operands[0]) {
                    return Err(self.fail(op, "result must have the base pointer type"));
                }
                if data.operands[1..].iter().any(|&idx| !self.ty(idx).is_int()) {
                    return Err(self.fail(op, "indices must be integers"));
                }
                if self.module.attr(op, attributes::ELEM_TYPE).and_then(Attribute::as_type).is_none() {
                    return Err(self.fail(op, "requires an 'elem_type' attribute"));
                }
                Ok(())
            }
            OpKind::Llvm(LlvmOp::Unreachable) => self.expect_counts(op, 0, 0, 0),
            OpKind::Llvm(LlvmOp::CondBr) => {
                self.expect_counts(op, 1, 0, 0)?;
                if *self.ty(self.module.op(op).operands[0]) != Type::i1() {
                    return Err(self.fail(op, "condition must be i1"));
                }
                self.verify_successors(op, 2)
            }
            OpKind::Llvm(LlvmOp::Br) => {
                self.expect_counts(op, 0, 0, 0)?;
                self.verify_successors(op, 1)
            }
        }
    }

    fn expect_ptr(&self, op: OpId, index: usize) -> Result<()> {
        let operand = self.module.op(op).operands[index];
        if !self.ty(operand).is_ptr() {
            return Err(self.fail(
                op,
                format!("operand #{} must be a pointer, got {}", index, self.ty(operand)),
            ));
        }
        Ok(())
    }

    fn undefined(&self, op: OpId, symbol: &str) -> VerifyError {
        VerifyError::UndefinedSymbol {
            op: self.module.kind(op).to_string(),
            location: self.module.op(op).location.to_string(),
            symbol: symbol.to_string(),
        }
    }

    fn verify_container(&self, op: OpId) -> Result<()> {
        self.expect_counts(op, 0, 0, 1)?;
        if self.module.sym_name(op).is_none() {
            return Err(self.fail(op, "requires a symbol name"));
        }
        let region = self.module.op(op).regions[0];
        if self.module.region(region).blocks.len() != 1 {
            return Err(self.fail(op, "body must contain exactly one block"));
        }
        self.verify_symbol_table(region)
    }

    fn signature(&self, op: OpId) -> Result<&FunctionType> {
        self.module
            .function_type(op)
            .ok_or_else(|| self.fail(op, "requires a 'function_type' attribute"))
    }

    fn verify_function(&self, op: OpId, requires_body: bool) -> Result<()> {
        self.expect_counts(op, 0, 0, 1)?;
        let name = self
            .module
            .sym_name(op)
            .ok_or_else(|| self.fail(op, "requires a symbol name"))?;
        let signature = self.signature(op)?;
        let region = self.module.op(op).regions[0];
        let blocks = &self.module.region(region).blocks;

        let Some(&entry) = blocks.first() else {
            if requires_body {
                return Err(self.fail(op, format!("@{} has no body", name)));
            }
            return Ok(());
        };

        let arg_types: Vec<&Type> = self
            .module
            .block(entry)
            .args
            .iter()
            .map(|&arg| self.ty(arg))
            .collect();
        if arg_types.len() != signature.inputs.len()
            || arg_types.iter().zip(&signature.inputs).any(|(a, b)| *a != b)
        {
            return Err(self.fail(
                op,
                format!("entry block arguments of @{} do not match its signature", name),
            ));
        }

        for &block in blocks {
            let terminated = self
                .module
                .block(block)
                .ops
                .last()
                .map(|&last| self.module.kind(last).is_terminator())
                .unwrap_or(false);
            if !terminated {
                return Err(VerifyError::MissingTerminator {
                    parent: format!("{} @{}", self.module.kind(op), name),
                    block: block.to_string(),
                });
            }
        }
        Ok(())
    }

    fn verify_return(&self, op: OpId, function_kind: OpKind) -> Result<()> {
        self.expect_counts(op, self.module.op(op).operands.len(), 0, 0)?;
        let func = match self.module.parent_op(op) {
            Some(parent) if self.module.kind(parent) == function_kind => parent,
            _ => return Err(self.fail(op, format!("must be directly nested in '{}'", function_kind))),
        };
        let signature = self.signature(func)?;
        let operand_types: Vec<&Type> = self
            .module
            .op(op)
            .operands
            .iter()
            .map(|&v| self.ty(v))
            .collect();
        if operand_types.len() != signature.results.len()
            || operand_types.iter().zip(&signature.results).any(|(a, b)| *a != b)
        {
            return Err(self.fail(
                op,
                format!("returned values do not match result types {}", signature),
            ));
        }
        Ok(())
    }

    fn verify_call(&self, op: OpId) -> Result<()> {
        let callee = self
            .module
            .callee(op)
            .ok_or_else(|| self.fail(op, "requires a 'callee' attribute"))?;
        let target = match self.module.lookup_symbol(op, callee) {
            Some(target) if self.module.kind(target).is_function() => target,
            _ => return Err(self.undefined(op, callee)),
        };
        let signature = self.signature(target)?;
        let data = self.module.op(op);
        let args: Vec<&Type> = data.operands.iter().map(|&v| self.ty(v)).collect();
        let results: Vec<&Type> = data.results.iter().map(|&v| self.ty(v)).collect();
        let args_match = args.len() == signature.inputs.len()
            && args.iter().zip(&signature.inputs).all(|(a, b)| *a == b);
        let results_match = results.len() == signature.results.len()
            && results.iter().zip(&signature.results).all(|(a, b)| *a == b);
        if !args_match || !results_match {
            return Err(self.fail(
                op,
                format!("call does not match the signature {} of @{}", signature, callee),
            ));
        }
        Ok(())
    }

    fn verify_successors(&self, op: OpId, count: usize) -> Result<()> {
        let successors = &self.module.op(op).successors;
        if successors.len() != count {
            return Err(self.fail(op, format!("expected {} successors", count)));
        }
        let region = self
            .module
            .parent_block(op)
            .and_then(|b| self.module.block_region(b));
        for &succ in successors {
            if self.module.block_region(succ) != region {
                return Err(self.fail(op, format!("successor {} is in another region", succ)));
            }
        }
        Ok(())
    }

    fn verify_operands_dominate(&self, op: OpId) -> Result<()> {
        for (index, &operand) in self.module.op(op).operands.iter().enumerate() {
            if !self.dominates(operand, op) {
                return Err(VerifyError::Dominance {
                    op: self.module.kind(op).to_string(),
                    location: self.module.op(op).location.to_string(),
                    index,
                });
            }
        }
        Ok(())
    }

    /// A value dominates a use when it is defined earlier in the same
    /// block, is an argument of that block, or lives in the entry block of
    /// an enclosing region that is reachable without crossing an isolated op.
    fn dominates(&self, value: ValueId, user: OpId) -> bool {
        let (def_block, def_index): (BlockId, Option<usize>) = match self.module.value(value).def {
            ValueDef::OpResult { op, .. } => {
                match (self.module.parent_block(op), self.module.op_index(op)) {
                    (Some(block), Some(index)) => (block, Some(index)),
                    _ => return false,
                }
            }
            ValueDef::BlockArg { block, .. } => (block, None),
        };
        let Some(def_region) = self.module.block_region(def_block) else {
            return false;
        };

        let mut current = user;
        loop {
            let Some(block) = self.module.parent_block(current) else {
                return false;
            };
            let Some(region) = self.module.block_region(block) else {
                return false;
            };
            if region == def_region {
                if block == def_block {
                    return match def_index {
                        Some(def_index) => self
                            .module
                            .op_index(current)
                            .map(|use_index| use_index > def_index)
                            .unwrap_or(false),
                        None => true,
                    };
                }
                return self.module.region(region).blocks.first() == Some(&def_block);
            }
            match self.module.region(region).parent {
                Some(parent) if !self.module.kind(parent).is_isolated_from_above() => {
                    current = parent;
                }
                _ => return false,
            }
        }
    }
}
