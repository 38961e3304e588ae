use solir_core::{Attribute, BlockId, FunctionType, Module, OpId, ValueId};
use std::collections::HashMap;

/// Value and block numbering of one isolated scope.
#[derive(Debug, Default)]
pub struct SSAContext {
    next_value: u32,
    next_block: u32,
    values: HashMap<ValueId, u32>,
    blocks: HashMap<BlockId, u32>,
}

impl SSAContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn value_number(&mut self, value: ValueId) -> u32 {
        if let Some(&n) = self.values.get(&value) {
            return n;
        }
        let n = self.next_value;
        self.values.insert(value, n);
        self.next_value += 1;
        n
    }

    pub fn block_number(&mut self, block: BlockId) -> u32 {
        if let Some(&n) = self.blocks.get(&block) {
            return n;
        }
        let n = self.next_block;
        self.blocks.insert(block, n);
        self.next_block += 1;
        n
    }
}

pub struct IRFormatterBase;

impl IRFormatterBase {
    pub fn format_value(value: ValueId, ssa: &mut SSAContext) -> String {
        format!("%{}", ssa.value_number(value))
    }

    pub fn format_values(values: &[ValueId], ssa: &mut SSAContext) -> String {
        values
            .iter()
            .map(|&v| Self::format_value(v, ssa))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn format_block(block: BlockId, ssa: &mut SSAContext) -> String {
        format!("^bb{}", ssa.block_number(block))
    }

    /// `^bbN(%a: T, ...)` for a block header.
    pub fn format_block_header(module: &Module, block: BlockId, ssa: &mut SSAContext) -> String {
        let label = Self::format_block(block, ssa);
        let args = &module.block(block).args;
        if args.is_empty() {
            return format!("{}:", label);
        }
        let args = args
            .iter()
            .map(|&arg| {
                format!(
                    "{}: {}",
                    Self::format_value(arg, ssa),
                    module.value_type(arg)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({}):", label, args)
    }

    pub fn format_attribute(attr: &Attribute) -> String {
        attr.to_string()
    }

    /// `{name = value, ...}` in insertion order, or nothing for an empty dictionary.
    pub fn format_attr_dict(module: &Module, op: OpId) -> Option<String> {
        let attrs = &module.op(op).attrs;
        if attrs.is_empty() {
            return None;
        }
        let entries = attrs
            .iter()
            .map(|(name, value)| format!("{} = {}", name, Self::format_attribute(value)))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("{{{}}}", entries))
    }

    /// Operand and result types of `op` as a function type.
    pub fn format_signature(module: &Module, op: OpId) -> String {
        let data = module.op(op);
        FunctionType {
            inputs: data.operands.iter().map(|&v| module.value_type(v).clone()).collect(),
            results: data.results.iter().map(|&v| module.value_type(v).clone()).collect(),
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;
    use solir_core::{builder::OpBuilder, InstBuilder, LlvmOp, OpKind, Type};

    #[test]
    fn test_numbering_is_stable() {
        let mut module = Module::default();
        let mut b = OpBuilder::new(&mut module);
        let x = b.llvm_constant(BigInt::from(1), Type::i256()).unwrap();
        let y = b.llvm_constant(BigInt::from(2), Type::i256()).unwrap();

        let mut ssa = SSAContext::new();
        assert_eq!(IRFormatterBase::format_value(y, &mut ssa), "%0");
        assert_eq!(IRFormatterBase::format_value(x, &mut ssa), "%1");
        assert_eq!(IRFormatterBase::format_values(&[x, y], &mut ssa), "%1, %0");

        ssa.reset();
        assert_eq!(IRFormatterBase::format_value(x, &mut ssa), "%0");
    }

    #[test]
    fn test_attr_dict_and_signature() {
        let mut module = Module::default();
        let mut b = OpBuilder::new(&mut module);
        let x = b.llvm_constant(BigInt::from(7), Type::Int(8)).unwrap();
        let op = module.ops_of_kind(OpKind::Llvm(LlvmOp::Constant))[0];

        assert_eq!(
            IRFormatterBase::format_attr_dict(&module, op).as_deref(),
            Some("{value = 7 : i8}")
        );
        assert_eq!(IRFormatterBase::format_signature(&module, op), "() -> i8");
        assert_eq!(module.value_type(x), &Type::Int(8));
    }
}
