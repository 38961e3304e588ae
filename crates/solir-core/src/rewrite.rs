use crate::{
    entities::{BlockId, OpId, ValueId},
    module::Module,
    IrError, Result,
};

impl Module {
    pub fn replace_all_uses_with(&mut self, old: ValueId, new: ValueId) {
        for op in self.walk() {
            for operand in self.op_mut(op).operands.iter_mut() {
                if *operand == old {
                    *operand = new;
                }
            }
        }
    }

    /// Removes `op` (and everything nested in it) from the module. Fails
    /// while an attached op outside of `op` still reads one of its results.
    pub fn erase_op(&mut self, op: OpId) -> Result<()> {
        let nested = self.walk_op(op);
        for &inner in &nested {
            for &result in &self.op(inner).results {
                if let Some(user) = self
                    .users(result)
                    .into_iter()
                    .find(|user| !nested.contains(user))
                {
                    return Err(IrError::InvalidInstruction(format!(
                        "cannot erase {}: result {} is still used by {}",
                        self.kind(inner),
                        result,
                        self.kind(user)
                    )));
                }
            }
        }
        self.detach_op(op);
        Ok(())
    }

    /// Rewires every use of `op`'s results to `values`, then erases `op`.
    pub fn replace_op(&mut self, op: OpId, values: &[ValueId]) -> Result<()> {
        let results = self.op(op).results.clone();
        if results.len() != values.len() {
            return Err(IrError::InvalidInstruction(format!(
                "{} has {} results, replaced with {} values",
                self.kind(op),
                results.len(),
                values.len()
            )));
        }
        for (&old, &new) in results.iter().zip(values) {
            self.replace_all_uses_with(old, new);
        }
        self.erase_op(op)
    }

    pub fn move_op_to_end(&mut self, op: OpId, block: BlockId) {
        self.detach_op(op);
        self.insert_op(block, None, op);
    }

    pub fn move_op_before(&mut self, op: OpId, anchor: OpId) -> Result<()> {
        let block = self.parent_block(anchor).ok_or_else(|| {
            IrError::InvalidInstruction(format!("anchor {} is not attached", anchor))
        })?;
        self.detach_op(op);
        let index = self.op_index(anchor);
        self.insert_op(block, index, op);
        Ok(())
    }

    /// Moves the ops of `from` selected by `keep` to the end of `to`,
    /// preserving their order.
    pub fn move_ops_where(
        &mut self,
        from: BlockId,
        to: BlockId,
        keep: impl Fn(&Module, OpId) -> bool,
    ) -> Vec<OpId> {
        let selected: Vec<OpId> = self
            .block(from)
            .ops
            .iter()
            .copied()
            .filter(|&op| keep(self, op))
            .collect();
        for &op in &selected {
            self.move_op_to_end(op, to);
        }
        selected
    }
}
