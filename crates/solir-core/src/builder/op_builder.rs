use super::inst_builder::InstBuilderBase;
use crate::{
    attributes::Attribute,
    entities::{BlockId, OpId, ValueId},
    module::Module,
    ops::OpKind,
    source_location::Location,
    types::Type,
    IrError, Result,
};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertPoint {
    pub block: BlockId,
    /// `None` appends at the end of the block.
    pub index: Option<usize>,
}

/// Creates operations at an insertion point, stamping each with the
/// builder's current location.
pub struct OpBuilder<'m> {
    module: &'m mut Module,
    insertion: Option<InsertPoint>,
    location: Location,
}

impl<'m> OpBuilder<'m> {
    pub fn new(module: &'m mut Module) -> Self {
        let body = module.body_block();
        Self {
            module,
            insertion: Some(InsertPoint {
                block: body,
                index: None,
            }),
            location: Location::Unknown,
        }
    }

    pub fn at_end(module: &'m mut Module, block: BlockId) -> Self {
        let mut builder = Self::new(module);
        builder.set_insertion_point_to_end(block);
        builder
    }

    pub fn set_insertion_point_to_end(&mut self, block: BlockId) {
        self.insertion = Some(InsertPoint { block, index: None });
    }

    pub fn set_insertion_point_to_start(&mut self, block: BlockId) {
        self.insertion = Some(InsertPoint {
            block,
            index: Some(0),
        });
    }

    pub fn set_insertion_point_before(&mut self, op: OpId) -> Result<()> {
        let (block, index) = self.position_of(op)?;
        self.insertion = Some(InsertPoint {
            block,
            index: Some(index),
        });
        Ok(())
    }

    pub fn set_insertion_point_after(&mut self, op: OpId) -> Result<()> {
        let (block, index) = self.position_of(op)?;
        self.insertion = Some(InsertPoint {
            block,
            index: Some(index + 1),
        });
        Ok(())
    }

    pub fn clear_insertion_point(&mut self) {
        self.insertion = None;
    }

    pub fn insertion_point(&self) -> Option<InsertPoint> {
        self.insertion
    }

    pub fn insertion_block(&self) -> Option<BlockId> {
        self.insertion.map(|ip| ip.block)
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    fn position_of(&self, op: OpId) -> Result<(BlockId, usize)> {
        let block = self
            .module
            .parent_block(op)
            .ok_or_else(|| IrError::BuilderError(format!("{} is not attached to a block", op)))?;
        let index = self
            .module
            .op_index(op)
            .ok_or_else(|| IrError::BuilderError(format!("{} not found in {}", op, block)))?;
        Ok((block, index))
    }

    /// Inserts an already created op at the insertion point.
    pub fn insert(&mut self, op: OpId) -> Result<()> {
        let ip = self
            .insertion
            .as_mut()
            .ok_or_else(|| IrError::BuilderError("no insertion point set".to_string()))?;
        self.module.insert_op(ip.block, ip.index, op);
        if let Some(index) = ip.index.as_mut() {
            *index += 1;
        }
        Ok(())
    }

    /// Adds a block with the given argument types to region `index` of `op`.
    pub fn append_block(&mut self, op: OpId, index: usize, arg_types: Vec<Type>) -> Result<BlockId> {
        let region = *self.module.op(op).regions.get(index).ok_or_else(|| {
            IrError::BuilderError(format!("{} has no region #{}", self.module.kind(op), index))
        })?;
        Ok(self.module.append_block(region, arg_types))
    }

    pub fn block_args(&self, block: BlockId) -> Vec<ValueId> {
        self.module.block(block).args.clone()
    }
}

impl<'m> InstBuilderBase for OpBuilder<'m> {
    fn module(&self) -> &Module {
        &*self.module
    }

    fn module_mut(&mut self) -> &mut Module {
        &mut *self.module
    }

    fn build_op(
        &mut self,
        kind: OpKind,
        operands: Vec<ValueId>,
        result_types: Vec<Type>,
        attrs: IndexMap<String, Attribute>,
        num_regions: usize,
    ) -> Result<OpId> {
        if self.insertion.is_none() {
            return Err(IrError::BuilderError(format!(
                "cannot build {} without an insertion point",
                kind
            )));
        }
        let location = self.location.clone();
        let op = self
            .module
            .create_op(kind, operands, result_types, attrs, num_regions, location);
        self.insert(op)?;
        Ok(op)
    }
}
