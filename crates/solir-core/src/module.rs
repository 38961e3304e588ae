use crate::attributes::{self, Attribute};
use crate::entities::{BlockId, OpId, RegionId, ValueId};
use crate::ops::OpKind;
use crate::source_location::Location;
use crate::types::{FunctionType, Type};
use cranelift_entity::PrimaryMap;
use indexmap::IndexMap;

#[derive(Debug, Clone)]
pub struct OpData {
    pub kind: OpKind,
    pub operands: Vec<ValueId>,
    pub results: Vec<ValueId>,
    pub regions: Vec<RegionId>,
    pub successors: Vec<BlockId>,
    pub attrs: IndexMap<String, Attribute>,
    pub location: Location,
    pub parent: Option<BlockId>,
}

#[derive(Debug, Clone, Default)]
pub struct BlockData {
    pub args: Vec<ValueId>,
    pub ops: Vec<OpId>,
    pub parent: Option<RegionId>,
}

#[derive(Debug, Clone, Default)]
pub struct RegionData {
    pub blocks: Vec<BlockId>,
    pub parent: Option<OpId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueDef {
    OpResult { op: OpId, index: usize },
    BlockArg { block: BlockId, index: usize },
}

#[derive(Debug, Clone)]
pub struct ValueData {
    pub ty: Type,
    pub def: ValueDef,
}

/// Arena owning every operation, block, region and value of one
/// compilation unit. The module body is a single-block region without a
/// parent operation.
#[derive(Debug, Clone)]
pub struct Module {
    ops: PrimaryMap<OpId, OpData>,
    blocks: PrimaryMap<BlockId, BlockData>,
    regions: PrimaryMap<RegionId, RegionData>,
    values: PrimaryMap<ValueId, ValueData>,
    body: RegionId,
    location: Location,
}

impl Module {
    pub fn new(location: Location) -> Self {
        let mut regions = PrimaryMap::new();
        let mut blocks = PrimaryMap::new();
        let body = regions.push(RegionData::default());
        let block = blocks.push(BlockData {
            parent: Some(body),
            ..BlockData::default()
        });
        regions[body].blocks.push(block);

        Self {
            ops: PrimaryMap::new(),
            blocks,
            regions,
            values: PrimaryMap::new(),
            body,
            location,
        }
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn body_region(&self) -> RegionId {
        self.body
    }

    pub fn body_block(&self) -> BlockId {
        self.regions[self.body].blocks[0]
    }

    pub fn top_level_ops(&self) -> &[OpId] {
        &self.blocks[self.body_block()].ops
    }

    pub fn op(&self, op: OpId) -> &OpData {
        &self.ops[op]
    }

    pub fn op_mut(&mut self, op: OpId) -> &mut OpData {
        &mut self.ops[op]
    }

    pub fn kind(&self, op: OpId) -> OpKind {
        self.ops[op].kind
    }

    pub fn block(&self, block: BlockId) -> &BlockData {
        &self.blocks[block]
    }

    pub fn block_mut(&mut self, block: BlockId) -> &mut BlockData {
        &mut self.blocks[block]
    }

    pub fn region(&self, region: RegionId) -> &RegionData {
        &self.regions[region]
    }

    pub fn value(&self, value: ValueId) -> &ValueData {
        &self.values[value]
    }

    pub fn value_type(&self, value: ValueId) -> &Type {
        &self.values[value].ty
    }

    /// Retypes a value in place. Used by conversions that keep the defining op.
    pub fn set_value_type(&mut self, value: ValueId, ty: Type) {
        self.values[value].ty = ty;
    }

    pub fn result(&self, op: OpId, index: usize) -> Option<ValueId> {
        self.ops[op].results.get(index).copied()
    }

    /// Creates a detached operation together with its result values and
    /// empty regions.
    pub fn create_op(
        &mut self,
        kind: OpKind,
        operands: Vec<ValueId>,
        result_types: Vec<Type>,
        attrs: IndexMap<String, Attribute>,
        num_regions: usize,
        location: Location,
    ) -> OpId {
        let op = self.ops.push(OpData {
            kind,
            operands,
            results: Vec::with_capacity(result_types.len()),
            regions: Vec::with_capacity(num_regions),
            successors: Vec::new(),
            attrs,
            location,
            parent: None,
        });

        for (index, ty) in result_types.into_iter().enumerate() {
            let value = self.values.push(ValueData {
                ty,
                def: ValueDef::OpResult { op, index },
            });
            self.ops[op].results.push(value);
        }

        for _ in 0..num_regions {
            let region = self.regions.push(RegionData {
                blocks: Vec::new(),
                parent: Some(op),
            });
            self.ops[op].regions.push(region);
        }

        op
    }

    pub fn append_block(&mut self, region: RegionId, arg_types: Vec<Type>) -> BlockId {
        let block = self.blocks.push(BlockData {
            parent: Some(region),
            ..BlockData::default()
        });
        for (index, ty) in arg_types.into_iter().enumerate() {
            let value = self.values.push(ValueData {
                ty,
                def: ValueDef::BlockArg { block, index },
            });
            self.blocks[block].args.push(value);
        }
        self.regions[region].blocks.push(block);
        block
    }

    /// Inserts a detached op into `block` at `index`, or at the end.
    pub fn insert_op(&mut self, block: BlockId, index: Option<usize>, op: OpId) {
        debug_assert!(self.ops[op].parent.is_none(), "{} is already attached", op);
        let ops = &mut self.blocks[block].ops;
        match index {
            Some(index) if index < ops.len() => ops.insert(index, op),
            _ => ops.push(op),
        }
        self.ops[op].parent = Some(block);
    }

    pub fn detach_op(&mut self, op: OpId) {
        if let Some(block) = self.ops[op].parent.take() {
            self.blocks[block].ops.retain(|&o| o != op);
        }
    }

    /// Moves every block of `from` to the end of `to`.
    pub fn take_region_blocks(&mut self, from: RegionId, to: RegionId) {
        let blocks = std::mem::take(&mut self.regions[from].blocks);
        for &block in &blocks {
            self.blocks[block].parent = Some(to);
        }
        self.regions[to].blocks.extend(blocks);
    }

    pub fn parent_block(&self, op: OpId) -> Option<BlockId> {
        self.ops[op].parent
    }

    pub fn block_region(&self, block: BlockId) -> Option<RegionId> {
        self.blocks[block].parent
    }

    /// The operation owning the region that contains `op`.
    pub fn parent_op(&self, op: OpId) -> Option<OpId> {
        let block = self.ops[op].parent?;
        let region = self.blocks[block].parent?;
        self.regions[region].parent
    }

    pub fn ancestors(&self, op: OpId) -> Vec<OpId> {
        let mut chain = Vec::new();
        let mut current = self.parent_op(op);
        while let Some(parent) = current {
            chain.push(parent);
            current = self.parent_op(parent);
        }
        chain
    }

    /// Position of `op` inside its parent block.
    pub fn op_index(&self, op: OpId) -> Option<usize> {
        let block = self.ops[op].parent?;
        self.blocks[block].ops.iter().position(|&o| o == op)
    }

    /// True when `op` is reachable from the module body.
    pub fn is_attached(&self, op: OpId) -> bool {
        let mut current = op;
        loop {
            let Some(block) = self.ops[current].parent else {
                return false;
            };
            let Some(region) = self.blocks[block].parent else {
                return false;
            };
            if region == self.body {
                return true;
            }
            match self.regions[region].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn entry_block(&self, op: OpId) -> Option<BlockId> {
        let region = *self.ops[op].regions.first()?;
        self.regions[region].blocks.first().copied()
    }

    pub fn attr(&self, op: OpId, name: &str) -> Option<&Attribute> {
        self.ops[op].attrs.get(name)
    }

    pub fn set_attr(&mut self, op: OpId, name: &str, value: Attribute) {
        self.ops[op].attrs.insert(name.to_string(), value);
    }

    pub fn sym_name(&self, op: OpId) -> Option<&str> {
        self.attr(op, attributes::SYM_NAME).and_then(Attribute::as_str)
    }

    pub fn function_type(&self, op: OpId) -> Option<&FunctionType> {
        self.attr(op, attributes::FUNCTION_TYPE)
            .and_then(Attribute::as_type)
            .and_then(Type::as_function)
    }

    pub fn callee(&self, op: OpId) -> Option<&str> {
        self.attr(op, attributes::CALLEE).and_then(Attribute::as_symbol)
    }

    /// Pre-order walk of every op nested in `region`.
    pub fn walk_region(&self, region: RegionId, out: &mut Vec<OpId>) {
        for &block in &self.regions[region].blocks {
            for &op in &self.blocks[block].ops {
                out.push(op);
                for &nested in &self.ops[op].regions {
                    self.walk_region(nested, out);
                }
            }
        }
    }

    /// `op` followed by every op nested inside it, in pre-order.
    pub fn walk_op(&self, op: OpId) -> Vec<OpId> {
        let mut out = vec![op];
        for &region in &self.ops[op].regions {
            self.walk_region(region, &mut out);
        }
        out
    }

    pub fn walk(&self) -> Vec<OpId> {
        let mut out = Vec::new();
        self.walk_region(self.body, &mut out);
        out
    }

    pub fn users(&self, value: ValueId) -> Vec<OpId> {
        self.walk()
            .into_iter()
            .filter(|&op| self.ops[op].operands.contains(&value))
            .collect()
    }

    /// Direct symbol children of `region`.
    pub fn symbols_in(&self, region: RegionId) -> Vec<(OpId, &str)> {
        let mut symbols = Vec::new();
        for &block in &self.regions[region].blocks {
            for &op in &self.blocks[block].ops {
                if !self.ops[op].kind.is_symbol() {
                    continue;
                }
                if let Some(name) = self.sym_name(op) {
                    symbols.push((op, name));
                }
            }
        }
        symbols
    }

    /// Resolves `name` from the scope of `from`, searching the nearest
    /// enclosing symbol table first and then each outer one.
    pub fn lookup_symbol(&self, from: OpId, name: &str) -> Option<OpId> {
        let mut scope = self.parent_op(from);
        loop {
            match scope {
                Some(op) if self.ops[op].kind.is_symbol_table() => {
                    for &region in &self.ops[op].regions {
                        if let Some((found, _)) =
                            self.symbols_in(region).into_iter().find(|(_, n)| *n == name)
                        {
                            return Some(found);
                        }
                    }
                    scope = self.parent_op(op);
                }
                Some(op) => scope = self.parent_op(op),
                None => {
                    return self
                        .symbols_in(self.body)
                        .into_iter()
                        .find(|(_, n)| *n == name)
                        .map(|(op, _)| op);
                }
            }
        }
    }

    pub fn lookup_top_level(&self, name: &str) -> Option<OpId> {
        self.symbols_in(self.body)
            .into_iter()
            .find(|(_, n)| *n == name)
            .map(|(op, _)| op)
    }

    /// Every attached op of the given kind, in pre-order.
    pub fn ops_of_kind(&self, kind: OpKind) -> Vec<OpId> {
        self.walk()
            .into_iter()
            .filter(|&op| self.ops[op].kind == kind)
            .collect()
    }
}

impl Default for Module {
    fn default() -> Self {
        Self::new(Location::Unknown)
    }
}
