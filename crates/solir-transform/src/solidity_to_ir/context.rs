use crate::ast::{DeclarationId, SemanticType, SourceRange};
use crate::errors::{Result, TransformError};
use solir_core::{builder::OpBuilder, Location, SourceBuffer, ValueId};
use std::collections::HashMap;

/// Memory cell backing one source variable.
#[derive(Debug, Clone)]
pub struct Cell {
    pub cell: ValueId,
    pub ty: SemanticType,
}

/// Declaration to memory cell table of the function being lowered.
#[derive(Debug, Default)]
pub struct MemoryCells {
    cells: HashMap<DeclarationId, Cell>,
}

impl MemoryCells {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, declaration: DeclarationId, cell: ValueId, ty: SemanticType) {
        self.cells.insert(declaration, Cell { cell, ty });
    }

    pub fn lookup(&self, declaration: DeclarationId) -> Option<&Cell> {
        self.cells.get(&declaration)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// State shared by the expression and statement lowering of one function.
pub struct FunctionContext<'s, 'm> {
    pub builder: OpBuilder<'m>,
    pub source: &'s SourceBuffer,
    pub cells: MemoryCells,
}

impl<'s, 'm> FunctionContext<'s, 'm> {
    pub fn new(builder: OpBuilder<'m>, source: &'s SourceBuffer) -> Self {
        Self {
            builder,
            source,
            cells: MemoryCells::new(),
        }
    }

    pub fn locate(&self, src: SourceRange) -> Result<Location> {
        Ok(self.source.location(src.start)?)
    }

    /// Points the builder at `src` for the ops created next.
    pub fn at(&mut self, src: SourceRange) -> Result<Location> {
        let location = self.locate(src)?;
        self.builder.set_location(location.clone());
        Ok(location)
    }

    pub fn unsupported(&self, message: impl Into<String>) -> TransformError {
        TransformError::unsupported(message, self.builder.location())
    }
}
