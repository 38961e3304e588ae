/*! Full-conversion driver.
 *
 * A `ConversionTarget` says which ops may survive; patterns rewrite the rest. The driver keeps
 * sweeping the module until no pattern fires, then rejects the module if any illegal op is left.
 */

use crate::{
    entities::OpId,
    module::Module,
    ops::{Dialect, OpKind},
    IrError,
};
use indexmap::IndexMap;
use std::collections::HashSet;
use tracing::{debug, trace};

pub const MAX_CONVERSION_ITERATIONS: usize = 32;

#[derive(Debug, Clone, Default)]
pub struct ConversionTarget {
    legal_dialects: HashSet<Dialect>,
    legal_ops: HashSet<OpKind>,
    illegal_ops: HashSet<OpKind>,
}

impl ConversionTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_legal_dialect(&mut self, dialect: Dialect) -> &mut Self {
        self.legal_dialects.insert(dialect);
        self
    }

    pub fn add_legal_op(&mut self, kind: OpKind) -> &mut Self {
        self.illegal_ops.remove(&kind);
        self.legal_ops.insert(kind);
        self
    }

    pub fn add_illegal_op(&mut self, kind: OpKind) -> &mut Self {
        self.legal_ops.remove(&kind);
        self.illegal_ops.insert(kind);
        self
    }

    pub fn is_legal(&self, kind: OpKind) -> bool {
        if self.illegal_ops.contains(&kind) {
            return false;
        }
        self.legal_ops.contains(&kind) || self.legal_dialects.contains(&kind.dialect())
    }

    /// Every attached op the target rejects, in pre-order.
    pub fn illegal_ops(&self, module: &Module) -> Vec<OpId> {
        module
            .walk()
            .into_iter()
            .filter(|&op| !self.is_legal(module.kind(op)))
            .collect()
    }
}

/// Rewrites one kind of op. Returning `Ok(false)` means the pattern did
/// not apply and the op was left untouched.
pub trait ConversionPattern<C, E> {
    fn name(&self) -> &'static str;

    fn root(&self) -> OpKind;

    fn match_and_rewrite(&self, module: &mut Module, op: OpId, ctx: &C) -> Result<bool, E>;
}

#[derive(Debug, Clone, Default)]
pub struct ConversionStats {
    pub iterations: usize,
    pub rewrites: IndexMap<&'static str, usize>,
}

impl ConversionStats {
    pub fn total_rewrites(&self) -> usize {
        self.rewrites.values().sum()
    }
}

pub fn apply_full_conversion<C, E: From<IrError>>(
    module: &mut Module,
    target: &ConversionTarget,
    patterns: &[&dyn ConversionPattern<C, E>],
    ctx: &C,
) -> Result<ConversionStats, E> {
    let mut stats = ConversionStats::default();

    loop {
        if stats.iterations >= MAX_CONVERSION_ITERATIONS {
            return Err(IrError::ConversionLimit(MAX_CONVERSION_ITERATIONS).into());
        }
        stats.iterations += 1;

        let mut changed = false;
        for op in module.walk() {
            if !module.is_attached(op) {
                continue;
            }
            let kind = module.kind(op);
            if target.is_legal(kind) {
                continue;
            }
            for pattern in patterns.iter().filter(|p| p.root() == kind) {
                if pattern.match_and_rewrite(module, op, ctx)? {
                    trace!(pattern = pattern.name(), op = %kind, "rewrote");
                    *stats.rewrites.entry(pattern.name()).or_insert(0) += 1;
                    changed = true;
                    break;
                }
            }
        }

        if !changed {
            break;
        }
    }

    let remaining = target.illegal_ops(module);
    if !remaining.is_empty() {
        let names = remaining
            .iter()
            .map(|&op| format!("{} at {}", module.kind(op), module.op(op).location))
            .collect();
        return Err(IrError::IllegalOperations(names).into());
    }

    debug!(
        iterations = stats.iterations,
        rewrites = stats.total_rewrites(),
        "full conversion finished"
    );
    Ok(stats)
}
