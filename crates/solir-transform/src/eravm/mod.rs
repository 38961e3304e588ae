/*! Legalize high-level solir for EraVM.
 *
 * Deployable containers are split into an `__entry` function that sets up the ABI globals and
 * dispatches on the constructor bit of the call flags, a `__deploy` function holding constructor
 * code, and a `__runtime` function holding the code of the `_deployed` object. Contract functions
 * are hoisted to module level and every remaining `sol`, `func`, `arith` and `memref` op is rewritten
 * into the `llvm` dialect by a full conversion.
 */

pub mod constants;
mod containers;
mod patterns;

use crate::errors::Result;
use solir_core::{
    apply_full_conversion, verify, ConversionPattern, ConversionStats, ConversionTarget, Dialect,
    Module, OpId, Pass,
};
use std::any::Any;
use std::collections::HashMap;
use tracing::{debug, info_span};

pub use constants::{AbiGlobal, AbiGlobals, AddrSpace, RetForwardPageType};
pub use containers::{classify_functions, hoist_functions, lower_containers};
pub use patterns::{immutables_size, lowering_patterns};

use crate::errors::TransformError;
use constants::RUNTIME_SUFFIX;

/// Which half of a contract's code an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeContext {
    Deploy,
    Runtime,
}

impl CodeContext {
    pub fn from_is_runtime(is_runtime: bool) -> Self {
        if is_runtime {
            CodeContext::Runtime
        } else {
            CodeContext::Deploy
        }
    }

    pub fn from_container_name(name: &str) -> Self {
        Self::from_is_runtime(name.ends_with(RUNTIME_SUFFIX))
    }
}

/// State shared by the lowering patterns.
#[derive(Debug, Clone, Default)]
pub struct LegalizeContext {
    pub contexts: HashMap<OpId, CodeContext>,
}

impl LegalizeContext {
    /// Context of the closest enclosing classified function.
    pub fn context_of(&self, module: &Module, op: OpId) -> Option<CodeContext> {
        module
            .ancestors(op)
            .into_iter()
            .find_map(|ancestor| self.contexts.get(&ancestor).copied())
    }
}

/// Runs the whole EraVM legalization on `module` and verifies the result.
pub fn legalize(module: &mut Module) -> Result<ConversionStats> {
    let _span = info_span!("eravm_legalize").entered();

    let globals = AbiGlobals::new();
    lower_containers(module, &globals)?;
    let ctx = LegalizeContext {
        contexts: classify_functions(module),
    };
    let hoisted = hoist_functions(module)?;

    let mut target = ConversionTarget::new();
    target.add_legal_dialect(Dialect::Llvm);

    let owned = lowering_patterns();
    let patterns: Vec<&dyn ConversionPattern<LegalizeContext, TransformError>> =
        owned.iter().map(|p| p.as_ref()).collect();
    let stats = apply_full_conversion(module, &target, &patterns, &ctx)?;

    verify(module)?;
    debug!(
        hoisted,
        rewrites = stats.total_rewrites(),
        iterations = stats.iterations,
        "module legalized for EraVM"
    );
    Ok(stats)
}

/// [`legalize`] as a pass for the core pass manager.
#[derive(Debug, Default)]
pub struct EraVmLowering {
    stats: Option<ConversionStats>,
}

impl EraVmLowering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statistics of the last run.
    pub fn stats(&self) -> Option<&ConversionStats> {
        self.stats.as_ref()
    }
}

impl Pass for EraVmLowering {
    fn name(&self) -> &'static str {
        "eravm-legalize"
    }

    fn description(&self) -> &'static str {
        "Lowers sol, func, arith and memref ops to the llvm dialect for EraVM"
    }

    fn run_on_module(&mut self, module: &mut Module) -> anyhow::Result<()> {
        self.stats = Some(legalize(module)?);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
