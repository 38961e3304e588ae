/*! Print solir modules as text.
 *
 * Both stages of the pipeline are printed the same way: MLIR generic operation syntax with `%N`
 * values, `^bbN` blocks and attribute dictionaries in insertion order. Locations and colored op names
 * are opt-in so the default output is stable enough to diff and snapshot.
 */

pub mod config;
pub mod emitter;
pub mod ir_formatter_base;
pub mod solir_emitter;

pub use config::{EmitterConfig, IndentStyle};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
pub use ir_formatter_base::{IRFormatterBase, SSAContext};
pub use solir_emitter::SolirEmitter;

/// Prints `module` with the given configuration.
pub fn print_module(module: &solir_core::Module, config: &EmitterConfig) -> anyhow::Result<String> {
    SolirEmitter::new(config.clone()).print(module)
}
