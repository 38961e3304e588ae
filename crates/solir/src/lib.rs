/*! Unified interface for the solir backend.
 *
 * A single import for lowering a resolved Solidity AST to the high-level IR, legalizing it for
 * EraVM and printing the result. `run_solidity_to_ir` drives a whole job; the member crates are
 * re-exported for callers that need to work on the IR directly.
 */

mod driver;
mod errors;
mod job;
mod options;

pub use solir_core as core;
pub use solir_emit as emit;
pub use solir_transform as transform;

pub use solir_core::{Location, Module, SourceBuffer};
pub use solir_emit::{print_module, EmitterConfig, SolirEmitter};
pub use solir_transform::ast::{contracts_from_json, Contract};
pub use solir_transform::{legalize, transform_contracts_to_ir, EraVmLowering, TransformError};

pub use driver::{run_solidity_to_ir, JobOutput};
pub use errors::{Error, Result};
pub use job::{Action, JobSpec, Target};
pub use options::{parse_ir_opts, IrOptions};
