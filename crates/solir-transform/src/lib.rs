/*! Lower Solidity to solir and legalize it for EraVM.
 *
 * Two stages live here. `solidity_to_ir` turns the front end's resolved AST into the high-level
 * `sol`/`func`/`arith`/`memref` form, keeping every source variable in a memory cell and making each
 * integer conversion explicit. `eravm` then rewrites that module into the `llvm` dialect with the
 * entry, deploy and runtime functions the EraVM ABI expects.
 */

pub mod ast;
pub mod eravm;
mod errors;
pub mod solidity_to_ir;

pub use errors::{Result, TransformError};
pub use eravm::{legalize, EraVmLowering};
pub use solidity_to_ir::transform_contracts_to_ir;
