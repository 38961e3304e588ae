/*! Builders for constructing IR.
 *
 * `OpBuilder` owns an insertion point into a `Module`; `InstBuilder` layers one helper per
 * operation kind on top of it, checking operand types before anything is inserted so that a
 * failed build never leaves a malformed op behind.
 */

pub mod inst_builder;
pub mod op_builder;

pub use inst_builder::{InstBuilder, InstBuilderBase};
pub use op_builder::{InsertPoint, OpBuilder};
