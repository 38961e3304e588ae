use crate::config::EmitterConfig;
use crate::emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
use crate::ir_formatter_base::{IRFormatterBase, SSAContext};
use anyhow::Result;
use colored::Colorize;
use solir_core::{Location, Module, OpId, OpKind, RegionId};
use std::io::Write;

/// Prints a module in MLIR generic operation syntax.
///
/// SSA values are numbered `%0, %1, ...` and blocks `^bb0, ^bb1, ...`, both
/// restarting inside every op that is isolated from above.
pub struct SolirEmitter {
    config: EmitterConfig,
}

impl SolirEmitter {
    pub fn new(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    pub fn print(&self, module: &Module) -> Result<String> {
        let mut buffer = Vec::new();
        let mut context = EmitContext::from_config(&self.config);
        self.emit(module, &mut buffer, &mut context)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn emit_op<W: Write>(
        &self,
        module: &Module,
        op: OpId,
        writer: &mut W,
        context: &mut EmitContext,
        ssa: &mut SSAContext,
    ) -> EmitResult {
        let data = module.op(op);

        let mut line = String::new();
        if !data.results.is_empty() {
            line.push_str(&IRFormatterBase::format_values(&data.results, ssa));
            line.push_str(" = ");
        }
        line.push_str(&self.op_name(data.kind, context));
        line.push_str(&format!("({})", IRFormatterBase::format_values(&data.operands, ssa)));
        if !data.successors.is_empty() {
            let successors = data
                .successors
                .iter()
                .map(|&block| IRFormatterBase::format_block(block, ssa))
                .collect::<Vec<_>>()
                .join(", ");
            line.push_str(&format!("[{}]", successors));
        }
        let trailer = self.trailer(module, op);

        if data.regions.is_empty() {
            return EmitHelper::write_line(writer, context, &format!("{}{}", line, trailer));
        }

        let mut inner = SSAContext::new();
        let scope = if data.kind.is_isolated_from_above() {
            &mut inner
        } else {
            ssa
        };
        EmitHelper::write_line(writer, context, &format!("{} ({{", line))?;
        for (index, &region) in data.regions.iter().enumerate() {
            if index > 0 {
                EmitHelper::write_line(writer, context, "}, {")?;
            }
            self.emit_region(module, region, writer, context, scope)?;
        }
        EmitHelper::write_line(writer, context, &format!("}}){}", trailer))
    }

    fn emit_region<W: Write>(
        &self,
        module: &Module,
        region: RegionId,
        writer: &mut W,
        context: &mut EmitContext,
        ssa: &mut SSAContext,
    ) -> EmitResult {
        let blocks = &module.region(region).blocks;
        for &block in blocks {
            ssa.block_number(block);
        }

        for (index, &block) in blocks.iter().enumerate() {
            let show_header = index > 0
                || !module.block(block).args.is_empty()
                || self.config.print_entry_block_headers;
            if show_header {
                let header = IRFormatterBase::format_block_header(module, block, ssa);
                EmitHelper::write_line(writer, context, &header)?;
            }
            context.indent();
            for &op in &module.block(block).ops {
                self.emit_op(module, op, writer, context, ssa)?;
            }
            context.dedent();
        }
        Ok(())
    }

    fn op_name(&self, kind: OpKind, context: &EmitContext) -> String {
        let name = kind.to_string();
        if context.use_colors {
            format!("\"{}\"", name.cyan().bold())
        } else {
            format!("\"{}\"", name)
        }
    }

    /// ` {attrs} : (operands) -> results loc(...)`
    fn trailer(&self, module: &Module, op: OpId) -> String {
        let mut out = String::new();
        if let Some(attrs) = IRFormatterBase::format_attr_dict(module, op) {
            out.push(' ');
            out.push_str(&attrs);
        }
        out.push_str(" : ");
        out.push_str(&IRFormatterBase::format_signature(module, op));
        out.push_str(&self.location_suffix(&module.op(op).location));
        out
    }

    fn location_suffix(&self, location: &Location) -> String {
        if self.config.print_debug_info {
            format!(" {}", location)
        } else {
            String::new()
        }
    }
}

impl Default for SolirEmitter {
    fn default() -> Self {
        Self::new(EmitterConfig::default())
    }
}

impl Emitter for SolirEmitter {
    type Item = Module;

    fn emit<W: Write>(
        &self,
        module: &Module,
        writer: &mut W,
        context: &mut EmitContext,
    ) -> EmitResult {
        let footer = self.location_suffix(module.location());
        EmitHelper::write_block(writer, context, "module", &footer, |w, c| {
            let mut ssa = SSAContext::new();
            for &op in module.top_level_ops() {
                self.emit_op(module, op, w, c, &mut ssa)?;
            }
            Ok(())
        })
    }
}
