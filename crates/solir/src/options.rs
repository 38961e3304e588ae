use crate::errors::Result;
use clap::Parser;
use solir_emit::EmitterConfig;
use std::ffi::OsString;

/// Program name prepended to a forwarded argument vector.
const PROGRAM_NAME: &str = "solir-ir-opts";

/// Generic IR printing and verification flags.
///
/// These arrive as a raw argument vector from the caller and are parsed here, before any lowering
/// happens.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = PROGRAM_NAME, disable_version_flag = true, args_override_self = true)]
pub struct IrOptions {
    /// Append source locations to every printed operation.
    #[arg(long = "print-debuginfo", alias = "mlir-print-debuginfo")]
    pub print_debuginfo: bool,

    /// Verify the module after every pass that modifies it.
    #[arg(long = "verify-each", alias = "mlir-verify-each")]
    pub verify_each: bool,

    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Accepted for compatibility; operations are always printed in generic form.
    #[arg(long = "mlir-print-op-generic")]
    pub print_op_generic: bool,

    /// Print `^bb0:` headers on entry blocks without arguments.
    #[arg(long = "print-entry-block-headers")]
    pub print_entry_block_headers: bool,

    /// Collect per-pass timing statistics.
    #[arg(long = "mlir-timing")]
    pub timing: bool,
}

impl IrOptions {
    pub fn emitter_config(&self) -> EmitterConfig {
        EmitterConfig {
            print_entry_block_headers: self.print_entry_block_headers,
            ..EmitterConfig::default()
        }
        .with_colors(!self.no_color)
        .with_debug_info(self.print_debuginfo)
    }
}

/// Parses a raw IR option vector. The vector holds flags only; no program name.
pub fn parse_ir_opts<I, S>(args: I) -> Result<IrOptions>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let argv = std::iter::once(OsString::from(PROGRAM_NAME)).chain(args.into_iter().map(Into::into));
    Ok(IrOptions::try_parse_from(argv)?)
}
