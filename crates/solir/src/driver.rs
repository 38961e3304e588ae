use crate::errors::{Error, Result};
use crate::job::{JobSpec, Target};
use crate::options::{parse_ir_opts, IrOptions};
use solir_core::{Module, PassManager, PassStatistics, SourceBuffer};
use solir_emit::print_module;
use solir_transform::ast::Contract;
use solir_transform::{transform_contracts_to_ir, EraVmLowering};
use std::ffi::OsString;
use tracing::{debug, info, info_span};

/// Result of a finished job.
#[derive(Debug)]
pub struct JobOutput {
    /// The high-level module, or the legalized one when the action asked for it.
    pub module: Module,
    /// Printed IR for the printing actions.
    pub ir: Option<String>,
    /// Per-pass timings, filled when `--mlir-timing` was given.
    pub statistics: Vec<PassStatistics>,
}

/// Lowers `contracts` to the high-level IR, verifies it and runs `job` on it.
///
/// `ir_args` is parsed first; a rejected option vector fails with [`Error::Config`] before any
/// lowering starts. Any later failure aborts the whole job.
pub fn run_solidity_to_ir<I, S>(
    contracts: &[Contract],
    source: &SourceBuffer,
    job: &JobSpec,
    ir_args: I,
) -> Result<JobOutput>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString> + Clone,
{
    let options = parse_ir_opts(ir_args)?;
    let _span = info_span!("job", action = ?job.action, target = %job.target).entered();

    let mut module = transform_contracts_to_ir(contracts, source)?;
    info!(contracts = contracts.len(), "lowered to high-level IR");

    let mut statistics = Vec::new();
    if job.action.needs_legalization() {
        let mut passes = pass_pipeline(job.target, &options);
        passes.run_all(&mut module).map_err(Error::Pass)?;

        if let Some(stats) = passes.get_pass::<EraVmLowering>().and_then(EraVmLowering::stats) {
            debug!(
                iterations = stats.iterations,
                rewrites = stats.total_rewrites(),
                "legalization converged"
            );
        }
        statistics = passes.statistics().to_vec();
        for stat in &statistics {
            info!(pass = %stat.name, duration = ?stat.duration, "pass finished");
        }
    }

    let ir = if job.action.prints() {
        Some(print_module(&module, &options.emitter_config()).map_err(Error::Print)?)
    } else {
        None
    };

    Ok(JobOutput {
        module,
        ir,
        statistics,
    })
}

fn pass_pipeline(target: Target, options: &IrOptions) -> PassManager {
    let mut passes = PassManager::new();
    passes.enable_verify_each(options.verify_each);
    if options.timing {
        passes.enable_statistics();
    }
    match target {
        Target::EraVm => passes.register_pass(EraVmLowering::new()),
    }
    passes
}
