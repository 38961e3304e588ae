use crate::{module::Module, verifier};
use anyhow::{Context, Result};
use std::any::Any;
use std::time::{Duration, Instant};
use tracing::debug;

pub trait Pass {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "No description provided"
    }

    fn run_on_module(&mut self, module: &mut Module) -> Result<()>;

    fn modifies_ir(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug, Clone)]
pub struct PassStatistics {
    pub name: String,
    pub duration: Duration,
}

pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    statistics: Vec<PassStatistics>,
    collect_stats: bool,
    verify_each: bool,
}

impl PassManager {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            statistics: Vec::new(),
            collect_stats: false,
            verify_each: false,
        }
    }

    pub fn enable_statistics(&mut self) {
        self.collect_stats = true;
    }

    pub fn enable_verify_each(&mut self, enabled: bool) {
        self.verify_each = enabled;
    }

    pub fn register_pass<P: Pass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn run_all(&mut self, module: &mut Module) -> Result<()> {
        for pass in self.passes.iter_mut() {
            let start = if self.collect_stats {
                Some(Instant::now())
            } else {
                None
            };

            debug!(pass = pass.name(), "running pass");
            pass.run_on_module(module)
                .with_context(|| format!("pass '{}' failed", pass.name()))?;

            if self.verify_each && pass.modifies_ir() {
                verifier::verify(module)
                    .with_context(|| format!("module invalid after pass '{}'", pass.name()))?;
            }

            if let Some(start) = start {
                self.statistics.push(PassStatistics {
                    name: pass.name().to_string(),
                    duration: start.elapsed(),
                });
            }
        }

        Ok(())
    }

    pub fn statistics(&self) -> &[PassStatistics] {
        &self.statistics
    }

    pub fn get_pass<P: Pass + 'static>(&self) -> Option<&P> {
        self.passes
            .iter()
            .find_map(|p| p.as_any().downcast_ref::<P>())
    }

    pub fn get_pass_mut<P: Pass + 'static>(&mut self) -> Option<&mut P> {
        self.passes
            .iter_mut()
            .find_map(|p| p.as_any_mut().downcast_mut::<P>())
    }
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new()
    }
}
