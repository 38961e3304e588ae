use std::fmt;

/// What to do with the verified high-level module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    /// Print the module as produced from the AST.
    #[default]
    PrintInitIr,
    /// Legalize for the target and print the low-level module.
    PrintLowLevelIr,
    /// Legalize for the target and print nothing.
    VerifyOnly,
}

impl Action {
    pub fn needs_legalization(self) -> bool {
        !matches!(self, Action::PrintInitIr)
    }

    pub fn prints(self) -> bool {
        !matches!(self, Action::VerifyOnly)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    EraVm,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::EraVm => f.write_str("eravm"),
        }
    }
}

/// A compilation job. Lowering never inspects it; only the driver does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JobSpec {
    pub action: Action,
    pub target: Target,
}

impl JobSpec {
    pub fn new(action: Action, target: Target) -> Self {
        Self { action, target }
    }
}
