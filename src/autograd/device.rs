//! Execution device selector

/// Where model state lives and forward/backward passes execute.
///
/// The in-crate engine runs on the CPU only. `Cuda` exists so that a model
/// backed by an accelerator-capable engine can be driven by the same
/// training loop; with the built-in engine, requesting it is an error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Device {
    #[default]
    Cpu,
    Cuda,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}
