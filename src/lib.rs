pub mod config;
pub mod core;
pub mod domain;
pub mod model;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{EngineConfig, LocalStorage, ScenarioBatch};

pub use crate::core::{InstrumentOverlay, ParameterStore, SimulationEngine, TrajectoryOrchestrator};
pub use domain::model::{ConvergenceStatus, ExportFormat, InstrumentVector, RunResult, SolverSettings};
pub use model::{ModelRegistry, RegistryBuilder};
pub use report::{FileExporter, ReportingAdapter};
pub use utils::error::{Ml2Error, Result};
