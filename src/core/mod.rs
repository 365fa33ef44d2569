pub mod engine;
pub mod overlay;
pub mod parameters;
pub mod solver;
pub mod trajectory;

pub use crate::domain::model::{ConvergenceRecord, ConvergenceStatus, RunResult, YearState};
pub use crate::domain::ports::{ConfigProvider, ReportSink, Storage};
pub use crate::utils::error::Result;
pub use engine::SimulationEngine;
pub use overlay::InstrumentOverlay;
pub use parameters::{Calibration, ParameterStore, ParameterView};
pub use solver::YearSolver;
pub use trajectory::{Trajectory, TrajectoryOrchestrator};
