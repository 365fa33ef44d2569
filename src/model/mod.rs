// Model layer: the registry abstraction and the concrete ML2 equation set.

pub mod frame;
pub mod ml2;
pub mod registry;
pub mod scalars;

pub use frame::Frame;
pub use registry::{
    EquationType, IndicatorSlots, InstrumentSpec, ModelRegistry, RegistryBuilder, VariableDecl,
};
pub use scalars::Ml2Scalars;
