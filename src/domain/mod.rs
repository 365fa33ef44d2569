// Domain layer: plain data types and ports (interfaces) shared by the engine and its adapters.

pub mod model;
pub mod ports;
