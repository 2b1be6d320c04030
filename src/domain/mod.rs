// Domain layer: value objects and ports. Adapters implement the ports.

pub mod model;
pub mod ports;
