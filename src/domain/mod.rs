// Domain layer: the versioned map contract and the values it hands out.

pub mod model;
pub mod ports;
