// Domain layer: the records every workflow produces and the ports the adapters implement.

pub mod model;
pub mod ports;
