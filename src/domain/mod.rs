// Domain layer: models, label taxonomy and ports. No I/O here.

pub mod model;
pub mod ports;
pub mod taxonomy;
