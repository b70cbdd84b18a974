// Domain layer: card model and ports (interfaces). No browser or file I/O here.

pub mod model;
pub mod ports;
