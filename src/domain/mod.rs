// Domain layer: step models and the executor port. No process or file handling here.

pub mod model;
pub mod ports;
