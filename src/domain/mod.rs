// Domain layer: startup stages, launch plans and the ports the orchestrator drives.

pub mod model;
pub mod ports;
