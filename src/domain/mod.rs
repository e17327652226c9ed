// Domain layer: DTOs shared by the client core and the ports it depends on.

pub mod booking;
pub mod model;
pub mod ports;
