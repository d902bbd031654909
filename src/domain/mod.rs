//! Domain layer: entities, value objects and the ports the application
//! layer depends on.

pub mod money;
pub mod ports;
pub mod pricing;
pub mod ride;
pub mod user;
