//! Utility modules

pub mod memory_gateway;
pub mod money;
pub mod validation;

pub use memory_gateway::*;
pub use money::*;
pub use validation::*;
