//! Cash drawer reconciliation: counting, validation and the close dialog session

pub mod calculator;
pub mod expected;
pub mod session;
pub mod validators;

pub use calculator::*;
pub use expected::*;
pub use session::*;
pub use validators::*;
