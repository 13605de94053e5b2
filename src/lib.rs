//! # Caja Core
//!
//! Cash register close-out for a small retail business: denomination counts,
//! drawer reconciliation, variance classification and the close-register
//! contract with the server.
//!
//! ## Features
//!
//! - **Counting**: sum bills and coins from operator-entered quantities
//! - **Variance**: counted vs. expected cash, classified as surplus, shortage or balanced
//! - **Distribution checks**: cash left in the drawer plus cash stored must match the count
//! - **Close session**: typed dialog state with synchronous revalidation on every input
//! - **Expected cash**: system total from register movements and a suggested breakdown
//! - **Gateway abstraction**: in-memory and (with the `http` feature) HTTP implementations
//!
//! ## Quick Start
//!
//! ```rust
//! use caja_core::{
//!     CloseRegisterSession, Denomination, DenominationId, ReconciliationConfig, RegisterStatus,
//! };
//! use bigdecimal::BigDecimal;
//!
//! let denominations = vec![Denomination::bill(1, 50000), Denomination::coin(2, 500)];
//! let status = RegisterStatus::new(BigDecimal::from(51000));
//! let mut session =
//!     CloseRegisterSession::open(denominations, status, &ReconciliationConfig::default()).unwrap();
//!
//! session.set_count(DenominationId(1), 1).unwrap();
//! session.set_count(DenominationId(2), 2).unwrap();
//!
//! assert!(session.state().is_valid());
//! assert!(session.variance().is_balanced());
//! ```

pub mod config;
#[cfg(feature = "http")]
pub mod http_gateway;
pub mod observability;
pub mod reconciliation;
pub mod traits;
pub mod types;
pub mod utils;
pub mod wire;

// Re-export commonly used types
pub use config::*;
#[cfg(feature = "http")]
pub use http_gateway::HttpGateway;
pub use reconciliation::*;
pub use traits::*;
pub use types::*;
pub use wire::*;
