//! Traits for the server seam

use async_trait::async_trait;

use crate::types::*;
use crate::wire::*;

/// Access to the register endpoints
///
/// The close session only talks to the server through this trait.
#[async_trait]
pub trait CloseRegisterGateway: Send + Sync {
    /// Active denominations, as reference data
    async fn fetch_denominations(&self) -> ReconciliationResult<Vec<Denomination>>;

    /// Expected total and suggested breakdown for the open register
    async fn fetch_register_status(&self) -> ReconciliationResult<RegisterStatus>;

    /// Post a close-out. One attempt, no retry.
    ///
    /// Transport failures map to [`ReconciliationError::Network`]. A
    /// `success: false` body is returned as-is for the caller to interpret.
    async fn submit_close(
        &self,
        request: &CloseRegisterRequest,
    ) -> ReconciliationResult<CloseRegisterResponse>;
}
