//! In-memory gateway implementation for testing

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;
use crate::wire::*;

#[derive(Debug)]
struct RegisterState {
    denominations: Vec<Denomination>,
    status: RegisterStatus,
    open: bool,
    submissions: Vec<CloseRegisterRequest>,
    next_failure: Option<ReconciliationError>,
}

/// In-memory register that answers like the server's close view
#[derive(Debug, Clone)]
pub struct MemoryGateway {
    state: Arc<RwLock<RegisterState>>,
}

impl MemoryGateway {
    /// Create an open register with the given reference data and status
    pub fn new(denominations: Vec<Denomination>, status: RegisterStatus) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegisterState {
                denominations,
                status,
                open: true,
                submissions: Vec::new(),
                next_failure: None,
            })),
        }
    }

    fn read(&self) -> ReconciliationResult<RwLockReadGuard<'_, RegisterState>> {
        self.state
            .read()
            .map_err(|_| ReconciliationError::Network("gateway state poisoned".to_string()))
    }

    fn write(&self) -> ReconciliationResult<RwLockWriteGuard<'_, RegisterState>> {
        self.state
            .write()
            .map_err(|_| ReconciliationError::Network("gateway state poisoned".to_string()))
    }

    /// Make the next `submit_close` fail with `error`
    pub fn fail_next_submit(&self, error: ReconciliationError) {
        if let Ok(mut state) = self.state.write() {
            state.next_failure = Some(error);
        }
    }

    /// Every close-out request accepted or attempted so far
    pub fn submissions(&self) -> Vec<CloseRegisterRequest> {
        self.state
            .read()
            .map(|state| state.submissions.clone())
            .unwrap_or_default()
    }

    /// Whether the register is still open
    pub fn is_open(&self) -> bool {
        self.state.read().map(|state| state.open).unwrap_or(false)
    }
}

#[async_trait]
impl CloseRegisterGateway for MemoryGateway {
    async fn fetch_denominations(&self) -> ReconciliationResult<Vec<Denomination>> {
        Ok(self.read()?.denominations.clone())
    }

    async fn fetch_register_status(&self) -> ReconciliationResult<RegisterStatus> {
        let state = self.read()?;
        if !state.open {
            return Err(ReconciliationError::Rejected(
                "no open register".to_string(),
            ));
        }
        Ok(state.status.clone())
    }

    async fn submit_close(
        &self,
        request: &CloseRegisterRequest,
    ) -> ReconciliationResult<CloseRegisterResponse> {
        let mut state = self.write()?;
        state.submissions.push(request.clone());

        if let Some(error) = state.next_failure.take() {
            return Err(error);
        }

        if !state.open {
            return Ok(CloseRegisterResponse {
                success: false,
                diferencia: 0.0,
                monto_final_declarado: 0.0,
                monto_final_sistema: 0.0,
                message: None,
                error: Some("no open register".to_string()),
            });
        }

        if request.monto_declarado < 0.0 {
            return Ok(CloseRegisterResponse {
                success: false,
                diferencia: 0.0,
                monto_final_declarado: 0.0,
                monto_final_sistema: 0.0,
                message: None,
                error: Some("invalid declared amount".to_string()),
            });
        }

        let declared = amount_from_wire(request.monto_declarado)?;
        let system = state.status.expected_total.clone();
        let difference: BigDecimal = &declared - &system;

        state.open = false;

        Ok(CloseRegisterResponse {
            success: true,
            diferencia: amount_to_wire(&difference)?,
            monto_final_declarado: amount_to_wire(&declared)?,
            monto_final_sistema: amount_to_wire(&system)?,
            message: Some("register closed".to_string()),
            error: None,
        })
    }
}
