//! JSON contract with the register endpoints
//!
//! Field names follow the server. Amounts travel as JSON numbers and are
//! converted to [`BigDecimal`] at this boundary.

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::types::*;

/// Convert a wire amount into a decimal
pub fn amount_from_wire(value: f64) -> ReconciliationResult<BigDecimal> {
    if !value.is_finite() {
        return Err(ReconciliationError::InvalidAmount(format!(
            "non-finite amount {value}"
        )));
    }
    BigDecimal::from_str(&value.to_string())
        .map_err(|e| ReconciliationError::InvalidAmount(format!("{value}: {e}")))
}

/// Convert a decimal into a wire amount
pub fn amount_to_wire(value: &BigDecimal) -> ReconciliationResult<f64> {
    value
        .to_f64()
        .ok_or_else(|| ReconciliationError::InvalidAmount(format!("{value} does not fit in f64")))
}

/// One entry of the denominations endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenominationDto {
    pub id: u64,
    pub valor: f64,
    pub tipo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl DenominationDto {
    pub fn into_domain(self) -> ReconciliationResult<Denomination> {
        let value = amount_from_wire(self.valor)?;
        let kind = DenominationKind::from_server_code(&self.tipo)?;
        Ok(Denomination {
            id: DenominationId(self.id),
            value,
            kind,
            label: self.label,
        })
    }
}

/// Body of the denominations endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenominationsResponse {
    pub success: bool,
    #[serde(default)]
    pub denominaciones: Vec<DenominationDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DenominationsResponse {
    /// Domain denominations, or an empty list when the server reported failure
    pub fn into_domain(self) -> ReconciliationResult<Vec<Denomination>> {
        if !self.success {
            return Ok(Vec::new());
        }
        self.denominaciones
            .into_iter()
            .map(DenominationDto::into_domain)
            .collect()
    }
}

/// Body of the register status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterStatusResponse {
    pub success: bool,
    #[serde(default)]
    pub caja_id: Option<u64>,
    #[serde(default)]
    pub monto_inicial: f64,
    #[serde(default)]
    pub total_ingresos: f64,
    #[serde(default)]
    pub total_egresos: f64,
    #[serde(default)]
    pub total_disponible: f64,
    #[serde(default)]
    pub denominaciones_esperadas: HashMap<String, i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State of the open register as the close dialog needs it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterStatus {
    pub register_id: Option<u64>,
    pub opening_amount: BigDecimal,
    /// Drawer inflows since opening, excluding the opening float
    pub inflows_total: BigDecimal,
    /// Drawer outflows since opening
    pub outflows_total: BigDecimal,
    /// Amount that should be in the drawer
    pub expected_total: BigDecimal,
    /// Suggested breakdown used to prefill the count
    pub expected_counts: DenominationCounts,
}

impl RegisterStatus {
    pub fn new(expected_total: BigDecimal) -> Self {
        Self {
            register_id: None,
            opening_amount: BigDecimal::from(0),
            inflows_total: BigDecimal::from(0),
            outflows_total: BigDecimal::from(0),
            expected_total,
            expected_counts: DenominationCounts::new(),
        }
    }

    pub fn with_expected_counts(mut self, counts: DenominationCounts) -> Self {
        self.expected_counts = counts;
        self
    }
}

impl RegisterStatusResponse {
    pub fn into_domain(self) -> ReconciliationResult<RegisterStatus> {
        if !self.success {
            return Err(ReconciliationError::Rejected(
                self.error
                    .unwrap_or_else(|| "could not read the register status".to_string()),
            ));
        }

        let mut expected_counts = DenominationCounts::new();
        for (id, quantity) in &self.denominaciones_esperadas {
            expected_counts.record(id.parse::<DenominationId>()?, *quantity);
        }

        Ok(RegisterStatus {
            register_id: self.caja_id,
            opening_amount: amount_from_wire(self.monto_inicial)?,
            inflows_total: amount_from_wire(self.total_ingresos)?,
            outflows_total: amount_from_wire(self.total_egresos)?,
            expected_total: amount_from_wire(self.total_disponible)?,
            expected_counts,
        })
    }
}

/// Close-out payload posted to the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseRegisterRequest {
    /// Counted total; the server stores it as the declared final amount
    pub monto_declarado: f64,
    pub conteos: DenominationCounts,
    pub dinero_en_caja: f64,
    pub dinero_guardado: f64,
    pub observaciones: String,
}

/// Server answer to a close-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseRegisterResponse {
    pub success: bool,
    #[serde(default)]
    pub diferencia: f64,
    #[serde(default)]
    pub monto_final_declarado: f64,
    #[serde(default)]
    pub monto_final_sistema: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
