//! What the system expects to find in the drawer

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Movement code the server uses for the opening float
pub const OPENING_MOVEMENT_CODE: &str = "APERTURA";

/// Direction of a register movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MovementDirection {
    Inflow,
    Outflow,
}

/// Where the cash of a movement physically ends up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementDestination {
    #[default]
    Drawer,
    /// Deposited straight to the bank; never in the drawer
    Bank,
}

/// A single register movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashMovement {
    pub direction: MovementDirection,
    pub amount: BigDecimal,
    /// Movement type code (e.g. `APERTURA`, `VENTA`)
    pub code: String,
    pub destination: MovementDestination,
}

impl CashMovement {
    pub fn inflow(code: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            direction: MovementDirection::Inflow,
            amount,
            code: code.into(),
            destination: MovementDestination::Drawer,
        }
    }

    pub fn outflow(code: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            direction: MovementDirection::Outflow,
            amount,
            code: code.into(),
            destination: MovementDestination::Drawer,
        }
    }

    /// Mark the movement as bank-destined
    pub fn to_bank(mut self) -> Self {
        self.destination = MovementDestination::Bank;
        self
    }

    fn affects_drawer(&self) -> bool {
        if self.destination == MovementDestination::Bank {
            return false;
        }
        // The opening float is already counted in the opening amount.
        !(self.direction == MovementDirection::Inflow
            && self.code.eq_ignore_ascii_case(OPENING_MOVEMENT_CODE))
    }
}

/// Opening float plus drawer inflows minus drawer outflows
pub fn compute_expected_total(opening_amount: &BigDecimal, movements: &[CashMovement]) -> BigDecimal {
    let inflows: BigDecimal = movements
        .iter()
        .filter(|m| m.direction == MovementDirection::Inflow && m.affects_drawer())
        .map(|m| &m.amount)
        .sum();
    let outflows: BigDecimal = movements
        .iter()
        .filter(|m| m.direction == MovementDirection::Outflow && m.affects_drawer())
        .map(|m| &m.amount)
        .sum();

    opening_amount + &inflows - &outflows
}

/// Greedy breakdown of `total` from the largest denomination down.
///
/// Used only to prefill the count; the real drawer mix will differ. Any
/// remainder smaller than the smallest denomination is left uncounted.
pub fn expected_denominations(
    total: &BigDecimal,
    denominations: &[Denomination],
) -> DenominationCounts {
    let mut ordered: Vec<&Denomination> = denominations
        .iter()
        .filter(|d| d.value > BigDecimal::from(0))
        .collect();
    ordered.sort_by(|a, b| b.value.cmp(&a.value));

    let mut counts = DenominationCounts::new();
    let mut remaining = total.clone();

    for denomination in ordered {
        if remaining < denomination.value {
            continue;
        }
        // with_scale(0) truncates the quotient to whole units
        let units = (&remaining / &denomination.value).with_scale(0);
        remaining -= &(&denomination.value * &units);
        counts.insert(denomination.id, units.to_u64().unwrap_or(u64::MAX));
    }

    counts
}
