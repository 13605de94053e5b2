//! Cash reconciliation arithmetic: counted totals, variance and the
//! distribution/breakdown checks run before a close-out is accepted.

use bigdecimal::BigDecimal;
use std::collections::HashMap;

use crate::types::*;

/// Reconciliation calculator with a fixed comparison tolerance
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationCalculator {
    tolerance: BigDecimal,
}

impl Default for ReconciliationCalculator {
    fn default() -> Self {
        Self::new(default_tolerance())
    }
}

impl ReconciliationCalculator {
    /// Create a calculator with an explicit tolerance
    pub fn new(tolerance: BigDecimal) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    pub fn tolerance(&self) -> &BigDecimal {
        &self.tolerance
    }

    /// Whether two amounts differ by more than the tolerance
    pub fn differs(&self, a: &BigDecimal, b: &BigDecimal) -> bool {
        (a - b).abs() > self.tolerance
    }

    /// Sum `value * quantity` over the counted denominations.
    ///
    /// Ids with no matching denomination contribute nothing.
    pub fn counted_total(
        &self,
        counts: &DenominationCounts,
        denominations: &[Denomination],
    ) -> BigDecimal {
        let values: HashMap<DenominationId, &BigDecimal> =
            denominations.iter().map(|d| (d.id, &d.value)).collect();

        counts
            .iter()
            .filter(|(_, quantity)| *quantity > 0)
            .filter_map(|(id, quantity)| {
                values
                    .get(&id)
                    .map(|value| *value * &BigDecimal::from(quantity))
            })
            .sum()
    }

    /// Counted minus expected, classified against the tolerance
    pub fn variance(&self, counted_total: &BigDecimal, expected_total: &BigDecimal) -> Variance {
        self.classify(counted_total - expected_total)
    }

    /// Classify an already computed signed difference
    pub fn classify(&self, amount: BigDecimal) -> Variance {
        let classification = if amount > self.tolerance {
            VarianceClassification::Surplus
        } else if amount < -self.tolerance.clone() {
            VarianceClassification::Shortage
        } else {
            VarianceClassification::Balanced
        };

        Variance {
            amount,
            classification,
        }
    }

    /// Check that the declared split adds up to the counted total.
    ///
    /// Negative declared amounts are rejected before the sum is compared.
    pub fn validate_distribution(
        &self,
        cash_on_hand: &BigDecimal,
        cash_stored: &BigDecimal,
        counted_total: &BigDecimal,
    ) -> ReconciliationResult<()> {
        let zero = BigDecimal::from(0);
        for (field, amount) in [("cash on hand", cash_on_hand), ("cash stored", cash_stored)] {
            if *amount < zero {
                return Err(ReconciliationError::InvalidAmount(format!(
                    "{field} cannot be negative, got {amount}"
                )));
            }
        }
        if *cash_on_hand == zero && *cash_stored == zero {
            return Err(ReconciliationError::EmptyDistribution);
        }

        let declared = cash_on_hand + cash_stored;
        if self.differs(&declared, counted_total) {
            return Err(ReconciliationError::DistributionMismatch {
                declared,
                counted: counted_total.clone(),
            });
        }

        Ok(())
    }

    /// Check that the cash left in the drawer is backed by the denomination count.
    ///
    /// Only applies when some cash is declared as on hand.
    pub fn validate_denomination_breakdown(
        &self,
        counted_total: &BigDecimal,
        cash_on_hand: &BigDecimal,
    ) -> ReconciliationResult<()> {
        if *cash_on_hand > BigDecimal::from(0) && self.differs(counted_total, cash_on_hand) {
            return Err(ReconciliationError::BreakdownMismatch {
                counted: counted_total.clone(),
                cash_on_hand: cash_on_hand.clone(),
            });
        }
        Ok(())
    }
}

/// Sum `value * quantity` using the default tolerance calculator
pub fn compute_counted_total(
    counts: &DenominationCounts,
    denominations: &[Denomination],
) -> BigDecimal {
    ReconciliationCalculator::default().counted_total(counts, denominations)
}

/// Variance between counted and expected totals with the default tolerance
pub fn compute_variance(counted_total: &BigDecimal, expected_total: &BigDecimal) -> Variance {
    ReconciliationCalculator::default().variance(counted_total, expected_total)
}

/// Validate the declared split with the default tolerance
pub fn validate_distribution(
    cash_on_hand: &BigDecimal,
    cash_stored: &BigDecimal,
    counted_total: &BigDecimal,
) -> ReconciliationResult<()> {
    ReconciliationCalculator::default().validate_distribution(
        cash_on_hand,
        cash_stored,
        counted_total,
    )
}

/// Validate the denomination breakdown with the default tolerance
pub fn validate_denomination_breakdown(
    counted_total: &BigDecimal,
    cash_on_hand: &BigDecimal,
) -> ReconciliationResult<()> {
    ReconciliationCalculator::default().validate_denomination_breakdown(counted_total, cash_on_hand)
}
