//! Close-out validation rules
//!
//! The close dialog has gone through three rule sets over time. Each is a
//! [`CloseValidator`]; the configured [`ValidationMode`] picks one and callers
//! may inject their own.

use serde::{Deserialize, Serialize};

use crate::reconciliation::calculator::ReconciliationCalculator;
use crate::types::*;

/// Trait for implementing close-out validation rules
pub trait CloseValidator: Send + Sync {
    /// Validate a snapshot before it is submitted.
    ///
    /// `counts` is passed separately so rules can reject an empty count.
    fn validate_close(
        &self,
        calculator: &ReconciliationCalculator,
        counts: &DenominationCounts,
        snapshot: &ReconciliationSnapshot,
    ) -> ReconciliationResult<()>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Which built-in rule set to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Only require a non-empty count
    TotalOnly,
    /// Count plus a declared split that adds up to it
    Distribution,
    /// Count, split, and cash on hand backed by the count
    #[default]
    Breakdown,
}

impl ValidationMode {
    /// Build the validator for this mode
    pub fn validator(&self) -> Box<dyn CloseValidator> {
        match self {
            ValidationMode::TotalOnly => Box::new(TotalOnlyValidator),
            ValidationMode::Distribution => Box::new(DistributionValidator),
            ValidationMode::Breakdown => Box::new(BreakdownValidator),
        }
    }
}

fn require_counts(counts: &DenominationCounts) -> ReconciliationResult<()> {
    if counts.is_empty() {
        Err(ReconciliationError::NoCountsEntered)
    } else {
        Ok(())
    }
}

/// Accepts any non-empty count
pub struct TotalOnlyValidator;

impl CloseValidator for TotalOnlyValidator {
    fn validate_close(
        &self,
        _calculator: &ReconciliationCalculator,
        counts: &DenominationCounts,
        _snapshot: &ReconciliationSnapshot,
    ) -> ReconciliationResult<()> {
        require_counts(counts)
    }

    fn name(&self) -> &'static str {
        "total_only"
    }
}

/// Requires the declared split to match the counted total
pub struct DistributionValidator;

impl CloseValidator for DistributionValidator {
    fn validate_close(
        &self,
        calculator: &ReconciliationCalculator,
        counts: &DenominationCounts,
        snapshot: &ReconciliationSnapshot,
    ) -> ReconciliationResult<()> {
        require_counts(counts)?;
        calculator.validate_distribution(
            &snapshot.cash_on_hand,
            &snapshot.cash_stored,
            &snapshot.counted_total,
        )
    }

    fn name(&self) -> &'static str {
        "distribution"
    }
}

/// Distribution rules plus cash on hand backed by the denomination count
pub struct BreakdownValidator;

impl CloseValidator for BreakdownValidator {
    fn validate_close(
        &self,
        calculator: &ReconciliationCalculator,
        counts: &DenominationCounts,
        snapshot: &ReconciliationSnapshot,
    ) -> ReconciliationResult<()> {
        DistributionValidator.validate_close(calculator, counts, snapshot)?;
        calculator.validate_denomination_breakdown(&snapshot.counted_total, &snapshot.cash_on_hand)
    }

    fn name(&self) -> &'static str {
        "breakdown"
    }
}
