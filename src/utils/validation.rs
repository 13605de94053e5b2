//! Validation utilities for denomination reference data

use bigdecimal::BigDecimal;
use std::collections::HashSet;

use crate::types::*;

/// Validate that a face value is positive
pub fn validate_positive_value(denomination: &Denomination) -> ReconciliationResult<()> {
    if denomination.value <= BigDecimal::from(0) {
        Err(ReconciliationError::InvalidDenomination(format!(
            "denomination {} must have a positive value, got {}",
            denomination.id, denomination.value
        )))
    } else {
        Ok(())
    }
}

/// Validate a full denomination list.
///
/// Ids must be unique and no two denominations may share a face value.
pub fn validate_denominations(denominations: &[Denomination]) -> ReconciliationResult<()> {
    let mut ids = HashSet::new();
    let mut values = HashSet::new();

    for denomination in denominations {
        validate_positive_value(denomination)?;

        if !ids.insert(denomination.id) {
            return Err(ReconciliationError::InvalidDenomination(format!(
                "denomination id {} appears more than once",
                denomination.id
            )));
        }

        // normalized() so 1000 and 1000.00 collide
        if !values.insert(denomination.value.normalized()) {
            return Err(ReconciliationError::InvalidDenomination(format!(
                "face value {} appears more than once",
                denomination.value
            )));
        }
    }

    Ok(())
}

/// Bills first, then coins, each from highest to lowest value
pub fn sort_for_display(denominations: &mut [Denomination]) {
    denominations.sort_by(|a, b| {
        let rank = |kind: DenominationKind| match kind {
            DenominationKind::Bill => 0,
            DenominationKind::Coin => 1,
        };
        rank(a.kind)
            .cmp(&rank(b.kind))
            .then_with(|| b.value.cmp(&a.value))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_valid_denominations() {
        let denominations = vec![
            Denomination::bill(1, 50000),
            Denomination::bill(2, 20000),
            Denomination::coin(3, 500),
        ];
        assert!(validate_denominations(&denominations).is_ok());
    }

    #[test]
    fn test_rejects_non_positive_value() {
        let denominations = vec![Denomination::coin(1, 0)];
        assert!(matches!(
            validate_denominations(&denominations),
            Err(ReconciliationError::InvalidDenomination(_))
        ));
    }

    #[test]
    fn test_rejects_duplicate_id() {
        let denominations = vec![Denomination::bill(1, 50000), Denomination::bill(1, 20000)];
        assert!(validate_denominations(&denominations).is_err());
    }

    #[test]
    fn test_rejects_duplicate_value_with_different_scale() {
        let mut scaled = Denomination::bill(2, 0);
        scaled.value = BigDecimal::from_str("1000.00").unwrap();
        let denominations = vec![Denomination::bill(1, 1000), scaled];
        assert!(validate_denominations(&denominations).is_err());
    }

    #[test]
    fn test_sort_for_display() {
        let mut denominations = vec![
            Denomination::coin(1, 200),
            Denomination::bill(2, 2000),
            Denomination::coin(3, 1000),
            Denomination::bill(4, 100000),
        ];
        sort_for_display(&mut denominations);

        let ids: Vec<u64> = denominations.iter().map(|d| d.id.0).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }
}
