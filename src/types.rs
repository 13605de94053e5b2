//! Core types and data structures for the cash register close-out

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default comparison tolerance: one peso.
pub const DEFAULT_TOLERANCE: &str = "0.01";

/// Parse [`DEFAULT_TOLERANCE`] into a decimal.
pub fn default_tolerance() -> BigDecimal {
    // The literal is a valid decimal.
    BigDecimal::from_str(DEFAULT_TOLERANCE).unwrap_or_else(|_| BigDecimal::from(0))
}

/// Identifier of a denomination as assigned by the server
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DenominationId(pub u64);

impl fmt::Display for DenominationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DenominationId {
    type Err = ReconciliationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(DenominationId)
            .map_err(|_| {
                ReconciliationError::InvalidDenomination(format!("invalid denomination id '{s}'"))
            })
    }
}

/// Physical form of a denomination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenominationKind {
    /// Paper bill
    Bill,
    /// Coin
    Coin,
}

impl DenominationKind {
    /// Parse the server's `tipo` field (`BILLETE` / `MONEDA`), case-insensitive
    pub fn from_server_code(code: &str) -> ReconciliationResult<Self> {
        match code.trim().to_uppercase().as_str() {
            "BILLETE" => Ok(DenominationKind::Bill),
            "MONEDA" => Ok(DenominationKind::Coin),
            other => Err(ReconciliationError::InvalidDenomination(format!(
                "unknown denomination kind '{other}'"
            ))),
        }
    }

    /// Server code for this kind
    pub fn server_code(&self) -> &'static str {
        match self {
            DenominationKind::Bill => "BILLETE",
            DenominationKind::Coin => "MONEDA",
        }
    }
}

/// A bill or coin with a fixed face value. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Denomination {
    /// Server identifier
    pub id: DenominationId,
    /// Face value in whole pesos
    pub value: BigDecimal,
    /// Bill or coin
    pub kind: DenominationKind,
    /// Optional display label supplied by the server
    pub label: Option<String>,
}

impl Denomination {
    /// Create a new denomination
    pub fn new(id: DenominationId, value: BigDecimal, kind: DenominationKind) -> Self {
        Self {
            id,
            value,
            kind,
            label: None,
        }
    }

    /// Shorthand for a bill
    pub fn bill(id: u64, value: i64) -> Self {
        Self::new(DenominationId(id), BigDecimal::from(value), DenominationKind::Bill)
    }

    /// Shorthand for a coin
    pub fn coin(id: u64, value: i64) -> Self {
        Self::new(DenominationId(id), BigDecimal::from(value), DenominationKind::Coin)
    }

    /// Attach a display label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Subtotal for a quantity of this denomination
    pub fn subtotal(&self, quantity: u64) -> BigDecimal {
        &self.value * &BigDecimal::from(quantity)
    }
}

/// Operator-entered quantities per denomination.
///
/// Only strictly positive quantities are stored; recording zero removes the
/// entry. Ordered by id so serialized payloads are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<DenominationId, u64>",
    into = "BTreeMap<DenominationId, u64>"
)]
pub struct DenominationCounts(BTreeMap<DenominationId, u64>);

impl DenominationCounts {
    /// Empty count
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a quantity. Zero and negative quantities clear the entry.
    pub fn record(&mut self, id: DenominationId, quantity: i64) {
        match u64::try_from(quantity) {
            Ok(q) => self.insert(id, q),
            Err(_) => {
                self.0.remove(&id);
            }
        }
    }

    /// Set an unsigned quantity; zero clears the entry
    pub fn insert(&mut self, id: DenominationId, quantity: u64) {
        if quantity == 0 {
            self.0.remove(&id);
        } else {
            self.0.insert(id, quantity);
        }
    }

    /// Record a quantity typed by the operator; unparseable text counts as zero
    pub fn record_input(&mut self, id: DenominationId, input: &str) {
        let quantity = crate::utils::money::parse_quantity_input(input);
        self.record(id, quantity);
    }

    /// Quantity for a denomination (zero if absent)
    pub fn quantity(&self, id: DenominationId) -> u64 {
        self.0.get(&id).copied().unwrap_or(0)
    }

    /// Whether no denomination has a positive quantity
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of denominations with a positive quantity
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Keep only the denominations accepted by `keep`
    pub fn retain<F: FnMut(DenominationId) -> bool>(&mut self, mut keep: F) {
        self.0.retain(|id, _| keep(*id));
    }

    /// Iterate over `(id, quantity)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (DenominationId, u64)> + '_ {
        self.0.iter().map(|(id, q)| (*id, *q))
    }

    /// Borrow the underlying map
    pub fn as_map(&self) -> &BTreeMap<DenominationId, u64> {
        &self.0
    }
}

impl FromIterator<(DenominationId, i64)> for DenominationCounts {
    fn from_iter<T: IntoIterator<Item = (DenominationId, i64)>>(iter: T) -> Self {
        let mut counts = Self::new();
        for (id, quantity) in iter {
            counts.record(id, quantity);
        }
        counts
    }
}

// Zero entries in a payload are dropped on the way in.
impl From<BTreeMap<DenominationId, u64>> for DenominationCounts {
    fn from(map: BTreeMap<DenominationId, u64>) -> Self {
        let mut counts = Self::new();
        for (id, quantity) in map {
            counts.insert(id, quantity);
        }
        counts
    }
}

impl From<DenominationCounts> for BTreeMap<DenominationId, u64> {
    fn from(counts: DenominationCounts) -> Self {
        counts.0
    }
}

/// Sign of a variance once the tolerance is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VarianceClassification {
    /// More cash than expected
    Surplus,
    /// Less cash than expected
    Shortage,
    /// Within tolerance
    Balanced,
}

/// Counted total minus expected total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variance {
    /// Signed difference
    pub amount: BigDecimal,
    pub classification: VarianceClassification,
}

impl Variance {
    pub fn is_balanced(&self) -> bool {
        self.classification == VarianceClassification::Balanced
    }
}

/// Point-in-time view of the figures being reconciled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSnapshot {
    /// What the system says should be in the drawer
    pub expected_total: BigDecimal,
    /// Sum of the denomination count
    pub counted_total: BigDecimal,
    /// Declared amount left in the drawer
    pub cash_on_hand: BigDecimal,
    /// Declared amount taken out for safekeeping
    pub cash_stored: BigDecimal,
}

impl ReconciliationSnapshot {
    /// Sum of the two declared amounts
    pub fn declared_total(&self) -> BigDecimal {
        &self.cash_on_hand + &self.cash_stored
    }
}

/// Errors raised while reconciling or submitting a close-out
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReconciliationError {
    #[error("at least one of cash on hand or cash stored must be greater than zero")]
    EmptyDistribution,
    #[error("declared distribution ({declared}) does not match the counted total ({counted})")]
    DistributionMismatch {
        declared: BigDecimal,
        counted: BigDecimal,
    },
    #[error("denomination count ({counted}) does not match cash on hand ({cash_on_hand})")]
    BreakdownMismatch {
        counted: BigDecimal,
        cash_on_hand: BigDecimal,
    },
    #[error("enter a quantity for at least one denomination")]
    NoCountsEntered,
    #[error("network error: {0}")]
    Network(String),
    #[error("server rejected the close-out: {0}")]
    Rejected(String),
    #[error("invalid denomination: {0}")]
    InvalidDenomination(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ReconciliationError {
    /// Whether the operator can fix this by correcting input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ReconciliationError::EmptyDistribution
                | ReconciliationError::DistributionMismatch { .. }
                | ReconciliationError::BreakdownMismatch { .. }
                | ReconciliationError::NoCountsEntered
        )
    }
}

/// Result type for reconciliation operations
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_drop_non_positive_quantities() {
        let mut counts = DenominationCounts::new();
        counts.record(DenominationId(1), 3);
        counts.record(DenominationId(2), 0);
        counts.record(DenominationId(3), -4);

        assert_eq!(counts.len(), 1);
        assert_eq!(counts.quantity(DenominationId(1)), 3);
        assert_eq!(counts.quantity(DenominationId(3)), 0);

        counts.record(DenominationId(1), 0);
        assert!(counts.is_empty());
    }

    #[test]
    fn test_counts_record_input() {
        let mut counts = DenominationCounts::new();
        counts.record_input(DenominationId(7), "12");
        counts.record_input(DenominationId(8), "abc");
        counts.record_input(DenominationId(9), "-2");

        assert_eq!(counts.quantity(DenominationId(7)), 12);
        assert_eq!(counts.len(), 1);
    }

    #[test]
    fn test_kind_from_server_code() {
        assert_eq!(
            DenominationKind::from_server_code("billete").unwrap(),
            DenominationKind::Bill
        );
        assert_eq!(
            DenominationKind::from_server_code("MONEDA").unwrap(),
            DenominationKind::Coin
        );
        assert!(DenominationKind::from_server_code("CHEQUE").is_err());
    }

    #[test]
    fn test_counts_serialize_with_string_keys() {
        let counts: DenominationCounts =
            vec![(DenominationId(4), 2), (DenominationId(12), 5)].into_iter().collect();

        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"4":2,"12":5}"#);

        let back: DenominationCounts = serde_json::from_str(&json).unwrap();
        assert_eq!(back, counts);
    }

    #[test]
    fn test_counts_keep_quantities_beyond_u32() {
        let mut counts = DenominationCounts::new();
        counts.record_input(DenominationId(1), "5000000000");

        assert_eq!(counts.quantity(DenominationId(1)), 5_000_000_000);
        assert_eq!(
            Denomination::coin(1, 50).subtotal(counts.quantity(DenominationId(1))),
            BigDecimal::from(250_000_000_000i64)
        );
    }

    #[test]
    fn test_counts_deserialize_drops_zero_entries() {
        let counts: DenominationCounts = serde_json::from_str(r#"{"1":0,"2":3}"#).unwrap();
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.quantity(DenominationId(2)), 3);

        let empty: DenominationCounts = serde_json::from_str(r#"{"7":0}"#).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_error_recoverability() {
        assert!(ReconciliationError::EmptyDistribution.is_recoverable());
        assert!(ReconciliationError::NoCountsEntered.is_recoverable());
        assert!(!ReconciliationError::Network("timeout".to_string()).is_recoverable());
        assert!(!ReconciliationError::Rejected("closed".to_string()).is_recoverable());
    }
}
