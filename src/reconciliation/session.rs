//! Close-register session
//!
//! Holds everything the close dialog knows between opening and submitting:
//! reference denominations, the expected figures, the operator's count and
//! declared split. Every input recomputes the state synchronously; only a
//! `Valid` session can be submitted.

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ReconciliationConfig;
use crate::reconciliation::calculator::ReconciliationCalculator;
use crate::reconciliation::validators::CloseValidator;
use crate::traits::*;
use crate::types::*;
use crate::utils::money::parse_amount_input;
use crate::utils::validation::{sort_for_display, validate_denominations};
use crate::wire::*;

/// Where a session stands
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Nothing entered or prefilled yet
    Empty,
    /// Inputs touched but no denomination has a positive quantity
    Counting,
    /// Ready to submit
    Valid,
    /// Rejected by the active validator
    Invalid(ReconciliationError),
}

impl SessionState {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionState::Valid)
    }

    /// The inline error to show, if any
    pub fn error(&self) -> Option<&ReconciliationError> {
        match self {
            SessionState::Invalid(error) => Some(error),
            _ => None,
        }
    }
}

/// Result of an accepted close-out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseOutcome {
    /// Declared minus system total, as computed by the server
    pub variance: Variance,
    pub declared_total: BigDecimal,
    pub system_total: BigDecimal,
    pub message: Option<String>,
    pub closed_at: NaiveDateTime,
}

/// State of one open close dialog
pub struct CloseRegisterSession {
    id: Uuid,
    denominations: Vec<Denomination>,
    status: RegisterStatus,
    calculator: ReconciliationCalculator,
    validator: Box<dyn CloseValidator>,
    auto_fill_cash_on_hand: bool,
    counts: DenominationCounts,
    cash_on_hand: BigDecimal,
    cash_stored: BigDecimal,
    observations: String,
    touched: bool,
    distribution_modified: bool,
    state: SessionState,
}

impl std::fmt::Debug for CloseRegisterSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloseRegisterSession")
            .field("id", &self.id)
            .field("validator", &self.validator.name())
            .field("counts", &self.counts)
            .field("cash_on_hand", &self.cash_on_hand)
            .field("cash_stored", &self.cash_stored)
            .field("state", &self.state)
            .finish()
    }
}

fn ensure_non_negative(field: &str, amount: &BigDecimal) -> ReconciliationResult<()> {
    if *amount < BigDecimal::from(0) {
        return Err(ReconciliationError::InvalidAmount(format!(
            "{field} cannot be negative, got {amount}"
        )));
    }
    Ok(())
}

impl CloseRegisterSession {
    /// Open a session from reference data and the register status
    pub fn open(
        denominations: Vec<Denomination>,
        status: RegisterStatus,
        config: &ReconciliationConfig,
    ) -> ReconciliationResult<Self> {
        Self::with_validator(
            denominations,
            status,
            config,
            config.validation_mode.validator(),
        )
    }

    /// Open a session with a custom validator
    pub fn with_validator(
        mut denominations: Vec<Denomination>,
        status: RegisterStatus,
        config: &ReconciliationConfig,
        validator: Box<dyn CloseValidator>,
    ) -> ReconciliationResult<Self> {
        config.validate()?;
        validate_denominations(&denominations)?;
        sort_for_display(&mut denominations);

        let counts = if config.prefill_expected_counts {
            let mut counts = status.expected_counts.clone();
            counts.retain(|id| denominations.iter().any(|d| d.id == id));
            counts
        } else {
            DenominationCounts::new()
        };

        let mut session = Self {
            id: Uuid::new_v4(),
            denominations,
            status,
            calculator: config.calculator(),
            validator,
            auto_fill_cash_on_hand: config.auto_fill_cash_on_hand,
            touched: !counts.is_empty(),
            counts,
            cash_on_hand: BigDecimal::from(0),
            cash_stored: BigDecimal::from(0),
            observations: String::new(),
            distribution_modified: false,
            state: SessionState::Empty,
        };
        session.recompute();

        info!(
            session_id = %session.id,
            validator = session.validator.name(),
            expected_total = %session.status.expected_total,
            denominations = session.denominations.len(),
            "close session opened"
        );

        Ok(session)
    }

    /// Fetch reference data and status through the gateway, then open
    pub async fn load<G: CloseRegisterGateway + ?Sized>(
        gateway: &G,
        config: &ReconciliationConfig,
    ) -> ReconciliationResult<Self> {
        let denominations = gateway.fetch_denominations().await?;
        let status = gateway.fetch_register_status().await?;
        Self::open(denominations, status, config)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Denominations in display order: bills, then coins, largest first
    pub fn denominations(&self) -> &[Denomination] {
        &self.denominations
    }

    pub fn register_status(&self) -> &RegisterStatus {
        &self.status
    }

    pub fn counts(&self) -> &DenominationCounts {
        &self.counts
    }

    pub fn cash_on_hand(&self) -> &BigDecimal {
        &self.cash_on_hand
    }

    pub fn cash_stored(&self) -> &BigDecimal {
        &self.cash_stored
    }

    pub fn observations(&self) -> &str {
        &self.observations
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Set the quantity for one denomination
    pub fn set_count(&mut self, id: DenominationId, quantity: i64) -> ReconciliationResult<()> {
        if !self.denominations.iter().any(|d| d.id == id) {
            return Err(ReconciliationError::InvalidDenomination(format!(
                "denomination {id} is not part of this session"
            )));
        }
        self.counts.record(id, quantity);
        self.touched = true;
        self.recompute();
        Ok(())
    }

    /// Set the quantity from operator text; non-numbers count as zero
    pub fn set_count_input(&mut self, id: DenominationId, input: &str) -> ReconciliationResult<()> {
        self.set_count(id, crate::utils::money::parse_quantity_input(input))
    }

    /// Declare the cash left in the drawer. Negative amounts are rejected
    /// and leave the session unchanged.
    pub fn set_cash_on_hand(&mut self, amount: BigDecimal) -> ReconciliationResult<()> {
        ensure_non_negative("cash on hand", &amount)?;
        self.cash_on_hand = amount;
        self.distribution_modified = true;
        self.recompute();
        Ok(())
    }

    /// Declare the cash taken out for safekeeping. Negative amounts are
    /// rejected and leave the session unchanged.
    pub fn set_cash_stored(&mut self, amount: BigDecimal) -> ReconciliationResult<()> {
        ensure_non_negative("cash stored", &amount)?;
        self.cash_stored = amount;
        self.distribution_modified = true;
        self.recompute();
        Ok(())
    }

    /// Set cash on hand from a money field such as `"$ 150.000"`
    pub fn set_cash_on_hand_input(&mut self, input: &str) {
        // digits only, never negative
        self.cash_on_hand = parse_amount_input(input);
        self.distribution_modified = true;
        self.recompute();
    }

    /// Set cash stored from a money field such as `"$ 50.000"`
    pub fn set_cash_stored_input(&mut self, input: &str) {
        self.cash_stored = parse_amount_input(input);
        self.distribution_modified = true;
        self.recompute();
    }

    pub fn set_observations(&mut self, observations: impl Into<String>) {
        self.observations = observations.into();
    }

    pub fn counted_total(&self) -> BigDecimal {
        self.calculator
            .counted_total(&self.counts, &self.denominations)
    }

    pub fn variance(&self) -> Variance {
        self.calculator
            .variance(&self.counted_total(), &self.status.expected_total)
    }

    pub fn snapshot(&self) -> ReconciliationSnapshot {
        ReconciliationSnapshot {
            expected_total: self.status.expected_total.clone(),
            counted_total: self.counted_total(),
            cash_on_hand: self.cash_on_hand.clone(),
            cash_stored: self.cash_stored.clone(),
        }
    }

    fn recompute(&mut self) {
        let counted_total = self.counted_total();

        if self.auto_fill_cash_on_hand
            && !self.distribution_modified
            && counted_total > BigDecimal::from(0)
        {
            self.cash_on_hand = counted_total;
            self.cash_stored = BigDecimal::from(0);
        }

        self.state = if self.counts.is_empty() {
            if self.touched {
                SessionState::Counting
            } else {
                SessionState::Empty
            }
        } else {
            match self
                .validator
                .validate_close(&self.calculator, &self.counts, &self.snapshot())
            {
                Ok(()) => SessionState::Valid,
                Err(error) => SessionState::Invalid(error),
            }
        };

        debug!(session_id = %self.id, state = ?self.state, "close session recomputed");
    }

    /// Build the close-out payload. Fails unless the session is valid.
    pub fn prepare_submission(&self) -> ReconciliationResult<CloseRegisterRequest> {
        match &self.state {
            SessionState::Valid => {}
            SessionState::Empty | SessionState::Counting => {
                return Err(ReconciliationError::NoCountsEntered)
            }
            SessionState::Invalid(error) => return Err(error.clone()),
        }

        Ok(CloseRegisterRequest {
            monto_declarado: amount_to_wire(&self.counted_total())?,
            conteos: self.counts.clone(),
            dinero_en_caja: amount_to_wire(&self.cash_on_hand)?,
            dinero_guardado: amount_to_wire(&self.cash_stored)?,
            observaciones: self.observations.trim().to_string(),
        })
    }

    /// Validate, then post the close-out once.
    ///
    /// The session is left untouched on failure so the operator can correct
    /// input or try again.
    pub async fn submit<G: CloseRegisterGateway + ?Sized>(
        &self,
        gateway: &G,
    ) -> ReconciliationResult<CloseOutcome> {
        let request = self.prepare_submission()?;

        let response = match gateway.submit_close(&request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(session_id = %self.id, error = %error, "close-out request failed");
                return Err(error);
            }
        };

        if !response.success {
            let reason = response
                .error
                .unwrap_or_else(|| "could not close the register".to_string());
            warn!(session_id = %self.id, reason = %reason, "close-out rejected");
            return Err(ReconciliationError::Rejected(reason));
        }

        let declared_total = amount_from_wire(response.monto_final_declarado)?;
        let system_total = amount_from_wire(response.monto_final_sistema)?;
        let difference = amount_from_wire(response.diferencia)?;
        let variance = self.calculator.classify(difference);

        info!(
            session_id = %self.id,
            declared = %declared_total,
            system = %system_total,
            classification = ?variance.classification,
            "register closed"
        );

        Ok(CloseOutcome {
            variance,
            declared_total,
            system_total,
            message: response.message,
            closed_at: chrono::Utc::now().naive_utc(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciliation::validators::{TotalOnlyValidator, ValidationMode};

    fn denominations() -> Vec<Denomination> {
        vec![
            Denomination::coin(10, 500),
            Denomination::bill(1, 50000),
            Denomination::bill(2, 20000),
            Denomination::bill(3, 10000),
        ]
    }

    fn no_prefill() -> ReconciliationConfig {
        ReconciliationConfig {
            prefill_expected_counts: false,
            ..ReconciliationConfig::default()
        }
    }

    fn open(config: &ReconciliationConfig) -> CloseRegisterSession {
        let status = RegisterStatus::new(BigDecimal::from(100000)).with_expected_counts(
            vec![(DenominationId(1), 2)].into_iter().collect(),
        );
        CloseRegisterSession::open(denominations(), status, config).unwrap()
    }

    #[test]
    fn test_open_without_prefill_is_empty() {
        let session = open(&no_prefill());
        assert_eq!(session.state(), &SessionState::Empty);
        assert_eq!(session.counted_total(), BigDecimal::from(0));
        assert_eq!(
            session.prepare_submission(),
            Err(ReconciliationError::NoCountsEntered)
        );
    }

    #[test]
    fn test_open_sorts_bills_before_coins() {
        let session = open(&no_prefill());
        let ids: Vec<u64> = session.denominations().iter().map(|d| d.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3, 10]);
    }

    #[test]
    fn test_prefill_from_expected_counts() {
        let session = open(&ReconciliationConfig::default());
        assert_eq!(session.counted_total(), BigDecimal::from(100000));
        assert_eq!(session.cash_on_hand(), &BigDecimal::from(100000));
        assert!(session.state().is_valid());
        assert!(session.variance().is_balanced());
    }

    #[test]
    fn test_prefill_skips_unknown_denominations() {
        let status = RegisterStatus::new(BigDecimal::from(0)).with_expected_counts(
            vec![(DenominationId(99), 4)].into_iter().collect(),
        );
        let session =
            CloseRegisterSession::open(denominations(), status, &ReconciliationConfig::default())
                .unwrap();
        assert!(session.counts().is_empty());
        assert_eq!(session.state(), &SessionState::Empty);
    }

    #[test]
    fn test_counting_after_clearing_all_counts() {
        let mut session = open(&no_prefill());
        session.set_count(DenominationId(1), 1).unwrap();
        session.set_count_input(DenominationId(1), "0").unwrap();
        assert_eq!(session.state(), &SessionState::Counting);
    }

    #[test]
    fn test_auto_fill_until_distribution_edited() {
        let mut session = open(&no_prefill());
        session.set_count(DenominationId(1), 1).unwrap();
        session.set_count(DenominationId(10), 3).unwrap();
        assert_eq!(session.cash_on_hand(), &BigDecimal::from(51500));
        assert!(session.state().is_valid());

        session.set_cash_on_hand_input("$ 40.000");
        session.set_count(DenominationId(2), 1).unwrap();
        assert_eq!(session.cash_on_hand(), &BigDecimal::from(40000));
        assert!(matches!(
            session.state(),
            SessionState::Invalid(ReconciliationError::DistributionMismatch { .. })
        ));
    }

    #[test]
    fn test_breakdown_rule_rejects_partial_cash_on_hand() {
        let mut session = open(&no_prefill());
        session.set_count(DenominationId(1), 1).unwrap();
        session.set_cash_on_hand_input("$ 30.000");
        session.set_cash_stored_input("$ 20.000");

        assert!(matches!(
            session.state(),
            SessionState::Invalid(ReconciliationError::BreakdownMismatch { .. })
        ));
        assert!(matches!(
            session.prepare_submission(),
            Err(ReconciliationError::BreakdownMismatch { .. })
        ));
    }

    #[test]
    fn test_distribution_mode_accepts_split() {
        let config = ReconciliationConfig {
            validation_mode: ValidationMode::Distribution,
            ..no_prefill()
        };
        let mut session = open(&config);
        session.set_count(DenominationId(1), 1).unwrap();
        session.set_cash_on_hand_input("$ 30.000");
        session.set_cash_stored_input("$ 20.000");
        assert!(session.state().is_valid());

        let request = session.prepare_submission().unwrap();
        assert_eq!(request.monto_declarado, 50000.0);
        assert_eq!(request.dinero_en_caja, 30000.0);
        assert_eq!(request.dinero_guardado, 20000.0);
    }

    #[test]
    fn test_negative_declared_amounts_are_rejected() {
        let mut session = open(&no_prefill());
        session.set_count(DenominationId(1), 1).unwrap();
        assert!(session.state().is_valid());

        assert!(matches!(
            session.set_cash_on_hand(BigDecimal::from(-10000)),
            Err(ReconciliationError::InvalidAmount(_))
        ));
        assert!(matches!(
            session.set_cash_stored(BigDecimal::from(-1)),
            Err(ReconciliationError::InvalidAmount(_))
        ));
        session.set_cash_stored(BigDecimal::from(60000)).unwrap();

        // the rejected amount never replaced the auto-filled one
        assert_eq!(session.cash_on_hand(), &BigDecimal::from(50000));
        assert!(matches!(
            session.prepare_submission(),
            Err(ReconciliationError::DistributionMismatch { .. })
        ));
    }

    #[test]
    fn test_count_beyond_u32_is_kept() {
        let mut session = open(&no_prefill());
        session
            .set_count_input(DenominationId(10), "5000000000")
            .unwrap();

        assert_eq!(session.counts().quantity(DenominationId(10)), 5_000_000_000);
        assert_eq!(
            session.counted_total(),
            BigDecimal::from(2_500_000_000_000i64)
        );
        assert!(session.state().is_valid());
    }

    #[test]
    fn test_empty_distribution() {
        let mut session = open(&no_prefill());
        session.set_count(DenominationId(3), 2).unwrap();
        session.set_cash_on_hand_input("");
        assert_eq!(
            session.state(),
            &SessionState::Invalid(ReconciliationError::EmptyDistribution)
        );
        assert!(session.state().error().unwrap().is_recoverable());
    }

    #[test]
    fn test_unknown_denomination_is_rejected() {
        let mut session = open(&no_prefill());
        assert!(matches!(
            session.set_count(DenominationId(42), 1),
            Err(ReconciliationError::InvalidDenomination(_))
        ));
    }

    #[test]
    fn test_custom_validator() {
        let status = RegisterStatus::new(BigDecimal::from(0));
        let mut session = CloseRegisterSession::with_validator(
            denominations(),
            status,
            &no_prefill(),
            Box::new(TotalOnlyValidator),
        )
        .unwrap();
        session.set_count(DenominationId(2), 1).unwrap();
        session.set_cash_on_hand_input("$ 1");
        assert!(session.state().is_valid());
    }

    #[test]
    fn test_open_rejects_bad_reference_data() {
        let duplicated = vec![Denomination::bill(1, 50000), Denomination::bill(2, 50000)];
        assert!(CloseRegisterSession::open(
            duplicated,
            RegisterStatus::new(BigDecimal::from(0)),
            &ReconciliationConfig::default()
        )
        .is_err());
    }

    #[test]
    fn test_observations_are_trimmed_in_payload() {
        let mut session = open(&ReconciliationConfig::default());
        session.set_observations("  faltó cambio  ");
        let request = session.prepare_submission().unwrap();
        assert_eq!(request.observaciones, "faltó cambio");
        assert_eq!(request.conteos.quantity(DenominationId(1)), 2);
    }
}
