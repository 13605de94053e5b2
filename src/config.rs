//! Configuration for the close dialog and the register endpoints

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::reconciliation::calculator::ReconciliationCalculator;
use crate::reconciliation::validators::ValidationMode;
use crate::types::*;

fn default_true() -> bool {
    true
}

/// Reconciliation behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// Largest difference treated as equal
    #[serde(default = "default_tolerance")]
    pub tolerance: BigDecimal,
    /// Which rule set gates submission
    #[serde(default)]
    pub validation_mode: ValidationMode,
    /// Prefill counts with the server's suggested breakdown
    #[serde(default = "default_true")]
    pub prefill_expected_counts: bool,
    /// Copy the counted total into cash on hand until the operator edits the split
    #[serde(default = "default_true")]
    pub auto_fill_cash_on_hand: bool,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            validation_mode: ValidationMode::default(),
            prefill_expected_counts: true,
            auto_fill_cash_on_hand: true,
        }
    }
}

impl ReconciliationConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> ReconciliationResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ReconciliationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReconciliationResult<()> {
        if self.tolerance < BigDecimal::from(0) {
            return Err(ReconciliationError::InvalidConfig(
                "tolerance cannot be negative".to_string(),
            ));
        }
        if self.tolerance >= BigDecimal::from(1000) {
            return Err(ReconciliationError::InvalidConfig(format!(
                "tolerance {} is larger than the smallest bill",
                self.tolerance
            )));
        }
        Ok(())
    }

    pub fn calculator(&self) -> ReconciliationCalculator {
        ReconciliationCalculator::new(self.tolerance.clone())
    }
}

fn default_denominations_path() -> String {
    "/caja/denominaciones/".to_string()
}

fn default_status_path() -> String {
    "/caja/estado-caja/".to_string()
}

fn default_close_path() -> String {
    "/caja/cerrar/".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where the register endpoints live and how to authenticate against them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub base_url: String,
    #[serde(default = "default_denominations_path")]
    pub denominations_path: String,
    #[serde(default = "default_status_path")]
    pub status_path: String,
    #[serde(default = "default_close_path")]
    pub close_path: String,
    /// Sent as `X-CSRFToken` on the close-out POST
    #[serde(default)]
    pub csrf_token: Option<String>,
    /// Sent as the `sessionid` cookie
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            denominations_path: default_denominations_path(),
            status_path: default_status_path(),
            close_path: default_close_path(),
            csrf_token: None,
            session_id: None,
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> ReconciliationResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ReconciliationError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ReconciliationResult<()> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ReconciliationError::InvalidConfig(
                "base_url cannot be empty".to_string(),
            ));
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(ReconciliationError::InvalidConfig(format!(
                "base_url must start with http:// or https://, got '{base}'"
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ReconciliationError::InvalidConfig(
                "timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Join the base URL with an endpoint path
    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim().trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reconciliation_defaults_from_empty_document() {
        let config = ReconciliationConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ReconciliationConfig::default());
        assert_eq!(config.validation_mode, ValidationMode::Breakdown);
    }

    #[test]
    fn test_reconciliation_overrides() {
        let config = ReconciliationConfig::from_json_str(
            r#"{"tolerance": "50", "validation_mode": "distribution", "prefill_expected_counts": false}"#,
        )
        .unwrap();

        assert_eq!(config.tolerance, BigDecimal::from(50));
        assert_eq!(config.validation_mode, ValidationMode::Distribution);
        assert!(!config.prefill_expected_counts);
        assert!(config.auto_fill_cash_on_hand);
    }

    #[test]
    fn test_reconciliation_rejects_bad_tolerance() {
        assert!(matches!(
            ReconciliationConfig::from_json_str(r#"{"tolerance": "-1"}"#),
            Err(ReconciliationError::InvalidConfig(_))
        ));
        assert!(matches!(
            ReconciliationConfig::from_json_str(r#"{"validation_mode": "lenient"}"#),
            Err(ReconciliationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_gateway_config() {
        let config = GatewayConfig::from_json_str(
            r#"{"base_url": "https://pos.example.com/", "csrf_token": "abc"}"#,
        )
        .unwrap();

        assert_eq!(config.url(&config.close_path), "https://pos.example.com/caja/cerrar/");
        assert_eq!(config.csrf_token.as_deref(), Some("abc"));
        assert_eq!(config.timeout_secs, 30);

        assert!(GatewayConfig::from_json_str(r#"{"base_url": "pos.example.com"}"#).is_err());
    }
}
