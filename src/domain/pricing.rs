use super::money::{Money, Percentage};
use crate::error::{DispatchError, Result};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Id of the rule used when no region matches the destination.
pub const DEFAULT_RULE_ID: &str = "default";

/// A regional tariff: flag-fall plus a per-kilometre rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRule {
    pub id: String,
    pub region: String,
    pub base: Money,
    pub per_km: Money,
    pub active: bool,
}

impl PricingRule {
    pub fn new(
        id: impl Into<String>,
        region: impl Into<String>,
        base: Money,
        per_km: Money,
    ) -> Self {
        Self {
            id: id.into(),
            region: region.into(),
            base,
            per_km,
            active: true,
        }
    }

    /// Used when the configured rules contain neither a match nor a default.
    pub fn fallback() -> Self {
        Self::new(
            "fallback",
            "Padrão",
            Money::new(dec!(5.0)),
            Money::new(dec!(2.0)),
        )
    }

    /// Checks the values an administrator may enter for a new rule.
    pub fn validate(&self) -> Result<()> {
        if self.region.trim().is_empty() {
            return Err(DispatchError::validation("region name must not be empty"));
        }
        if !self.base.is_positive() || !self.per_km.is_positive() {
            return Err(DispatchError::validation(
                "base fare and per-km rate must be positive",
            ));
        }
        Ok(())
    }

    /// Case-insensitive containment of the region name in `destination`.
    pub fn matches(&self, destination: &str) -> bool {
        destination
            .to_lowercase()
            .contains(&self.region.to_lowercase())
    }
}

/// Process-wide payment configuration, mutated only by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSettings {
    /// Whether an external payment provider credential is present. Gates the
    /// prepaid wallet.
    pub provider_configured: bool,
    pub commission: Percentage,
    /// Evaluated in order; first regional match wins.
    pub rules: Vec<PricingRule>,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        Self {
            provider_configured: false,
            commission: Percentage::from_trusted(dec!(15)),
            rules: vec![
                PricingRule::new(
                    DEFAULT_RULE_ID,
                    "Geral (Padrão)",
                    Money::new(dec!(5.00)),
                    Money::new(dec!(2.50)),
                ),
                PricingRule::new(
                    "center",
                    "Centro Histórico",
                    Money::new(dec!(8.00)),
                    Money::new(dec!(3.50)),
                ),
            ],
        }
    }
}
