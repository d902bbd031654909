use crate::domain::money::{Money, Percentage};
use crate::domain::pricing::{PaymentSettings, PricingRule};
use crate::error::{DispatchError, Result};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Shared handle to the process-wide [`PaymentSettings`].
///
/// Readers take a snapshot; administrators mutate through the methods below.
/// Rides already quoted keep their price whatever happens here.
#[derive(Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<PaymentSettings>>,
}

impl SettingsHandle {
    /// Creates a new handle owning `settings`.
    pub fn new(settings: PaymentSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// A copy of the current settings.
    pub async fn snapshot(&self) -> PaymentSettings {
        self.inner.read().await.clone()
    }

    pub async fn commission(&self) -> Percentage {
        self.inner.read().await.commission
    }

    pub async fn provider_configured(&self) -> bool {
        self.inner.read().await.provider_configured
    }

    pub async fn set_commission(&self, percent: Decimal) -> Result<()> {
        let commission = Percentage::new(percent)?;
        self.inner.write().await.commission = commission;
        info!(%commission, "platform commission updated");
        Ok(())
    }

    pub async fn set_payment_provider(&self, configured: bool) {
        self.inner.write().await.provider_configured = configured;
        info!(configured, "payment provider configuration changed");
    }

    /// Appends a validated rule with a generated id and returns it.
    pub async fn add_rule(&self, region: &str, base: Money, per_km: Money) -> Result<PricingRule> {
        let rule = PricingRule::new(format!("rule-{}", Uuid::new_v4()), region, base, per_km);
        rule.validate()?;
        self.inner.write().await.rules.push(rule.clone());
        info!(rule = %rule.id, region = %rule.region, "pricing rule added");
        Ok(rule)
    }

    /// Replaces the whole ordered rule list. Every rule must be valid and
    /// ids must be unique; otherwise nothing changes.
    pub async fn replace_rules(&self, rules: Vec<PricingRule>) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &rules {
            rule.validate()?;
            if !seen.insert(rule.id.as_str()) {
                return Err(DispatchError::validation(format!(
                    "duplicate pricing rule id {}",
                    rule.id
                )));
            }
        }
        let count = rules.len();
        self.inner.write().await.rules = rules;
        info!(count, "pricing rules replaced");
        Ok(())
    }

    /// Enables or disables a rule without removing it.
    pub async fn set_rule_active(&self, id: &str, active: bool) -> Result<()> {
        let mut settings = self.inner.write().await;
        let rule = settings
            .rules
            .iter_mut()
            .find(|rule| rule.id == id)
            .ok_or_else(|| DispatchError::NotFound {
                entity: "pricing rule",
                id: id.to_string(),
            })?;
        rule.active = active;
        Ok(())
    }

    /// Deletes a rule and returns it.
    pub async fn remove_rule(&self, id: &str) -> Result<PricingRule> {
        let mut settings = self.inner.write().await;
        let position = settings
            .rules
            .iter()
            .position(|rule| rule.id == id)
            .ok_or_else(|| DispatchError::NotFound {
                entity: "pricing rule",
                id: id.to_string(),
            })?;
        let removed = settings.rules.remove(position);
        info!(rule = %removed.id, "pricing rule removed");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_commission_validation() {
        let settings = SettingsHandle::default();
        settings.set_commission(dec!(20)).await.unwrap();
        assert_eq!(settings.commission().await.value(), dec!(20));

        let result = settings.set_commission(dec!(120)).await;
        assert!(matches!(result, Err(DispatchError::ValidationError(_))));
        assert_eq!(settings.commission().await.value(), dec!(20));
    }

    #[tokio::test]
    async fn test_rule_lifecycle() {
        let settings = SettingsHandle::default();
        let rule = settings
            .add_rule("Pinheiros", Money::new(dec!(6)), Money::new(dec!(2.8)))
            .await
            .unwrap();
        assert!(rule.id.starts_with("rule-"));
        assert_eq!(settings.snapshot().await.rules.last(), Some(&rule));

        settings.set_rule_active(&rule.id, false).await.unwrap();
        assert!(!settings.snapshot().await.rules.last().unwrap().active);

        settings.remove_rule(&rule.id).await.unwrap();
        assert_eq!(settings.snapshot().await.rules.len(), 2);
        assert!(matches!(
            settings.remove_rule(&rule.id).await,
            Err(DispatchError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_rule_is_not_added() {
        let settings = SettingsHandle::default();
        let result = settings
            .add_rule("", Money::new(dec!(6)), Money::new(dec!(2)))
            .await;
        assert!(result.is_err());
        assert_eq!(settings.snapshot().await.rules.len(), 2);
    }

    #[tokio::test]
    async fn test_provider_toggle() {
        let settings = SettingsHandle::default();
        assert!(!settings.provider_configured().await);
        settings.set_payment_provider(true).await;
        assert!(settings.provider_configured().await);
    }

    #[tokio::test]
    async fn test_replace_rules_rejects_duplicate_ids() {
        let settings = SettingsHandle::default();
        let rules = vec![
            PricingRule::new("default", "Geral", Money::new(dec!(5)), Money::new(dec!(2.5))),
            PricingRule::new("default", "Centro", Money::new(dec!(8)), Money::new(dec!(3.5))),
        ];
        assert!(matches!(
            settings.replace_rules(rules).await,
            Err(DispatchError::ValidationError(_))
        ));
        assert_eq!(settings.snapshot().await, PaymentSettings::default());

        let rules = vec![
            PricingRule::new("default", "Geral", Money::new(dec!(5)), Money::new(dec!(2.5))),
            PricingRule::new("airport", "Aeroporto", Money::new(dec!(12)), Money::new(dec!(4))),
        ];
        settings.replace_rules(rules).await.unwrap();
        settings.remove_rule("default").await.unwrap();
        let remaining: Vec<String> = settings
            .snapshot()
            .await
            .rules
            .into_iter()
            .map(|rule| rule.id)
            .collect();
        assert_eq!(remaining, vec!["airport".to_string()]);
    }
}
