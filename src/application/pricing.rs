use super::settings::SettingsHandle;
use crate::domain::money::{Distance, Money};
use crate::domain::pricing::{DEFAULT_RULE_ID, PricingRule};
use crate::domain::ride::{ServiceTier, VehicleCategory};
use crate::error::{DispatchError, Result};
use tracing::debug;

/// Resolves tariff rules and quotes fares.
#[derive(Clone)]
pub struct PricingEngine {
    settings: SettingsHandle,
}

impl PricingEngine {
    /// Creates a new pricing engine reading rules from `settings`.
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    /// Quotes a fare against the rules configured right now.
    ///
    /// If nothing matches, the default rule and then a built-in fallback are
    /// used. The result is rounded to cents. Only a tariff too large for the
    /// trip fails.
    pub async fn quote(
        &self,
        destination: &str,
        vehicle: VehicleCategory,
        tier: ServiceTier,
        distance: Distance,
    ) -> Result<Money> {
        let settings = self.settings.snapshot().await;
        let rule = resolve_rule(&settings.rules, destination);
        let price = fare(&rule, vehicle, tier, distance)?;
        debug!(
            rule = %rule.id,
            destination,
            %vehicle,
            ?tier,
            %distance,
            %price,
            "fare quoted"
        );
        Ok(price)
    }
}

/// Picks the tariff for `destination`.
///
/// Active rules are scanned in order and the first whose region name occurs
/// in the destination (case-insensitively) wins. Otherwise the active rule
/// with id `"default"`, otherwise [`PricingRule::fallback`].
pub fn resolve_rule(rules: &[PricingRule], destination: &str) -> PricingRule {
    let active = || rules.iter().filter(|rule| rule.active);
    active()
        .find(|rule| rule.matches(destination))
        .or_else(|| active().find(|rule| rule.id == DEFAULT_RULE_ID))
        .cloned()
        .unwrap_or_else(PricingRule::fallback)
}

/// `(base + per_km * km) * tier multiplier * vehicle multiplier`, in cents.
///
/// Fails with `ValidationError` when a tariff is too large to price the trip.
pub fn fare(
    rule: &PricingRule,
    vehicle: VehicleCategory,
    tier: ServiceTier,
    distance: Distance,
) -> Result<Money> {
    rule.per_km
        .value()
        .checked_mul(distance.km())
        .and_then(|metered| metered.checked_add(rule.base.value()))
        .and_then(|metered| metered.checked_mul(tier.fare_multiplier()))
        .and_then(|metered| metered.checked_mul(vehicle.fare_multiplier()))
        .map(|total| Money::new(total).round_to_cents())
        .ok_or_else(|| {
            DispatchError::validation(format!(
                "fare for rule {} over {distance} is out of range",
                rule.id
            ))
        })
}
