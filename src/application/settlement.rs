use super::registry::RideRegistry;
use super::settings::SettingsHandle;
use crate::domain::money::{Money, Percentage};
use crate::domain::ride::{PaymentMethod, Ride, RideStatus, Settlement};
use crate::domain::user::User;
use crate::error::{DispatchError, Result};
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Splits a completed ride's fare and moves the money.
///
/// The split is recorded on the ride first, under the ride's lock; only the
/// call that records it goes on to credit the driver and debit the wallet.
/// A second call for the same ride returns the stored settlement and moves
/// nothing.
#[derive(Clone)]
pub struct SettlementEngine {
    registry: Arc<RideRegistry>,
    settings: SettingsHandle,
}

impl SettlementEngine {
    /// Creates a new settlement engine.
    pub fn new(registry: Arc<RideRegistry>, settings: SettingsHandle) -> Self {
        Self { registry, settings }
    }

    /// Records the split of a completed ride that has none yet, then pays it
    /// out. A ride already settled is returned untouched.
    pub async fn settle(&self, ride: &Ride) -> Result<Settlement> {
        let commission = self.settings.commission().await;
        let proposed = split(ride, commission);

        let mut first = false;
        let committed = self
            .registry
            .update_ride(
                &ride.id,
                Box::new(|stored: &mut Ride| {
                    if stored.status() != RideStatus::Completed {
                        return Err(DispatchError::InvalidTransition {
                            from: stored.status(),
                            to: RideStatus::Completed,
                        });
                    }
                    first = stored.record_settlement(proposed);
                    Ok(())
                }),
            )
            .await?;
        let settlement = committed
            .settlement()
            .cloned()
            .ok_or_else(|| DispatchError::validation("settlement was not recorded"))?;

        if !first {
            warn!(ride = %ride.id, "ride already settled; no money moved");
            return Ok(settlement);
        }
        self.pay_out(&committed, &settlement).await?;
        Ok(settlement)
    }

    /// Credits the driver and debits the prepaid wallet as `settlement` says.
    ///
    /// Must run once per settlement, by the caller that recorded it on the
    /// ride.
    pub async fn pay_out(&self, ride: &Ride, settlement: &Settlement) -> Result<()> {
        self.credit_driver(ride, settlement.driver_share).await?;
        if let Some(debit) = settlement.wallet_debit {
            self.debit_wallet(ride, debit).await?;
        }
        info!(
            ride = %ride.id,
            price = %settlement.price,
            commission = %settlement.platform_commission,
            driver_share = %settlement.driver_share,
            "ride settled"
        );
        Ok(())
    }

    async fn credit_driver(&self, ride: &Ride, share: Money) -> Result<()> {
        let Some(driver) = ride.driver() else {
            warn!(ride = %ride.id, "completed ride has no driver; earnings not credited");
            return Ok(());
        };
        let result = self
            .registry
            .update_user(
                driver,
                Box::new(|user: &mut User| {
                    if let Some(profile) = user.as_driver_mut() {
                        profile.earnings += share;
                    }
                    Ok(())
                }),
            )
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(DispatchError::NotFound { .. }) => {
                warn!(ride = %ride.id, driver = %driver, "driver no longer exists; earnings not credited");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Debits unconditionally: sufficiency was checked when the ride was
    /// requested, so the wallet may go negative here.
    async fn debit_wallet(&self, ride: &Ride, amount: Money) -> Result<()> {
        let result = self
            .registry
            .update_user(
                &ride.rider,
                Box::new(|user: &mut User| {
                    if let Some(profile) = user.as_rider_mut() {
                        profile.wallet -= amount;
                    }
                    Ok(())
                }),
            )
            .await;
        match result {
            Ok(user) => {
                if let Some(profile) = user.as_rider()
                    && profile.wallet < Money::ZERO
                {
                    warn!(rider = %ride.rider, wallet = %profile.wallet, "prepaid wallet overdrawn by settlement");
                }
                Ok(())
            }
            Err(DispatchError::NotFound { .. }) => {
                warn!(ride = %ride.id, rider = %ride.rider, "rider no longer exists; wallet not debited");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// Computes the split of `ride`'s price at `commission`.
///
/// The platform keeps whatever the driver does not get, so the two parts
/// always add up to the price exactly.
pub fn split(ride: &Ride, commission: Percentage) -> Settlement {
    let price = ride.price();
    let driver_share = price * (Decimal::ONE - commission.fraction());
    Settlement {
        price,
        commission_rate: commission,
        platform_commission: price - driver_share,
        driver_share,
        wallet_debit: (ride.payment == PaymentMethod::PrepaidWallet).then_some(price),
        settled_at: Utc::now(),
    }
}
