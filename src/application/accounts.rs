use super::registry::RideRegistry;
use super::settings::SettingsHandle;
use crate::domain::money::Money;
use crate::domain::ride::VehicleCategory;
use crate::domain::user::{Role, User, UserId};
use crate::error::{DispatchError, Result};
use std::sync::Arc;
use tracing::info;

/// User registration and the profile updates the core cares about.
#[derive(Clone)]
pub struct AccountService {
    registry: Arc<RideRegistry>,
    settings: SettingsHandle,
}

impl AccountService {
    /// Creates a new account service.
    pub fn new(registry: Arc<RideRegistry>, settings: SettingsHandle) -> Self {
        Self { registry, settings }
    }

    /// Adds a pre-built user, e.g. when seeding from a file.
    pub async fn register(&self, user: User) -> Result<User> {
        self.registry.insert_user(user.clone()).await?;
        info!(user = %user.id, role = %user.role(), "user registered");
        Ok(user)
    }

    /// Registers a rider with an empty wallet.
    pub async fn register_rider(&self, name: &str) -> Result<User> {
        self.register(User::rider(UserId::generate(), name, Money::ZERO))
            .await
    }

    pub async fn register_driver(&self, name: &str, vehicle: VehicleCategory) -> Result<User> {
        self.register(User::driver(UserId::generate(), name, vehicle))
            .await
    }

    pub async fn register_administrator(&self, name: &str) -> Result<User> {
        self.register(User::administrator(UserId::generate(), name))
            .await
    }

    /// Toggles whether a driver is taking rides.
    pub async fn set_driver_online(&self, driver_id: &UserId, online: bool) -> Result<User> {
        self.registry
            .update_user(
                driver_id,
                Box::new(|user: &mut User| {
                    let profile = user.as_driver_mut().ok_or_else(|| DispatchError::RoleMismatch {
                        user: driver_id.to_string(),
                        expected: Role::Driver,
                    })?;
                    profile.online = online;
                    Ok(())
                }),
            )
            .await
    }

    /// Adds funds to a rider's prepaid wallet and returns the new balance.
    pub async fn top_up(&self, rider_id: &UserId, amount: Money) -> Result<Money> {
        if !amount.is_positive() {
            return Err(DispatchError::validation("top-up amount must be positive"));
        }
        if !self.settings.provider_configured().await {
            return Err(DispatchError::PaymentMethodUnavailable);
        }
        let user = self
            .registry
            .update_user(
                rider_id,
                Box::new(|user: &mut User| {
                    let profile = user.as_rider_mut().ok_or_else(|| DispatchError::RoleMismatch {
                        user: rider_id.to_string(),
                        expected: Role::Rider,
                    })?;
                    profile.wallet += amount;
                    Ok(())
                }),
            )
            .await?;
        let balance = user.as_rider().map(|profile| profile.wallet).unwrap_or_default();
        info!(rider = %rider_id, %amount, %balance, "wallet topped up");
        Ok(balance)
    }

    /// Administrative removal. Rides keep referring to the id.
    pub async fn delete_user(&self, id: &UserId) -> Result<User> {
        let removed = self.registry.remove_user(id).await?;
        info!(user = %id, "user deleted");
        Ok(removed)
    }

    /// All users ordered by id.
    pub async fn users(&self) -> Result<Vec<User>> {
        self.registry.users().await
    }
}
