use super::pricing::PricingEngine;
use super::registry::RideRegistry;
use super::settings::SettingsHandle;
use super::settlement::{SettlementEngine, split};
use crate::domain::ride::{PaymentMethod, Ride, RideId, RideRequest, RideStatus};
use crate::domain::user::{Role, User, UserId};
use crate::error::{DispatchError, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Drives rides through their lifecycle.
///
/// Every check-then-write on a ride happens inside a single
/// [`RideRegistry::update_ride`] call, so two drivers accepting the same ride,
/// or a cancellation racing an acceptance, are decided by whichever mutation
/// takes the ride's lock first. Losers get a typed error and change nothing.
#[derive(Clone)]
pub struct DispatchCoordinator {
    registry: Arc<RideRegistry>,
    pricing: PricingEngine,
    settlement: SettlementEngine,
    settings: SettingsHandle,
}

impl DispatchCoordinator {
    /// Creates a new dispatcher sharing the given registry and services.
    pub fn new(
        registry: Arc<RideRegistry>,
        pricing: PricingEngine,
        settlement: SettlementEngine,
        settings: SettingsHandle,
    ) -> Self {
        Self {
            registry,
            pricing,
            settlement,
            settings,
        }
    }

    /// Quotes and records a new ride in `Requested`.
    ///
    /// Prepaid-wallet requests need a configured payment provider and a
    /// wallet covering the quoted price; either failure creates no ride.
    pub async fn request_ride(&self, request: RideRequest) -> Result<Ride> {
        let rider = self
            .registry
            .user_with_role(&request.rider, Role::Rider)
            .await?;
        let price = self
            .pricing
            .quote(
                &request.destination.address,
                request.vehicle,
                request.tier,
                request.distance,
            )
            .await?;

        if request.payment == PaymentMethod::PrepaidWallet {
            if !self.settings.provider_configured().await {
                return Err(DispatchError::PaymentMethodUnavailable);
            }
            let available = rider
                .as_rider()
                .map(|profile| profile.wallet)
                .unwrap_or_default();
            if available < price {
                return Err(DispatchError::InsufficientBalance {
                    required: price,
                    available,
                });
            }
        }

        let ride = Ride::new(RideId::generate(), request, price, Utc::now());
        self.registry.insert_ride(ride.clone()).await?;
        info!(
            ride = %ride.id,
            rider = %ride.rider,
            price = %ride.price(),
            payment = %ride.payment,
            vehicle = %ride.vehicle,
            "ride requested"
        );
        Ok(ride)
    }

    /// Assigns `driver` to a `Requested` ride. First successful caller wins.
    pub async fn accept_ride(&self, ride_id: &RideId, driver_id: &UserId) -> Result<Ride> {
        let driver = self.registry.user_with_role(driver_id, Role::Driver).await?;
        let offered = driver
            .as_driver()
            .map(|profile| profile.vehicle)
            .ok_or_else(|| DispatchError::RoleMismatch {
                user: driver_id.to_string(),
                expected: Role::Driver,
            })?;

        let ride = self
            .registry
            .update_ride(
                ride_id,
                Box::new(|ride: &mut Ride| ride.assign_driver(driver_id, offered, Utc::now())),
            )
            .await?;
        info!(ride = %ride.id, driver = %driver_id, "ride accepted");
        Ok(ride)
    }

    /// Moves a ride forward on behalf of its assigned driver.
    ///
    /// Only `Accepted -> Pickup`, `Accepted -> InProgress`,
    /// `Pickup -> InProgress` and `InProgress -> Completed` are accepted here.
    /// Reaching `Completed` records the fare split in the same ride update;
    /// the driver and wallet are then paid out from that record.
    pub async fn advance(
        &self,
        ride_id: &RideId,
        target: RideStatus,
        driver_id: &UserId,
    ) -> Result<Ride> {
        let commission = self.settings.commission().await;
        let ride = self
            .registry
            .update_ride(
                ride_id,
                Box::new(|ride: &mut Ride| {
                    let from = ride.status();
                    let driver_edge = matches!(
                        (from, target),
                        (RideStatus::Accepted, RideStatus::Pickup)
                            | (RideStatus::Accepted, RideStatus::InProgress)
                            | (RideStatus::Pickup, RideStatus::InProgress)
                            | (RideStatus::InProgress, RideStatus::Completed)
                    );
                    if !driver_edge {
                        return Err(DispatchError::InvalidTransition { from, to: target });
                    }
                    if ride.driver() != Some(driver_id) {
                        return Err(DispatchError::NotAssignedDriver {
                            ride: ride.id.to_string(),
                            driver: driver_id.to_string(),
                        });
                    }
                    ride.transition_to(target, Utc::now())?;
                    if target == RideStatus::Completed {
                        let settlement = split(ride, commission);
                        ride.record_settlement(settlement);
                    }
                    Ok(())
                }),
            )
            .await?;
        info!(ride = %ride.id, status = %ride.status(), "ride advanced");

        if target == RideStatus::Completed
            && let Some(settlement) = ride.settlement()
        {
            self.settlement.pay_out(&ride, settlement).await?;
        }
        Ok(ride)
    }

    /// Cancels a ride that is still `Requested` or `Accepted`.
    pub async fn cancel(&self, ride_id: &RideId) -> Result<Ride> {
        let ride = self
            .registry
            .update_ride(
                ride_id,
                Box::new(|ride: &mut Ride| {
                    if !ride.status().is_cancellable() {
                        return Err(DispatchError::InvalidTransition {
                            from: ride.status(),
                            to: RideStatus::Cancelled,
                        });
                    }
                    ride.transition_to(RideStatus::Cancelled, Utc::now())
                }),
            )
            .await?;
        info!(ride = %ride.id, "ride cancelled");
        Ok(ride)
    }

    /// Pending rides matching the driver's vehicle, then the driver's own
    /// rides that have not finished.
    pub async fn rides_for_driver(&self, driver_id: &UserId) -> Result<Vec<Ride>> {
        let driver = self.registry.user_with_role(driver_id, Role::Driver).await?;
        let mut rides = match driver.as_driver() {
            Some(profile) => self.registry.pending_rides(profile.vehicle).await?,
            None => Vec::new(),
        };
        rides.extend(
            self.registry
                .rides_by_driver(driver_id)
                .await?
                .into_iter()
                .filter(|ride| !ride.status().is_terminal()),
        );
        Ok(rides)
    }

    /// Every ride the driver has been assigned, newest first.
    pub async fn driver_history(&self, driver_id: &UserId) -> Result<Vec<Ride>> {
        self.registry.user_with_role(driver_id, Role::Driver).await?;
        self.registry.rides_by_driver(driver_id).await
    }

    /// Every ride the rider has requested, newest first.
    pub async fn rides_for_rider(&self, rider_id: &UserId) -> Result<Vec<Ride>> {
        self.registry.user_with_role(rider_id, Role::Rider).await?;
        self.registry.rides_by_rider(rider_id).await
    }

    /// The rider's most recent ride that has not reached a terminal state.
    pub async fn active_ride_for_rider(&self, rider_id: &UserId) -> Result<Option<Ride>> {
        Ok(self
            .rides_for_rider(rider_id)
            .await?
            .into_iter()
            .find(|ride| !ride.status().is_terminal()))
    }

    /// Drivers whose online flag is set.
    pub async fn available_drivers(&self) -> Result<Vec<User>> {
        Ok(self
            .registry
            .users()
            .await?
            .into_iter()
            .filter(|user| user.as_driver().is_some_and(|profile| profile.online))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Distance, Money};
    use crate::domain::ride::{Location, ServiceTier, VehicleCategory};
    use crate::infrastructure::in_memory::{InMemoryRideStore, InMemoryUserStore};
    use rust_decimal_macros::dec;

    async fn coordinator() -> (Arc<RideRegistry>, DispatchCoordinator) {
        let registry = Arc::new(RideRegistry::new(
            Box::new(InMemoryRideStore::new()),
            Box::new(InMemoryUserStore::new()),
        ));
        let settings = SettingsHandle::default();
        settings.set_payment_provider(true).await;
        let pricing = PricingEngine::new(settings.clone());
        let settlement = SettlementEngine::new(registry.clone(), settings.clone());
        let dispatch = DispatchCoordinator::new(registry.clone(), pricing, settlement, settings);

        registry
            .insert_user(User::rider(UserId::new("r1"), "João", Money::new(dec!(150))))
            .await
            .unwrap();
        registry
            .insert_user(User::driver(UserId::new("d1"), "Carlos", VehicleCategory::Car))
            .await
            .unwrap();
        registry
            .insert_user(User::driver(UserId::new("m1"), "Ana", VehicleCategory::Motorcycle))
            .await
            .unwrap();
        (registry, dispatch)
    }

    fn request(payment: PaymentMethod, vehicle: VehicleCategory) -> RideRequest {
        RideRequest {
            rider: UserId::new("r1"),
            origin: Location::from_address("Avenida Paulista"),
            destination: Location::from_address("Centro Histórico"),
            distance: Distance::from_km(dec!(4.8)).unwrap(),
            payment,
            vehicle,
            tier: ServiceTier::Economy,
        }
    }

    #[tokio::test]
    async fn test_request_creates_quoted_ride() {
        let (registry, dispatch) = coordinator().await;
        let ride = dispatch
            .request_ride(request(PaymentMethod::Card, VehicleCategory::Car))
            .await
            .unwrap();
        assert_eq!(ride.status(), RideStatus::Requested);
        assert_eq!(ride.price(), Money::new(dec!(24.80)));
        assert!(ride.driver().is_none());
        assert_eq!(registry.ride(&ride.id).await.unwrap(), ride);
    }

    #[tokio::test]
    async fn test_only_riders_request() {
        let (_, dispatch) = coordinator().await;
        let mut req = request(PaymentMethod::Card, VehicleCategory::Car);
        req.rider = UserId::new("d1");
        assert!(matches!(
            dispatch.request_ride(req).await,
            Err(DispatchError::RoleMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_full_lifecycle_with_pickup() {
        let (registry, dispatch) = coordinator().await;
        let ride = dispatch
            .request_ride(request(PaymentMethod::Cash, VehicleCategory::Car))
            .await
            .unwrap();
        let driver = UserId::new("d1");

        dispatch.accept_ride(&ride.id, &driver).await.unwrap();
        dispatch
            .advance(&ride.id, RideStatus::Pickup, &driver)
            .await
            .unwrap();
        dispatch
            .advance(&ride.id, RideStatus::InProgress, &driver)
            .await
            .unwrap();
        let done = dispatch
            .advance(&ride.id, RideStatus::Completed, &driver)
            .await
            .unwrap();

        assert_eq!(done.status(), RideStatus::Completed);
        assert!(done.settlement().is_some());
        let earnings = registry.user(&driver).await.unwrap();
        assert_eq!(earnings.as_driver().unwrap().earnings, Money::new(dec!(21.08)));
    }

    #[tokio::test]
    async fn test_advance_rejects_skipped_and_backward_edges() {
        let (_, dispatch) = coordinator().await;
        let ride = dispatch
            .request_ride(request(PaymentMethod::Card, VehicleCategory::Car))
            .await
            .unwrap();
        let driver = UserId::new("d1");

        assert!(matches!(
            dispatch
                .advance(&ride.id, RideStatus::InProgress, &driver)
                .await,
            Err(DispatchError::InvalidTransition {
                from: RideStatus::Requested,
                to: RideStatus::InProgress
            })
        ));

        dispatch.accept_ride(&ride.id, &driver).await.unwrap();
        assert!(matches!(
            dispatch
                .advance(&ride.id, RideStatus::Completed, &driver)
                .await,
            Err(DispatchError::InvalidTransition { .. })
        ));
        assert!(matches!(
            dispatch
                .advance(&ride.id, RideStatus::Cancelled, &driver)
                .await,
            Err(DispatchError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_advance_by_other_driver_rejected() {
        let (registry, dispatch) = coordinator().await;
        registry
            .insert_user(User::driver(UserId::new("d2"), "Bia", VehicleCategory::Car))
            .await
            .unwrap();
        let ride = dispatch
            .request_ride(request(PaymentMethod::Card, VehicleCategory::Car))
            .await
            .unwrap();
        dispatch
            .accept_ride(&ride.id, &UserId::new("d1"))
            .await
            .unwrap();

        let result = dispatch
            .advance(&ride.id, RideStatus::InProgress, &UserId::new("d2"))
            .await;
        assert!(matches!(result, Err(DispatchError::NotAssignedDriver { .. })));
        assert_eq!(
            registry.ride(&ride.id).await.unwrap().status(),
            RideStatus::Accepted
        );
    }

    #[tokio::test]
    async fn test_accept_category_mismatch() {
        let (_, dispatch) = coordinator().await;
        let ride = dispatch
            .request_ride(request(PaymentMethod::Card, VehicleCategory::Car))
            .await
            .unwrap();
        assert!(matches!(
            dispatch.accept_ride(&ride.id, &UserId::new("m1")).await,
            Err(DispatchError::CategoryMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_accept_unknown_ride() {
        let (_, dispatch) = coordinator().await;
        assert!(matches!(
            dispatch
                .accept_ride(&RideId::new("ghost"), &UserId::new("d1"))
                .await,
            Err(DispatchError::NotFound { entity: "ride", .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let (_, dispatch) = coordinator().await;
        let driver = UserId::new("d1");

        let requested = dispatch
            .request_ride(request(PaymentMethod::Card, VehicleCategory::Car))
            .await
            .unwrap();
        assert_eq!(
            dispatch.cancel(&requested.id).await.unwrap().status(),
            RideStatus::Cancelled
        );
        assert!(matches!(
            dispatch.accept_ride(&requested.id, &driver).await,
            Err(DispatchError::InvalidTransition { .. })
        ));

        let accepted = dispatch
            .request_ride(request(PaymentMethod::Card, VehicleCategory::Car))
            .await
            .unwrap();
        dispatch.accept_ride(&accepted.id, &driver).await.unwrap();
        assert_eq!(
            dispatch.cancel(&accepted.id).await.unwrap().status(),
            RideStatus::Cancelled
        );

        let started = dispatch
            .request_ride(request(PaymentMethod::Card, VehicleCategory::Car))
            .await
            .unwrap();
        dispatch.accept_ride(&started.id, &driver).await.unwrap();
        dispatch
            .advance(&started.id, RideStatus::InProgress, &driver)
            .await
            .unwrap();
        assert!(matches!(
            dispatch.cancel(&started.id).await,
            Err(DispatchError::InvalidTransition {
                from: RideStatus::InProgress,
                to: RideStatus::Cancelled
            })
        ));
    }

    #[tokio::test]
    async fn test_prepaid_requires_provider() {
        let (registry, _) = coordinator().await;
        let settings = SettingsHandle::default();
        let dispatch = DispatchCoordinator::new(
            registry.clone(),
            PricingEngine::new(settings.clone()),
            SettlementEngine::new(registry.clone(), settings.clone()),
            settings,
        );
        let result = dispatch
            .request_ride(request(PaymentMethod::PrepaidWallet, VehicleCategory::Car))
            .await;
        assert!(matches!(result, Err(DispatchError::PaymentMethodUnavailable)));
        assert!(registry.rides().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_driver_views() {
        let (registry, dispatch) = coordinator().await;
        let car = dispatch
            .request_ride(request(PaymentMethod::Card, VehicleCategory::Car))
            .await
            .unwrap();
        dispatch
            .request_ride(request(PaymentMethod::Card, VehicleCategory::Motorcycle))
            .await
            .unwrap();

        let visible = dispatch.rides_for_driver(&UserId::new("d1")).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, car.id);

        dispatch
            .accept_ride(&car.id, &UserId::new("d1"))
            .await
            .unwrap();
        let visible = dispatch.rides_for_driver(&UserId::new("d1")).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].status(), RideStatus::Accepted);

        assert!(dispatch.available_drivers().await.unwrap().is_empty());
        registry
            .update_user(
                &UserId::new("m1"),
                Box::new(|user: &mut User| {
                    if let Some(profile) = user.as_driver_mut() {
                        profile.online = true;
                    }
                    Ok(())
                }),
            )
            .await
            .unwrap();
        let online = dispatch.available_drivers().await.unwrap();
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].id, UserId::new("m1"));

        let active = dispatch
            .active_ride_for_rider(&UserId::new("r1"))
            .await
            .unwrap();
        assert!(active.is_some());
    }
}
