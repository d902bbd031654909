use super::money::{Distance, Money, Percentage};
use super::user::UserId;
use crate::error::{DispatchError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RideId(String);

impl RideId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("ride-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a ride.
///
/// ```text
/// Requested -> Accepted -> [Pickup ->] InProgress -> Completed
///     |            |
///     +-> Cancelled <-+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RideStatus {
    Requested,
    Accepted,
    Pickup,
    InProgress,
    Completed,
    Cancelled,
}

impl RideStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn is_cancellable(self) -> bool {
        matches!(self, Self::Requested | Self::Accepted)
    }

    /// The single table of permitted edges. Every status change goes through it.
    pub fn can_transition_to(self, next: Self) -> bool {
        use RideStatus::*;
        matches!(
            (self, next),
            (Requested, Accepted)
                | (Requested, Cancelled)
                | (Accepted, Pickup)
                | (Accepted, InProgress)
                | (Accepted, Cancelled)
                | (Pickup, InProgress)
                | (InProgress, Completed)
        )
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::Pickup => "pickup",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    Card,
    #[serde(alias = "pix")]
    InstantTransfer,
    Cash,
    #[serde(alias = "prepaid")]
    PrepaidWallet,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Card => "card",
            Self::InstantTransfer => "instant-transfer",
            Self::Cash => "cash",
            Self::PrepaidWallet => "prepaid-wallet",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleCategory {
    Car,
    Motorcycle,
}

impl VehicleCategory {
    pub fn fare_multiplier(self) -> Decimal {
        match self {
            Self::Car => Decimal::ONE,
            Self::Motorcycle => dec!(0.65),
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Car => "car",
            Self::Motorcycle => "motorcycle",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceTier {
    #[default]
    Economy,
    Comfort,
    Premium,
}

impl ServiceTier {
    pub fn fare_multiplier(self) -> Decimal {
        match self {
            Self::Economy => Decimal::ONE,
            Self::Comfort => dec!(1.3),
            Self::Premium => dec!(1.8),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(address: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            address: address.into(),
            lat,
            lng,
        }
    }

    /// A location known only by its address.
    pub fn from_address(address: impl Into<String>) -> Self {
        Self::new(address, 0.0, 0.0)
    }
}

/// A one-to-five star rating.
///
/// Values outside one to five are rejected rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(stars: u8) -> Result<Self> {
        if (1..=5).contains(&stars) {
            Ok(Self(stars))
        } else {
            Err(DispatchError::validation(format!(
                "rating must be between 1 and 5, got {stars}"
            )))
        }
    }

    pub fn stars(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = DispatchError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// Chat line attached to a ride. The text is never interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub sender: UserId,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: RideStatus,
    pub at: DateTime<Utc>,
}

/// The money movements applied when a ride completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub price: Money,
    pub commission_rate: Percentage,
    pub platform_commission: Money,
    pub driver_share: Money,
    /// Amount taken from the rider's prepaid wallet, if that was the method.
    pub wallet_debit: Option<Money>,
    pub settled_at: DateTime<Utc>,
}

/// Everything a rider supplies to ask for a ride.
#[derive(Debug, Clone, PartialEq)]
pub struct RideRequest {
    pub rider: UserId,
    pub origin: Location,
    pub destination: Location,
    pub distance: Distance,
    pub payment: PaymentMethod,
    pub vehicle: VehicleCategory,
    pub tier: ServiceTier,
}

/// A requested trip and its full lifecycle record.
///
/// Price and driver are private: the price is fixed at creation and a driver
/// can be assigned exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub rider: UserId,
    driver: Option<UserId>,
    pub origin: Location,
    pub destination: Location,
    pub distance: Distance,
    status: RideStatus,
    price: Money,
    pub payment: PaymentMethod,
    pub vehicle: VehicleCategory,
    pub tier: ServiceTier,
    pub created_at: DateTime<Utc>,
    history: Vec<StatusChange>,
    pub rating_to_driver: Option<Rating>,
    pub rating_to_rider: Option<Rating>,
    messages: Vec<MessageRecord>,
    settlement: Option<Settlement>,
}

impl Ride {
    pub fn new(id: RideId, request: RideRequest, price: Money, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            rider: request.rider,
            driver: None,
            origin: request.origin,
            destination: request.destination,
            distance: request.distance,
            status: RideStatus::Requested,
            price,
            payment: request.payment,
            vehicle: request.vehicle,
            tier: request.tier,
            created_at,
            history: vec![StatusChange {
                status: RideStatus::Requested,
                at: created_at,
            }],
            rating_to_driver: None,
            rating_to_rider: None,
            messages: Vec::new(),
            settlement: None,
        }
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn status(&self) -> RideStatus {
        self.status
    }

    pub fn driver(&self) -> Option<&UserId> {
        self.driver.as_ref()
    }

    pub fn history(&self) -> &[StatusChange] {
        &self.history
    }

    pub fn messages(&self) -> &[MessageRecord] {
        &self.messages
    }

    pub fn settlement(&self) -> Option<&Settlement> {
        self.settlement.as_ref()
    }

    /// Whether a driver of `category` should be offered this ride.
    pub fn is_pending_for(&self, category: VehicleCategory) -> bool {
        self.status == RideStatus::Requested && self.driver.is_none() && self.vehicle == category
    }

    pub fn transition_to(&mut self, next: RideStatus, at: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DispatchError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.history.push(StatusChange { status: next, at });
        Ok(())
    }

    /// Binds `driver` to the ride and moves it to `Accepted`.
    pub fn assign_driver(
        &mut self,
        driver: &UserId,
        offered: VehicleCategory,
        at: DateTime<Utc>,
    ) -> Result<()> {
        if self.driver.is_some() {
            return Err(DispatchError::DuplicateAcceptance {
                ride: self.id.to_string(),
                driver: driver.to_string(),
            });
        }
        if self.vehicle != offered {
            return Err(DispatchError::CategoryMismatch {
                requested: self.vehicle,
                offered,
            });
        }
        self.transition_to(RideStatus::Accepted, at)?;
        self.driver = Some(driver.clone());
        Ok(())
    }

    pub fn push_message(&mut self, message: MessageRecord) {
        self.messages.push(message);
    }

    /// Stores the settlement unless one is already present.
    ///
    /// Returns `false` when the ride had been settled before.
    pub fn record_settlement(&mut self, settlement: Settlement) -> bool {
        if self.settlement.is_some() {
            return false;
        }
        self.settlement = Some(settlement);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_ride() -> Ride {
        let request = RideRequest {
            rider: UserId::new("r1"),
            origin: Location::from_address("Praça da Sé"),
            destination: Location::from_address("Centro Histórico"),
            distance: Distance::from_km(dec!(4.8)).unwrap(),
            payment: PaymentMethod::Card,
            vehicle: VehicleCategory::Car,
            tier: ServiceTier::Economy,
        };
        Ride::new(RideId::new("ride-1"), request, Money::new(dec!(24.80)), Utc::now())
    }

    #[test]
    fn test_transition_table() {
        use RideStatus::*;
        let all = [Requested, Accepted, Pickup, InProgress, Completed, Cancelled];
        let allowed = [
            (Requested, Accepted),
            (Requested, Cancelled),
            (Accepted, Pickup),
            (Accepted, InProgress),
            (Accepted, Cancelled),
            (Pickup, InProgress),
            (InProgress, Completed),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for status in [RideStatus::Completed, RideStatus::Cancelled] {
            assert!(status.is_terminal());
            assert!(!status.is_cancellable());
        }
        assert!(!RideStatus::InProgress.is_cancellable());
        assert!(!RideStatus::Pickup.is_cancellable());
    }

    #[test]
    fn test_assign_driver_once() {
        let mut ride = sample_ride();
        ride.assign_driver(&UserId::new("d1"), VehicleCategory::Car, Utc::now())
            .unwrap();
        assert_eq!(ride.status(), RideStatus::Accepted);
        assert_eq!(ride.driver(), Some(&UserId::new("d1")));

        let second = ride.assign_driver(&UserId::new("d2"), VehicleCategory::Car, Utc::now());
        assert!(matches!(
            second,
            Err(DispatchError::DuplicateAcceptance { .. })
        ));
        assert_eq!(ride.driver(), Some(&UserId::new("d1")));
    }

    #[test]
    fn test_assign_driver_checks_category() {
        let mut ride = sample_ride();
        let result = ride.assign_driver(&UserId::new("d1"), VehicleCategory::Motorcycle, Utc::now());
        assert!(matches!(
            result,
            Err(DispatchError::CategoryMismatch {
                requested: VehicleCategory::Car,
                offered: VehicleCategory::Motorcycle
            })
        ));
        assert_eq!(ride.status(), RideStatus::Requested);
        assert!(ride.driver().is_none());
    }

    #[test]
    fn test_cancelled_ride_cannot_be_accepted() {
        let mut ride = sample_ride();
        ride.transition_to(RideStatus::Cancelled, Utc::now()).unwrap();
        let result = ride.assign_driver(&UserId::new("d1"), VehicleCategory::Car, Utc::now());
        assert!(matches!(
            result,
            Err(DispatchError::InvalidTransition {
                from: RideStatus::Cancelled,
                to: RideStatus::Accepted
            })
        ));
    }

    #[test]
    fn test_history_tracks_every_change() {
        let mut ride = sample_ride();
        ride.assign_driver(&UserId::new("d1"), VehicleCategory::Car, Utc::now())
            .unwrap();
        ride.transition_to(RideStatus::InProgress, Utc::now()).unwrap();
        ride.transition_to(RideStatus::Completed, Utc::now()).unwrap();
        let statuses: Vec<_> = ride.history().iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![
                RideStatus::Requested,
                RideStatus::Accepted,
                RideStatus::InProgress,
                RideStatus::Completed
            ]
        );
        assert!(ride.transition_to(RideStatus::InProgress, Utc::now()).is_err());
    }

    #[test]
    fn test_settlement_recorded_once() {
        let mut ride = sample_ride();
        let settlement = Settlement {
            price: ride.price(),
            commission_rate: Percentage::new(dec!(15)).unwrap(),
            platform_commission: Money::new(dec!(3.72)),
            driver_share: Money::new(dec!(21.08)),
            wallet_debit: None,
            settled_at: Utc::now(),
        };
        assert!(ride.record_settlement(settlement.clone()));
        assert!(!ride.record_settlement(settlement));
    }

    #[test]
    fn test_rating_bounds() {
        assert!(Rating::new(1).is_ok());
        assert!(Rating::new(5).is_ok());
        assert!(Rating::new(0).is_err());
        assert!(Rating::new(6).is_err());
    }

    #[test]
    fn test_payment_method_aliases() {
        let parsed: PaymentMethod = serde_json::from_str("\"pix\"").unwrap();
        assert_eq!(parsed, PaymentMethod::InstantTransfer);
        let parsed: PaymentMethod = serde_json::from_str("\"prepaid\"").unwrap();
        assert_eq!(parsed, PaymentMethod::PrepaidWallet);
    }
}
