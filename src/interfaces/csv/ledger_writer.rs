use crate::application::reports::DriverStatement;
use crate::domain::ride::{Ride, RideId};
use crate::domain::user::{RoleProfile, User};
use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// Flat view of a user for ledger output. Amounts are normalized strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub user: String,
    pub role: String,
    pub name: String,
    pub wallet: Option<String>,
    pub earnings: Option<String>,
    pub online: Option<bool>,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        let (wallet, earnings, online) = match user.profile() {
            RoleProfile::Rider(profile) => (Some(profile.wallet.to_string()), None, None),
            RoleProfile::Driver(profile) => {
                (None, Some(profile.earnings.to_string()), Some(profile.online))
            }
            RoleProfile::Administrator => (None, None, None),
        };
        Self {
            user: user.id.to_string(),
            role: user.role().to_string(),
            name: user.name.clone(),
            wallet,
            earnings,
            online,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideRow {
    pub ride: String,
    pub rider: String,
    pub driver: Option<String>,
    pub status: String,
    pub price: String,
    pub payment: String,
    pub vehicle: String,
    pub driver_share: Option<String>,
    pub platform_commission: Option<String>,
    pub rating_to_driver: Option<u8>,
    pub rating_to_rider: Option<u8>,
    pub messages: usize,
}

impl RideRow {
    /// `label` replaces the generated ride id when the ride has one.
    pub fn new(ride: &Ride, label: Option<&str>) -> Self {
        let settlement = ride.settlement();
        Self {
            ride: label.map_or_else(|| ride.id.to_string(), str::to_string),
            rider: ride.rider.to_string(),
            driver: ride.driver().map(ToString::to_string),
            status: ride.status().to_string(),
            price: ride.price().to_string(),
            payment: ride.payment.to_string(),
            vehicle: ride.vehicle.to_string(),
            driver_share: settlement.map(|s| s.driver_share.to_string()),
            platform_commission: settlement.map(|s| s.platform_commission.to_string()),
            rating_to_driver: ride.rating_to_driver.map(|r| r.stars()),
            rating_to_rider: ride.rating_to_rider.map(|r| r.stars()),
            messages: ride.messages().len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementRow {
    pub driver: String,
    pub name: String,
    pub completed_rides: usize,
    pub gross: String,
    pub commission: String,
    pub payout: String,
}

impl From<&DriverStatement> for StatementRow {
    fn from(statement: &DriverStatement) -> Self {
        Self {
            driver: statement.driver.to_string(),
            name: statement.name.clone(),
            completed_rides: statement.completed_rides,
            gross: statement.gross.to_string(),
            commission: statement.commission.to_string(),
            payout: statement.payout.to_string(),
        }
    }
}

/// Builds ride rows, preferring script labels over generated ids.
pub fn ride_rows(rides: &[Ride], labels: &HashMap<RideId, String>) -> Vec<RideRow> {
    rides
        .iter()
        .map(|ride| RideRow::new(ride, labels.get(&ride.id).map(String::as_str)))
        .collect()
}

/// Writes ledger rows as CSV with a header line.
pub struct LedgerWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> LedgerWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_rows<T: Serialize>(&mut self, rows: &[T]) -> Result<()> {
        for row in rows {
            self.writer.serialize(row)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_users(&mut self, users: &[User]) -> Result<()> {
        let rows: Vec<UserRow> = users.iter().map(UserRow::from).collect();
        self.write_rows(&rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::{Distance, Money};
    use crate::domain::ride::{
        Location, PaymentMethod, Rating, RideRequest, ServiceTier, VehicleCategory,
    };
    use crate::domain::user::UserId;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_user_ledger() {
        let users = vec![
            User::rider(UserId::new("r1"), "João", Money::new(dec!(125.20))),
            User::driver(UserId::new("d1"), "Carlos", VehicleCategory::Car),
        ];
        let mut out = Vec::new();
        LedgerWriter::new(&mut out).write_users(&users).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("user,role,name,wallet,earnings,online\n"));
        assert!(text.contains("r1,rider,João,125.2,,\n"));
        assert!(text.contains("d1,driver,Carlos,,0,false\n"));
    }

    #[test]
    fn test_ride_rows_use_labels() {
        let request = RideRequest {
            rider: UserId::new("r1"),
            origin: Location::from_address("Avenida Paulista"),
            destination: Location::from_address("Centro Histórico"),
            distance: Distance::from_km(dec!(4.8)).unwrap(),
            payment: PaymentMethod::InstantTransfer,
            vehicle: VehicleCategory::Car,
            tier: ServiceTier::Economy,
        };
        let mut ride = Ride::new(
            RideId::new("ride-42"),
            request,
            Money::new(dec!(24.80)),
            Utc::now(),
        );
        ride.rating_to_driver = Some(Rating::new(5).unwrap());
        let labels = HashMap::from([(RideId::new("ride-42"), "t1".to_string())]);

        let rows = ride_rows(std::slice::from_ref(&ride), &labels);
        assert_eq!(rows[0].ride, "t1");
        assert_eq!(rows[0].price, "24.8");
        assert_eq!(rows[0].payment, "instant-transfer");
        assert_eq!(rows[0].rating_to_driver, Some(5));

        let rows = ride_rows(&[ride], &HashMap::new());
        assert_eq!(rows[0].ride, "ride-42");

        let mut out = Vec::new();
        LedgerWriter::new(&mut out).write_rows(&rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("ride-42,r1,,requested,24.8,instant-transfer,car,,,5,,0"));
    }
}
