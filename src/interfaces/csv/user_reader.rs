use crate::domain::money::Money;
use crate::domain::ride::VehicleCategory;
use crate::domain::user::{Role, User, UserId};
use crate::error::{DispatchError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    role: Role,
    name: String,
    vehicle: Option<VehicleCategory>,
    wallet: Option<Decimal>,
    online: Option<bool>,
}

impl TryFrom<UserRecord> for User {
    type Error = DispatchError;

    fn try_from(record: UserRecord) -> Result<Self> {
        let id = UserId::new(record.id);
        match record.role {
            Role::Administrator => Ok(User::administrator(id, record.name)),
            Role::Rider => {
                let wallet = record.wallet.map(Money::new).unwrap_or_default();
                Ok(User::rider(id, record.name, wallet))
            }
            Role::Driver => {
                let vehicle = record.vehicle.ok_or_else(|| {
                    DispatchError::validation(format!("driver {id} has no vehicle category"))
                })?;
                let mut user = User::driver(id, record.name, vehicle);
                if let Some(profile) = user.as_driver_mut() {
                    profile.online = record.online.unwrap_or(false);
                }
                Ok(user)
            }
        }
    }
}

/// Reads seed users from a CSV source with the header
/// `id, role, name, vehicle, wallet, online`.
///
/// `vehicle` is required for drivers, `wallet` only applies to riders and
/// `online` only to drivers.
pub struct UserReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> UserReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn users(self) -> impl Iterator<Item = Result<User>> {
        self.reader
            .into_deserialize::<UserRecord>()
            .map(|record| User::try_from(record?))
    }
}
