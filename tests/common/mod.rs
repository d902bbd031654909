use ridehail::application::platform::Platform;
use ridehail::domain::money::{Distance, Money};
use ridehail::domain::pricing::PaymentSettings;
use ridehail::domain::ride::{Location, PaymentMethod, RideRequest, ServiceTier, VehicleCategory};
use ridehail::domain::user::{User, UserId};
use rust_decimal::Decimal;
use std::io::{Error, Write};
use tempfile::NamedTempFile;

pub const SCRIPT_HEADER: &str =
    "op,ride,user,origin,destination,distance,payment,vehicle,tier,value,text";

/// A platform with rider `r1` (wallet as given), car drivers `d1`, `d2` and
/// motorcycle driver `m1`.
pub async fn seeded_platform(wallet: Decimal, provider_configured: bool) -> Platform {
    let settings = PaymentSettings {
        provider_configured,
        ..PaymentSettings::default()
    };
    let platform = Platform::in_memory(settings);
    let users = [
        User::rider(UserId::new("r1"), "João", Money::new(wallet)),
        User::driver(UserId::new("d1"), "Carlos", VehicleCategory::Car),
        User::driver(UserId::new("d2"), "Bia", VehicleCategory::Car),
        User::driver(UserId::new("m1"), "Ana", VehicleCategory::Motorcycle),
    ];
    for user in users {
        platform.accounts.register(user).await.unwrap();
    }
    platform
}

pub fn ride_request(
    destination: &str,
    km: Decimal,
    payment: PaymentMethod,
    vehicle: VehicleCategory,
) -> RideRequest {
    RideRequest {
        rider: UserId::new("r1"),
        origin: Location::from_address("Avenida Paulista"),
        destination: Location::from_address(destination),
        distance: Distance::from_km(km).unwrap(),
        payment,
        vehicle,
        tier: ServiceTier::Economy,
    }
}

/// Writes `header` and `rows` to a fresh temporary file.
pub fn csv_file(header: &str, rows: &[&str]) -> Result<NamedTempFile, Error> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "{header}")?;
    for row in rows {
        writeln!(file, "{row}")?;
    }
    file.flush()?;
    Ok(file)
}

pub fn seed_users_file() -> Result<NamedTempFile, Error> {
    csv_file(
        "id,role,name,vehicle,wallet,online",
        &[
            "r1,rider,João,,100.00,",
            "d1,driver,Carlos,car,,true",
            "m1,driver,Ana,motorcycle,,false",
            "a1,administrator,Ops,,,",
        ],
    )
}
