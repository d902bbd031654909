use super::money::Money;
use super::ride::VehicleCategory;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("u-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Administrator,
    Driver,
    Rider,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Administrator => "administrator",
            Self::Driver => "driver",
            Self::Rider => "rider",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverProfile {
    pub vehicle: VehicleCategory,
    /// Cumulative driver share of every settled ride.
    pub earnings: Money,
    /// Maintained by the presentation layer; read only for listings.
    pub online: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiderProfile {
    /// Prepaid wallet. May go negative, see `SettlementEngine`.
    pub wallet: Money,
}

/// Role-specific state. The variant is fixed when the user is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum RoleProfile {
    Administrator,
    Driver(DriverProfile),
    Rider(RiderProfile),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    profile: RoleProfile,
}

impl User {
    pub fn rider(id: UserId, name: impl Into<String>, wallet: Money) -> Self {
        Self {
            id,
            name: name.into(),
            profile: RoleProfile::Rider(RiderProfile { wallet }),
        }
    }

    pub fn driver(id: UserId, name: impl Into<String>, vehicle: VehicleCategory) -> Self {
        Self {
            id,
            name: name.into(),
            profile: RoleProfile::Driver(DriverProfile {
                vehicle,
                earnings: Money::ZERO,
                online: false,
            }),
        }
    }

    pub fn administrator(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            profile: RoleProfile::Administrator,
        }
    }

    pub fn role(&self) -> Role {
        match self.profile {
            RoleProfile::Administrator => Role::Administrator,
            RoleProfile::Driver(_) => Role::Driver,
            RoleProfile::Rider(_) => Role::Rider,
        }
    }

    pub fn profile(&self) -> &RoleProfile {
        &self.profile
    }

    pub fn as_driver(&self) -> Option<&DriverProfile> {
        match &self.profile {
            RoleProfile::Driver(driver) => Some(driver),
            _ => None,
        }
    }

    /// Mutable access to driver state. The role itself cannot be changed.
    pub fn as_driver_mut(&mut self) -> Option<&mut DriverProfile> {
        match &mut self.profile {
            RoleProfile::Driver(driver) => Some(driver),
            _ => None,
        }
    }

    pub fn as_rider(&self) -> Option<&RiderProfile> {
        match &self.profile {
            RoleProfile::Rider(rider) => Some(rider),
            _ => None,
        }
    }

    pub fn as_rider_mut(&mut self) -> Option<&mut RiderProfile> {
        match &mut self.profile {
            RoleProfile::Rider(rider) => Some(rider),
            _ => None,
        }
    }
}
