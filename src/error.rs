use crate::domain::money::Money;
use crate::domain::ride::{RideStatus, VehicleCategory};
use crate::domain::user::Role;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: RideStatus, to: RideStatus },
    #[error("ride {ride} was already accepted; driver {driver} arrived too late")]
    DuplicateAcceptance { ride: String, driver: String },
    #[error("insufficient wallet balance: required {required}, available {available}")]
    InsufficientBalance { required: Money, available: Money },
    #[error("vehicle category mismatch: ride requested {requested}, driver offers {offered}")]
    CategoryMismatch {
        requested: VehicleCategory,
        offered: VehicleCategory,
    },
    #[error("user {user} is not a {expected}")]
    RoleMismatch { user: String, expected: Role },
    #[error("driver {driver} is not assigned to ride {ride}")]
    NotAssignedDriver { ride: String, driver: String },
    #[error("prepaid wallet is unavailable: no payment provider configured")]
    PaymentMethodUnavailable,
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("advisory text unavailable: {0}")]
    AdvisoryUnavailable(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    pub fn ride_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "ride",
            id: id.to_string(),
        }
    }

    pub fn user_not_found(id: impl ToString) -> Self {
        Self::NotFound {
            entity: "user",
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
