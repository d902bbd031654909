use crate::domain::ride::{PaymentMethod, ServiceTier, VehicleCategory};
use crate::error::{DispatchError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fmt;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Request,
    Accept,
    Pickup,
    Start,
    Complete,
    Cancel,
    Rate,
    Message,
    Topup,
    Online,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Request => "request",
            Self::Accept => "accept",
            Self::Pickup => "pickup",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::Rate => "rate",
            Self::Message => "message",
            Self::Topup => "topup",
            Self::Online => "online",
        };
        f.write_str(name)
    }
}

/// One line of a ride command script.
///
/// Which columns matter depends on `op`; the rest stay empty.
#[derive(Debug, Clone, Deserialize)]
pub struct Command {
    pub op: Op,
    /// Script-local ride label, bound by `request`.
    pub ride: Option<String>,
    pub user: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub distance: Option<Decimal>,
    pub payment: Option<PaymentMethod>,
    pub vehicle: Option<VehicleCategory>,
    pub tier: Option<ServiceTier>,
    /// Stars for `rate`, amount for `topup`, `true`/`false` for `online`.
    pub value: Option<String>,
    pub text: Option<String>,
}

impl Command {
    pub fn ride_label(&self) -> Result<&str> {
        self.ride
            .as_deref()
            .ok_or_else(|| DispatchError::validation(format!("{} needs a ride label", self.op)))
    }

    pub fn user_id(&self) -> Result<&str> {
        self.user
            .as_deref()
            .ok_or_else(|| DispatchError::validation(format!("{} needs a user", self.op)))
    }

    pub fn value(&self) -> Result<&str> {
        self.value
            .as_deref()
            .ok_or_else(|| DispatchError::validation(format!("{} needs a value", self.op)))
    }
}

/// Reads ride commands from a CSV source.
///
/// The header is `op, ride, user, origin, destination, distance, payment,
/// vehicle, tier, value, text`. Whitespace is trimmed and short records are
/// accepted, so trailing empty columns may be omitted.
pub struct CommandReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes commands; a malformed line yields an error and
    /// reading carries on with the next one.
    pub fn commands(self) -> impl Iterator<Item = Result<Command>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(DispatchError::from))
    }
}
