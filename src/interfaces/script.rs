use super::csv::command_reader::{Command, Op};
use crate::application::platform::Platform;
use crate::domain::money::{Distance, Money};
use crate::domain::ride::{
    Location, PaymentMethod, Rating, RideId, RideRequest, RideStatus, VehicleCategory,
};
use crate::domain::user::UserId;
use crate::error::{DispatchError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub applied: usize,
    pub rejected: usize,
}

/// Applies script commands to a [`Platform`], mapping ride labels to the
/// ids generated on `request`.
pub struct ScriptRunner<'a> {
    platform: &'a Platform,
    labels: HashMap<String, RideId>,
}

impl<'a> ScriptRunner<'a> {
    pub fn new(platform: &'a Platform) -> Self {
        Self {
            platform,
            labels: HashMap::new(),
        }
    }

    /// Reverse label lookup for ledger output.
    pub fn labels_by_ride(&self) -> HashMap<RideId, String> {
        self.labels
            .iter()
            .map(|(label, id)| (id.clone(), label.clone()))
            .collect()
    }

    /// Replays every command. Failures are logged and skipped.
    pub async fn replay(
        &mut self,
        commands: impl IntoIterator<Item = Result<Command>>,
    ) -> ReplayOutcome {
        let mut outcome = ReplayOutcome::default();
        for (index, command) in commands.into_iter().enumerate() {
            let line = index + 2;
            let result = match command {
                Ok(command) => self.apply(&command).await,
                Err(err) => Err(err),
            };
            match result {
                Ok(()) => outcome.applied += 1,
                Err(err) => {
                    warn!(line, error = %err, "command rejected");
                    outcome.rejected += 1;
                }
            }
        }
        outcome
    }

    pub async fn apply(&mut self, command: &Command) -> Result<()> {
        match command.op {
            Op::Request => self.request(command).await,
            Op::Accept => {
                let ride = self.ride(command)?;
                let driver = UserId::new(command.user_id()?);
                self.platform.dispatch.accept_ride(&ride, &driver).await?;
                Ok(())
            }
            Op::Pickup => self.advance(command, RideStatus::Pickup).await,
            Op::Start => self.advance(command, RideStatus::InProgress).await,
            Op::Complete => self.advance(command, RideStatus::Completed).await,
            Op::Cancel => {
                let ride = self.ride(command)?;
                self.platform.dispatch.cancel(&ride).await?;
                Ok(())
            }
            Op::Rate => {
                let ride = self.ride(command)?;
                let rater = self
                    .platform
                    .registry
                    .user(&UserId::new(command.user_id()?))
                    .await?;
                let stars = command
                    .value()?
                    .parse::<u8>()
                    .map_err(|_| DispatchError::validation("rating must be a whole number"))?;
                self.platform
                    .rating
                    .rate(&ride, Rating::new(stars)?, rater.role())
                    .await?;
                Ok(())
            }
            Op::Message => {
                let ride = self.ride(command)?;
                let sender = UserId::new(command.user_id()?);
                let text = command.text.as_deref().unwrap_or_default();
                self.platform.chat.append_message(&ride, &sender, text).await?;
                Ok(())
            }
            Op::Topup => {
                let rider = UserId::new(command.user_id()?);
                let amount = Decimal::from_str(command.value()?)
                    .map_err(|err| DispatchError::validation(format!("bad amount: {err}")))?;
                self.platform
                    .accounts
                    .top_up(&rider, Money::new(amount))
                    .await?;
                Ok(())
            }
            Op::Online => {
                let driver = UserId::new(command.user_id()?);
                let online = command
                    .value()?
                    .parse::<bool>()
                    .map_err(|_| DispatchError::validation("online expects true or false"))?;
                self.platform
                    .accounts
                    .set_driver_online(&driver, online)
                    .await?;
                Ok(())
            }
        }
    }

    async fn request(&mut self, command: &Command) -> Result<()> {
        let label = command.ride_label()?;
        if self.labels.contains_key(label) {
            return Err(DispatchError::validation(format!(
                "ride label {label} is already bound"
            )));
        }
        let destination = command
            .destination
            .as_deref()
            .ok_or_else(|| DispatchError::validation("request needs a destination"))?;
        let distance = command
            .distance
            .ok_or_else(|| DispatchError::validation("request needs a distance"))?;
        let request = RideRequest {
            rider: UserId::new(command.user_id()?),
            origin: Location::from_address(command.origin.clone().unwrap_or_default()),
            destination: Location::from_address(destination),
            distance: Distance::from_km(distance)?,
            payment: command.payment.unwrap_or(PaymentMethod::Card),
            vehicle: command.vehicle.unwrap_or(VehicleCategory::Car),
            tier: command.tier.unwrap_or_default(),
        };
        let ride = self.platform.dispatch.request_ride(request).await?;
        self.labels.insert(label.to_string(), ride.id);
        Ok(())
    }

    async fn advance(&self, command: &Command, target: RideStatus) -> Result<()> {
        let ride = self.ride(command)?;
        let driver = UserId::new(command.user_id()?);
        self.platform.dispatch.advance(&ride, target, &driver).await?;
        Ok(())
    }

    fn ride(&self, command: &Command) -> Result<RideId> {
        let label = command.ride_label()?;
        self.labels
            .get(label)
            .cloned()
            .ok_or_else(|| DispatchError::NotFound {
                entity: "ride label",
                id: label.to_string(),
            })
    }
}
