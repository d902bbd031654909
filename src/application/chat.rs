use super::registry::RideRegistry;
use crate::domain::ride::{MessageRecord, Ride, RideId};
use crate::domain::user::UserId;
use crate::error::{DispatchError, Result};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Appends chat lines to a ride. Delivery is someone else's job.
#[derive(Clone)]
pub struct ChatRelay {
    registry: Arc<RideRegistry>,
}

impl ChatRelay {
    /// Creates a new chat relay.
    pub fn new(registry: Arc<RideRegistry>) -> Self {
        Self { registry }
    }

    /// Appends a non-blank message to a ride's thread.
    pub async fn append_message(
        &self,
        ride_id: &RideId,
        sender: &UserId,
        text: &str,
    ) -> Result<MessageRecord> {
        if text.trim().is_empty() {
            return Err(DispatchError::validation("message text must not be empty"));
        }
        let message = MessageRecord {
            id: format!("msg-{}", Uuid::new_v4()),
            sender: sender.clone(),
            text: text.to_string(),
            sent_at: Utc::now(),
        };
        let record = message.clone();
        self.registry
            .update_ride(
                ride_id,
                Box::new(move |ride: &mut Ride| {
                    ride.push_message(record);
                    Ok(())
                }),
            )
            .await?;
        Ok(message)
    }
}
