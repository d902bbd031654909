use super::registry::RideRegistry;
use crate::domain::ride::{Rating, Ride, RideId};
use crate::domain::user::Role;
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// Records post-ride ratings.
///
/// A rating is accepted whatever the ride's status, and a later rating from
/// the same side replaces the earlier one.
#[derive(Clone)]
pub struct RatingService {
    registry: Arc<RideRegistry>,
}

impl RatingService {
    /// Creates a new rating service.
    pub fn new(registry: Arc<RideRegistry>) -> Self {
        Self { registry }
    }

    /// A rider's rating lands on the driver; anyone else's on the rider.
    pub async fn rate(&self, ride_id: &RideId, rating: Rating, rater: Role) -> Result<Ride> {
        let ride = self
            .registry
            .update_ride(
                ride_id,
                Box::new(|ride: &mut Ride| {
                    match rater {
                        Role::Rider => ride.rating_to_driver = Some(rating),
                        Role::Driver | Role::Administrator => ride.rating_to_rider = Some(rating),
                    }
                    Ok(())
                }),
            )
            .await?;
        debug!(ride = %ride_id, stars = rating.stars(), %rater, "rating recorded");
        Ok(ride)
    }
}
