use crate::domain::ports::{RideMutator, RideStoreBox, UserMutator, UserStoreBox};
use crate::domain::ride::{Ride, RideId, VehicleCategory};
use crate::domain::user::{Role, User, UserId};
use crate::error::{DispatchError, Result};

/// The authoritative owner of every ride and user.
///
/// Other components hold an `Arc<RideRegistry>` and never keep private copies
/// of entities; every write goes through [`RideRegistry::update_ride`] or
/// [`RideRegistry::update_user`], which serialize writers per entity id.
pub struct RideRegistry {
    rides: RideStoreBox,
    users: UserStoreBox,
}

impl RideRegistry {
    /// Creates a new registry over the given stores.
    pub fn new(rides: RideStoreBox, users: UserStoreBox) -> Self {
        Self { rides, users }
    }

    /// Stores a newly requested ride.
    pub async fn insert_ride(&self, ride: Ride) -> Result<()> {
        self.rides.insert(ride).await
    }

    /// Fetches a snapshot of one ride.
    pub async fn ride(&self, id: &RideId) -> Result<Ride> {
        self.rides
            .get(id)
            .await?
            .ok_or_else(|| DispatchError::ride_not_found(id))
    }

    /// Applies `mutator` to the ride under its lock and returns the committed
    /// ride. A failing mutator leaves the stored ride untouched.
    pub async fn update_ride(&self, id: &RideId, mutator: RideMutator<'_>) -> Result<Ride> {
        self.rides.update(id, mutator).await
    }

    /// All rides, newest first.
    pub async fn rides(&self) -> Result<Vec<Ride>> {
        let mut rides = self.rides.all().await?;
        rides.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(rides)
    }

    /// Rides requested by `rider`, newest first.
    pub async fn rides_by_rider(&self, rider: &UserId) -> Result<Vec<Ride>> {
        Ok(self
            .rides()
            .await?
            .into_iter()
            .filter(|ride| &ride.rider == rider)
            .collect())
    }

    /// Rides assigned to `driver`, newest first.
    pub async fn rides_by_driver(&self, driver: &UserId) -> Result<Vec<Ride>> {
        Ok(self
            .rides()
            .await?
            .into_iter()
            .filter(|ride| ride.driver() == Some(driver))
            .collect())
    }

    /// Unassigned `Requested` rides asking for `category`.
    pub async fn pending_rides(&self, category: VehicleCategory) -> Result<Vec<Ride>> {
        Ok(self
            .rides()
            .await?
            .into_iter()
            .filter(|ride| ride.is_pending_for(category))
            .collect())
    }

    /// Stores a new user. Fails if the id is taken.
    pub async fn insert_user(&self, user: User) -> Result<()> {
        self.users.insert(user).await
    }

    /// Fetches a snapshot of one user.
    pub async fn user(&self, id: &UserId) -> Result<User> {
        self.users
            .get(id)
            .await?
            .ok_or_else(|| DispatchError::user_not_found(id))
    }

    /// Fetches a user and checks it has the `expected` role.
    pub async fn user_with_role(&self, id: &UserId, expected: Role) -> Result<User> {
        let user = self.user(id).await?;
        if user.role() != expected {
            return Err(DispatchError::RoleMismatch {
                user: id.to_string(),
                expected,
            });
        }
        Ok(user)
    }

    /// Same as [`RideRegistry::update_ride`], for users.
    pub async fn update_user(&self, id: &UserId, mutator: UserMutator<'_>) -> Result<User> {
        self.users.update(id, mutator).await
    }

    /// Deletes a user and returns what was stored.
    pub async fn remove_user(&self, id: &UserId) -> Result<User> {
        self.users
            .remove(id)
            .await?
            .ok_or_else(|| DispatchError::user_not_found(id))
    }

    /// All users ordered by id.
    pub async fn users(&self) -> Result<Vec<User>> {
        let mut users = self.users.all().await?;
        users.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(users)
    }
}
