use super::ride::{Ride, RideId};
use super::user::{User, UserId};
use crate::error::Result;
use async_trait::async_trait;

/// A transformation applied to one ride under that ride's lock.
///
/// Returning an error discards every change the closure made.
pub type RideMutator<'a> = Box<dyn FnOnce(&mut Ride) -> Result<()> + Send + 'a>;

/// A transformation applied to one user under that user's lock.
pub type UserMutator<'a> = Box<dyn FnOnce(&mut User) -> Result<()> + Send + 'a>;

#[async_trait]
pub trait RideStore: Send + Sync {
    /// Adds a new ride. Fails with `ValidationError` if the id is taken.
    async fn insert(&self, ride: Ride) -> Result<()>;
    async fn get(&self, id: &RideId) -> Result<Option<Ride>>;
    /// Applies `mutator` atomically and returns the committed ride.
    async fn update(&self, id: &RideId, mutator: RideMutator<'_>) -> Result<Ride>;
    async fn all(&self) -> Result<Vec<Ride>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> Result<()>;
    async fn get(&self, id: &UserId) -> Result<Option<User>>;
    async fn update(&self, id: &UserId, mutator: UserMutator<'_>) -> Result<User>;
    async fn remove(&self, id: &UserId) -> Result<Option<User>>;
    async fn all(&self) -> Result<Vec<User>>;
}

pub type RideStoreBox = Box<dyn RideStore>;
pub type UserStoreBox = Box<dyn UserStore>;

/// External text generator used for advisory copy shown to users.
///
/// Output never influences prices, statuses or balances.
#[async_trait]
pub trait AdvisoryTextProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
