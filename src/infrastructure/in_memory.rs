use crate::domain::ports::{RideMutator, RideStore, UserMutator, UserStore};
use crate::domain::ride::{Ride, RideId};
use crate::domain::user::{User, UserId};
use crate::error::{DispatchError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type Slot<T> = Arc<Mutex<T>>;

/// A thread-safe in-memory store for rides.
///
/// The map lock only guards slot lookup and insertion. Each ride sits behind
/// its own mutex, so `update` calls on the same ride run one at a time while
/// updates to different rides proceed independently.
#[derive(Default, Clone)]
pub struct InMemoryRideStore {
    rides: Arc<RwLock<HashMap<RideId, Slot<Ride>>>>,
}

impl InMemoryRideStore {
    /// Creates a new, empty in-memory ride store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: &RideId) -> Option<Slot<Ride>> {
        self.rides.read().await.get(id).cloned()
    }
}

#[async_trait]
impl RideStore for InMemoryRideStore {
    async fn insert(&self, ride: Ride) -> Result<()> {
        let mut rides = self.rides.write().await;
        match rides.entry(ride.id.clone()) {
            Entry::Occupied(_) => Err(DispatchError::validation(format!(
                "ride {} already exists",
                ride.id
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(Mutex::new(ride)));
                Ok(())
            }
        }
    }

    async fn get(&self, id: &RideId) -> Result<Option<Ride>> {
        match self.slot(id).await {
            Some(slot) => {
                let entity = slot.lock().await.clone();
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, id: &RideId, mutator: RideMutator<'_>) -> Result<Ride> {
        let slot = self
            .slot(id)
            .await
            .ok_or_else(|| DispatchError::ride_not_found(id))?;
        let mut current = slot.lock().await;
        let mut draft = current.clone();
        mutator(&mut draft)?;
        *current = draft.clone();
        Ok(draft)
    }

    async fn all(&self) -> Result<Vec<Ride>> {
        let slots: Vec<Slot<Ride>> = self.rides.read().await.values().cloned().collect();
        let mut rides = Vec::with_capacity(slots.len());
        for slot in slots {
            rides.push(slot.lock().await.clone());
        }
        Ok(rides)
    }
}

/// A thread-safe in-memory store for users, locked per user like
/// [`InMemoryRideStore`].
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<UserId, Slot<User>>>>,
}

impl InMemoryUserStore {
    /// Creates a new, empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, id: &UserId) -> Option<Slot<User>> {
        self.users.read().await.get(id).cloned()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        match users.entry(user.id.clone()) {
            Entry::Occupied(_) => Err(DispatchError::validation(format!(
                "user {} already exists",
                user.id
            ))),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(Mutex::new(user)));
                Ok(())
            }
        }
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>> {
        match self.slot(id).await {
            Some(slot) => {
                let entity = slot.lock().await.clone();
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, id: &UserId, mutator: UserMutator<'_>) -> Result<User> {
        let slot = self
            .slot(id)
            .await
            .ok_or_else(|| DispatchError::user_not_found(id))?;
        let mut current = slot.lock().await;
        let mut draft = current.clone();
        mutator(&mut draft)?;
        *current = draft.clone();
        Ok(draft)
    }

    async fn remove(&self, id: &UserId) -> Result<Option<User>> {
        let slot = self.users.write().await.remove(id);
        match slot {
            Some(slot) => {
                let entity = slot.lock().await.clone();
                Ok(Some(entity))
            }
            None => Ok(None),
        }
    }

    async fn all(&self) -> Result<Vec<User>> {
        let slots: Vec<Slot<User>> = self.users.read().await.values().cloned().collect();
        let mut users = Vec::with_capacity(slots.len());
        for slot in slots {
            users.push(slot.lock().await.clone());
        }
        Ok(users)
    }
}
