use super::accounts::AccountService;
use super::advisory::AdvisoryService;
use super::chat::ChatRelay;
use super::dispatch::DispatchCoordinator;
use super::pricing::PricingEngine;
use super::rating::RatingService;
use super::registry::RideRegistry;
use super::reports::ReportService;
use super::settings::SettingsHandle;
use super::settlement::SettlementEngine;
use crate::domain::pricing::PaymentSettings;
use crate::domain::ports::{RideStoreBox, UserStoreBox};
use crate::infrastructure::in_memory::{InMemoryRideStore, InMemoryUserStore};
use std::sync::Arc;

/// Every service wired around one shared registry and one settings handle.
#[derive(Clone)]
pub struct Platform {
    pub registry: Arc<RideRegistry>,
    pub settings: SettingsHandle,
    pub pricing: PricingEngine,
    pub dispatch: DispatchCoordinator,
    pub settlement: SettlementEngine,
    pub rating: RatingService,
    pub chat: ChatRelay,
    pub accounts: AccountService,
    pub reports: ReportService,
    pub advisory: AdvisoryService,
}

impl Platform {
    pub fn new(rides: RideStoreBox, users: UserStoreBox, settings: PaymentSettings) -> Self {
        let registry = Arc::new(RideRegistry::new(rides, users));
        let settings = SettingsHandle::new(settings);
        let pricing = PricingEngine::new(settings.clone());
        let settlement = SettlementEngine::new(registry.clone(), settings.clone());
        let dispatch = DispatchCoordinator::new(
            registry.clone(),
            pricing.clone(),
            settlement.clone(),
            settings.clone(),
        );
        Self {
            rating: RatingService::new(registry.clone()),
            chat: ChatRelay::new(registry.clone()),
            accounts: AccountService::new(registry.clone(), settings.clone()),
            reports: ReportService::new(registry.clone()),
            advisory: AdvisoryService::disabled(),
            registry,
            settings,
            pricing,
            dispatch,
            settlement,
        }
    }

    /// Wires every service over fresh in-memory stores.
    pub fn in_memory(settings: PaymentSettings) -> Self {
        Self::new(
            Box::new(InMemoryRideStore::new()),
            Box::new(InMemoryUserStore::new()),
            settings,
        )
    }

    pub fn with_advisory(mut self, advisory: AdvisoryService) -> Self {
        self.advisory = advisory;
        self
    }
}
