use super::registry::RideRegistry;
use crate::domain::money::Money;
use crate::domain::ride::{Ride, RideStatus};
use crate::domain::user::UserId;
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformSummary {
    pub active_rides: usize,
    pub completed_rides: usize,
    pub cancelled_rides: usize,
    pub gross_revenue: Money,
    pub platform_earnings: Money,
    pub driver_payouts: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStatement {
    pub driver: UserId,
    pub name: String,
    pub completed_rides: usize,
    pub gross: Money,
    pub commission: Money,
    pub payout: Money,
}

/// Read-only financial views over the registry.
///
/// Amounts come from each ride's recorded settlement, so a later change of
/// the commission rate does not rewrite history.
#[derive(Clone)]
pub struct ReportService {
    registry: Arc<RideRegistry>,
}

impl ReportService {
    /// Creates a new report service.
    pub fn new(registry: Arc<RideRegistry>) -> Self {
        Self { registry }
    }

    /// Revenue and ride counts built from recorded settlements.
    pub async fn platform_summary(&self) -> Result<PlatformSummary> {
        let rides = self.registry.rides().await?;
        let completed: Vec<&Ride> = rides
            .iter()
            .filter(|ride| ride.status() == RideStatus::Completed)
            .collect();
        Ok(PlatformSummary {
            active_rides: rides
                .iter()
                .filter(|ride| !ride.status().is_terminal())
                .count(),
            completed_rides: completed.len(),
            cancelled_rides: rides
                .iter()
                .filter(|ride| ride.status() == RideStatus::Cancelled)
                .count(),
            gross_revenue: completed.iter().map(|ride| ride.price()).sum(),
            platform_earnings: completed
                .iter()
                .filter_map(|ride| ride.settlement())
                .map(|s| s.platform_commission)
                .sum(),
            driver_payouts: completed
                .iter()
                .filter_map(|ride| ride.settlement())
                .map(|s| s.driver_share)
                .sum(),
        })
    }

    /// One statement per registered driver, ordered by driver id.
    pub async fn driver_statements(&self) -> Result<Vec<DriverStatement>> {
        let rides = self.registry.rides().await?;
        let users = self.registry.users().await?;
        Ok(users
            .into_iter()
            .filter(|user| user.as_driver().is_some())
            .map(|driver| {
                let settled: Vec<_> = rides
                    .iter()
                    .filter(|ride| ride.driver() == Some(&driver.id))
                    .filter_map(|ride| ride.settlement())
                    .collect();
                DriverStatement {
                    completed_rides: settled.len(),
                    gross: settled.iter().map(|s| s.price).sum(),
                    commission: settled.iter().map(|s| s.platform_commission).sum(),
                    payout: settled.iter().map(|s| s.driver_share).sum(),
                    driver: driver.id,
                    name: driver.name,
                }
            })
            .collect())
    }
}
