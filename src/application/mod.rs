//! Application layer coordinating rides, money and users.
//!
//! All services share one [`registry::RideRegistry`] behind an `Arc` and one
//! [`settings::SettingsHandle`]. [`platform::Platform`] wires them together.

pub mod accounts;
pub mod advisory;
pub mod chat;
pub mod dispatch;
pub mod platform;
pub mod pricing;
pub mod rating;
pub mod registry;
pub mod reports;
pub mod settings;
pub mod settlement;
