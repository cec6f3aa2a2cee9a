//! Database models shared across the dashboard repository.

pub mod api_usage;
#[cfg(feature = "server")]
pub mod auth;
pub mod communication;
#[cfg(feature = "server")]
pub mod config;
pub mod contact;
pub mod event;
pub mod export;
pub mod extraction;
pub mod report;
pub mod resource;
