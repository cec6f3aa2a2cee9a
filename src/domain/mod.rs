//! Domain entities exposed by the dashboard service layer.

pub mod api_usage;
pub mod auth;
pub mod communication;
pub mod contact;
pub mod event;
pub mod export;
pub mod extraction;
pub mod report;
pub mod resource;
pub mod types;
