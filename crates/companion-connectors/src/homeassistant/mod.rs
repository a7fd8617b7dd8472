//! Home Assistant hub connector

mod client;
mod types;

pub use client::HomeAssistantClient;
pub use types::{ActualService, DomainServices, Entity, HaService, ServiceField};
