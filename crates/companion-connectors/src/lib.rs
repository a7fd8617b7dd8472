//! Remote clients for the Tasker HTTP server and the Home Assistant hub.
//!
//! Every remote call goes through a [`RequestCoordinator`], which keeps at most
//! one call in flight per operation key and retries fast transient failures.

pub mod coordinator;
pub mod error;
pub mod homeassistant;
mod response;
pub mod retry;
pub mod session;
pub mod status;
pub mod tasker;
pub mod url_builder;

// Re-export commonly used types
pub use coordinator::RequestCoordinator;
pub use error::{ConnectorError, ConnectorResult};
pub use homeassistant::{ActualService, DomainServices, Entity, HomeAssistantClient, ServiceField};
pub use retry::{ErrorClassification, RetryDecision, RetryManager, RetryPolicy};
pub use session::CompanionSession;
pub use status::{ActivityStatus, ConnectionStatus, StatusHandle, StatusSnapshot};
pub use tasker::TaskerClient;
pub use url_builder::UrlBuilder;
