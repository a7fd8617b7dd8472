//! Action-type resolution: turns positional Tasker actions into typed parameters and back

pub mod action_type;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod mapper;
pub mod registry;
pub mod types;

// Re-export commonly used types
pub use action_type::{ActionKind, ActionParams, ActionType, SupportKind};
pub use context::ResolveContext;
pub use descriptor::ActionTypeDescriptor;
pub use error::{RegistryError, RegistryResult};
pub use mapper::{KeyValue, ParameterMapper};
pub use registry::ActionTypeRegistry;
pub use types::{
    GenericParams, HomeAssistantParams, HttpMethod, HttpRequestParams, PopupParams, ServiceData,
};
