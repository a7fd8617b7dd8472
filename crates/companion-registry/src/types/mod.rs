//! Built-in action types

pub mod generic;
pub mod homeassistant;
pub mod http_request;
pub mod popup;

pub use generic::GenericParams;
pub use homeassistant::{HomeAssistantParams, ServiceData};
pub use http_request::{HttpMethod, HttpRequestParams};
pub use popup::PopupParams;

use crate::descriptor::ActionTypeDescriptor;

/// Base types in resolution order; the catch-all default type must stay last
pub fn base_types() -> Vec<ActionTypeDescriptor> {
    vec![
        ActionTypeDescriptor::of::<PopupParams>(),
        ActionTypeDescriptor::of::<HttpRequestParams>(),
        ActionTypeDescriptor::of::<GenericParams>(),
    ]
}

pub fn plugin_types() -> Vec<ActionTypeDescriptor> {
    vec![ActionTypeDescriptor::of::<HomeAssistantParams>()]
}
