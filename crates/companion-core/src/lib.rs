pub mod action;
pub mod catalog;
pub mod error;
pub mod spec;

// Re-export commonly used types
pub use action::{ArgSlot, ArgValue, Condition, GenericAction};
pub use catalog::Catalog;
pub use error::{CoreError, CoreResult};
pub use spec::{ActionArgSpec, ActionSpec, CategorySpec, PrimitiveType, Variable};
