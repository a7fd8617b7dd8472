//! In-memory catalog of action and category specs

use crate::action::GenericAction;
use crate::error::{CoreError, CoreResult};
use crate::spec::{ActionSpec, CategorySpec};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    action_specs: Vec<ActionSpec>,
    category_specs: Vec<CategorySpec>,
}

impl Catalog {
    pub fn new(action_specs: Vec<ActionSpec>, category_specs: Vec<CategorySpec>) -> Self {
        Self {
            action_specs,
            category_specs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.action_specs.is_empty()
    }

    pub fn action_specs(&self) -> &[ActionSpec] {
        &self.action_specs
    }

    pub fn category_specs(&self) -> &[CategorySpec] {
        &self.category_specs
    }

    pub fn spec_for(&self, code: i64) -> Option<&ActionSpec> {
        self.action_specs.iter().find(|spec| spec.code == code)
    }

    pub fn category(&self, code: i64) -> Option<&CategorySpec> {
        self.category_specs.iter().find(|category| category.code == code)
    }

    pub fn specs_in_category(&self, category_code: i64) -> impl Iterator<Item = &ActionSpec> {
        self.action_specs
            .iter()
            .filter(move |spec| spec.category_code == category_code)
    }

    /// Build a new action for the given code from its declared spec
    pub fn create_action(&self, code: i64) -> CoreResult<GenericAction> {
        let spec = self
            .spec_for(code)
            .ok_or_else(|| CoreError::NotFound(format!("action spec {}", code)))?;
        tracing::debug!(code, name = %spec.name, "Creating action from spec");
        Ok(spec.create_action())
    }
}
