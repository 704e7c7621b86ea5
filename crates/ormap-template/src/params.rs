//! Template parameters.

use crate::ast::Template;
use crate::error::{Result, TemplateError};
use ormap_core::Value;
use std::collections::HashMap;

/// Values for a template's variables.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateParams {
    /// Values by variable name. Missing variables evaluate to null.
    Named(HashMap<String, Value>),
    /// Values assigned to variables in order of their first appearance.
    /// The count must match the number of distinct variables.
    Positional(Vec<Value>),
}

impl Default for TemplateParams {
    fn default() -> Self {
        TemplateParams::Named(HashMap::new())
    }
}

impl TemplateParams {
    /// Named parameters from `(name, value)` pairs.
    pub fn named<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        TemplateParams::Named(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Positional parameters.
    pub fn positional<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        TemplateParams::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Resolve to values by name for `template`.
    pub fn resolve(&self, template: &Template) -> Result<HashMap<String, Value>> {
        match self {
            TemplateParams::Named(values) => Ok(values.clone()),
            TemplateParams::Positional(values) => {
                let names = template.parameter_names();
                if names.len() != values.len() {
                    return Err(TemplateError::ParameterCount {
                        expected: names.len(),
                        actual: values.len(),
                    });
                }
                Ok(names.into_iter().zip(values.iter().cloned()).collect())
            }
        }
    }
}
