//! Lookup scopes.
//!
//! Every scope is a [`Provider`]: KVC instances, lambda call frames, host
//! variable maps and the built-in library at the root. A provider answers
//! for its own names and delegates everything else to its parent, which is
//! captured once at construction and never re-pointed.
//!
//! Names are matched case-insensitively; callers pass the lower-cased name.

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::error::Result;
use crate::kvc::{Kvc, Visited};
use crate::value::Value;

/// Shared handle to a scope.
pub type ProviderRef = Rc<dyn Provider>;

pub trait Provider {
    /// Resolve `name` (already lower-cased) here or along the parent chain.
    fn get(&self, name: &str) -> Result<Option<Value>>;

    /// Cheap existence check; never evaluates anything.
    fn is_defined(&self, name: &str) -> bool;

    fn parent(&self) -> Option<&ProviderRef>;

    /// Does this scope hold on to `kvc`, directly or through its parent and
    /// values?
    fn reaches(&self, _kvc: &Kvc, _seen: &mut Visited) -> bool {
        false
    }
}

/// Plain name → value scope, used for host variables and the built-ins.
/// A map is filled before it is shared, so it never holds a KVC created
/// after it and keeps the default [`Provider::reaches`].
pub struct MapProvider {
    values: HashMap<String, Value>,
    parent: Option<ProviderRef>,
}

impl MapProvider {
    pub fn new() -> Self {
        MapProvider {
            values: HashMap::new(),
            parent: None,
        }
    }

    pub fn with_parent(parent: ProviderRef) -> Self {
        MapProvider {
            values: HashMap::new(),
            parent: Some(parent),
        }
    }

    pub fn define(&mut self, name: &str, value: Value) {
        debug!("Defining '{}' as {}", name, value.type_name());

        self.values.insert(name.to_lowercase(), value);
    }

    /// Builder-style [`define`](Self::define).
    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.define(name, value);
        self
    }

    pub fn into_ref(self) -> ProviderRef {
        Rc::new(self)
    }
}

impl Default for MapProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for MapProvider {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        if let Some(value) = self.values.get(name) {
            Ok(Some(value.clone()))
        } else if let Some(parent) = &self.parent {
            parent.get(name)
        } else {
            Ok(None)
        }
    }

    fn is_defined(&self, name: &str) -> bool {
        self.values.contains_key(name)
            || self.parent.as_ref().is_some_and(|p| p.is_defined(name))
    }

    fn parent(&self) -> Option<&ProviderRef> {
        self.parent.as_ref()
    }
}

/// Scope of one lambda invocation: parameters bound over the closure's
/// captured environment.
pub struct ParameterFrame {
    names: Vec<String>,
    values: Vec<Value>,
    parent: ProviderRef,
}

impl ParameterFrame {
    pub fn new(names: Vec<String>, values: Vec<Value>, parent: ProviderRef) -> Self {
        ParameterFrame {
            names,
            values,
            parent,
        }
    }
}

impl Provider for ParameterFrame {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        match self.names.iter().position(|n| n == name) {
            Some(i) => Ok(Some(self.values.get(i).cloned().unwrap_or(Value::Null))),
            None => self.parent.get(name),
        }
    }

    fn is_defined(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name) || self.parent.is_defined(name)
    }

    fn parent(&self) -> Option<&ProviderRef> {
        Some(&self.parent)
    }

    fn reaches(&self, kvc: &Kvc, seen: &mut Visited) -> bool {
        self.values.iter().any(|v| v.reaches(kvc, seen)) || self.parent.reaches(kvc, seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookups_fall_through_to_the_parent() {
        let root = MapProvider::new().with("x", Value::Integer(1)).into_ref();
        let child = MapProvider::with_parent(root).with("Y", Value::Integer(2));

        assert!(matches!(child.get("x"), Ok(Some(Value::Integer(1)))));
        assert!(matches!(child.get("y"), Ok(Some(Value::Integer(2)))));
        assert!(matches!(child.get("z"), Ok(None)));
        assert!(child.is_defined("x"));
        assert!(!child.is_defined("z"));
    }

    #[test]
    fn parameters_shadow_the_closure() {
        let closure = MapProvider::new().with("a", Value::Integer(1)).into_ref();
        let frame = ParameterFrame::new(vec!["a".into()], vec![Value::Integer(9)], closure);

        assert!(matches!(frame.get("a"), Ok(Some(Value::Integer(9)))));
    }
}
