//! Key/value collections.
//!
//! A [`Kvc`] is both a value and a scope. Its fields are lazy: each one
//! starts as a [`Thunk`], is evaluated on first lookup with the KVC itself as
//! the enclosing scope, and is memoized. Fields may therefore reference each
//! other in any textual order.
//!
//! Per-field state moves `Pending -> InProgress -> Done`. Meeting a field in
//! `InProgress` means the lookup re-entered the field it is computing; the
//! name is then resolved in the parent scope instead. That is what makes
//! `{a:4}{a:a}` read the source's `a`, and `{x:1, k:{x:x+1}}` compute `2`.
//! When no parent can answer, the lookup fails with
//! [`EvalError::CircularReference`].
//!
//! A KVC never memoizes a value that leads back to itself (a lambda closing
//! over it, a nested KVC whose parent it is, a list of those). Such a field
//! is evaluated again on every lookup instead, which keeps the `Rc` graph
//! acyclic.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::mem;
use std::rc::{Rc, Weak};

use log::debug;

use crate::environment::{Provider, ProviderRef};
use crate::error::{EvalError, Result};
use crate::expr::{FieldValue, KvcExpression};
use crate::interpreter::evaluate;
use crate::value::Value;

/// KVCs already walked by a reachability check.
pub type Visited = HashSet<*const Kvc>;

/// How a pending field gets its value.
#[derive(Clone)]
enum Thunk {
    /// Field `index` of the defining expression.
    Expression(usize),

    /// Same name, read from the parent scope; `null` when absent.
    Inherit,

    /// Value of `key` in another KVC (merge results).
    Forward(Rc<Kvc>),

    /// Key present on both sides of a merge.
    Merge(Rc<Kvc>, Rc<Kvc>),
}

enum FieldState {
    Pending(Thunk),
    InProgress,
    Done(Value),
}

struct Field {
    key: String,
    lookup: String,
    state: RefCell<FieldState>,
}

pub struct Kvc {
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    definition: Option<Rc<KvcExpression>>,
    parent: Option<ProviderRef>,
    me: Weak<Kvc>,
}

impl Kvc {
    fn build(
        fields: Vec<Field>,
        definition: Option<Rc<KvcExpression>>,
        parent: Option<ProviderRef>,
    ) -> Rc<Kvc> {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.lookup.clone(), i))
            .collect();

        Rc::new_cyclic(|me| Kvc {
            fields,
            index,
            definition,
            parent,
            me: me.clone(),
        })
    }

    /// Instantiate a KVC literal (or a selector projection) over `parent`.
    pub fn from_expression(definition: Rc<KvcExpression>, parent: Option<ProviderRef>) -> Rc<Kvc> {
        debug!(
            "Instantiating kvc with {} field(s)",
            definition.fields.len()
        );

        let fields = definition
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| Field {
                key: f.key.clone(),
                lookup: f.key_lookup.clone(),
                state: RefCell::new(FieldState::Pending(match f.value {
                    FieldValue::Expression(_) => Thunk::Expression(i),
                    FieldValue::Inherit => Thunk::Inherit,
                })),
            })
            .collect();

        Self::build(fields, Some(definition), parent)
    }

    /// KVC of already computed values, e.g. from JSON or the host.
    /// Later duplicates (case-insensitive) replace earlier ones.
    pub fn from_values<K: Into<String>>(pairs: Vec<(K, Value)>) -> Rc<Kvc> {
        let mut fields: Vec<Field> = Vec::with_capacity(pairs.len());
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (key, value) in pairs {
            let key: String = key.into();
            let lookup = key.to_lowercase();
            let field = Field {
                key,
                lookup: lookup.clone(),
                state: RefCell::new(FieldState::Done(value)),
            };
            match seen.get(&lookup) {
                Some(&i) => fields[i] = field,
                None => {
                    seen.insert(lookup, fields.len());
                    fields.push(field);
                }
            }
        }

        Self::build(fields, None, None)
    }

    /// Hierarchical merge: union of keys; a key on both sides merges
    /// recursively when both values are KVCs, otherwise the right side wins.
    /// Nothing is evaluated until a merged field is read.
    pub fn merge(left: &Rc<Kvc>, right: &Rc<Kvc>) -> Rc<Kvc> {
        debug!(
            "Merging kvcs with {} and {} field(s)",
            left.fields.len(),
            right.fields.len()
        );

        let mut fields: Vec<Field> = Vec::with_capacity(left.fields.len() + right.fields.len());

        for f in &left.fields {
            let thunk = if right.index.contains_key(&f.lookup) {
                Thunk::Merge(left.clone(), right.clone())
            } else {
                Thunk::Forward(left.clone())
            };
            fields.push(Field {
                key: f.key.clone(),
                lookup: f.lookup.clone(),
                state: RefCell::new(FieldState::Pending(thunk)),
            });
        }

        for f in &right.fields {
            if left.index.contains_key(&f.lookup) {
                continue;
            }
            fields.push(Field {
                key: f.key.clone(),
                lookup: f.lookup.clone(),
                state: RefCell::new(FieldState::Pending(Thunk::Forward(right.clone()))),
            });
        }

        Self::build(fields, None, None)
    }

    /// The value a KVC literal evaluates to: its `return` expression when it
    /// has one, otherwise the KVC itself.
    pub fn value(self: &Rc<Self>) -> Result<Value> {
        match self.definition.as_ref().and_then(|d| d.ret.as_ref()) {
            Some(ret) => {
                let scope: ProviderRef = self.clone();
                evaluate(ret, &scope)
            }
            None => Ok(Value::Kvc(self.clone())),
        }
    }

    /// Keys in definition order, original spelling.
    pub fn keys(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.key.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains_key(&self, lookup: &str) -> bool {
        self.index.contains_key(lookup)
    }

    /// All fields, forced, in definition order.
    pub fn entries(&self) -> Result<Vec<(String, Value)>> {
        (0..self.fields.len())
            .map(|i| Ok((self.fields[i].key.clone(), self.force(i)?)))
            .collect()
    }

    /// Own field only, no parent fallback. `lookup` is lower-cased.
    pub fn get_field(&self, lookup: &str) -> Result<Option<Value>> {
        match self.index.get(lookup) {
            Some(&i) => self.force(i).map(Some),
            None => Ok(None),
        }
    }

    fn scope(&self) -> Result<ProviderRef> {
        let me: Rc<Kvc> = self
            .me
            .upgrade()
            .ok_or_else(|| EvalError::Internal("kvc scope used after release".into()))?;
        Ok(me)
    }

    /// Evaluate field `i` and memoize it, unless the value leads back here.
    fn force(&self, i: usize) -> Result<Value> {
        let field = &self.fields[i];

        let pending = {
            let mut state = field.state.borrow_mut();
            match mem::replace(&mut *state, FieldState::InProgress) {
                FieldState::Done(value) => {
                    *state = FieldState::Done(value.clone());
                    return Ok(value);
                }
                FieldState::InProgress => None,
                FieldState::Pending(thunk) => Some(thunk),
            }
        };

        let Some(thunk) = pending else {
            return self.reentered(&field.lookup);
        };

        debug!("Evaluating kvc field '{}'", field.key);

        match self.run(&thunk, &field.lookup) {
            Ok(value) => {
                let state = if value.reaches(self, &mut Visited::new()) {
                    debug!("Field '{}' leads back to its kvc; not memoized", field.key);
                    FieldState::Pending(thunk)
                } else {
                    FieldState::Done(value.clone())
                };
                *field.state.borrow_mut() = state;
                Ok(value)
            }
            Err(e) => {
                *field.state.borrow_mut() = FieldState::Pending(thunk);
                Err(e)
            }
        }
    }

    fn run(&self, thunk: &Thunk, lookup: &str) -> Result<Value> {
        match thunk {
            Thunk::Expression(i) => {
                let def = self
                    .definition
                    .as_ref()
                    .ok_or_else(|| EvalError::Internal("kvc field without definition".into()))?;
                match def.fields.get(*i).map(|f| &f.value) {
                    Some(FieldValue::Expression(expr)) => evaluate(expr, &self.scope()?),
                    _ => Err(EvalError::Internal("kvc field index out of range".into())),
                }
            }

            Thunk::Inherit => match &self.parent {
                Some(parent) => Ok(parent.get(lookup)?.unwrap_or(Value::Null)),
                None => Ok(Value::Null),
            },

            Thunk::Forward(source) => Ok(source.get_field(lookup)?.unwrap_or(Value::Null)),

            Thunk::Merge(left, right) => {
                let l = left.get_field(lookup)?.unwrap_or(Value::Null);
                let r = right.get_field(lookup)?.unwrap_or(Value::Null);
                Ok(match (&l, &r) {
                    (Value::Kvc(a), Value::Kvc(b)) => Value::Kvc(Kvc::merge(a, b)),
                    _ => r,
                })
            }
        }
    }

    /// Can `target` be reached from here through strong references?
    pub fn leads_to(&self, target: &Kvc, seen: &mut Visited) -> bool {
        if std::ptr::eq(self, target) {
            return true;
        }
        if !seen.insert(self as *const Kvc) {
            return false;
        }
        if self.parent.as_ref().is_some_and(|p| p.reaches(target, seen)) {
            return true;
        }

        self.fields.iter().any(|f| match &*f.state.borrow() {
            FieldState::Pending(Thunk::Forward(source)) => source.leads_to(target, seen),
            FieldState::Pending(Thunk::Merge(left, right)) => {
                left.leads_to(target, seen) || right.leads_to(target, seen)
            }
            FieldState::Done(value) => value.reaches(target, seen),
            _ => false,
        })
    }

    /// A field was looked up while it was being computed.
    fn reentered(&self, lookup: &str) -> Result<Value> {
        debug!("Field '{}' re-entered; resolving in parent scope", lookup);

        match &self.parent {
            Some(parent) => parent
                .get(lookup)?
                .ok_or_else(|| EvalError::CircularReference {
                    name: lookup.to_string(),
                }),
            None => Err(EvalError::CircularReference {
                name: lookup.to_string(),
            }),
        }
    }
}

impl Provider for Kvc {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        match self.index.get(name) {
            Some(&i) => self.force(i).map(Some),
            None => match &self.parent {
                Some(parent) => parent.get(name),
                None => Ok(None),
            },
        }
    }

    fn is_defined(&self, name: &str) -> bool {
        self.index.contains_key(name)
            || self.parent.as_ref().is_some_and(|p| p.is_defined(name))
    }

    fn parent(&self) -> Option<&ProviderRef> {
        self.parent.as_ref()
    }

    fn reaches(&self, kvc: &Kvc, seen: &mut Visited) -> bool {
        self.leads_to(kvc, seen)
    }
}

/// Scope of a selector projection: the source's own fields, then the scope
/// the selector is written in. The source's parent chain is not consulted,
/// so merged, JSON and host KVCs behave like literals.
struct SelectorScope {
    source: Rc<Kvc>,
    outer: ProviderRef,
}

impl Provider for SelectorScope {
    fn get(&self, name: &str) -> Result<Option<Value>> {
        match self.source.get_field(name)? {
            Some(value) => Ok(Some(value)),
            None => self.outer.get(name),
        }
    }

    fn is_defined(&self, name: &str) -> bool {
        self.source.contains_key(name) || self.outer.is_defined(name)
    }

    fn parent(&self) -> Option<&ProviderRef> {
        Some(&self.outer)
    }

    fn reaches(&self, kvc: &Kvc, seen: &mut Visited) -> bool {
        self.source.leads_to(kvc, seen) || self.outer.reaches(kvc, seen)
    }
}

/// `source{...}`: project a KVC (or each KVC of a list) through `projection`.
/// `env` is the scope the selector appears in.
pub fn select(source: Value, projection: &Rc<KvcExpression>, env: &ProviderRef) -> Result<Value> {
    match source {
        Value::Kvc(kvc) => {
            let scope: ProviderRef = Rc::new(SelectorScope {
                source: kvc,
                outer: env.clone(),
            });
            Kvc::from_expression(projection.clone(), Some(scope)).value()
        }

        Value::List(items) => {
            let projected = items
                .iter()
                .map(|item| select(item.clone(), projection, env))
                .collect::<Result<Vec<Value>>>()?;
            Ok(Value::list(projected))
        }

        Value::Null => Ok(Value::Null),

        other => Ok(Value::type_mismatch(format!(
            "selector needs a kvc or a list, got {}",
            other.type_name()
        ))),
    }
}
