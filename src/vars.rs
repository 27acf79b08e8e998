//! Process-local published variables.
//!
//! [`VarRegistry`] is the lightweight metrics backend: a flat namespace of
//! named integers, floats and strings that can be read back at any time,
//! e.g. dumped as JSON from a debug endpoint. There are no labels and no
//! distributions. Each name can be published once; the returned handle is
//! cheap to clone and updates the published value in place.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::{Result, TokenmeterError};

const BACKEND: &str = "vars";

/// Integer variable.
#[derive(Debug, Clone, Default)]
pub struct IntVar(Arc<AtomicI64>);

impl IntVar {
    pub fn add(&self, delta: i64) {
        self.0.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn set(&self, value: i64) {
        self.0.store(value, Ordering::Relaxed);
    }

    pub fn value(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Float variable, stored as raw `f64` bits.
#[derive(Debug, Clone, Default)]
pub struct FloatVar(Arc<AtomicU64>);

impl FloatVar {
    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn value(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }
}

/// String variable.
#[derive(Debug, Clone, Default)]
pub struct StringVar(Arc<RwLock<String>>);

impl StringVar {
    pub fn set(&self, value: impl Into<String>) -> Result<()> {
        let mut guard = self
            .0
            .write()
            .map_err(|e| TokenmeterError::backend(BACKEND, format!("poisoned string var: {e}")))?;
        *guard = value.into();
        Ok(())
    }

    pub fn value(&self) -> Result<String> {
        self.0
            .read()
            .map(|guard| guard.clone())
            .map_err(|e| TokenmeterError::backend(BACKEND, format!("poisoned string var: {e}")))
    }
}

/// A published variable.
#[derive(Debug, Clone)]
pub enum Var {
    Int(IntVar),
    Float(FloatVar),
    String(StringVar),
}

impl Var {
    /// Current value as JSON.
    pub fn to_json(&self) -> Result<Value> {
        Ok(match self {
            Var::Int(var) => Value::from(var.value()),
            // Non-finite floats have no JSON form and become null.
            Var::Float(var) => Value::from(var.value()),
            Var::String(var) => Value::from(var.value()?),
        })
    }
}

/// Registry of published variables, keyed by unique name.
#[derive(Debug, Default)]
pub struct VarRegistry {
    vars: RwLock<BTreeMap<String, Var>>,
}

impl VarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a new integer variable starting at 0.
    pub fn new_int(&self, name: impl Into<String>) -> Result<IntVar> {
        let var = IntVar::default();
        self.publish(name.into(), Var::Int(var.clone()))?;
        Ok(var)
    }

    /// Publish a new float variable starting at 0.0.
    pub fn new_float(&self, name: impl Into<String>) -> Result<FloatVar> {
        let var = FloatVar::default();
        self.publish(name.into(), Var::Float(var.clone()))?;
        Ok(var)
    }

    /// Publish a new, empty string variable.
    pub fn new_string(&self, name: impl Into<String>) -> Result<StringVar> {
        let var = StringVar::default();
        self.publish(name.into(), Var::String(var.clone()))?;
        Ok(var)
    }

    /// Look up a published variable.
    pub fn get(&self, name: &str) -> Option<Var> {
        self.vars.read().ok()?.get(name).cloned()
    }

    /// Names of all published variables, sorted.
    pub fn names(&self) -> Vec<String> {
        self.vars
            .read()
            .map(|vars| vars.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Current value of every variable as one JSON object.
    pub fn snapshot(&self) -> Result<Value> {
        let vars = self.vars.read().map_err(|e| {
            TokenmeterError::backend(BACKEND, format!("failed to acquire read lock: {e}"))
        })?;
        let mut object = serde_json::Map::with_capacity(vars.len());
        for (name, var) in vars.iter() {
            object.insert(name.clone(), var.to_json()?);
        }
        Ok(Value::Object(object))
    }

    /// Publish several variables at once. Either all names are published
    /// or, if any is already taken, none are.
    pub fn publish_all(&self, group: Vec<(String, Var)>) -> Result<()> {
        let mut vars = self.vars.write().map_err(|e| {
            TokenmeterError::backend(BACKEND, format!("failed to acquire write lock: {e}"))
        })?;
        for (i, (name, _)) in group.iter().enumerate() {
            if vars.contains_key(name) || group[..i].iter().any(|(other, _)| other == name) {
                return Err(TokenmeterError::DuplicateVar(name.clone()));
            }
        }
        vars.extend(group);
        Ok(())
    }

    fn publish(&self, name: String, var: Var) -> Result<()> {
        self.publish_all(vec![(name, var)])
    }
}
