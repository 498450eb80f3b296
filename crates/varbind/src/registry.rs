//! Insertion-ordered registry of configuration bindings.

use crate::{
    item::{Item, TypedItem},
    value::ConfigValue,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Ordered collection of named configuration bindings.
///
/// Items are registered once during the owner's construction and looked up
/// by exact, case-sensitive name during loads. Iteration order always
/// equals registration order, which makes save output deterministic.
///
/// Re-registering an existing name replaces the binding in place (the new
/// item takes the original insertion slot) and logs a warning.
#[derive(Default)]
pub struct Registry {
    /// Bindings in registration order
    items: Vec<Arc<dyn Item>>,
    /// Name -> position in `items`
    index: HashMap<String, usize>,
}

impl Registry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a binding for a caller-owned slot.
    ///
    /// Writes `default` into the slot immediately, so the variable holds a
    /// defined value even if no load ever runs. The caller keeps its own
    /// `Arc` clone and reads values through it.
    pub fn add<T: ConfigValue>(
        &mut self,
        name: impl Into<String>,
        slot: &Arc<RwLock<T>>,
        default: T,
    ) {
        let name = name.into();
        let item: Arc<dyn Item> = Arc::new(TypedItem::new(name.clone(), Arc::clone(slot), default));

        if let Some(&position) = self.index.get(&name) {
            warn!(key = %name, "replacing existing configuration binding");
            self.items[position] = item;
        } else {
            self.index.insert(name.clone(), self.items.len());
            self.items.push(item);
            debug!(key = %name, "registered configuration binding");
        }
    }

    /// Allocate a slot, register it under `name`, and return the caller's
    /// handle to it.
    pub fn bind<T: ConfigValue>(&mut self, name: impl Into<String>, default: T) -> Arc<RwLock<T>> {
        let slot = Arc::new(RwLock::new(default.clone()));
        self.add(name, &slot, default);
        slot
    }

    /// Look up a binding by exact, case-sensitive name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&dyn Item> {
        self.index
            .get(name)
            .map(|&position| self.items[position].as_ref())
    }

    /// Iterate bindings in registration order.
    ///
    /// The iterator is restartable; each save walks it afresh.
    pub fn items(&self) -> impl Iterator<Item = &dyn Item> {
        self.items.iter().map(|item| item.as_ref())
    }

    /// Number of registered bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the registry has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether a binding exists for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Restore every binding to its registration default.
    pub fn reset_all(&self) {
        for item in &self.items {
            item.reset();
        }
    }
}
