//! Type-erased bindings between configuration keys and program variables.

use crate::{error::ValueError, value::ConfigValue};
use std::sync::{Arc, RwLock};

/// A type-erased registry entry.
///
/// The registry and the file store only see this trait; the concrete value
/// type is known solely to the [`TypedItem`] behind it.
pub trait Item: Send + Sync {
    /// The configuration key this item is registered under.
    fn name(&self) -> &str;

    /// Parse `text` and write the result into the bound variable.
    ///
    /// The variable is only written on success; a failed parse leaves the
    /// previous value in place.
    ///
    /// # Errors
    /// Returns [`ValueError`] if `text` is not valid for the bound type.
    fn parse(&self, text: &str) -> Result<(), ValueError>;

    /// Format the bound variable's current value as text.
    fn format(&self) -> String;

    /// Restore the default value recorded at registration time.
    fn reset(&self);
}

/// Binding between one key and one shared storage slot of type `T`.
///
/// The slot is caller-allocated; the item holds its own `Arc` clone, so the
/// caller's handle stays valid for the life of the registry. The default is
/// recorded at registration and written into the slot immediately.
pub struct TypedItem<T: ConfigValue> {
    name: String,
    slot: Arc<RwLock<T>>,
    default: T,
}

impl<T: ConfigValue> TypedItem<T> {
    /// Create a binding and write `default` into the slot.
    pub fn new(name: impl Into<String>, slot: Arc<RwLock<T>>, default: T) -> Self {
        *slot.write().expect("acquire write lock on bound variable") = default.clone();

        Self {
            name: name.into(),
            slot,
            default,
        }
    }
}

impl<T: ConfigValue> Item for TypedItem<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, text: &str) -> Result<(), ValueError> {
        let value = T::parse_text(text)?;

        *self
            .slot
            .write()
            .expect("acquire write lock on bound variable") = value;

        Ok(())
    }

    fn format(&self) -> String {
        self.slot
            .read()
            .expect("acquire read lock on bound variable")
            .format_text()
    }

    fn reset(&self) {
        *self
            .slot
            .write()
            .expect("acquire write lock on bound variable") = self.default.clone();
    }
}
