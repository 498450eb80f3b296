//! Varbind - a configuration registry for typed program variables.
//!
//! Arbitrary typed variables are registered under string names, then
//! bulk-loaded from and saved to a line-oriented `key = value` file through
//! a uniform, type-erased parse/format protocol.
//!
//! # Architecture
//!
//! - **Values** ([`value`]): the [`ConfigValue`] parse/format contract,
//!   implemented for the primitive types and open to user enumerations
//! - **Items** ([`item`]): type-erased bindings to caller-owned storage
//! - **Registry** ([`registry`]): insertion-ordered name lookup
//! - **Store** ([`store`]): the textual file protocol, load and save
//! - **Diagnostics** ([`diag`]): injected reporting for load-time problems
//! - **Errors** ([`error`]): store and value error types
//!
//! # Example
//!
//! ```rust
//! use varbind::{FileStore, Registry};
//!
//! # fn main() -> varbind::Result<()> {
//! # let dir = tempfile::tempdir().unwrap();
//! # let path = dir.path().join("server.cfg");
//! // Register every field, then load once.
//! let mut registry = Registry::new();
//! let host = registry.bind("host", "localhost".to_string());
//! let port = registry.bind("port", 8080_u16);
//! let debug = registry.bind("debug", false);
//!
//! let store = FileStore::new(&path);
//! store.save(&registry)?;
//! store.load(&registry)?;
//!
//! assert_eq!(*port.read().unwrap(), 8080);
//! # let _ = (host, debug);
//! # Ok(())
//! # }
//! ```
//!
//! Registration order matters twice: saves emit records in registration
//! order, and loading before a field is registered drops its value as an
//! unknown key.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod diag;
pub mod error;
pub mod item;
pub mod registry;
pub mod store;
pub mod value;

// Re-export commonly used types
pub use diag::{DiagnosticSink, Severity, TracingSink};
pub use error::{Result, StoreError, ValueError};
pub use item::{Item, TypedItem};
pub use registry::Registry;
pub use store::FileStore;
pub use value::ConfigValue;
