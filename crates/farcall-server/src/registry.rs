//! Server-side procedure registry.
//!
//! Maps procedure names to callables plus the introspection metadata
//! (parameter names, documentation) the client proxy discovers them by.
//! Registration is expected to finish before serving begins: the server takes
//! the registry by value and shares it read-only across workers.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use farcall_common::protocol::ProcedureDescriptor;

/// Placeholder doc string for procedures registered without documentation.
const NO_DOCS: &str = "NO DOCS";

/// Outcome of one procedure invocation.
pub type ProcedureResult = anyhow::Result<Value>;

/// A registered server-side callable.
///
/// Arguments arrive as the positional slice decoded from the request
/// envelope. Returning `Err` produces an `{"error": ...}` reply for that
/// connection; it never affects the server itself.
pub type Procedure = Arc<dyn Fn(&[Value]) -> ProcedureResult + Send + Sync>;

struct RegistryEntry {
    callable: Procedure,
    params: Vec<String>,
    doc: Option<String>,
}

/// Name → procedure map with stable insertion-order iteration.
///
/// # Example
///
/// ```
/// use farcall_server::Registry;
/// use serde_json::json;
///
/// let mut registry = Registry::new();
/// registry.register("greet", &["name"], Some("Say hello."), |args| {
///     Ok(json!(format!("hello, {}", args[0].as_str().unwrap_or("world"))))
/// });
///
/// assert_eq!(registry.describe()[0].signature, "name");
/// assert!(registry.unregister("greet"));
/// assert!(!registry.unregister("greet"));
/// ```
#[derive(Default)]
pub struct Registry {
    entries: IndexMap<String, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entries: IndexMap::new(),
        }
    }

    /// Adds or replaces the entry for `name` (last write wins).
    ///
    /// `params` are the parameter names reported through introspection, in
    /// call order; `doc` is the human-readable description, reported as
    /// `"NO DOCS"` when absent.
    pub fn register<F>(&mut self, name: impl Into<String>, params: &[&str], doc: Option<&str>, f: F)
    where
        F: Fn(&[Value]) -> ProcedureResult + Send + Sync + 'static,
    {
        let name = name.into();
        let replaced = self
            .entries
            .insert(
                name.clone(),
                RegistryEntry {
                    callable: Arc::new(f),
                    params: params.iter().map(|p| p.to_string()).collect(),
                    doc: doc.map(str::to_string),
                },
            )
            .is_some();
        if replaced {
            debug!(procedure = %name, "replaced existing registration");
        }
    }

    /// Removes the entry for `name` if present.
    ///
    /// Absence is a normal, reportable outcome, never an error.
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.entries.shift_remove(name).is_some();
        if removed {
            debug!(procedure = %name, "unregistered");
        } else {
            debug!(procedure = %name, "unregister of unknown procedure");
        }
        removed
    }

    /// Looks up a procedure; `None` means not registered.
    pub fn lookup(&self, name: &str) -> Option<Procedure> {
        self.entries.get(name).map(|entry| entry.callable.clone())
    }

    /// Snapshot of all registered procedures, in registration order.
    pub fn describe(&self) -> Vec<ProcedureDescriptor> {
        self.entries
            .iter()
            .map(|(name, entry)| ProcedureDescriptor {
                name: name.clone(),
                signature: entry.params.join(", "),
                doc: entry.doc.clone().unwrap_or_else(|| NO_DOCS.to_string()),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
