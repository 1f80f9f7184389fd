//! farcall Server
//!
//! The server side of farcall: a [`Registry`] of named procedures, a
//! per-connection dispatcher, and a fixed pool of worker threads competing on
//! one shared listener.
//!
//! # Example
//!
//! ```no_run
//! use farcall_server::{Registry, Server, ServerConfig};
//! use serde_json::json;
//!
//! let mut registry = Registry::new();
//! registry.register("add", &["x", "y"], Some("Add two numbers."), |args| {
//!     let x = args[0].as_i64().ok_or_else(|| anyhow::anyhow!("x must be a number"))?;
//!     let y = args[1].as_i64().ok_or_else(|| anyhow::anyhow!("y must be a number"))?;
//!     Ok(json!(x + y))
//! });
//!
//! let handle = Server::new(registry, ServerConfig::default()).serve()?;
//! println!("listening on {}", handle.local_addr());
//! handle.wait();
//! # Ok::<(), farcall_common::FarcallError>(())
//! ```
//!
//! Registration happens before [`Server::serve`]; the registry is shared
//! read-only across workers from then on, so dispatch needs no locking.

mod dispatch;
pub mod registry;
pub mod server;

pub use registry::{Procedure, ProcedureResult, Registry};
pub use server::{Server, ServerConfig, ServerHandle};
