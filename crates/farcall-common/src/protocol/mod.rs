//! farcall Protocol Layer
//!
//! Envelope types carried inside wire frames, plus the shared error taxonomy.
//!
//! Every payload on the wire is one of:
//!
//! - the literal introspection sentinel [`envelope::INTROSPECT`]
//! - a JSON [`envelope::RequestEnvelope`]
//! - a JSON [`envelope::ResponseEnvelope`]
//! - a JSON [`envelope::IntrospectionEnvelope`]

pub mod envelope;
pub mod error;

pub use envelope::{
    IntrospectionEnvelope, ProcedureDescriptor, RequestEnvelope, ResponseEnvelope, INTROSPECT,
};
pub use error::{FarcallError, Result};
