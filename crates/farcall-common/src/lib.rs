//! farcall Common Types and Transport
//!
//! This crate provides the protocol definitions and TCP framing layer shared
//! by the farcall server and client.
//!
//! # Overview
//!
//! farcall is a minimal RPC system: a server exposes named procedures that a
//! remote client discovers through an introspection exchange and then invokes
//! over TCP. One connection carries exactly one request and one response.
//!
//! # Wire Protocol
//!
//! - **Transport**: TCP, one exchange per connection
//! - **Serialization**: JSON
//! - **Frame Format**: `[4-byte length prefix as u32 big-endian] + [payload]`
//! - **Introspection**: the literal payload `INTROSPECT` (matched byte-wise,
//!   never JSON-parsed) asks the server for its procedure list
//!
//! # Components
//!
//! - [`protocol`] - envelope types and the error taxonomy
//! - [`transport`] - length-prefixed framing and the blocking TCP transport
//!
//! # Example
//!
//! ```
//! use farcall_common::{RequestEnvelope, ResponseEnvelope};
//! use serde_json::json;
//!
//! let request = RequestEnvelope::new("add", vec![json!(2), json!(3)]);
//! assert_eq!(request.args.len(), 2);
//!
//! let response = ResponseEnvelope::success(json!(5));
//! assert_eq!(serde_json::to_string(&response).unwrap(), r#"{"result":5}"#);
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::envelope::{
    IntrospectionEnvelope, ProcedureDescriptor, RequestEnvelope, ResponseEnvelope, INTROSPECT,
};
pub use protocol::error::{FarcallError, Result};
pub use transport::TcpTransport;
