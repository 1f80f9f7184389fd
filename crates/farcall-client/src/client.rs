use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use farcall_common::protocol::envelope::{
    IntrospectionEnvelope, ProcedureDescriptor, RequestEnvelope, ResponseEnvelope, INTROSPECT,
};
use farcall_common::protocol::error::{FarcallError, Result};
use farcall_common::transport::TcpTransport;

/// farcall client proxy.
///
/// Construction performs the synchronous introspection bootstrap: one
/// connection carrying the `INTROSPECT` sentinel, whose reply is the server's
/// procedure list. Any bootstrap failure — refusal, timeout, malformed
/// listing — is fatal to construction.
///
/// Each [`call`] afterwards opens a fresh connection for exactly one
/// request/response exchange; there is no connection reuse or pooling.
///
/// # Example
///
/// ```no_run
/// use farcall_client::RpcClient;
/// use serde_json::json;
///
/// let client = RpcClient::connect("127.0.0.1:4444")?;
/// let sum = client.call("add", vec![json!(2), json!(3)])?;
/// assert_eq!(sum, json!(5));
/// # Ok::<(), farcall_common::FarcallError>(())
/// ```
///
/// [`call`]: RpcClient::call
#[derive(Debug)]
pub struct RpcClient {
    addr: String,
    transport: TcpTransport,
    procedures: Vec<ProcedureDescriptor>,
}

impl RpcClient {
    /// Connects with the default per-operation timeout.
    pub fn connect(addr: impl Into<String>) -> Result<Self> {
        Self::connect_with(addr, TcpTransport::new())
    }

    /// Connects with a specific timeout.
    pub fn connect_with_timeout(addr: impl Into<String>, timeout: Duration) -> Result<Self> {
        Self::connect_with(addr, TcpTransport::new().with_timeout(timeout))
    }

    /// Connects over a pre-configured transport and runs the introspection
    /// bootstrap.
    pub fn connect_with(addr: impl Into<String>, transport: TcpTransport) -> Result<Self> {
        let addr = addr.into();
        let raw = transport.round_trip(&addr, INTROSPECT)?;
        let listing: IntrospectionEnvelope = serde_json::from_slice(&raw).map_err(|e| {
            FarcallError::Protocol(format!("malformed introspection response: {}", e))
        })?;
        debug!(%addr, procedures = listing.procedures.len(), "introspected");

        Ok(RpcClient {
            addr,
            transport,
            procedures: listing.procedures,
        })
    }

    /// Invokes a remote procedure with positional arguments.
    ///
    /// The name is not checked against the cached listing — the server is the
    /// authority, and an unknown name comes back as its normal error reply.
    ///
    /// # Errors
    ///
    /// - [`FarcallError::ConnectionRefused`] if nothing is listening — the
    ///   call fails fast at the connect step
    /// - [`FarcallError::Remote`] for a server-side `{"error": ...}` reply,
    ///   including unknown procedures and failed invocations
    /// - [`FarcallError::Protocol`] if the reply is not a response envelope
    pub fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Value> {
        let request = RequestEnvelope::new(procedure, args);
        let raw = self
            .transport
            .round_trip(&self.addr, &serde_json::to_vec(&request)?)?;
        let response: ResponseEnvelope = serde_json::from_slice(&raw)
            .map_err(|e| FarcallError::Protocol(format!("malformed response: {}", e)))?;

        match response {
            ResponseEnvelope::Success { result } => Ok(result),
            ResponseEnvelope::Failure { error } => Err(FarcallError::Remote(error)),
        }
    }

    /// The procedure list cached at construction.
    pub fn procedures(&self) -> &[ProcedureDescriptor] {
        &self.procedures
    }

    /// Human-readable help for every discovered procedure, one entry per
    /// line pair: `name(signature)` followed by the doc string.
    pub fn procedures_help(&self) -> String {
        self.procedures
            .iter()
            .map(|p| format!("{}({})\n{}", p.name, p.signature, p.doc))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
