//! Per-connection request dispatch.
//!
//! One accepted connection goes through exactly one exchange:
//! read a frame, answer it, done. The caller owns the socket lifecycle
//! (timeouts before, shutdown after); dispatch only needs `Read + Write`,
//! which also keeps it testable without sockets.

use std::io::{Read, Write};
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde_json::Value;
use tracing::debug;

use farcall_common::protocol::envelope::{
    IntrospectionEnvelope, RequestEnvelope, ResponseEnvelope, INTROSPECT,
};
use farcall_common::protocol::error::{FarcallError, Result};
use farcall_common::transport::frame::{read_frame, write_frame};

use crate::registry::{Procedure, Registry};

/// Error string reported for calls to unregistered procedures.
const NO_SUCH_PROCEDURE: &str = "No such procedure provided";

/// Drives one connection through its single request/response exchange.
///
/// The introspection sentinel is matched against the raw payload bytes before
/// any JSON parsing. A payload that fails to parse as a request envelope is
/// fatal to the connection; a best-effort error reply is attempted first,
/// with its own failure ignored.
pub(crate) fn handle_connection<S: Read + Write>(
    stream: &mut S,
    registry: &Registry,
    max_frame_len: usize,
) -> Result<()> {
    let payload = read_frame(stream, max_frame_len)?;

    if payload == INTROSPECT {
        debug!("-> INTROSPECT");
        let listing = IntrospectionEnvelope {
            procedures: registry.describe(),
        };
        return write_frame(stream, &serde_json::to_vec(&listing)?);
    }

    let request: RequestEnvelope = match serde_json::from_slice(&payload) {
        Ok(request) => request,
        Err(e) => {
            let reply = ResponseEnvelope::failure(format!("malformed request: {}", e));
            if let Ok(bytes) = serde_json::to_vec(&reply) {
                let _ = write_frame(stream, &bytes);
            }
            return Err(FarcallError::Protocol(format!("malformed request: {}", e)));
        }
    };
    debug!(procedure = %request.procedure, args = request.args.len(), "-> request");

    let reply = match registry.lookup(&request.procedure) {
        Some(procedure) => invoke(&procedure, &request.args),
        None => ResponseEnvelope::failure(NO_SUCH_PROCEDURE),
    };
    debug!(procedure = %request.procedure, ok = matches!(reply, ResponseEnvelope::Success { .. }), "<- response");

    write_frame(stream, &serde_json::to_vec(&reply)?)
}

/// Recovered-call boundary around user code.
///
/// Both an `Err` return and a panic become `{"error": ...}` replies, so a
/// misbehaving procedure can never take down more than its own response.
fn invoke(procedure: &Procedure, args: &[Value]) -> ResponseEnvelope {
    match catch_unwind(AssertUnwindSafe(|| procedure(args))) {
        Ok(Ok(value)) => ResponseEnvelope::success(value),
        Ok(Err(e)) => ResponseEnvelope::failure(e.to_string()),
        Err(panic) => ResponseEnvelope::failure(format!(
            "procedure panicked: {}",
            panic_message(panic.as_ref())
        )),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
