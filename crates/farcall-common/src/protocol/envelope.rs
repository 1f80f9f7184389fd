use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel request payload asking the server for its procedure list.
///
/// Matched byte-for-byte against the raw frame payload before any JSON
/// parsing happens; it is not itself a JSON document.
pub const INTROSPECT: &[u8] = b"INTROSPECT";

/// A single remote call.
///
/// `args` is an ordered sequence of JSON values, unpacked positionally on the
/// server side. The key may be omitted entirely on the wire, in which case it
/// defaults to the empty sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestEnvelope {
    /// Name of the procedure to invoke
    pub procedure: String,
    /// Positional arguments (defaults to empty when absent)
    #[serde(default)]
    pub args: Vec<Value>,
}

impl RequestEnvelope {
    pub fn new(procedure: impl Into<String>, args: Vec<Value>) -> Self {
        RequestEnvelope {
            procedure: procedure.into(),
            args,
        }
    }
}

/// Reply to a single call.
///
/// Exactly one of the two keys is present on the wire, never both; the
/// untagged enum carries that invariant in the type. `{"result": ...}` wins
/// during deserialization, so a result value that happens to be an object
/// with an `error` key is still a success.
///
/// # Example
///
/// ```
/// use farcall_common::ResponseEnvelope;
/// use serde_json::json;
///
/// let ok = ResponseEnvelope::success(json!([1, 2]));
/// assert_eq!(serde_json::to_string(&ok).unwrap(), r#"{"result":[1,2]}"#);
///
/// let err = ResponseEnvelope::failure("No such procedure provided");
/// assert_eq!(
///     serde_json::to_string(&err).unwrap(),
///     r#"{"error":"No such procedure provided"}"#
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// The call succeeded
    Success {
        /// Return value of the procedure
        result: Value,
    },
    /// The call failed
    Failure {
        /// Human-readable description of what went wrong
        error: String,
    },
}

impl ResponseEnvelope {
    /// Creates a success reply.
    pub fn success(result: Value) -> Self {
        ResponseEnvelope::Success { result }
    }

    /// Creates a failure reply.
    pub fn failure(error: impl Into<String>) -> Self {
        ResponseEnvelope::Failure {
            error: error.into(),
        }
    }
}

/// Description of one registered procedure, as reported by introspection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcedureDescriptor {
    /// Procedure name as registered on the server
    pub name: String,
    /// Comma-joined parameter names
    pub signature: String,
    /// Documentation string, or `"NO DOCS"` when the procedure has none
    pub doc: String,
}

/// Reply to the [`INTROSPECT`] sentinel: the server's full procedure list,
/// in registry order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntrospectionEnvelope {
    pub procedures: Vec<ProcedureDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_round_trip() {
        let request = RequestEnvelope::new("add", vec![json!(2), json!(3)]);

        let encoded = serde_json::to_vec(&request).unwrap();
        let decoded: RequestEnvelope = serde_json::from_slice(&encoded).unwrap();

        assert_eq!(request, decoded);
    }

    #[test]
    fn request_args_default_to_empty() {
        let decoded: RequestEnvelope = serde_json::from_str(r#"{"procedure":"ping"}"#).unwrap();

        assert_eq!(decoded.procedure, "ping");
        assert!(decoded.args.is_empty());
    }

    #[test]
    fn request_without_procedure_is_rejected() {
        let decoded = serde_json::from_str::<RequestEnvelope>(r#"{"args":[1]}"#);

        assert!(decoded.is_err());
    }

    #[test]
    fn response_has_exactly_one_key() {
        let ok = serde_json::to_value(ResponseEnvelope::success(json!(null))).unwrap();
        assert_eq!(ok, json!({"result": null}));

        let err = serde_json::to_value(ResponseEnvelope::failure("boom")).unwrap();
        assert_eq!(err, json!({"error": "boom"}));
    }

    #[test]
    fn response_result_wins_over_error_shaped_values() {
        // A success whose result is an object containing an "error" key must
        // still decode as a success.
        let decoded: ResponseEnvelope =
            serde_json::from_str(r#"{"result":{"error":"not an rpc error"}}"#).unwrap();

        assert_eq!(
            decoded,
            ResponseEnvelope::success(json!({"error": "not an rpc error"}))
        );
    }

    #[test]
    fn introspection_wire_shape() {
        let listing = IntrospectionEnvelope {
            procedures: vec![ProcedureDescriptor {
                name: "add".into(),
                signature: "x, y".into(),
                doc: "NO DOCS".into(),
            }],
        };

        let encoded = serde_json::to_value(&listing).unwrap();
        assert_eq!(
            encoded,
            json!({"procedures": [{"name": "add", "signature": "x, y", "doc": "NO DOCS"}]})
        );
    }
}
