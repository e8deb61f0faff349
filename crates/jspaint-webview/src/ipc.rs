//! IPC protocol between Rust and the paint UI.
//!
//! Messages flow in both directions:
//! - **JS -> Rust**: the bridge posts `{kind, id?, payload}` through
//!   `window.ipc.postMessage`, which reaches the WebView's `ipc_handler`.
//!   Messages with an `id` are requests and get exactly one response.
//! - **Rust -> JS**: `evaluate_script` calls `window.jspaint.ipc._dispatch`
//!   for notifications and `window.jspaint.ipc._resolve` for responses.
//!
//! Binary data crosses as `{"$bytes": "<base64>"}` in both directions; the
//! bridge converts to and from `ArrayBuffer`.

use jspaint_common::ProtocolError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message from the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpcMessage {
    pub kind: String,
    /// Present on requests; echoed in the response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default)]
    pub payload: Value,
}

/// A message that could not be decoded. `id` is salvaged when the body was
/// JSON with a numeric `id`, so the caller can still be answered.
#[derive(Debug)]
pub struct RejectedMessage {
    pub id: Option<u64>,
    pub error: ProtocolError,
}

impl IpcMessage {
    /// Parse a raw body posted by the bridge script.
    pub fn from_json(raw: &str) -> Result<Self, RejectedMessage> {
        let value: Value = serde_json::from_str(raw).map_err(|e| RejectedMessage {
            id: None,
            error: ProtocolError::Malformed(e.to_string()),
        })?;
        let id = value.get("id").and_then(Value::as_u64);
        serde_json::from_value(value).map_err(|e| RejectedMessage {
            id,
            error: ProtocolError::Malformed(e.to_string()),
        })
    }
}

/// A message to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    Notification { kind: String, payload: Value },
    Response { id: u64, payload: Value },
}

impl OutboundMessage {
    pub fn notification(kind: impl Into<String>, payload: Value) -> Self {
        Self::Notification {
            kind: kind.into(),
            payload,
        }
    }

    /// Serialize `payload` into a response. A payload that cannot be
    /// represented as JSON becomes `null`.
    pub fn response<T: Serialize>(id: u64, payload: &T) -> Self {
        let payload = serde_json::to_value(payload).unwrap_or_else(|e| {
            tracing::warn!(id, "Failed to serialize response: {e}");
            Value::Null
        });
        Self::Response { id, payload }
    }

    /// The script that delivers this message inside the WebView.
    pub fn to_script(&self) -> String {
        match self {
            Self::Notification { kind, payload } => js_dispatch_message(kind, payload),
            Self::Response { id, payload } => js_resolve_message(*id, payload),
        }
    }
}

/// JavaScript snippet that sets up the IPC bridge on the JS side.
/// This is injected as an initialization script before the page loads.
pub const IPC_INIT_SCRIPT: &str = r#"
(function() {
    if (window.jspaint && window.jspaint.ipc) {
        return;
    }
    var BYTES = "$bytes";

    function toBase64(buffer) {
        var bytes = new Uint8Array(buffer);
        var chunks = [];
        for (var i = 0; i < bytes.length; i += 0x8000) {
            chunks.push(String.fromCharCode.apply(null, bytes.subarray(i, i + 0x8000)));
        }
        return btoa(chunks.join(""));
    }

    function fromBase64(text) {
        var binary = atob(text);
        var bytes = new Uint8Array(binary.length);
        for (var i = 0; i < binary.length; i++) {
            bytes[i] = binary.charCodeAt(i);
        }
        return bytes.buffer;
    }

    function encode(value) {
        if (value instanceof ArrayBuffer) {
            var tagged = {};
            tagged[BYTES] = toBase64(value);
            return tagged;
        }
        if (ArrayBuffer.isView(value)) {
            return encode(value.buffer.slice(value.byteOffset, value.byteOffset + value.byteLength));
        }
        if (Array.isArray(value)) {
            return value.map(encode);
        }
        if (value && typeof value === "object") {
            var out = {};
            Object.keys(value).forEach(function(key) {
                out[key] = encode(value[key]);
            });
            return out;
        }
        return value === undefined ? null : value;
    }

    function decode(value) {
        if (Array.isArray(value)) {
            return value.map(decode);
        }
        if (value && typeof value === "object") {
            var keys = Object.keys(value);
            if (keys.length === 1 && keys[0] === BYTES && typeof value[BYTES] === "string") {
                return fromBase64(value[BYTES]);
            }
            var out = {};
            keys.forEach(function(key) {
                out[key] = decode(value[key]);
            });
            return out;
        }
        return value;
    }

    var handlers = {};
    var pending = {};
    var nextId = 1;

    window.jspaint = window.jspaint || {};
    window.jspaint.ipc = {
        send: function(kind, payload) {
            window.ipc.postMessage(JSON.stringify({
                kind: kind,
                payload: encode(payload)
            }));
        },
        invoke: function(kind, payload) {
            return new Promise(function(resolve) {
                var id = nextId++;
                pending[id] = resolve;
                window.ipc.postMessage(JSON.stringify({
                    kind: kind,
                    id: id,
                    payload: encode(payload)
                }));
            });
        },
        on: function(kind, callback) {
            handlers[kind] = callback;
        },
        _dispatch: function(kind, payload) {
            var handler = handlers[kind];
            if (handler) {
                handler(decode(payload));
            }
        },
        _resolve: function(id, payload) {
            var resolve = pending[id];
            if (resolve) {
                delete pending[id];
                resolve(decode(payload));
            }
        }
    };
})();
"#;

/// Generate a JS snippet that dispatches a notification to the UI.
pub fn js_dispatch_message(kind: &str, payload: &Value) -> String {
    let payload_json = serde_json::to_string(payload).unwrap_or_else(|_| "null".to_string());
    format!(
        "window.jspaint.ipc._dispatch({}, {});",
        serde_json::to_string(kind).unwrap_or_else(|_| "\"unknown\"".to_string()),
        payload_json,
    )
}

/// Generate a JS snippet that resolves the UI's pending request `id`.
pub fn js_resolve_message(id: u64, payload: &Value) -> String {
    let payload_json = serde_json::to_string(payload).unwrap_or_else(|_| "null".to_string());
    format!("window.jspaint.ipc._resolve({id}, {payload_json});")
}

#[cfg(test)]
mod tests {
    use super::*;
    use jspaint_common::protocol::FileResponse;
    use jspaint_common::ResponseCode;
    use serde_json::json;

    #[test]
    fn parses_request_with_id() {
        let msg =
            IpcMessage::from_json(r#"{"kind":"read-file","id":7,"payload":{"path":"/a.png"}}"#)
                .unwrap();
        assert_eq!(msg.kind, "read-file");
        assert_eq!(msg.id, Some(7));
        assert_eq!(msg.payload, json!({"path": "/a.png"}));
    }

    #[test]
    fn notification_without_payload_defaults_to_null() {
        let msg = IpcMessage::from_json(r#"{"kind":"close-window"}"#).unwrap();
        assert_eq!(msg.id, None);
        assert_eq!(msg.payload, Value::Null);
    }

    #[test]
    fn malformed_message_keeps_its_id() {
        let rejected = IpcMessage::from_json(r#"{"id":3,"payload":{}}"#).unwrap_err();
        assert_eq!(rejected.id, Some(3));
        assert!(matches!(rejected.error, ProtocolError::Malformed(_)));
    }

    #[test]
    fn garbage_has_no_id() {
        let rejected = IpcMessage::from_json("not json").unwrap_err();
        assert_eq!(rejected.id, None);
    }

    #[test]
    fn dispatch_script_quotes_kind() {
        let js = js_dispatch_message("open-file", &json!("/tmp/a \"b\".png"));
        assert_eq!(
            js,
            r#"window.jspaint.ipc._dispatch("open-file", "/tmp/a \"b\".png");"#
        );
    }

    #[test]
    fn response_script_carries_id_and_payload() {
        let msg = OutboundMessage::response(42, &FileResponse::code(ResponseCode::AccessDenied));
        assert_eq!(
            msg.to_script(),
            r#"window.jspaint.ipc._resolve(42, {"responseCode":"ACCESS_DENIED"});"#
        );
    }

    #[test]
    fn init_script_defines_bridge() {
        assert!(IPC_INIT_SCRIPT.contains("window.jspaint.ipc"));
        assert!(IPC_INIT_SCRIPT.contains("_dispatch"));
        assert!(IPC_INIT_SCRIPT.contains("_resolve"));
        assert!(IPC_INIT_SCRIPT.contains("\"$bytes\""));
    }
}
