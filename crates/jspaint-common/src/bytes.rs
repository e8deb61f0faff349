//! Raw byte buffers carried over the JSON IPC channel.
//!
//! JSON has no binary type, so the bridge script encodes every
//! `ArrayBuffer` / typed array as an object with exactly one key:
//!
//! ```json
//! { "$bytes": "iVBORw0KGgo..." }
//! ```
//!
//! Anything else (strings, arrays of numbers, objects with extra keys) is
//! not a byte buffer. Handlers that expect bytes must reject it rather than
//! try to coerce it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Key under which the base64 payload lives.
pub const BYTES_TAG: &str = "$bytes";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteBuffer(Vec<u8>);

impl ByteBuffer {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decode a byte buffer from its wire form.
    ///
    /// Returns `None` for any value that is not exactly
    /// `{"$bytes": <valid base64 string>}`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        if obj.len() != 1 {
            return None;
        }
        let encoded = obj.get(BYTES_TAG)?.as_str()?;
        STANDARD.decode(encoded).ok().map(Self)
    }

    /// Encode to the wire form.
    pub fn to_value(&self) -> Value {
        let mut map = serde_json::Map::with_capacity(1);
        map.insert(BYTES_TAG.to_string(), Value::String(STANDARD.encode(&self.0)));
        Value::Object(map)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for ByteBuffer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(BYTES_TAG, &STANDARD.encode(&self.0))?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_tagged_base64() {
        let value = json!({ "$bytes": "iVBORw==" });
        let buf = ByteBuffer::from_value(&value).unwrap();
        assert_eq!(buf.as_slice(), &[0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn empty_buffer_is_valid() {
        let buf = ByteBuffer::from_value(&json!({ "$bytes": "" })).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn rejects_non_buffer_shapes() {
        assert!(ByteBuffer::from_value(&json!("iVBORw==")).is_none());
        assert!(ByteBuffer::from_value(&json!([137, 80, 78, 71])).is_none());
        assert!(ByteBuffer::from_value(&json!(null)).is_none());
        assert!(ByteBuffer::from_value(&json!(42)).is_none());
        assert!(ByteBuffer::from_value(&json!({})).is_none());
    }

    #[test]
    fn rejects_options_object_smuggling() {
        // An fs options object in place of the data must not pass.
        let value = json!({ "$bytes": "AAAA", "flag": "a", "mode": 511 });
        assert!(ByteBuffer::from_value(&value).is_none());
        assert!(ByteBuffer::from_value(&json!({ "encoding": "utf8" })).is_none());
    }

    #[test]
    fn rejects_invalid_base64_and_wrong_value_type() {
        assert!(ByteBuffer::from_value(&json!({ "$bytes": "not base64!" })).is_none());
        assert!(ByteBuffer::from_value(&json!({ "$bytes": [1, 2, 3] })).is_none());
    }

    #[test]
    fn serializes_to_tagged_form() {
        let buf = ByteBuffer::new(vec![1u8, 2, 3]);
        let value = serde_json::to_value(&buf).unwrap();
        assert_eq!(value, json!({ "$bytes": "AQID" }));
        assert_eq!(buf.to_value(), value);
    }
}
