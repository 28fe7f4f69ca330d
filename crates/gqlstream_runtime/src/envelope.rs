//! Response envelopes: the unit of output for one operation.

use bytes::Bytes;
use serde::ser::{Error as _, SerializeMap};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::value::RawValue;
use std::fmt;

/// A path segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<String> for PathSegment {
    fn from(s: String) -> Self {
        Self::Field(s)
    }
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        Self::Field(s.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        Self::Index(i)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Index(i) => write!(f, "{i}"),
        }
    }
}

/// A GraphQL error attached to an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// Error message.
    pub message: String,
    /// Resolution path that was active when the error was recorded.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl ErrorEntry {
    /// Creates an error with no path.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    /// Sets the path.
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            return f.write_str(&self.message);
        }
        let path: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        write!(f, "{}: {}", path.join("."), self.message)
    }
}

/// One discrete unit of response output.
///
/// `has_next` is `None` for single-shot and streaming envelopes, `Some(true)`
/// when more parts of an incremental response follow, and `Some(false)` on the
/// last part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseEnvelope {
    /// Serialized result data. Empty means no data.
    pub payload: Bytes,
    /// Whether more parts follow.
    pub has_next: Option<bool>,
    /// Errors recorded while producing this part.
    pub errors: Vec<ErrorEntry>,
}

impl ResponseEnvelope {
    /// Creates an envelope carrying the given serialized data.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            has_next: None,
            errors: Vec::new(),
        }
    }

    /// Creates a data-less envelope carrying a single error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            payload: Bytes::new(),
            has_next: None,
            errors: vec![ErrorEntry::new(message)],
        }
    }

    /// Sets the `hasNext` flag.
    pub fn with_has_next(mut self, has_next: bool) -> Self {
        self.has_next = Some(has_next);
        self
    }

    /// Appends errors.
    pub fn with_errors(mut self, errors: impl IntoIterator<Item = ErrorEntry>) -> Self {
        self.errors.extend(errors);
        self
    }

    /// Returns true if this envelope carries data.
    pub fn has_data(&self) -> bool {
        !self.payload.is_empty()
    }

    /// Parses the payload as JSON. An empty payload is `null`.
    pub fn data(&self) -> serde_json::Result<serde_json::Value> {
        if self.payload.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.payload)
    }

    /// Serializes the envelope into the GraphQL response shape.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let data: Option<&RawValue> = if self.payload.is_empty() {
            None
        } else {
            Some(serde_json::from_slice(&self.payload).map_err(S::Error::custom)?)
        };

        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("data", &data)?;
        if let Some(has_next) = self.has_next {
            map.serialize_entry("hasNext", &has_next)?;
        }
        if !self.errors.is_empty() {
            map.serialize_entry("errors", &self.errors)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_shot_shape() {
        let envelope = ResponseEnvelope::new(r#"{"name":"test"}"#);
        let json = String::from_utf8(envelope.to_json().unwrap()).unwrap();
        assert_eq!(json, r#"{"data":{"name":"test"}}"#);
    }

    #[test]
    fn test_incremental_shape() {
        let envelope = ResponseEnvelope::new(r#"{"name":null}"#).with_has_next(true);
        let json = String::from_utf8(envelope.to_json().unwrap()).unwrap();
        assert_eq!(json, r#"{"data":{"name":null},"hasNext":true}"#);
    }

    #[test]
    fn test_error_envelope_has_null_data() {
        let envelope = ResponseEnvelope::error("mutations are not supported");
        assert!(!envelope.has_data());
        assert_eq!(envelope.data().unwrap(), serde_json::Value::Null);

        let json: serde_json::Value = serde_json::from_slice(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "data": null,
                "errors": [{"message": "mutations are not supported"}]
            })
        );
    }

    #[test]
    fn test_error_path_serialization() {
        let envelope = ResponseEnvelope::new("null").with_errors([ErrorEntry::new("boom")
            .with_path(vec![PathSegment::from("users"), PathSegment::from(2usize), "name".into()])]);

        let json: serde_json::Value = serde_json::from_slice(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(json["errors"][0]["path"], serde_json::json!(["users", 2, "name"]));
        assert_eq!(envelope.errors[0].to_string(), "users.2.name: boom");
    }

    #[test]
    fn test_invalid_payload_fails_to_serialize() {
        let envelope = ResponseEnvelope::new("{not json");
        assert!(envelope.to_json().is_err());
    }
}
