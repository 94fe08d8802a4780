//! Remote configuration API response document.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Configuration object of a single namespace.
pub type NamespaceConfig = Map<String, Value>;

/// Decoded body of a configuration fetch: `{ "configs": { <namespace>: { .. } } }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteConfigApiResponse {
    #[serde(default)]
    pub configs: Option<HashMap<String, Value>>,
}

impl RemoteConfigApiResponse {
    /// Decodes a response body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Returns the object stored under `namespace`.
    ///
    /// Absent, `null` and non-object entries all yield `None`.
    pub fn namespace(&self, namespace: &str) -> Option<&NamespaceConfig> {
        match self.configs.as_ref()?.get(namespace)? {
            Value::Object(config) => Some(config),
            Value::Null => None,
            other => {
                tracing::debug!(
                    namespace,
                    kind = value_kind(other),
                    "remote-config namespace entry is not an object"
                );
                None
            }
        }
    }

    /// Consumes the document and returns the object stored under `namespace`.
    pub fn into_namespace(mut self, namespace: &str) -> Option<NamespaceConfig> {
        self.namespace(namespace)?;
        match self.configs.as_mut()?.remove(namespace)? {
            Value::Object(config) => Some(config),
            _ => None,
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
