//! Operator header override file
//!
//! A JSON object of header names to values, read on every request so edits
//! apply without a restart. Any problem reading it yields no overrides.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

/// Headers from the override file, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderOverrides {
    /// `None` values delete the header from the outbound set
    entries: Vec<(String, Option<String>)>,
}

impl HeaderOverrides {
    /// Load overrides from `path`. Relative paths resolve against the
    /// working directory.
    pub async fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Header override file not readable");
                return Self::default();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(value) => Self::from_value(&value),
            Err(e) => {
                debug!(
                    path = %path.display(),
                    error = %e,
                    "Header override file is not valid JSON"
                );
                Self::default()
            }
        }
    }

    /// Build overrides from parsed JSON; anything but an object is empty
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::default();
        };

        let entries = object
            .iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    Value::Array(_) | Value::Object(_) => {
                        debug!(header = %name, "Ignoring structured header override");
                        return None;
                    }
                };
                Some((name.clone(), value))
            })
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[(String, Option<String>)] {
        &self.entries
    }

    /// Whether the file sets an Authorization header of its own
    pub fn contains_authorization(&self) -> bool {
        self.entries
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("authorization"))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
