use std::collections::HashMap;

use anyhow::{Context, Result};

use super::{CHECKBOX_FIELDS, FieldSource};

/// State of a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldState {
    /// Text input or select: the current value as typed.
    Value(String),
    /// Checkbox: the checked state.
    Checkbox(bool),
}

/// In-memory form state.
///
/// Captures the fields of a form at one point in time. Used for CLI input,
/// snapshot files, the embedded web page's POST body, and test fakes.
#[derive(Debug, Clone, Default)]
pub struct FormSnapshot {
    fields: HashMap<String, FieldState>,
}

impl FormSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_value(&mut self, id: &str, value: impl Into<String>) -> &mut Self {
        self.fields
            .insert(id.to_string(), FieldState::Value(value.into()));
        self
    }

    pub fn set_checked(&mut self, id: &str, checked: bool) -> &mut Self {
        self.fields
            .insert(id.to_string(), FieldState::Checkbox(checked));
        self
    }

    pub fn remove(&mut self, id: &str) -> &mut Self {
        self.fields.remove(id);
        self
    }

    pub fn field(&self, id: &str) -> Option<&FieldState> {
        self.fields.get(id)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Build a snapshot from an `application/x-www-form-urlencoded` body.
    ///
    /// HTML forms omit unchecked checkboxes from the submission, so every
    /// declared checkbox field exists and is checked only if its name
    /// appears in the body.
    pub fn from_form_body(body: &str) -> Self {
        let mut snapshot = Self::new();
        for id in CHECKBOX_FIELDS {
            snapshot.set_checked(id, false);
        }

        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            if CHECKBOX_FIELDS.contains(&key.as_ref()) {
                snapshot.set_checked(&key, true);
            } else {
                snapshot.set_value(&key, value.into_owned());
            }
        }

        snapshot
    }

    /// Load a snapshot from a TOML document.
    ///
    /// Strings and numbers become field values, booleans become checkboxes:
    ///
    /// ```toml
    /// age = 61
    /// gender = "Female"
    /// hepatitis_c = true
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content).context("invalid TOML form snapshot")?;
        let mut snapshot = Self::new();

        for (key, value) in table {
            match value {
                toml::Value::String(s) => snapshot.set_value(&key, s),
                toml::Value::Integer(n) => snapshot.set_value(&key, n.to_string()),
                toml::Value::Float(f) => snapshot.set_value(&key, f.to_string()),
                toml::Value::Boolean(b) => snapshot.set_checked(&key, b),
                other => anyhow::bail!(
                    "unsupported value for field '{key}': {}",
                    other.type_str()
                ),
            };
        }

        Ok(snapshot)
    }

    /// Load a snapshot from a flat JSON object, with the same mapping as
    /// [`FormSnapshot::from_toml_str`].
    pub fn from_json_str(content: &str) -> Result<Self> {
        let object: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(content).context("invalid JSON form snapshot")?;
        let mut snapshot = Self::new();

        for (key, value) in object {
            match value {
                serde_json::Value::String(s) => snapshot.set_value(&key, s),
                serde_json::Value::Number(n) => snapshot.set_value(&key, n.to_string()),
                serde_json::Value::Bool(b) => snapshot.set_checked(&key, b),
                other => anyhow::bail!("unsupported value for field '{key}': {other}"),
            };
        }

        Ok(snapshot)
    }

    /// Load a snapshot file, picking the format from the extension
    /// (`.json` is JSON, anything else is TOML).
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read form snapshot {}", path.display()))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }
}

impl FieldSource for FormSnapshot {
    fn value(&self, id: &str) -> Option<String> {
        match self.fields.get(id)? {
            FieldState::Value(v) => Some(v.clone()),
            // A checkbox still has a value attribute; browsers default it to "on".
            FieldState::Checkbox(_) => Some("on".to_string()),
        }
    }

    fn checked(&self, id: &str) -> Option<bool> {
        match self.fields.get(id)? {
            FieldState::Checkbox(checked) => Some(*checked),
            FieldState::Value(_) => None,
        }
    }
}
