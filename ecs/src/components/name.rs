use cobalt_core::data::{DataError, Value};

use crate::component::Component;
use crate::inspect::{Editable, FieldValue};

/// Debug name for an entity.
///
/// Document key: `value` (default empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Name(pub String);

impl Name {
    /// Create a new name from a string.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Name {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Component for Name {
    const NAME: &'static str = "Name";

    fn load(data: &Value) -> Result<Self, DataError> {
        let value = data.field_or("value", String::new(), |v, key| {
            v.read_str(key).map(str::to_owned)
        })?;
        Ok(Self(value))
    }

    fn save(&self) -> Value {
        Value::object([("value", Value::from(self.0.as_str()))])
    }

    fn as_editable(&self) -> Option<&dyn Editable> {
        Some(self)
    }

    fn as_editable_mut(&mut self) -> Option<&mut dyn Editable> {
        Some(self)
    }
}

impl Editable for Name {
    fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![("value", FieldValue::Text(self.0.clone()))]
    }

    fn set_field(&mut self, name: &str, value: FieldValue) -> bool {
        match (name, value) {
            ("value", FieldValue::Text(s)) => {
                self.0 = s;
                true
            }
            _ => false,
        }
    }
}
