//! Attribute sources for extraction.

use protoform_model::{Message, Value};
use std::collections::BTreeMap;

/// Source of named attributes for [`crate::Builder::extract`].
///
/// Implement this for domain objects that should be copied field-by-field
/// into a message.
pub trait Attributes {
    /// Value of the named attribute, or `None` if the element has none.
    fn attribute(&self, name: &str) -> Option<Value>;
}

impl Attributes for Value {
    fn attribute(&self, name: &str) -> Option<Value> {
        match self {
            Value::Mapping(entries) => entries.attribute(name),
            Value::Message(message) => message.attribute(name),
            _ => None,
        }
    }
}

impl Attributes for Message {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).ok().flatten()
    }
}

impl Attributes for BTreeMap<String, Value> {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

/// JSON objects; `null` members count as missing.
impl Attributes for serde_json::Value {
    fn attribute(&self, name: &str) -> Option<Value> {
        let member = self.as_object()?.get(name)?;
        Value::from_json(member).ok()
    }
}

impl<T: Attributes + ?Sized> Attributes for &T {
    fn attribute(&self, name: &str) -> Option<Value> {
        (**self).attribute(name)
    }
}
