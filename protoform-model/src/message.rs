//! Reflective message instances.
//!
//! A [`Message`] stores one slot per declared field, initialized to the
//! schema default. All writes are checked against the field descriptor:
//! scalars are coerced to the declared type, nested messages must match the
//! declared type (or be built from a mapping payload), and collection
//! operations only apply to collection fields.

use crate::error::{MessageError, MessageResult};
use crate::schema::{FieldDescriptor, FieldKind, MapValue, MessageType, ScalarType};
use crate::value::{Scalar, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
enum Slot {
    Scalar(Scalar),
    Message(Option<Box<Message>>),
    Repeated(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Slot {
    fn default_for(field: &FieldDescriptor) -> Self {
        match (&field.kind, field.is_repeated()) {
            (FieldKind::Map(_), _) => Self::Map(BTreeMap::new()),
            (_, true) => Self::Repeated(Vec::new()),
            (FieldKind::Scalar(ty), false) => Self::Scalar(ty.default_value()),
            (FieldKind::Message(_), false) => Self::Message(None),
        }
    }
}

/// A mutable, schema-typed record.
#[derive(Clone, PartialEq)]
pub struct Message {
    ty: MessageType,
    slots: Vec<Slot>,
}

impl Message {
    /// Creates an empty instance with every field at its default.
    #[must_use]
    pub fn new(ty: MessageType) -> Self {
        let slots = ty.descriptor().fields().iter().map(Slot::default_for).collect();
        Self { ty, slots }
    }

    /// Constructs a message from a mapping keyed by field name.
    ///
    /// Nested mappings construct nested messages; sequences fill repeated
    /// fields; mappings fill map fields.
    pub fn from_payload(ty: MessageType, payload: &Value) -> MessageResult<Self> {
        let entries = match payload {
            Value::Mapping(entries) => entries,
            Value::Message(m) if m.ty == ty => return Ok(m.clone()),
            other => {
                return Err(MessageError::InvalidPayload {
                    message_type: ty.name().to_string(),
                    found: other.kind_name(),
                });
            }
        };

        let mut message = Self::new(ty);
        for (name, value) in entries {
            message.assign(name, value.clone())?;
        }
        Ok(message)
    }

    /// Constructs a message from plain JSON, see [`Message::from_payload`].
    pub fn from_json(ty: MessageType, json: &serde_json::Value) -> MessageResult<Self> {
        let payload = Value::from_json(json)?;
        Self::from_payload(ty, &payload)
    }

    #[must_use]
    pub fn message_type(&self) -> &MessageType {
        &self.ty
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.ty.field(name).is_some()
    }

    /// Descriptor of a field, or `UnknownField`.
    pub fn field(&self, name: &str) -> MessageResult<&FieldDescriptor> {
        self.ty.field(name).ok_or_else(|| self.unknown(name))
    }

    fn unknown(&self, name: &str) -> MessageError {
        MessageError::UnknownField {
            message_type: self.ty.name().to_string(),
            field: name.to_string(),
        }
    }

    fn index(&self, name: &str) -> MessageResult<usize> {
        self.ty
            .descriptor()
            .field_index(name)
            .ok_or_else(|| self.unknown(name))
    }

    fn nested(&self, field: &FieldDescriptor) -> MessageResult<MessageType> {
        let target = field
            .message_type_name()
            .ok_or_else(|| MessageError::WrongShape {
                field: field.name.clone(),
                expected: "message",
            })?;
        self.ty
            .resolve(target)
            .ok_or_else(|| MessageError::UnresolvedType {
                field: field.name.clone(),
                target: target.to_string(),
            })
    }

    // ── Reads ────────────────────────────────────────────────────────

    /// Current value of any field. Unset singular messages read as `None`.
    pub fn get(&self, name: &str) -> MessageResult<Option<Value>> {
        let idx = self.index(name)?;
        Ok(match &self.slots[idx] {
            Slot::Scalar(s) => Some(Value::Scalar(s.clone())),
            Slot::Message(m) => m.as_deref().cloned().map(Value::Message),
            Slot::Repeated(items) => Some(Value::Sequence(items.clone())),
            Slot::Map(entries) => Some(Value::Mapping(entries.clone())),
        })
    }

    /// Value of a singular scalar field.
    pub fn get_scalar(&self, name: &str) -> MessageResult<&Scalar> {
        let idx = self.index(name)?;
        match &self.slots[idx] {
            Slot::Scalar(s) => Ok(s),
            _ => Err(Self::shape(name, "singular scalar")),
        }
    }

    /// Value of a singular message field, `None` while unset.
    pub fn get_message(&self, name: &str) -> MessageResult<Option<&Message>> {
        let idx = self.index(name)?;
        match &self.slots[idx] {
            Slot::Message(m) => Ok(m.as_deref()),
            _ => Err(Self::shape(name, "singular message")),
        }
    }

    /// Ordered contents of a repeated field.
    pub fn get_repeated(&self, name: &str) -> MessageResult<&[Value]> {
        let idx = self.index(name)?;
        match &self.slots[idx] {
            Slot::Repeated(items) => Ok(items),
            _ => Err(Self::shape(name, "repeated")),
        }
    }

    /// Entries of a map field.
    pub fn get_map(&self, name: &str) -> MessageResult<&BTreeMap<String, Value>> {
        let idx = self.index(name)?;
        match &self.slots[idx] {
            Slot::Map(entries) => Ok(entries),
            _ => Err(Self::shape(name, "map")),
        }
    }

    pub fn get_map_entry(&self, name: &str, key: &str) -> MessageResult<Option<&Value>> {
        Ok(self.get_map(name)?.get(key))
    }

    /// Shorthand for reading a string field; `None` for anything else.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get_scalar(name).ok().and_then(Scalar::as_str)
    }

    #[must_use]
    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_scalar(name).ok().and_then(Scalar::as_bool)
    }

    #[must_use]
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get_scalar(name).ok().and_then(Scalar::as_i64)
    }

    #[must_use]
    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get_scalar(name).ok().and_then(Scalar::as_f64)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Assigns a singular field.
    pub fn set(&mut self, name: &str, value: Value) -> MessageResult<()> {
        let idx = self.index(name)?;
        let field = &self.ty.descriptor().fields()[idx];
        if field.is_repeated() {
            return Err(Self::shape(name, "singular"));
        }
        let slot = match &field.kind {
            FieldKind::Scalar(ty) => Slot::Scalar(coerce_scalar(name, *ty, value)?),
            FieldKind::Message(_) => {
                let nested = self.nested(field)?;
                Slot::Message(Some(Box::new(coerce_message(name, &nested, value)?)))
            }
            FieldKind::Map(_) => return Err(Self::shape(name, "singular")),
        };
        self.slots[idx] = slot;
        Ok(())
    }

    /// Returns the singular child message, creating an empty one if unset.
    pub fn message_mut(&mut self, name: &str) -> MessageResult<&mut Message> {
        let idx = self.index(name)?;
        let field = &self.ty.descriptor().fields()[idx];
        if field.is_repeated() || !field.is_message() {
            return Err(Self::shape(name, "singular message"));
        }
        let nested = self.nested(field)?;
        match &mut self.slots[idx] {
            Slot::Message(slot) => {
                let child = slot.get_or_insert_with(|| Box::new(Message::new(nested)));
                Ok(&mut **child)
            }
            _ => Err(Self::shape(name, "singular message")),
        }
    }

    /// Replaces the whole contents of a repeated field.
    ///
    /// Elements are checked before anything is written, so a rejected element
    /// leaves the previous contents in place.
    pub fn replace_repeated(&mut self, name: &str, items: Vec<Value>) -> MessageResult<()> {
        let idx = self.index(name)?;
        let items = self.coerce_elements(idx, items)?;
        self.slots[idx] = Slot::Repeated(items);
        Ok(())
    }

    /// Appends to a repeated field.
    pub fn push_repeated(&mut self, name: &str, items: Vec<Value>) -> MessageResult<()> {
        let idx = self.index(name)?;
        let items = self.coerce_elements(idx, items)?;
        match &mut self.slots[idx] {
            Slot::Repeated(existing) => {
                existing.extend(items);
                Ok(())
            }
            _ => Err(Self::shape(name, "repeated")),
        }
    }

    /// Sets one entry of a map field.
    pub fn set_map_entry(&mut self, name: &str, key: &str, value: Value) -> MessageResult<()> {
        let idx = self.index(name)?;
        let field = &self.ty.descriptor().fields()[idx];
        let value = match &field.kind {
            FieldKind::Map(MapValue::Scalar(ty)) => Value::Scalar(coerce_scalar(name, *ty, value)?),
            FieldKind::Map(MapValue::Message(_)) => {
                let nested = self.nested(field)?;
                Value::Message(coerce_message(name, &nested, value)?)
            }
            _ => return Err(Self::shape(name, "map")),
        };
        match &mut self.slots[idx] {
            Slot::Map(entries) => {
                entries.insert(key.to_string(), value);
                Ok(())
            }
            _ => Err(Self::shape(name, "map")),
        }
    }

    /// An empty instance of the type a message (or message-map) field holds.
    pub fn new_child(&self, name: &str) -> MessageResult<Message> {
        let field = self.field(name)?;
        Ok(Message::new(self.nested(field)?))
    }

    /// Writes any field from a payload value, dispatching on the field's shape.
    fn assign(&mut self, name: &str, value: Value) -> MessageResult<()> {
        let field = self.field(name)?;
        let (is_map, is_repeated) = (field.is_map(), field.is_repeated());
        if is_map {
            match value {
                Value::Mapping(entries) => {
                    for (key, entry) in entries {
                        self.set_map_entry(name, &key, entry)?;
                    }
                    Ok(())
                }
                other => Err(Self::mismatch(name, "mapping", &other)),
            }
        } else if is_repeated {
            match value {
                Value::Sequence(items) => self.replace_repeated(name, items),
                other => Err(Self::mismatch(name, "sequence", &other)),
            }
        } else {
            self.set(name, value)
        }
    }

    fn coerce_elements(&self, idx: usize, items: Vec<Value>) -> MessageResult<Vec<Value>> {
        let field = &self.ty.descriptor().fields()[idx];
        if !field.is_repeated() || field.is_map() {
            return Err(Self::shape(&field.name, "repeated"));
        }
        match &field.kind {
            FieldKind::Scalar(ty) => items
                .into_iter()
                .map(|item| coerce_scalar(&field.name, *ty, item).map(Value::Scalar))
                .collect(),
            FieldKind::Message(_) => {
                let nested = self.nested(field)?;
                items
                    .into_iter()
                    .map(|item| coerce_message(&field.name, &nested, item).map(Value::Message))
                    .collect()
            }
            FieldKind::Map(_) => Err(Self::shape(&field.name, "repeated")),
        }
    }

    fn shape(name: &str, expected: &'static str) -> MessageError {
        MessageError::WrongShape {
            field: name.to_string(),
            expected,
        }
    }

    fn mismatch(name: &str, expected: &str, found: &Value) -> MessageError {
        MessageError::TypeMismatch {
            field: name.to_string(),
            expected: expected.to_string(),
            found: found.kind_name(),
        }
    }

    // ── Plain form ───────────────────────────────────────────────────

    /// Flattens the message into plain JSON keyed by field name.
    ///
    /// Scalars, repeated fields and maps are always present; singular
    /// messages only when set.
    #[must_use]
    pub fn to_plain(&self) -> serde_json::Value {
        let mut out = serde_json::Map::new();
        for (field, slot) in self.ty.descriptor().fields().iter().zip(&self.slots) {
            let plain = match slot {
                Slot::Scalar(s) => s.to_json(),
                Slot::Message(None) => continue,
                Slot::Message(Some(m)) => m.to_plain(),
                Slot::Repeated(items) => {
                    serde_json::Value::Array(items.iter().map(Value::to_json).collect())
                }
                Slot::Map(entries) => serde_json::Value::Object(
                    entries
                        .iter()
                        .map(|(k, v)| (k.clone(), v.to_json()))
                        .collect(),
                ),
            };
            out.insert(field.name.clone(), plain);
        }
        serde_json::Value::Object(out)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.ty.name());
        for (field, slot) in self.ty.descriptor().fields().iter().zip(&self.slots) {
            match slot {
                Slot::Scalar(v) => s.field(&field.name, v),
                Slot::Message(v) => s.field(&field.name, v),
                Slot::Repeated(v) => s.field(&field.name, v),
                Slot::Map(v) => s.field(&field.name, v),
            };
        }
        s.finish()
    }
}

fn coerce_message(field: &str, expected: &MessageType, value: Value) -> MessageResult<Message> {
    match value {
        Value::Message(m) if m.message_type() == expected => Ok(m),
        Value::Message(m) => Err(MessageError::WrongMessageType {
            field: field.to_string(),
            expected: expected.name().to_string(),
            found: m.type_name().to_string(),
        }),
        payload @ Value::Mapping(_) => Message::from_payload(expected.clone(), &payload),
        other => Err(Message::mismatch(field, expected.name(), &other)),
    }
}

fn coerce_scalar(field: &str, ty: ScalarType, value: Value) -> MessageResult<Scalar> {
    let scalar = match value {
        Value::Scalar(s) => s,
        other => return Err(Message::mismatch(field, ty.name(), &other)),
    };
    let out_of_range = |s: &Scalar| MessageError::OutOfRange {
        field: field.to_string(),
        expected: ty.name(),
        value: format!("{s:?}"),
    };
    let mismatch = |s: &Scalar| MessageError::TypeMismatch {
        field: field.to_string(),
        expected: ty.name().to_string(),
        found: s.kind_name(),
    };

    match ty {
        ScalarType::Bool => match scalar {
            Scalar::Bool(_) => Ok(scalar),
            other => Err(mismatch(&other)),
        },
        ScalarType::String => match scalar {
            Scalar::String(_) => Ok(scalar),
            other => Err(mismatch(&other)),
        },
        ScalarType::Float | ScalarType::Double => scalar
            .as_f64()
            .map(Scalar::Float)
            .ok_or_else(|| mismatch(&scalar)),
        ScalarType::Int32 | ScalarType::Int64 | ScalarType::UInt32 | ScalarType::UInt64 => {
            let Some(n) = integral(&scalar) else {
                return Err(match scalar {
                    Scalar::Float(_) => out_of_range(&scalar),
                    _ => mismatch(&scalar),
                });
            };
            let (min, max) = match ty {
                ScalarType::Int32 => (i128::from(i32::MIN), i128::from(i32::MAX)),
                ScalarType::Int64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
                ScalarType::UInt32 => (0, i128::from(u32::MAX)),
                _ => (0, i128::from(u64::MAX)),
            };
            if n < min || n > max {
                return Err(out_of_range(&scalar));
            }
            // Bounds were checked above.
            Ok(match ty {
                ScalarType::Int32 | ScalarType::Int64 => Scalar::Int(n as i64),
                _ => Scalar::UInt(n as u64),
            })
        }
    }
}

/// Integer value of a scalar; floats qualify only when they have no fraction.
fn integral(scalar: &Scalar) -> Option<i128> {
    match scalar {
        Scalar::Int(i) => Some(i128::from(*i)),
        Scalar::UInt(u) => Some(i128::from(*u)),
        Scalar::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i128),
        _ => None,
    }
}
