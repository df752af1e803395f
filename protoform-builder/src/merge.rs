//! Snapshot merge: reconciles a plain key/value tree back into a scope.

use crate::builder::Builder;
use crate::config::EmptyValuePolicy;
use crate::error::{BuildError, BuildResult};
use crate::resolver::{FieldResolver, ResolvedField};
use protoform_model::{MessageType, Value};
use tracing::{debug, trace};

impl Builder<'_> {
    /// Merges a snapshot object into the current scope.
    ///
    /// For each key:
    /// - `null` and empty values (`""`, `[]`, `{}`) are skipped before the key
    ///   is looked up, unless the config rejects empty values
    /// - nested messages count against `max_depth` one level per message,
    ///   the same as callback scopes
    /// - map fields take a mapping of entries
    /// - repeated fields take a sequence that replaces their contents; message
    ///   elements are built from mappings
    /// - singular message fields take a mapping that constructs a new child
    /// - scalar fields are assigned
    ///
    /// Keys are applied in order; a failing key leaves earlier keys applied.
    pub fn merge_snapshot(&mut self, snapshot: &serde_json::Value) -> BuildResult<()> {
        let members = snapshot
            .as_object()
            .ok_or_else(|| BuildError::MergeTypeMismatch {
                target: self.message.type_name().to_string(),
                expected: "mapping",
                found: json_kind(snapshot),
            })?;

        for (key, raw) in members {
            if raw.is_null() {
                trace!("merge: skipping null {}", key);
                continue;
            }
            let value = Value::from_json(raw)?;
            if value.is_empty() {
                match self.config.empty_values {
                    EmptyValuePolicy::Skip => {
                        trace!("merge: skipping empty {}", key);
                        continue;
                    }
                    EmptyValuePolicy::Reject => {
                        return Err(BuildError::EmptyValue { field: key.clone() });
                    }
                }
            }
            let field = FieldResolver::resolve(self.message, key)?;
            if self.depth + message_depth(&field, &value) > self.config.max_depth {
                return Err(BuildError::DepthExceeded {
                    max_depth: self.config.max_depth,
                });
            }
            debug!("merge {} <- {}", field.qualified_name(), value.kind_name());
            self.merge_field(&field, value)?;
        }
        Ok(())
    }

    fn merge_field(&mut self, field: &ResolvedField, value: Value) -> BuildResult<()> {
        let found = value.kind_name();
        let mismatch = |expected| BuildError::MergeTypeMismatch {
            target: field.qualified_name(),
            expected,
            found,
        };

        if field.is_map() {
            if !matches!(value, Value::Mapping(_)) {
                return Err(mismatch("mapping"));
            }
        } else if field.is_repeated() {
            if !matches!(value, Value::Sequence(_)) {
                return Err(mismatch("sequence"));
            }
        } else if field.is_message() && !matches!(value, Value::Mapping(_) | Value::Message(_)) {
            return Err(mismatch("mapping"));
        }
        self.assign(field, value)
    }
}

/// Message nesting a value creates when written to `field`, counted in
/// builder scopes: one per nested message, however it is wrapped in
/// sequences or mappings.
fn message_depth(field: &ResolvedField, value: &Value) -> usize {
    let Some(ty) = field.nested_type() else {
        return 0;
    };
    let children: Vec<&Value> = match value {
        Value::Sequence(items) if field.is_repeated() && !field.is_map() => items.iter().collect(),
        Value::Mapping(entries) if field.is_map() => entries.values().collect(),
        other => vec![other],
    };
    children
        .into_iter()
        .map(|child| 1 + payload_depth(ty, child))
        .max()
        .unwrap_or(0)
}

/// Deepest message nesting inside a constructor payload for `ty`. Keys the
/// type does not declare count as 0; the write reports them.
fn payload_depth(ty: &MessageType, payload: &Value) -> usize {
    let Value::Mapping(entries) = payload else {
        return 0;
    };
    entries
        .iter()
        .filter_map(|(key, value)| {
            FieldResolver::resolve_on(ty, key)
                .ok()
                .map(|field| message_depth(&field, value))
        })
        .max()
        .unwrap_or(0)
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "sequence",
        serde_json::Value::Object(_) => "mapping",
    }
}
