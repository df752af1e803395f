//! Field lookup against the current scope's message type.

use crate::error::{BuildError, BuildResult};
use protoform_model::{Cardinality, FieldDescriptor, FieldKind, Message, MessageType};

/// A field looked up on the current scope's type, with its nested message
/// type resolved ahead of time.
///
/// Owns a copy of the descriptor so the caller can keep mutating the scope
/// while holding it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    descriptor: FieldDescriptor,
    nested: Option<MessageType>,
    owner: String,
}

impl ResolvedField {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    #[must_use]
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn cardinality(&self) -> Cardinality {
        self.descriptor.cardinality
    }

    #[must_use]
    pub fn kind(&self) -> &FieldKind {
        &self.descriptor.kind
    }

    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.descriptor.is_repeated()
    }

    /// Message-kind field (singular or repeated). Maps with message values
    /// are maps, not messages.
    #[must_use]
    pub fn is_message(&self) -> bool {
        self.descriptor.is_message()
    }

    #[must_use]
    pub fn is_map(&self) -> bool {
        self.descriptor.is_map()
    }

    /// Nested type for message fields and message-valued maps.
    #[must_use]
    pub fn nested_type(&self) -> Option<&MessageType> {
        self.nested.as_ref()
    }

    /// `Type.field`, used in error messages.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.descriptor.name)
    }

    pub(crate) fn require_nested(&self) -> BuildResult<&MessageType> {
        self.nested.as_ref().ok_or_else(|| BuildError::InvalidBlockUsage {
            field: self.descriptor.name.clone(),
        })
    }
}

/// Looks up field metadata on a scope.
pub struct FieldResolver;

impl FieldResolver {
    /// Resolves `name` on the scope's message type.
    ///
    /// Lookup is exact and case-sensitive. Fails with `UnknownField` when
    /// the type declares no such field.
    pub fn resolve(scope: &Message, name: &str) -> BuildResult<ResolvedField> {
        Self::resolve_on(scope.message_type(), name)
    }

    pub fn resolve_on(ty: &MessageType, name: &str) -> BuildResult<ResolvedField> {
        let descriptor = ty.field(name).ok_or_else(|| BuildError::UnknownField {
            message_type: ty.name().to_string(),
            field: name.to_string(),
        })?;
        Ok(ResolvedField {
            nested: ty.nested_type(descriptor),
            descriptor: descriptor.clone(),
            owner: ty.name().to_string(),
        })
    }
}
