//! Scoped builder: field dispatch, extraction and nested scopes.

use crate::attributes::Attributes;
use crate::config::BuilderConfig;
use crate::error::{BuildError, BuildResult};
use crate::resolver::{FieldResolver, ResolvedField};
use protoform_model::{Message, MessageError, MessageType, Scalar, Value};
use tracing::debug;

/// Nested-population callback accepted by [`Builder::set`].
///
/// Receives a builder scoped to the child message and, for repeated fields,
/// the collection element the child is built from.
pub type Block<'b> = &'b mut dyn FnMut(&mut Builder<'_>, Option<&Value>) -> BuildResult<()>;

/// Mutation engine over one message scope.
///
/// Nested scopes are new `Builder`s over the child message, handed to the
/// callback and dropped when it returns.
pub struct Builder<'m> {
    pub(crate) message: &'m mut Message,
    pub(crate) config: BuilderConfig,
    pub(crate) depth: usize,
}

impl<'m> Builder<'m> {
    pub fn new(message: &'m mut Message) -> Self {
        Self::with_config(message, BuilderConfig::default())
    }

    pub fn with_config(message: &'m mut Message, config: BuilderConfig) -> Self {
        Self {
            message,
            config,
            depth: 0,
        }
    }

    /// The message this scope populates.
    #[must_use]
    pub fn target(&self) -> &Message {
        self.message
    }

    #[must_use]
    pub fn config(&self) -> BuilderConfig {
        self.config
    }

    /// Nesting level of this scope; the root is 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the scope's type declares `name`. Used for dynamic dispatch
    /// checks before calling [`Builder::set`].
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.message.has_field(name)
    }

    /// Populates one field. Branches are tried in order:
    ///
    /// 1. With a `block`: the field must be a message field. Repeated fields
    ///    take exactly one sequence argument and get one child per element,
    ///    appended in order. Singular fields take no arguments and reuse the
    ///    existing child if one is set.
    /// 2. Exactly one argument: repeated fields take a mapping (map entries),
    ///    a sequence (replacement) or a single value (one-element
    ///    replacement). Singular fields are assigned.
    /// 3. Zero or two or more arguments: `[element, attr, ...]` extracts the
    ///    named attributes of `element` into a child (or one child per element
    ///    for repeated fields). With no arguments a singular message field
    ///    gets an empty child, or keeps its existing one.
    pub fn set(
        &mut self,
        field: &str,
        args: Vec<Value>,
        block: Option<Block<'_>>,
    ) -> BuildResult<()> {
        let field = FieldResolver::resolve(self.message, field)?;
        match block {
            Some(block) => self.set_scoped(&field, args, block),
            None if args.len() == 1 => {
                let value = single(&field, args)?;
                debug!("set {} = {}", field.qualified_name(), value.kind_name());
                self.assign(&field, value)
            }
            None => self.set_extracted(&field, args),
        }
    }

    fn set_scoped(
        &mut self,
        field: &ResolvedField,
        args: Vec<Value>,
        block: Block<'_>,
    ) -> BuildResult<()> {
        if !field.is_message() {
            return Err(BuildError::InvalidBlockUsage {
                field: field.name().to_string(),
            });
        }
        if field.is_repeated() {
            let items = collection(field, single(field, args)?)?;
            debug!(
                "set {}: {} children via callback",
                field.qualified_name(),
                items.len()
            );
            self.push_children(field, &items, |scope, item| block(scope, Some(item)))
        } else {
            if !args.is_empty() {
                return Err(BuildError::ArityMismatch {
                    field: field.name().to_string(),
                    expected: "0",
                    found: args.len(),
                });
            }
            debug!("set {}: nested scope", field.qualified_name());
            self.scope_child(field, |scope| block(scope, None))
        }
    }

    fn set_extracted(&mut self, field: &ResolvedField, args: Vec<Value>) -> BuildResult<()> {
        if !field.is_message() {
            return Err(BuildError::InvalidBlockUsage {
                field: field.name().to_string(),
            });
        }
        let mut args = args.into_iter();
        let element = args.next();
        let names = args.map(attribute_name).collect::<BuildResult<Vec<_>>>()?;
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        debug!("set {}: extract {:?}", field.qualified_name(), names);

        match (field.is_repeated(), element) {
            (true, Some(element)) => {
                let items = collection(field, element)?;
                self.push_children(field, &items, |scope, item| scope.extract(item, &names))
            }
            (true, None) => Err(BuildError::ExpectedCollection {
                field: field.name().to_string(),
                found: "nothing",
            }),
            (false, Some(element)) => self.scope_child(field, |scope| scope.extract(&element, &names)),
            (false, None) => self.scope_child(field, |_| Ok(())),
        }
    }

    /// Writes one value to a resolved field according to its shape.
    pub(crate) fn assign(&mut self, field: &ResolvedField, value: Value) -> BuildResult<()> {
        let name = field.name();
        if !field.is_repeated() {
            self.message.set(name, value)?;
            return Ok(());
        }
        match value {
            Value::Mapping(entries) => {
                for (key, entry) in entries {
                    self.message.set_map_entry(name, &key, entry)?;
                }
            }
            Value::Sequence(items) => self.message.replace_repeated(name, items)?,
            other => self.message.replace_repeated(name, vec![other])?,
        }
        Ok(())
    }

    /// Builds one child per item and appends them once all succeed.
    fn push_children<T, F>(&mut self, field: &ResolvedField, items: &[T], mut fill: F) -> BuildResult<()>
    where
        F: FnMut(&mut Builder<'_>, &T) -> BuildResult<()>,
    {
        let ty = field.require_nested()?.clone();
        let depth = self.enter()?;
        let mut children = Vec::with_capacity(items.len());
        for item in items {
            let mut child = ty.new_instance();
            fill(
                &mut Builder {
                    message: &mut child,
                    config: self.config,
                    depth,
                },
                item,
            )?;
            children.push(Value::Message(child));
        }
        self.message.push_repeated(field.name(), children)?;
        Ok(())
    }

    fn scope_child<F>(&mut self, field: &ResolvedField, fill: F) -> BuildResult<()>
    where
        F: FnOnce(&mut Builder<'_>) -> BuildResult<()>,
    {
        let depth = self.enter()?;
        let config = self.config;
        let child = self.message.message_mut(field.name())?;
        fill(&mut Builder {
            message: child,
            config,
            depth,
        })
    }

    fn enter(&self) -> BuildResult<usize> {
        let depth = self.depth + 1;
        if depth > self.config.max_depth {
            return Err(BuildError::DepthExceeded {
                max_depth: self.config.max_depth,
            });
        }
        Ok(depth)
    }

    // ── Extraction ───────────────────────────────────────────────────

    /// Copies the named attributes of `element` into same-named fields of
    /// this scope, stopping at the first failure.
    pub fn extract<A: Attributes + ?Sized>(&mut self, element: &A, names: &[&str]) -> BuildResult<()> {
        for &name in names {
            let field = FieldResolver::resolve(self.message, name)?;
            let value = element
                .attribute(name)
                .ok_or_else(|| BuildError::MissingAttribute {
                    attribute: name.to_string(),
                })?;
            self.assign(&field, value)?;
        }
        Ok(())
    }

    /// Appends one child per element to a repeated message field, each
    /// populated by extracting `names`.
    pub fn extract_each<A: Attributes>(
        &mut self,
        field: &str,
        elements: &[A],
        names: &[&str],
    ) -> BuildResult<()> {
        let field = FieldResolver::resolve(self.message, field)?;
        if !field.is_message() || !field.is_repeated() {
            return Err(BuildError::Message(MessageError::WrongShape {
                field: field.name().to_string(),
                expected: "repeated message",
            }));
        }
        self.push_children(&field, elements, |scope, element| scope.extract(element, names))
    }

    /// Empty instance of the nested type `field` holds, for use as a prefab
    /// value.
    pub fn new_child_for(&self, field: &str) -> BuildResult<Message> {
        Ok(self.message.new_child(field)?)
    }

    // ── Convenience wrappers over `set` ──────────────────────────────

    /// Single-value form of [`Builder::set`].
    pub fn set_value(&mut self, field: &str, value: impl Into<Value>) -> BuildResult<()> {
        self.set(field, vec![value.into()], None)
    }

    /// Populates a singular message field in a nested scope.
    pub fn set_nested<F>(&mut self, field: &str, mut fill: F) -> BuildResult<()>
    where
        F: FnMut(&mut Builder<'_>) -> BuildResult<()>,
    {
        let mut block = |scope: &mut Builder<'_>, _: Option<&Value>| fill(scope);
        self.set(field, Vec::new(), Some(&mut block))
    }

    /// Appends one child per item to a repeated message field.
    pub fn set_each<I, T, F>(&mut self, field: &str, items: I, mut fill: F) -> BuildResult<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
        F: FnMut(&mut Builder<'_>, &Value) -> BuildResult<()>,
    {
        let mut block = |scope: &mut Builder<'_>, item: Option<&Value>| match item {
            Some(item) => fill(scope, item),
            None => Ok(()),
        };
        self.set(field, vec![Value::sequence(items)], Some(&mut block))
    }

    /// Extract shorthand: `element`'s named attributes go into a child of
    /// `field` (one child per element if `field` is repeated).
    pub fn set_extract(
        &mut self,
        field: &str,
        element: impl Into<Value>,
        names: &[&str],
    ) -> BuildResult<()> {
        if names.is_empty() {
            return Err(BuildError::ArityMismatch {
                field: field.to_string(),
                expected: "at least 2",
                found: 1,
            });
        }
        let args = std::iter::once(element.into())
            .chain(names.iter().map(|&name| Value::from(name)))
            .collect();
        self.set(field, args, None)
    }
}

/// Builds a fresh message of `ty` with a root-scope builder.
pub fn build<F>(ty: &MessageType, fill: F) -> BuildResult<Message>
where
    F: FnOnce(&mut Builder<'_>) -> BuildResult<()>,
{
    build_with_config(ty, BuilderConfig::default(), fill)
}

pub fn build_with_config<F>(ty: &MessageType, config: BuilderConfig, fill: F) -> BuildResult<Message>
where
    F: FnOnce(&mut Builder<'_>) -> BuildResult<()>,
{
    let mut message = ty.new_instance();
    fill(&mut Builder::with_config(&mut message, config))?;
    Ok(message)
}

/// Like [`build`], but starts from a payload mapping instead of an empty
/// instance.
pub fn build_from<F>(ty: &MessageType, payload: &Value, fill: F) -> BuildResult<Message>
where
    F: FnOnce(&mut Builder<'_>) -> BuildResult<()>,
{
    build_from_with_config(ty, BuilderConfig::default(), payload, fill)
}

pub fn build_from_with_config<F>(
    ty: &MessageType,
    config: BuilderConfig,
    payload: &Value,
    fill: F,
) -> BuildResult<Message>
where
    F: FnOnce(&mut Builder<'_>) -> BuildResult<()>,
{
    let mut message = Message::from_payload(ty.clone(), payload)?;
    fill(&mut Builder::with_config(&mut message, config))?;
    Ok(message)
}

fn single(field: &ResolvedField, args: Vec<Value>) -> BuildResult<Value> {
    let found = args.len();
    <[Value; 1]>::try_from(args)
        .map(|[value]| value)
        .map_err(|_| BuildError::ArityMismatch {
            field: field.name().to_string(),
            expected: "1",
            found,
        })
}

fn collection(field: &ResolvedField, value: Value) -> BuildResult<Vec<Value>> {
    match value {
        Value::Sequence(items) => Ok(items),
        other => Err(BuildError::ExpectedCollection {
            field: field.name().to_string(),
            found: other.kind_name(),
        }),
    }
}

fn attribute_name(value: Value) -> BuildResult<String> {
    match value {
        Value::Scalar(Scalar::String(name)) => Ok(name),
        other => Err(BuildError::InvalidAttributeName {
            found: other.kind_name(),
        }),
    }
}
