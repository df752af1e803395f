//! Declarative builder for schema-typed messages.
//!
//! Fields are populated by name and validated against the schema at call time:
//!
//! - [`FieldResolver`]: looks up a field's cardinality and kind on the current scope
//! - [`Builder`]: the mutation engine, with a single [`Builder::set`] dispatcher plus
//!   [`Builder::extract`], [`Builder::new_child_for`] and typed convenience wrappers
//! - [`Builder::merge_snapshot`]: reconciles a plain key/value snapshot (e.g. a
//!   cached [`protoform_model::Message::to_plain`] result) back into a message
//!
//! Nested scopes are separate [`Builder`] values handed to callbacks, so the
//! parent scope is never rebound and nothing needs restoring on error.
//!
//! ```ignore
//! let person = protoform_builder::build(&person_type, |pb| {
//!     pb.set_value("name", "Ada")?;
//!     pb.set_each("friends", vec![1i64, 2], |pb, n| {
//!         pb.set_value("name", format!("F{}", n.as_scalar().and_then(|s| s.as_i64()).unwrap_or(0)))
//!     })?;
//!     pb.set_nested("best_friend", |pb| pb.set_value("name", "Manuelo"))
//! })?;
//! ```

mod attributes;
mod builder;
mod config;
mod error;
mod merge;
mod resolver;

pub use attributes::Attributes;
pub use builder::{build, build_from, build_from_with_config, build_with_config, Block, Builder};
pub use config::{BuilderConfig, EmptyValuePolicy};
pub use error::{BuildError, BuildResult, ConfigError};
pub use resolver::{FieldResolver, ResolvedField};
