//! Library half of the `protoform` command: schema loading, snapshot merge
//! and descriptor listings, kept separate from argument parsing so they can
//! be tested directly.

use anyhow::{anyhow, Context, Result};
use protoform_builder::{Builder, BuilderConfig};
use protoform_model::{DescriptorPool, FieldDescriptor, FieldKind, MapValue, MessageType};
use std::fmt::Write as _;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Inputs for `protoform merge`.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub schema: PathBuf,
    pub type_name: String,
    pub config: Option<PathBuf>,
    /// Snapshot files applied in order; `-` reads standard input.
    pub snapshots: Vec<PathBuf>,
}

pub fn load_pool(path: &Path) -> Result<Arc<DescriptorPool>> {
    DescriptorPool::load(path).with_context(|| format!("failed to load schema {}", path.display()))
}

pub fn message_type(pool: &Arc<DescriptorPool>, name: &str) -> Result<MessageType> {
    pool.message_type(name)
        .ok_or_else(|| anyhow!("schema has no message type named {name}"))
}

/// Merges each snapshot into a fresh instance and returns the plain form.
pub fn run_merge(request: &MergeRequest) -> Result<serde_json::Value> {
    let pool = load_pool(&request.schema)?;
    let ty = message_type(&pool, &request.type_name)?;
    let config = match &request.config {
        Some(path) => BuilderConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BuilderConfig::default(),
    };

    let mut message = ty.new_instance();
    let mut builder = Builder::with_config(&mut message, config);
    for path in &request.snapshots {
        let snapshot = read_snapshot(path)?;
        builder
            .merge_snapshot(&snapshot)
            .with_context(|| format!("failed to merge {}", path.display()))?;
        debug!("Merged snapshot {:?}", path);
    }
    info!(
        "Merged {} snapshot(s) into {}",
        request.snapshots.len(),
        ty.name()
    );
    Ok(message.to_plain())
}

fn read_snapshot(path: &Path) -> Result<serde_json::Value> {
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?
    };
    serde_json::from_str(&contents)
        .with_context(|| format!("invalid JSON in snapshot {}", path.display()))
}

/// Human-readable listing of one message type, or all of them.
pub fn describe(pool: &Arc<DescriptorPool>, type_name: Option<&str>) -> Result<String> {
    let names: Vec<&str> = match type_name {
        Some(name) => vec![name],
        None => pool.type_names().collect(),
    };
    let mut out = String::new();
    for name in names {
        let ty = message_type(pool, name)?;
        writeln!(out, "message {}", ty.name())?;
        for field in ty.descriptor().fields() {
            writeln!(out, "  {}: {}", field.name, field_signature(field))?;
        }
    }
    Ok(out)
}

fn field_signature(field: &FieldDescriptor) -> String {
    let base = match &field.kind {
        FieldKind::Scalar(scalar) => scalar.to_string(),
        FieldKind::Message(target) => format!("message {target}"),
        FieldKind::Map(MapValue::Scalar(scalar)) => return format!("map<string, {scalar}>"),
        FieldKind::Map(MapValue::Message(target)) => return format!("map<string, {target}>"),
    };
    if field.is_repeated() {
        format!("repeated {base}")
    } else {
        base
    }
}
