//! Transformations, post-conditions and strategies

use std::fmt;
use std::str::FromStr;

use cvdata_meta::{JsonKind, JsonPath, SchemaVersion};
use serde_json::Value;

use crate::{Error, Result};

/// A named pure function over a JSON value.
#[derive(Clone, Copy)]
pub struct ValueTransform {
    pub name: &'static str,
    pub apply: fn(&Value) -> Value,
}

impl fmt::Debug for ValueTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueTransform").field(&self.name).finish()
    }
}

/// One edit applied to a document during a migration step.
#[derive(Debug, Clone)]
pub enum Transformation {
    /// Write `value` at `path`, creating intermediate objects
    Add { path: JsonPath, value: Value },
    /// Delete `path`; absent paths are ignored
    Remove { path: JsonPath },
    /// Take the value at `from` and write it at `to`; absent sources are ignored
    Move { from: JsonPath, to: JsonPath },
    /// Move under the same parent with a new key
    Rename { path: JsonPath, to_key: String },
    /// Replace an existing value with `op(value)`
    Transform { path: JsonPath, op: ValueTransform },
}

impl Transformation {
    pub fn add(path: &str, value: Value) -> Self {
        Self::Add {
            path: JsonPath::parse(path),
            value,
        }
    }

    pub fn remove(path: &str) -> Self {
        Self::Remove {
            path: JsonPath::parse(path),
        }
    }

    pub fn move_to(from: &str, to: &str) -> Self {
        Self::Move {
            from: JsonPath::parse(from),
            to: JsonPath::parse(to),
        }
    }

    pub fn rename(path: &str, to_key: &str) -> Self {
        Self::Rename {
            path: JsonPath::parse(path),
            to_key: to_key.to_string(),
        }
    }

    pub fn transform(path: &str, name: &'static str, apply: fn(&Value) -> Value) -> Self {
        Self::Transform {
            path: JsonPath::parse(path),
            op: ValueTransform { name, apply },
        }
    }

    /// Apply this edit in place.
    pub fn apply(&self, doc: &mut Value) -> std::result::Result<(), String> {
        match self {
            Self::Add { path, value } => write(doc, path, value.clone()),
            Self::Remove { path } => {
                path.remove(doc);
                Ok(())
            }
            Self::Move { from, to } => move_value(doc, from, to),
            Self::Rename { path, to_key } => move_value(doc, path, &path.with_last_key(to_key)),
            Self::Transform { path, op } => match path.get(doc) {
                Some(current) => {
                    let next = (op.apply)(current);
                    write(doc, path, next)
                }
                None => Ok(()),
            },
        }
    }
}

fn write(doc: &mut Value, path: &JsonPath, value: Value) -> std::result::Result<(), String> {
    if path.insert(doc, value) {
        Ok(())
    } else {
        Err(format!("cannot write to '{path}'"))
    }
}

fn move_value(doc: &mut Value, from: &JsonPath, to: &JsonPath) -> std::result::Result<(), String> {
    match from.remove(doc) {
        Some(value) => write(doc, to, value),
        None => Ok(()),
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { path, .. } => write!(f, "add {path}"),
            Self::Remove { path } => write!(f, "remove {path}"),
            Self::Move { from, to } => write!(f, "move {from} -> {to}"),
            Self::Rename { path, to_key } => write!(f, "rename {path} -> {to_key}"),
            Self::Transform { path, op } => write!(f, "transform {path} ({})", op.name),
        }
    }
}

/// A post-condition checked after a strategy's transformations.
#[derive(Debug, Clone)]
pub enum Validation {
    /// The path must exist
    Required(JsonPath),
    /// The path must exist and hold a value of this kind
    Kind(JsonPath, JsonKind),
}

impl Validation {
    pub fn required(path: &str) -> Self {
        Self::Required(JsonPath::parse(path))
    }

    pub fn kind(path: &str, kind: JsonKind) -> Self {
        Self::Kind(JsonPath::parse(path), kind)
    }

    /// `None` when satisfied, otherwise a description of the violation.
    pub fn check(&self, doc: &Value) -> Option<String> {
        match self {
            Self::Required(path) => {
                (!path.exists(doc)).then(|| format!("required field missing: {path}"))
            }
            Self::Kind(path, kind) => match path.get(doc) {
                None => Some(format!("required field missing: {path}")),
                Some(value) if JsonKind::of(value) != *kind => Some(format!(
                    "{path} should be {kind}, found {}",
                    JsonKind::of(value)
                )),
                Some(_) => None,
            },
        }
    }
}

/// Identifies one edge of the version graph, written `from->to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StepKey {
    pub from: SchemaVersion,
    pub to: SchemaVersion,
}

impl StepKey {
    pub fn new(from: SchemaVersion, to: SchemaVersion) -> Self {
        Self { from, to }
    }

    /// The same edge walked backwards.
    pub fn reversed(&self) -> Self {
        Self::new(self.to.clone(), self.from.clone())
    }

    /// Whether the edge lowers the version.
    pub fn is_rollback(&self) -> bool {
        self.to < self.from
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

impl FromStr for StepKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (from, to) = s
            .split_once("->")
            .ok_or_else(|| Error::migration(s, "step must be written as 'from->to'"))?;
        Ok(Self::new(
            SchemaVersion::parse(from)?,
            SchemaVersion::parse(to)?,
        ))
    }
}

/// Ordered transformations plus post-conditions for one edge.
#[derive(Debug, Clone)]
pub struct MigrationStrategy {
    pub key: StepKey,
    pub description: String,
    pub transformations: Vec<Transformation>,
    pub validations: Vec<Validation>,
}

impl MigrationStrategy {
    pub fn new(key: StepKey, description: &str) -> Self {
        Self {
            key,
            description: description.to_string(),
            transformations: Vec::new(),
            validations: Vec::new(),
        }
    }

    pub fn then(mut self, transformation: Transformation) -> Self {
        self.transformations.push(transformation);
        self
    }

    pub fn ensure(mut self, validation: Validation) -> Self {
        self.validations.push(validation);
        self
    }
}

/// Apply every transformation of `strategy`, then check its post-conditions.
///
/// On error the document may be partially transformed; callers work on a
/// copy.
pub fn apply_strategy(doc: &mut Value, strategy: &MigrationStrategy) -> Result<()> {
    let step = strategy.key.to_string();
    for transformation in &strategy.transformations {
        tracing::trace!(%step, %transformation, "applying");
        transformation
            .apply(doc)
            .map_err(|message| Error::migration(&step, message))?;
    }

    let violations: Vec<String> = strategy
        .validations
        .iter()
        .filter_map(|v| v.check(doc))
        .collect();
    if !violations.is_empty() {
        return Err(Error::migration(
            &step,
            format!("post-condition failed: {}", violations.join("; ")),
        ));
    }
    Ok(())
}
