//! The `searchable` directive attached to a domain class.
//!
//! A directive is either a flag or a customization block. Blocks come in two
//! shapes: a statement list read from descriptor files, interpreted in order,
//! or a Rust callback run against the same [`MappingContext`].
//!
//! In JSON a block is written as a list of single-key objects:
//!
//! ```json
//! [{"only": ["title", "author"]}, {"title": {"boost": 2.0}}]
//! ```
//!
//! `all`, `only` and `except` set the scoping knobs; any other key configures
//! the property of that name.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::context::MappingContext;
use crate::error::Result;

pub const ALL_KEY: &str = "all";
pub const ONLY_KEY: &str = "only";
pub const EXCEPT_KEY: &str = "except";

#[derive(Debug, Clone)]
pub enum Directive {
    Flag(bool),
    Block(SearchableBlock),
    /// A descriptor value of an unusable JSON kind, rejected at build time.
    Unsupported(String),
}

impl Directive {
    pub fn from_value(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Bool(flag) => Ok(Self::Flag(flag)),
            Value::Array(items) => {
                let mut statements = Vec::with_capacity(items.len());
                for item in items {
                    let Value::Object(entries) = item else {
                        return Err(format!(
                            "searchable statements must be objects, found {}",
                            json_kind(&item)
                        ));
                    };
                    statements.extend(statements_from_map(entries)?);
                }
                Ok(Self::Block(SearchableBlock::Statements(statements)))
            }
            Value::Object(entries) => Ok(Self::Block(SearchableBlock::Statements(
                statements_from_map(entries)?,
            ))),
            other => Ok(Self::Unsupported(json_kind(&other).to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Directive {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Directive::from_value(value).map_err(de::Error::custom)
    }
}

impl From<bool> for Directive {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<SearchableBlock> for Directive {
    fn from(block: SearchableBlock) -> Self {
        Self::Block(block)
    }
}

impl From<Vec<Statement>> for Directive {
    fn from(statements: Vec<Statement>) -> Self {
        Self::Block(SearchableBlock::Statements(statements))
    }
}

pub type BlockFn = dyn Fn(&mut MappingContext<'_>) -> Result<()> + Send + Sync;

#[derive(Clone)]
pub enum SearchableBlock {
    Statements(Vec<Statement>),
    Callback(Arc<BlockFn>),
}

impl SearchableBlock {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&mut MappingContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(f))
    }

    /// Runs the block once against `ctx`.
    pub fn run(&self, ctx: &mut MappingContext<'_>) -> Result<()> {
        match self {
            Self::Statements(statements) => {
                for statement in statements {
                    ctx.apply(statement)?;
                }
                Ok(())
            }
            Self::Callback(f) => f(ctx),
        }
    }
}

impl fmt::Debug for SearchableBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Statements(statements) => f.debug_tuple("Statements").field(statements).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    All(bool),
    Only(ScopeArg),
    Except(ScopeArg),
    Property { name: String, attributes: Value },
}

impl Statement {
    pub fn only(arg: impl Into<ScopeArg>) -> Self {
        Self::Only(arg.into())
    }

    pub fn except(arg: impl Into<ScopeArg>) -> Self {
        Self::Except(arg.into())
    }

    pub fn property(name: impl Into<String>, attributes: Value) -> Self {
        Self::Property {
            name: name.into(),
            attributes,
        }
    }
}

fn statements_from_map(entries: Map<String, Value>) -> std::result::Result<Vec<Statement>, String> {
    entries
        .into_iter()
        .map(|(key, value)| match key.as_str() {
            ALL_KEY => match value {
                Value::Bool(flag) => Ok(Statement::All(flag)),
                other => Err(format!(
                    "'all' expects a boolean, found {}",
                    json_kind(&other)
                )),
            },
            ONLY_KEY => Ok(Statement::Only(ScopeArg::Raw(value))),
            EXCEPT_KEY => Ok(Statement::Except(ScopeArg::Raw(value))),
            _ => Ok(Statement::Property {
                name: key,
                attributes: value,
            }),
        })
        .collect()
}

/// Raw argument given to `only` or `except`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScopeArg {
    #[default]
    Unset,
    Name(String),
    Names(Vec<String>),
    Raw(Value),
}

impl ScopeArg {
    /// Normalizes the argument into a duplicate-free name list.
    ///
    /// Returns the offending value rendered as text when it is neither a name
    /// nor a collection of names.
    pub fn to_names(&self) -> std::result::Result<Vec<String>, String> {
        let names: Vec<String> = match self {
            Self::Unset => Vec::new(),
            Self::Name(name) => vec![name.clone()],
            Self::Names(names) => names.clone(),
            Self::Raw(Value::Null) => Vec::new(),
            Self::Raw(Value::String(name)) => vec![name.clone()],
            Self::Raw(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(name) => Ok(name.clone()),
                    _ => Err(Value::Array(items.clone()).to_string()),
                })
                .collect::<std::result::Result<_, _>>()?,
            Self::Raw(other) => return Err(other.to_string()),
        };

        let mut unique: Vec<String> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        Ok(unique)
    }
}

impl From<&str> for ScopeArg {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for ScopeArg {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Vec<String>> for ScopeArg {
    fn from(names: Vec<String>) -> Self {
        Self::Names(names)
    }
}

impl From<Vec<&str>> for ScopeArg {
    fn from(names: Vec<&str>) -> Self {
        Self::Names(names.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ScopeArg {
    fn from(names: [&str; N]) -> Self {
        Self::Names(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Value> for ScopeArg {
    fn from(value: Value) -> Self {
        Self::Raw(value)
    }
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
