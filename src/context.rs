//! Execution context for one run of a customization block.
//!
//! A fresh context is created for every ancestor whose directive is a block.
//! The block sets the scoping knobs and configures properties through it; the
//! builder then folds the finished [`BlockOutcome`] into its own state.

use serde_json::Value;
use std::collections::HashMap;

use crate::directive::{ScopeArg, Statement};
use crate::error::{MappingError, Result};
use crate::mapping::PropertyMappingSpec;
use crate::model::{DomainClass, DomainProperty};

#[derive(Debug)]
pub struct MappingContext<'a> {
    class: &'a DomainClass,
    properties: Vec<DomainProperty>,
    all: Option<bool>,
    only: ScopeArg,
    except: ScopeArg,
    specs: HashMap<String, PropertyMappingSpec>,
}

/// Normalized result of a block run.
#[derive(Debug, Default)]
pub struct BlockOutcome {
    pub all: Option<bool>,
    pub only: Vec<String>,
    pub except: Vec<String>,
    pub specs: HashMap<String, PropertyMappingSpec>,
}

impl<'a> MappingContext<'a> {
    pub fn new(class: &'a DomainClass) -> Self {
        Self::with_properties(class, class.persistent_properties().to_vec())
    }

    /// A context whose property lookups see `properties`, typically the
    /// class's own merged with what it inherits.
    pub fn with_properties(class: &'a DomainClass, properties: Vec<DomainProperty>) -> Self {
        Self {
            class,
            properties,
            all: None,
            only: ScopeArg::Unset,
            except: ScopeArg::Unset,
            specs: HashMap::new(),
        }
    }

    pub fn class(&self) -> &DomainClass {
        self.class
    }

    pub fn all(&self) -> bool {
        self.all.unwrap_or(true)
    }

    pub fn set_all(&mut self, all: bool) {
        self.all = Some(all);
    }

    pub fn only(&self) -> &ScopeArg {
        &self.only
    }

    pub fn set_only(&mut self, only: impl Into<ScopeArg>) {
        self.only = only.into();
    }

    pub fn except(&self) -> &ScopeArg {
        &self.except
    }

    pub fn set_except(&mut self, except: impl Into<ScopeArg>) {
        self.except = except.into();
    }

    /// Adds `attributes` to the spec of `name`, creating it on first use.
    pub fn configure_property(&mut self, name: &str, attributes: Value) -> Result<()> {
        let Some(property) = self.class.resolve_property(&self.properties, name) else {
            return Err(MappingError::UnknownProperty {
                class: self.class.name.clone(),
                property: name.to_string(),
            });
        };
        let Value::Object(attributes) = attributes else {
            return Err(MappingError::InvalidAttributes {
                class: self.class.name.clone(),
                property: name.to_string(),
            });
        };

        self.specs
            .entry(name.to_string())
            .or_insert_with(|| PropertyMappingSpec::new(property.clone()))
            .add_attributes(attributes);
        Ok(())
    }

    pub fn apply(&mut self, statement: &Statement) -> Result<()> {
        match statement {
            Statement::All(all) => self.set_all(*all),
            Statement::Only(arg) => self.set_only(arg.clone()),
            Statement::Except(arg) => self.set_except(arg.clone()),
            Statement::Property { name, attributes } => {
                self.configure_property(name, attributes.clone())?
            }
        }
        Ok(())
    }

    /// Normalizes `only`/`except` and rejects blocks that set both.
    pub fn finish(self) -> Result<BlockOutcome> {
        let only = self.scope_names("only", &self.only)?;
        let except = self.scope_names("except", &self.except)?;

        if !only.is_empty() && !except.is_empty() {
            return Err(MappingError::ConflictingScope {
                class: self.class.name.clone(),
            });
        }

        Ok(BlockOutcome {
            all: self.all,
            only,
            except,
            specs: self.specs,
        })
    }

    fn scope_names(&self, scope: &'static str, arg: &ScopeArg) -> Result<Vec<String>> {
        arg.to_names()
            .map_err(|value| MappingError::InvalidScopeArgument {
                class: self.class.name.clone(),
                scope,
                value,
            })
    }
}
