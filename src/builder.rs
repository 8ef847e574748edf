//! Builds the search mapping of one domain class.
//!
//! The class's hierarchy is resolved once up front, then each ancestor's
//! directive is applied oldest first so that subclass customizations win.
//! A builder is consumed by [`MappingBuilder::build_class_mapping`]; build a
//! new one for every class.

use rayon::prelude::*;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::context::{BlockOutcome, MappingContext};
use crate::directive::{Directive, SearchableBlock};
use crate::error::{MappingError, Result};
use crate::mapping::{ClassSearchMapping, PropertyMappingSpec};
use crate::model::{DomainClass, DomainModel, DomainProperty, merge_properties};

#[derive(Debug)]
pub struct MappingBuilder<'a, M: DomainModel + ?Sized> {
    model: &'a M,
    config: &'a SearchConfig,
    class: &'a DomainClass,
    properties: Vec<DomainProperty>,
    mappable: Vec<String>,
    default_skipped: HashSet<String>,
    specs: HashMap<String, PropertyMappingSpec>,
    all: Option<bool>,
}

impl<'a, M: DomainModel + ?Sized> MappingBuilder<'a, M> {
    pub fn new(model: &'a M, config: &'a SearchConfig, class: &'a DomainClass) -> Self {
        Self {
            model,
            config,
            class,
            properties: Vec::new(),
            mappable: Vec::new(),
            default_skipped: HashSet::new(),
            specs: HashMap::new(),
            all: None,
        }
    }

    /// Returns `Ok(None)` when the class is not searchable.
    pub fn build_class_mapping(mut self) -> Result<Option<ClassSearchMapping>> {
        let class = self.class;
        match class.directive() {
            None => {
                debug!(class = %class.name, "no searchable directive");
                return Ok(None);
            }
            Some(Directive::Flag(false)) => {
                debug!(class = %class.name, "searchable disabled");
                return Ok(None);
            }
            Some(_) => {}
        }
        let Some(document_type) = class.document_type.clone() else {
            debug!(class = %class.name, "no document type");
            return Ok(None);
        };

        let chain = resolve_hierarchy(self.model, class);
        debug!(
            class = %class.name,
            chain = ?chain.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            "resolved searchable hierarchy"
        );

        // Properties declared above the mapped chain are out of reach.
        self.properties = merge_properties(chain.iter().copied());
        self.seed_candidates();

        for (depth, ancestor) in chain.iter().copied().enumerate() {
            let inherited = || merge_properties(chain[..=depth].iter().copied());
            match ancestor.directive() {
                None => {}
                Some(Directive::Flag(_)) => self.apply_default_mapping(ancestor, &inherited()),
                Some(Directive::Block(block)) => self.apply_block(ancestor, inherited(), block)?,
                Some(Directive::Unsupported(kind)) => {
                    return Err(MappingError::UnknownDirectiveType {
                        class: ancestor.name.clone(),
                        kind: kind.clone(),
                    });
                }
            }
        }

        let properties = self.finalize_properties();
        Ok(Some(ClassSearchMapping {
            class_name: class.name.clone(),
            document_type,
            all: self.all.unwrap_or(true),
            properties,
        }))
    }

    fn seed_candidates(&mut self) {
        let class = self.class;
        let names: Vec<String> = self.properties.iter().map(|p| p.name.clone()).collect();
        for name in &names {
            self.add_candidate(name);
        }
        self.add_candidate(&class.identifier.name);
        self.add_candidate(&class.version.name);
    }

    fn add_candidate(&mut self, name: &str) {
        if !self.mappable.iter().any(|n| n == name) {
            self.mappable.push(name.to_string());
        }
    }

    fn is_identity(&self, name: &str) -> bool {
        name == self.class.identifier.name || name == self.class.version.name
    }

    /// `searchable = true`: every persistent property of `ancestor` except the
    /// globally excluded ones and its document type discriminator. Those two
    /// stay out of the mapping unless a later block configures them or names
    /// them in `only`.
    fn apply_default_mapping(&mut self, ancestor: &DomainClass, properties: &[DomainProperty]) {
        let config = self.config;
        for property in properties {
            let excluded = config
                .default_excluded_properties
                .iter()
                .any(|e| *e == property.name);
            let discriminator = ancestor.document_type.as_deref() == Some(property.name.as_str());
            if excluded || discriminator {
                if !self.specs.contains_key(&property.name) {
                    self.default_skipped.insert(property.name.clone());
                }
                continue;
            }
            self.specs
                .entry(property.name.clone())
                .or_insert_with(|| PropertyMappingSpec::new(property.clone()));
        }
    }

    fn apply_block(
        &mut self,
        ancestor: &DomainClass,
        properties: Vec<DomainProperty>,
        block: &SearchableBlock,
    ) -> Result<()> {
        let mut ctx = MappingContext::with_properties(ancestor, properties);
        block.run(&mut ctx)?;
        let BlockOutcome {
            all,
            only,
            except,
            specs,
        } = ctx.finish()?;

        if all.is_some() {
            self.all = all;
        }

        if !except.is_empty() {
            self.mappable.retain(|name| !except.contains(name));
        }

        if !only.is_empty() {
            let inherit = self.config.always_inherit_properties;
            let kept: Vec<String> = self
                .mappable
                .iter()
                .filter(|name| {
                    self.is_identity(name)
                        || (inherit && self.model.is_property_inherited(ancestor, name))
                })
                .cloned()
                .collect();
            self.mappable = kept;
            for name in &only {
                self.default_skipped.remove(name);
                self.add_candidate(name);
            }
        }

        debug!(
            class = %self.class.name,
            ancestor = %ancestor.name,
            candidates = ?self.mappable,
            "applied searchable block"
        );

        for (name, spec) in specs {
            self.default_skipped.remove(&name);
            match self.specs.entry(name) {
                Entry::Occupied(mut existing) => {
                    existing.get_mut().attributes.extend(spec.attributes)
                }
                Entry::Vacant(slot) => {
                    slot.insert(spec);
                }
            }
        }
        Ok(())
    }

    fn finalize_properties(&mut self) -> Vec<PropertyMappingSpec> {
        let skipped = &self.default_skipped;
        self.mappable.retain(|name| !skipped.contains(name));
        let mappable: HashSet<&str> = self.mappable.iter().map(String::as_str).collect();
        self.specs.retain(|name, _| mappable.contains(name.as_str()));

        let class = self.class;
        let mut properties = Vec::with_capacity(self.mappable.len());
        for name in &self.mappable {
            if let Some(spec) = self.specs.remove(name) {
                properties.push(spec);
                continue;
            }
            match class.resolve_property(&self.properties, name) {
                Some(property) => properties.push(PropertyMappingSpec::new(property.clone())),
                None => warn!(
                    class = %class.name,
                    property = %name,
                    "'only' names a property the class does not have, skipping"
                ),
            }
        }
        properties
    }
}

/// Resolves the mapped hierarchy of `class`, oldest ancestor first.
///
/// The walk stops before an ancestor that sets `searchable = false`, after a
/// class flagged as root, and at the first superclass that is not a known
/// domain class.
pub fn resolve_hierarchy<'a, M: DomainModel + ?Sized>(
    model: &'a M,
    class: &'a DomainClass,
) -> Vec<&'a DomainClass> {
    let mut chain = vec![class];
    let mut seen = HashSet::new();
    seen.insert(class.name.as_str());

    let mut current = class;
    while !current.root {
        let Some(parent) = model.superclass_of(current) else {
            break;
        };
        if !seen.insert(parent.name.as_str()) {
            warn!(class = %class.name, ancestor = %parent.name, "superclass cycle");
            break;
        }
        if parent.disables_search() {
            break;
        }
        chain.push(parent);
        current = parent;
    }

    chain.reverse();
    chain
}

/// Convenience wrapper building one class with a fresh builder.
pub fn build_mapping<M: DomainModel + ?Sized>(
    model: &M,
    config: &SearchConfig,
    class: &DomainClass,
) -> Result<Option<ClassSearchMapping>> {
    MappingBuilder::new(model, config, class).build_class_mapping()
}

#[derive(Debug)]
pub struct ClassOutcome {
    pub class_name: String,
    pub result: Result<Option<ClassSearchMapping>>,
}

/// Builds every class in parallel, each with its own builder, so a failure
/// stays local to its class. Output keeps the order of `classes`.
pub fn map_classes<M: DomainModel + Sync + ?Sized>(
    model: &M,
    config: &SearchConfig,
    classes: &[&DomainClass],
) -> Vec<ClassOutcome> {
    classes
        .par_iter()
        .map(|class| ClassOutcome {
            class_name: class.name.clone(),
            result: build_mapping(model, config, class),
        })
        .collect()
}
