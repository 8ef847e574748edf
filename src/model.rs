//! Domain class descriptions and the model they are looked up from.
//!
//! The framework's own introspection is out of reach here, so a class is
//! described by plain data: its name, superclass link, identifier and version
//! properties, persistent properties and the optional `searchable` directive.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::directive::Directive;

pub const DEFAULT_IDENTIFIER: &str = "id";
pub const DEFAULT_VERSION: &str = "version";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PropertyRepr")]
pub struct DomainProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl DomainProperty {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Descriptor files may name a property by a bare string.
#[derive(Deserialize)]
#[serde(untagged)]
enum PropertyRepr {
    Name(String),
    Full {
        name: String,
        #[serde(rename = "type", default)]
        type_name: String,
    },
}

impl From<PropertyRepr> for DomainProperty {
    fn from(repr: PropertyRepr) -> Self {
        match repr {
            PropertyRepr::Name(name) => Self::new(name, "Object"),
            PropertyRepr::Full { name, type_name } if type_name.is_empty() => {
                Self::new(name, "Object")
            }
            PropertyRepr::Full { name, type_name } => Self::new(name, type_name),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainClass {
    pub name: String,
    #[serde(default)]
    pub superclass: Option<String>,
    #[serde(default = "default_identifier")]
    pub identifier: DomainProperty,
    #[serde(default = "default_version")]
    pub version: DomainProperty,
    #[serde(default)]
    pub properties: Vec<DomainProperty>,
    #[serde(default)]
    pub searchable: Option<Directive>,
    #[serde(default)]
    pub document_type: Option<String>,
    #[serde(default)]
    pub root: bool,
}

fn default_identifier() -> DomainProperty {
    DomainProperty::new(DEFAULT_IDENTIFIER, "Long")
}

fn default_version() -> DomainProperty {
    DomainProperty::new(DEFAULT_VERSION, "Long")
}

impl DomainClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            identifier: default_identifier(),
            version: default_version(),
            properties: Vec::new(),
            searchable: None,
            document_type: None,
            root: false,
        }
    }

    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.properties.push(DomainProperty::new(name, type_name));
        self
    }

    pub fn searchable(mut self, directive: impl Into<Directive>) -> Self {
        self.searchable = Some(directive.into());
        self
    }

    pub fn document_type(mut self, marker: impl Into<String>) -> Self {
        self.document_type = Some(marker.into());
        self
    }

    pub fn root(mut self) -> Self {
        self.root = true;
        self
    }

    pub fn with_identifier(mut self, property: DomainProperty) -> Self {
        self.identifier = property;
        self
    }

    pub fn with_version(mut self, property: DomainProperty) -> Self {
        self.version = property;
        self
    }

    pub fn directive(&self) -> Option<&Directive> {
        self.searchable.as_ref()
    }

    /// True only for an explicit `searchable = false`.
    pub fn disables_search(&self) -> bool {
        matches!(self.searchable, Some(Directive::Flag(false)))
    }

    pub fn persistent_properties(&self) -> &[DomainProperty] {
        &self.properties
    }

    pub fn persistent_property(&self, name: &str) -> Option<&DomainProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Looks a property up by name, identifier and version included.
    pub fn property_by_name(&self, name: &str) -> Option<&DomainProperty> {
        self.resolve_property(&self.properties, name)
    }

    /// Like `property_by_name`, but over `properties` merged from ancestors.
    pub fn resolve_property<'p>(
        &'p self,
        properties: &'p [DomainProperty],
        name: &str,
    ) -> Option<&'p DomainProperty> {
        properties
            .iter()
            .find(|p| p.name == name)
            .or_else(|| (self.identifier.name == name).then_some(&self.identifier))
            .or_else(|| (self.version.name == name).then_some(&self.version))
    }
}

/// Persistent properties of `classes`, given oldest first. The first
/// declaration of a name wins.
pub fn merge_properties<'c>(
    classes: impl IntoIterator<Item = &'c DomainClass>,
) -> Vec<DomainProperty> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for class in classes {
        for property in class.persistent_properties() {
            if seen.insert(property.name.as_str()) {
                merged.push(property.clone());
            }
        }
    }
    merged
}

/// Class metadata the mapping builder consults.
pub trait DomainModel {
    fn domain_class(&self, name: &str) -> Option<&DomainClass>;

    fn is_domain_class(&self, name: &str) -> bool {
        self.domain_class(name).is_some()
    }

    fn superclass_of(&self, class: &DomainClass) -> Option<&DomainClass> {
        class
            .superclass
            .as_deref()
            .and_then(|name| self.domain_class(name))
    }

    /// Domain ancestors of `class`, nearest first. Cycles are cut.
    fn ancestors_of<'m>(&'m self, class: &DomainClass) -> Vec<&'m DomainClass> {
        let mut seen = HashSet::new();
        seen.insert(class.name.clone());

        let mut ancestors = Vec::new();
        let mut current = self.superclass_of(class);
        while let Some(ancestor) = current {
            if !seen.insert(ancestor.name.clone()) {
                break;
            }
            ancestors.push(ancestor);
            current = self.superclass_of(ancestor);
        }
        ancestors
    }

    /// Whether `property` of `class` is declared by one of its domain ancestors.
    fn is_property_inherited(&self, class: &DomainClass, property: &str) -> bool {
        self.ancestors_of(class)
            .iter()
            .any(|ancestor| ancestor.persistent_property(property).is_some())
    }
}
