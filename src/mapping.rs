use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::model::DomainProperty;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyMappingSpec {
    pub property: DomainProperty,
    pub attributes: BTreeMap<String, Value>,
}

impl PropertyMappingSpec {
    pub fn new(property: DomainProperty) -> Self {
        Self {
            property,
            attributes: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.property.name
    }

    /// Merges `attributes` into this spec. Later values win per key.
    pub fn add_attributes(&mut self, attributes: Map<String, Value>) {
        self.attributes.extend(attributes);
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn is_default(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn boost(&self) -> Option<f64> {
        self.attribute("boost").and_then(Value::as_f64)
    }

    pub fn analyzer(&self) -> Option<&str> {
        self.attribute("analyzer").and_then(Value::as_str)
    }

    pub fn index(&self) -> Option<&str> {
        self.attribute("index").and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassSearchMapping {
    pub class_name: String,
    pub document_type: String,
    /// Whether the catch-all field is enabled for this class.
    pub all: bool,
    pub properties: Vec<PropertyMappingSpec>,
}

impl ClassSearchMapping {
    pub fn property(&self, name: &str) -> Option<&PropertyMappingSpec> {
        self.properties.iter().find(|p| p.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    pub fn property_names(&self) -> Vec<&str> {
        self.properties.iter().map(PropertyMappingSpec::name).collect()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// SHA-256 over the mapping's JSON form, for detecting schema drift.
    pub fn fingerprint(&self) -> String {
        let payload = serde_json::to_string(self).unwrap_or_default();
        hash_content(&payload)
    }
}

pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}
