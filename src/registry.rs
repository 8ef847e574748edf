//! In-memory domain model loaded from JSON class descriptors.
//!
//! A descriptor file holds `{"classes": [...]}`. A directory is scanned
//! recursively for `*.json` files and every class found is registered.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use crate::builder::{ClassOutcome, map_classes};
use crate::config::SearchConfig;
use crate::model::{DomainClass, DomainModel};

#[derive(Debug, Deserialize)]
struct DescriptorFile {
    classes: Vec<DomainClass>,
}

#[derive(Debug, Clone, Default)]
pub struct DomainRegistry {
    classes: BTreeMap<String, DomainClass>,
}

impl DomainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, class: DomainClass) -> Result<()> {
        if self.classes.contains_key(&class.name) {
            anyhow::bail!("Duplicate domain class: {}", class.name);
        }
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    pub fn from_classes(classes: impl IntoIterator<Item = DomainClass>) -> Result<Self> {
        let mut registry = Self::new();
        for class in classes {
            registry.register(class)?;
        }
        Ok(registry)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let mut registry = Self::new();
        registry.add_json_str(raw)?;
        Ok(registry)
    }

    /// Loads a single descriptor file, or every descriptor under a directory.
    pub fn load(path: &Path) -> Result<Self> {
        if path.is_dir() {
            Self::load_dir(path)
        } else {
            Self::load_file(path)
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let mut registry = Self::new();
        registry.add_file(path)?;
        Ok(registry)
    }

    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut files = scan_descriptors(dir)?;
        files.sort();

        let mut registry = Self::new();
        for file in files.iter() {
            registry.add_file(file)?;
        }
        Ok(registry)
    }

    fn add_file(&mut self, path: &Path) -> Result<()> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read descriptor: {}", path.display()))?;
        self.add_json_str(&raw)
            .with_context(|| format!("Invalid descriptor: {}", path.display()))
    }

    fn add_json_str(&mut self, raw: &str) -> Result<()> {
        let file: DescriptorFile =
            serde_json::from_str(raw).context("Failed to parse class descriptors")?;
        for class in file.classes {
            self.register(class)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn classes(&self) -> impl Iterator<Item = &DomainClass> {
        self.classes.values()
    }

    /// Classes carrying a `searchable` directive, in name order.
    pub fn searchable_classes(&self) -> Vec<&DomainClass> {
        self.classes
            .values()
            .filter(|c| c.searchable.is_some())
            .collect()
    }

    /// Builds every searchable class, each with its own builder.
    pub fn map_all(&self, config: &SearchConfig) -> Vec<ClassOutcome> {
        map_classes(self, config, &self.searchable_classes())
    }
}

impl DomainModel for DomainRegistry {
    fn domain_class(&self, name: &str) -> Option<&DomainClass> {
        self.classes.get(name)
    }
}

pub fn scan_descriptors(base_path: &Path) -> Result<Vec<PathBuf>> {
    if !base_path.is_dir() {
        anyhow::bail!("Descriptor directory not found: {}", base_path.display());
    }

    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(base_path)
        .hidden(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry {
                let path = entry.path();
                if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                    let _ = tx.send(path.to_path_buf());
                }
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    Ok(rx.iter().collect())
}
