//! # searchable-mapper
//!
//! Turns the `searchable` directive of domain classes into search index
//! mappings.
//!
//! ## Architecture
//!
//! - **model**: Domain class descriptions and the `DomainModel` lookup trait
//! - **directive**: The `searchable` directive: flags, statement blocks, callbacks
//! - **context**: Execution context a customization block runs against
//! - **builder**: Hierarchy resolution and per-class mapping construction
//! - **mapping**: Property specs and the class mapping handed to the indexer
//! - **registry**: Domain model loaded from JSON class descriptors
//! - **config**: Global search configuration (TOML + environment)
//! - **error**: Mapping failures
//! - **logging**: tracing subscriber setup for the CLI

pub mod builder;
pub mod cli;
pub mod config;
pub mod context;
pub mod directive;
pub mod error;
pub mod logging;
pub mod mapping;
pub mod model;
pub mod registry;

pub use builder::{MappingBuilder, build_mapping, map_classes, resolve_hierarchy};
pub use config::SearchConfig;
pub use context::MappingContext;
pub use directive::{Directive, ScopeArg, SearchableBlock, Statement};
pub use error::{MappingError, Result};
pub use mapping::{ClassSearchMapping, PropertyMappingSpec};
pub use model::{DomainClass, DomainModel, DomainProperty};
pub use registry::DomainRegistry;
