use anyhow::{Context, Result};
use clap::Parser;
use searchable_mapper::builder::build_mapping;
use searchable_mapper::cli::{Cli, Commands, OutputFormat};
use searchable_mapper::config::{SearchConfig, load_config};
use searchable_mapper::logging::init_logging;
use searchable_mapper::mapping::ClassSearchMapping;
use searchable_mapper::model::DomainModel;
use searchable_mapper::registry::DomainRegistry;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref())?;
    let config = load_config(&cli)?;

    match cli.command.clone() {
        Commands::Map {
            input,
            class,
            format,
            output,
        } => {
            let registry = DomainRegistry::load(&input)?;
            let mappings = match class {
                Some(name) => vec![map_one(&registry, &config, &name)?],
                None => map_every(&registry, &config)?,
            };
            write_map_output(&mappings, format, output.as_deref())?;
        }
        Commands::Check { input } => {
            let registry = DomainRegistry::load(&input)?;
            let report = check(&registry, &config);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.failed > 0 {
                anyhow::bail!("{} class(es) failed to map", report.failed);
            }
        }
    }

    Ok(())
}

fn map_one(
    registry: &DomainRegistry,
    config: &SearchConfig,
    name: &str,
) -> Result<ClassSearchMapping> {
    let class = registry
        .domain_class(name)
        .with_context(|| format!("Unknown domain class: {name}"))?;
    build_mapping(registry, config, class)?
        .with_context(|| format!("Class {name} is not searchable"))
}

fn map_every(
    registry: &DomainRegistry,
    config: &SearchConfig,
) -> Result<Vec<ClassSearchMapping>> {
    let start = Instant::now();
    let mut mappings = Vec::new();
    for outcome in registry.map_all(config) {
        if let Some(mapping) = outcome.result? {
            mappings.push(mapping);
        }
    }
    info!(
        classes = registry.len(),
        mapped = mappings.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "built search mappings"
    );
    Ok(mappings)
}

#[derive(Debug, Serialize)]
struct ClassReport {
    class_name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    properties: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct CheckReport {
    mapped: usize,
    skipped: usize,
    failed: usize,
    classes: Vec<ClassReport>,
}

fn check(registry: &DomainRegistry, config: &SearchConfig) -> CheckReport {
    let mut report = CheckReport {
        mapped: 0,
        skipped: 0,
        failed: 0,
        classes: Vec::new(),
    };

    for outcome in registry.map_all(config) {
        let entry = match outcome.result {
            Ok(Some(mapping)) => {
                report.mapped += 1;
                ClassReport {
                    class_name: outcome.class_name,
                    status: "mapped",
                    properties: Some(mapping.len()),
                    fingerprint: Some(mapping.fingerprint()),
                    error: None,
                }
            }
            Ok(None) => {
                report.skipped += 1;
                ClassReport {
                    class_name: outcome.class_name,
                    status: "skipped",
                    properties: None,
                    fingerprint: None,
                    error: None,
                }
            }
            Err(e) => {
                warn!(class = %outcome.class_name, error = %e, "class mapping failed");
                report.failed += 1;
                ClassReport {
                    class_name: outcome.class_name,
                    status: "failed",
                    properties: None,
                    fingerprint: None,
                    error: Some(e.to_string()),
                }
            }
        };
        report.classes.push(entry);
    }

    report
}

fn write_map_output(
    mappings: &[ClassSearchMapping],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(mappings)?,
        OutputFormat::Text => {
            let mut out = String::new();
            for mapping in mappings {
                out.push_str(&format!(
                    "{} (type: {}, all: {})\n",
                    mapping.class_name, mapping.document_type, mapping.all
                ));
                for spec in &mapping.properties {
                    if spec.is_default() {
                        out.push_str(&format!("- {}\n", spec.name()));
                    } else {
                        out.push_str(&format!(
                            "- {} {}\n",
                            spec.name(),
                            serde_json::to_string(&spec.attributes)?
                        ));
                    }
                }
            }
            out
        }
    };

    if let Some(path) = output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write output: {}", path.display()))?;
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_reports_each_class_independently() -> Result<()> {
        let registry = DomainRegistry::from_json_str(
            r#"{"classes": [
                {"name": "Book", "documentType": "book", "properties": ["title"], "searchable": true},
                {"name": "Broken", "documentType": "broken", "properties": ["title"],
                 "searchable": {"only": "title", "except": "title"}},
                {"name": "Draft", "properties": ["title"], "searchable": true}
            ]}"#,
        )?;

        let report = check(&registry, &SearchConfig::default());
        assert_eq!((report.mapped, report.skipped, report.failed), (1, 1, 1));

        let broken = report
            .classes
            .iter()
            .find(|c| c.class_name == "Broken")
            .expect("broken reported");
        assert_eq!(broken.status, "failed");
        assert!(broken.error.as_deref().unwrap_or_default().contains("'Broken#searchable'"));
        Ok(())
    }
}
