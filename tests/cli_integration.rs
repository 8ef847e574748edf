use serde_json::Value;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> std::path::PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!(
        "searchable_mapper_it_{}_{}_{}",
        std::process::id(),
        nanos,
        name
    ))
}

fn write_file(path: &std::path::Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

fn run(args: &[&str]) -> anyhow::Result<Output> {
    let bin = env!("CARGO_BIN_EXE_searchable-mapper");
    Ok(Command::new(bin)
        .args(args)
        .env_remove("SEARCHABLE_MAPPER_CONFIG")
        .env_remove("SEARCHABLE_MAPPER_SEARCH_DEFAULT_EXCLUDED_PROPERTIES")
        .env_remove("SEARCHABLE_MAPPER_SEARCH_ALWAYS_INHERIT_PROPERTIES")
        .output()?)
}

fn run_json(args: &[&str]) -> anyhow::Result<Value> {
    let out = run(args)?;
    if !out.status.success() {
        return Err(anyhow::anyhow!(
            "command failed: status={:?}, stderr={}",
            out.status.code(),
            String::from_utf8_lossy(&out.stderr)
        ));
    }
    Ok(serde_json::from_slice(&out.stdout)?)
}

fn names(mapping: &Value) -> Vec<String> {
    let mut names: Vec<String> = mapping["properties"]
        .as_array()
        .map(|props| {
            props
                .iter()
                .filter_map(|p| p["property"]["name"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

const LIBRARY: &str = r#"{
  "classes": [
    {
      "name": "Publication",
      "documentType": "publication",
      "properties": ["title", "publisher", "internalCode"],
      "searchable": true
    },
    {
      "name": "Book",
      "superclass": "Publication",
      "documentType": "book",
      "properties": ["title", "publisher", "internalCode", "isbn", "pages"],
      "searchable": [
        {"only": ["title", "isbn"]},
        {"title": {"boost": 2.0}},
        {"title": {"analyzer": "english"}}
      ]
    },
    {
      "name": "Pamphlet",
      "superclass": "Publication",
      "documentType": "pamphlet",
      "properties": ["title", "publisher", "internalCode", "sponsor"],
      "searchable": true
    }
  ]
}"#;

#[test]
fn map_applies_hierarchy_scoping_and_config() -> anyhow::Result<()> {
    let base = temp_dir("map_flow");
    let models = base.join("models").join("library.json");
    let config = base.join("searchable.toml");
    write_file(&models, LIBRARY)?;
    write_file(
        &config,
        "default_excluded_properties = [\"internalCode\"]\n",
    )?;

    let book = run_json(&[
        "--config",
        config.to_string_lossy().as_ref(),
        "map",
        models.to_string_lossy().as_ref(),
        "--class",
        "Book",
    ])?;
    let book = &book[0];
    assert_eq!(book["class_name"], Value::String("Book".to_string()));
    assert_eq!(names(book), vec!["id", "isbn", "title", "version"]);
    let title = book["properties"]
        .as_array()
        .and_then(|props| props.iter().find(|p| p["property"]["name"] == "title"))
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(title["attributes"]["boost"], Value::from(2.0));
    assert_eq!(title["attributes"]["analyzer"], Value::from("english"));

    let all = run_json(&[
        "--config",
        config.to_string_lossy().as_ref(),
        "map",
        base.join("models").to_string_lossy().as_ref(),
    ])?;
    let all = all.as_array().cloned().unwrap_or_default();
    assert_eq!(all.len(), 3);
    let pamphlet = all
        .iter()
        .find(|m| m["class_name"] == "Pamphlet")
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(
        names(&pamphlet),
        vec!["id", "publisher", "sponsor", "title", "version"]
    );

    let _ = std::fs::remove_dir_all(base);
    Ok(())
}

#[test]
fn map_writes_text_output_to_file() -> anyhow::Result<()> {
    let base = temp_dir("text_output");
    let models = base.join("library.json");
    let out_file = base.join("out").join("book.txt");
    write_file(&models, LIBRARY)?;

    let out = run(&[
        "map",
        models.to_string_lossy().as_ref(),
        "-c",
        "Book",
        "-f",
        "text",
        "-o",
        out_file.to_string_lossy().as_ref(),
    ])?;
    assert!(out.status.success());

    let text = std::fs::read_to_string(&out_file)?;
    assert!(text.starts_with("Book (type: book, all: true)"));
    assert!(text.contains("- isbn\n"));
    assert!(text.contains("- title {\"analyzer\":\"english\",\"boost\":2.0}"));

    let _ = std::fs::remove_dir_all(base);
    Ok(())
}

#[test]
fn map_fails_fast_on_conflicting_scope() -> anyhow::Result<()> {
    let base = temp_dir("conflict");
    let models = base.join("broken.json");
    write_file(
        &models,
        r#"{"classes": [{
            "name": "Broken",
            "documentType": "broken",
            "properties": ["a", "b"],
            "searchable": [{"only": "a"}, {"except": ["b"]}]
        }]}"#,
    )?;

    let out = run(&["map", models.to_string_lossy().as_ref()])?;
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("'Broken#searchable'"));

    let _ = std::fs::remove_dir_all(base);
    Ok(())
}

#[test]
fn check_reports_failures_and_keeps_going() -> anyhow::Result<()> {
    let base = temp_dir("check");
    let models = base.join("models.json");
    write_file(
        &models,
        r#"{"classes": [
            {"name": "Good", "documentType": "good", "properties": ["a"], "searchable": true},
            {"name": "Typo", "documentType": "typo", "properties": ["a"],
             "searchable": [{"b": {"boost": 1}}]},
            {"name": "Odd", "documentType": "odd", "properties": ["a"], "searchable": "yes"},
            {"name": "Hidden", "documentType": "hidden", "properties": ["a"], "searchable": false}
        ]}"#,
    )?;

    let out = run(&["check", models.to_string_lossy().as_ref()])?;
    assert!(!out.status.success());
    let report: Value = serde_json::from_slice(&out.stdout)?;
    assert_eq!(report["mapped"], Value::from(1));
    assert_eq!(report["skipped"], Value::from(1));
    assert_eq!(report["failed"], Value::from(2));

    let classes = report["classes"].as_array().cloned().unwrap_or_default();
    let typo = classes
        .iter()
        .find(|c| c["class_name"] == "Typo")
        .cloned()
        .unwrap_or(Value::Null);
    assert!(
        typo["error"]
            .as_str()
            .unwrap_or_default()
            .contains("Unable to find property [b]")
    );
    let good = classes
        .iter()
        .find(|c| c["class_name"] == "Good")
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(good["fingerprint"].as_str().map(str::len), Some(64));

    let _ = std::fs::remove_dir_all(base);
    Ok(())
}
