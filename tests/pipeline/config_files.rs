use streamchat::config::{Config, ProviderKind};
use tempfile::TempDir;

#[test]
fn config_file_round_trip_keeps_catalog_and_sections() {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = dir.path().join("config.toml");

    let mut config = Config {
        config_path: path.clone(),
        provider: ProviderKind::OpenaiCompatible,
        base_url: Some("http://127.0.0.1:8080".into()),
        ..Config::default()
    };
    config.pipeline.history_window = 6;
    config.tools.url_fetch = false;
    config.models[0].temperature = 0.2;
    config.save().expect("config should be saved");

    let loaded = Config::load_from(&path).expect("config should load");
    assert_eq!(loaded.provider, ProviderKind::OpenaiCompatible);
    assert_eq!(loaded.effective_base_url(), "http://127.0.0.1:8080");
    assert_eq!(loaded.pipeline.history_window, 6);
    assert!(!loaded.tools.url_fetch);
    assert_eq!(loaded.models.len(), 3);
    assert!((loaded.models[0].temperature - 0.2).abs() < f64::EPSILON);
}

#[test]
fn custom_catalog_replaces_defaults() {
    let dir = TempDir::new().expect("temp dir should be created");
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
provider = "openai-compatible"

[[models]]
id = "local"
name = "Local"
upstream_model = "qwen2.5-0.5b"
active = true
prompt_template = "{{ system }}\n{{ message }}"
"#,
    )
    .expect("config should be written");

    let loaded = Config::load_from(&path).expect("config should load");
    assert_eq!(loaded.models.len(), 1);
    assert_eq!(loaded.models[0].id, "local");
    assert_eq!(loaded.models[0].max_tokens, 500);
    assert!(loaded.models[0].prompt_template.is_some());
}
