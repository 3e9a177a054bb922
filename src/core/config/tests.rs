use super::data::{mask_secret, Config, SettingKey, SettingsError, DEFAULT_THEME};
use super::store::ConfigStore;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn store_in(temp_dir: &TempDir) -> ConfigStore {
    ConfigStore::new(temp_dir.path().join("config.json"))
}

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = store_in(&temp_dir);

    assert_eq!(store.load(), Config::default());
    assert!(!store.path().exists(), "load must not create the record");
}

#[test]
fn defaults_match_first_run_record() {
    let config = Config::default();
    assert_eq!(config.provider, None);
    assert_eq!(config.api_key, "");
    assert_eq!(config.model, None);
    assert_eq!(config.theme, DEFAULT_THEME);
    assert!(config.extra.is_empty());
}

#[test]
fn partial_records_are_backfilled_and_keep_present_keys() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = store_in(&temp_dir);

    let partials = [
        json!({}),
        json!({ "provider": "ollama" }),
        json!({ "api_key": "sk-test", "theme": "dark" }),
        json!({ "model": "llama3.1", "provider": "openai" }),
    ];

    for partial in partials {
        fs::write(store.path(), partial.to_string()).unwrap();
        let loaded = store.load();

        let expected_provider = partial["provider"].as_str().map(str::to_string);
        let expected_key = partial["api_key"].as_str().unwrap_or("");
        let expected_model = partial["model"].as_str().map(str::to_string);
        let expected_theme = partial["theme"].as_str().unwrap_or(DEFAULT_THEME);

        assert_eq!(loaded.provider, expected_provider, "record {partial}");
        assert_eq!(loaded.api_key, expected_key, "record {partial}");
        assert_eq!(loaded.model, expected_model, "record {partial}");
        assert_eq!(loaded.theme, expected_theme, "record {partial}");
    }
}

#[test]
fn null_credential_and_theme_fall_back_to_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = store_in(&temp_dir);
    fs::write(
        store.path(),
        r#"{"provider":"ollama","api_key":null,"model":null,"theme":null}"#,
    )
    .unwrap();

    let loaded = store.load();
    assert_eq!(loaded.provider.as_deref(), Some("ollama"));
    assert_eq!(loaded.api_key, "");
    assert_eq!(loaded.theme, DEFAULT_THEME);
}

#[test]
fn unparsable_records_load_as_exact_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = store_in(&temp_dir);

    for broken in ["", "{", "not json", "[1, 2, 3]", "\"ollama\"", r#"{"provider": 7}"#] {
        fs::write(store.path(), broken).unwrap();
        assert_eq!(store.load(), Config::default(), "record {broken:?}");
    }
}

#[test]
fn strict_loader_classifies_parse_failures() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = store_in(&temp_dir);
    fs::write(store.path(), "{ nope").unwrap();

    let err = ConfigStore::load_from_path(store.path()).unwrap_err();
    assert!(err.is_read_failure());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = store_in(&temp_dir);

    let config = Config {
        provider: Some("openai".to_string()),
        api_key: "sk-live-1234".to_string(),
        model: Some("gpt-4o".to_string()),
        theme: "dark".to_string(),
        ..Default::default()
    };
    store.save(&config).expect("Failed to save config");
    assert_eq!(store.load(), config);

    let mut config = store.load();
    config.unset(SettingKey::Model);
    config.unset(SettingKey::ApiKey);
    store.save(&config).expect("Failed to save config");

    let reloaded = store.load();
    assert_eq!(reloaded.model, None);
    assert_eq!(reloaded.api_key, "");
    assert_eq!(reloaded.provider.as_deref(), Some("openai"));
}

#[test]
fn unknown_keys_survive_a_save() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = store_in(&temp_dir);
    fs::write(
        store.path(),
        r#"{"provider":"ollama","editor":"vim","window":{"rows":40}}"#,
    )
    .unwrap();

    let mut config = store.load();
    assert_eq!(config.extra.get("editor"), Some(&json!("vim")));
    config.theme = "light".to_string();
    store.save(&config).unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
    assert_eq!(raw["editor"], "vim");
    assert_eq!(raw["window"]["rows"], 40);
    assert_eq!(raw["theme"], "light");
    assert_eq!(raw["api_key"], "");
    assert!(raw["model"].is_null());
}

#[test]
fn ensure_exists_writes_defaults_once() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let store = store_in(&temp_dir);

    assert!(store.ensure_exists().unwrap());
    let raw = fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\n  \"theme\": \"default\""));

    let customised = Config {
        provider: Some("ollama".to_string()),
        ..Default::default()
    };
    store.save(&customised).unwrap();

    assert!(!store.ensure_exists().unwrap());
    assert_eq!(store.load(), customised);
}

#[test]
fn settings_keys_accept_cli_spellings() {
    assert_eq!(SettingKey::parse("api-key"), Ok(SettingKey::ApiKey));
    assert_eq!(SettingKey::parse("API_KEY"), Ok(SettingKey::ApiKey));
    assert_eq!(SettingKey::parse(" model "), Ok(SettingKey::Model));
    assert_eq!(
        SettingKey::parse("colour"),
        Err(SettingsError::UnknownKey("colour".to_string()))
    );
}

#[test]
fn set_normalises_provider_and_rejects_blank_values() {
    let mut config = Config::default();
    config.set(SettingKey::Provider, " OpenAI ").unwrap();
    assert_eq!(config.provider.as_deref(), Some("openai"));

    assert_eq!(
        config.set(SettingKey::Model, "   "),
        Err(SettingsError::EmptyValue(SettingKey::Model))
    );
    assert!(config.model.is_none());
}

#[test]
fn blank_provider_still_needs_setup() {
    let config = Config {
        provider: Some("  ".to_string()),
        model: Some(String::new()),
        ..Default::default()
    };
    assert!(config.needs_setup());
    assert_eq!(config.model_name(), None);
}

#[test]
fn redacted_display_hides_all_but_the_tail() {
    let config = Config {
        provider: Some("openai".to_string()),
        api_key: "sk-abcdefgh".to_string(),
        ..Default::default()
    };
    let shown = config.redacted_json();
    assert!(shown.contains("\"api_key\": \"*******efgh\""));
    assert!(!shown.contains("sk-abcdefgh"));

    assert_eq!(mask_secret(""), "");
    assert_eq!(mask_secret("abc"), "***");
}
