use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;
use veracity_common::DeadLinkPolicy;
use veracity_config::VeracityConfigLoader;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
server:
  bind: "127.0.0.1:4000"
llm:
  model: "gpt-4o-mini"
  auth_token: "${TEST_VERACITY_KEY}"
  max_tokens: 900
  response_mode: function_call
moderation:
  enabled: true
verifier:
  concurrency: 3
  min_sources: 2
  dead_links: drop
"#;

#[test]
#[serial]
fn test_config_load() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "veracity.yaml", FILE_YAML);

    let config = temp_env::with_var("TEST_VERACITY_KEY", Some("sk-test"), || {
        VeracityConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load system config")
    });

    assert_eq!(config.server.bind, "127.0.0.1:4000");
    assert_eq!(config.llm.max_tokens, 900);
    assert_eq!(config.llm.api_key().as_deref(), Some("sk-test"));
    assert!(config.moderation.enabled);
    assert_eq!(config.verifier.concurrency, 3);
    assert_eq!(config.verifier.max_sources, 10);
}

#[test]
#[serial]
fn env_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "veracity.yaml", FILE_YAML);

    let config = temp_env::with_vars(
        [
            ("VERACITY__LLM__MODEL", Some("gpt-4.1-mini")),
            ("VERACITY__VERIFIER__CONCURRENCY", Some("8")),
        ],
        || {
            VeracityConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load with env overrides")
        },
    );

    assert_eq!(config.llm.model, "gpt-4.1-mini");
    assert_eq!(config.verifier.concurrency, 8);
    assert_eq!(config.server.bind, "127.0.0.1:4000");
}

#[test]
#[serial]
fn missing_optional_file_uses_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = VeracityConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults load");

    assert_eq!(config.server.bind, "0.0.0.0:3000");
    assert_eq!(config.llm.max_tokens, 1500);
    assert!(!config.moderation.enabled);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = VeracityConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn invalid_settings_fail_fast() {
    let err = VeracityConfigLoader::new()
        .with_yaml_str("verifier:\n  min_sources: 20\n  max_sources: 10\n")
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("min_sources"));
}

#[test]
#[serial]
fn numeric_looking_env_stays_a_string() {
    let config = temp_env::with_vars(
        [
            ("VERACITY__LLM__AUTH_TOKEN", Some("12345")),
            ("VERACITY__LLM__MODEL", Some("4")),
            ("VERACITY__LOGGING__EMIT_STDERR", Some("false")),
            ("VERACITY__VERIFIER__TIMEOUT_MS", Some("2500")),
        ],
        || {
            VeracityConfigLoader::new()
                .load()
                .expect("string fields accept numeric env values")
        },
    );

    assert_eq!(config.llm.api_key().as_deref(), Some("12345"));
    assert_eq!(config.llm.model, "4");
    assert!(!config.logging.emit_stderr);
    assert_eq!(config.verifier.timeout_ms, 2500);
}

#[test]
#[serial]
fn bare_null_dead_links_means_null_policy() {
    let config = VeracityConfigLoader::new()
        .with_yaml_str("verifier:\n  dead_links: null\n  min_sources: 2\n")
        .load()
        .expect("bare null dead_links loads");

    assert_eq!(config.verifier.dead_links().unwrap(), DeadLinkPolicy::Null);
    assert_eq!(config.verifier.min_sources, 2);
}

#[test]
#[serial]
fn unknown_dead_link_policy_is_rejected() {
    let err = VeracityConfigLoader::new()
        .with_yaml_str("verifier:\n  dead_links: archive\n")
        .load()
        .unwrap_err();
    assert!(err.to_string().contains("dead_links"));
}
