//! Loader for Veracity configuration with YAML + environment overlays.
//!
//! Precedence, lowest to highest: serde defaults, YAML sources in the order
//! they were attached, then `VERACITY__SECTION__KEY` environment variables.
//! After merging, every free-form string setting goes through `${VAR}` expansion, so a
//! file may say `auth_token: "${OPENAI_API_KEY}"`.
//!
//! ```yaml
//! server:
//!   bind: "0.0.0.0:3000"
//! llm:
//!   model: "gpt-4o-mini"
//!   auth_token: "${OPENAI_API_KEY}"
//!   response_mode: "function_call"
//! moderation:
//!   enabled: true
//! guard:
//!   patterns_file: ".patterns"
//! verifier:
//!   concurrency: 5
//!   dead_links: "null"
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use veracity_common::{DeadLinkPolicy, ResponseMode};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "VERACITY";
const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VeracityConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub moderation: ModerationConfig,
    pub guard: GuardConfig,
    pub verifier: VerifierConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:3000".into(),
        }
    }
}

/// OpenAI-compatible chat-completion settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub auth_token: Option<String>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// `text` or `function_call`.
    pub response_mode: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: default_openai_endpoint(),
            model: "gpt-4o-mini".into(),
            auth_token: None,
            max_tokens: 1500,
            temperature: None,
            response_mode: "text".into(),
            timeout_secs: 60,
        }
    }
}

impl LlmConfig {
    /// The bearer credential: the configured token if it resolved to something,
    /// otherwise `OPENAI_API_KEY` from the process environment.
    pub fn api_key(&self) -> Option<String> {
        self.auth_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.contains("${"))
            .map(str::to_string)
            .or_else(|| {
                std::env::var(API_KEY_ENV)
                    .ok()
                    .map(|k| k.trim().to_string())
                    .filter(|k| !k.is_empty())
            })
    }

    pub fn response_mode(&self) -> veracity_common::Result<ResponseMode> {
        ResponseMode::parse(&self.response_mode)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModerationConfig {
    pub enabled: bool,
    /// Falls back to `llm.endpoint` when unset.
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            model: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// `null` disables the deny-list entirely.
    pub patterns_file: Option<PathBuf>,
    pub max_input_chars: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            patterns_file: Some(PathBuf::from(".patterns")),
            max_input_chars: 2000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerifierConfig {
    pub concurrency: usize,
    pub timeout_ms: u64,
    pub max_redirects: usize,
    pub min_sources: usize,
    pub max_sources: usize,
    /// `null` or `drop`. A bare YAML `null` means `null`.
    #[serde(deserialize_with = "policy_name")]
    pub dead_links: String,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            timeout_ms: 5_000,
            max_redirects: 5,
            min_sources: 3,
            max_sources: 10,
            dead_links: "null".into(),
        }
    }
}

impl VerifierConfig {
    pub fn dead_links(&self) -> veracity_common::Result<DeadLinkPolicy> {
        DeadLinkPolicy::parse(&self.dead_links)
    }
}

fn policy_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| "null".into()))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `text` or `json`.
    pub format: String,
    pub emit_stderr: bool,
    pub dir: Option<PathBuf>,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "text".into(),
            emit_stderr: true,
            dir: None,
            filter: "info".into(),
        }
    }
}

fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}

fn expand_env(s: &mut String) {
    if !s.contains('$') {
        return;
    }
    let mut cur = std::mem::take(s);
    for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
        let expanded = match shellexpand::env(&cur) {
            Ok(cow) => cow.into_owned(),
            Err(_) => cur.clone(),
        };
        if expanded == cur {
            break;
        }
        cur = expanded;
    }
    *s = cur;
}

fn expand_env_path(p: &mut PathBuf) {
    if let Some(raw) = p.to_str() {
        let mut raw = raw.to_string();
        expand_env(&mut raw);
        *p = PathBuf::from(raw);
    }
}

impl VeracityConfig {
    /// Expand `${VAR}` references in every free-form string setting.
    fn expand_env(&mut self) {
        for s in [
            &mut self.server.bind,
            &mut self.llm.endpoint,
            &mut self.llm.model,
            &mut self.llm.response_mode,
            &mut self.verifier.dead_links,
            &mut self.logging.format,
            &mut self.logging.filter,
        ] {
            expand_env(s);
        }
        for s in [
            self.llm.auth_token.as_mut(),
            self.moderation.endpoint.as_mut(),
            self.moderation.model.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            expand_env(s);
        }
        for p in [self.guard.patterns_file.as_mut(), self.logging.dir.as_mut()]
            .into_iter()
            .flatten()
        {
            expand_env_path(p);
        }
    }
}

/// Reject settings that would make the pipeline meaningless.
fn validate(cfg: &VeracityConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if cfg.verifier.concurrency == 0 {
        errors.push("verifier.concurrency must be at least 1".to_string());
    }
    if cfg.verifier.timeout_ms == 0 {
        errors.push("verifier.timeout_ms must be positive".to_string());
    }
    if cfg.verifier.max_sources == 0 {
        errors.push("verifier.max_sources must be at least 1".to_string());
    }
    if cfg.verifier.min_sources > cfg.verifier.max_sources {
        errors.push(format!(
            "verifier.min_sources ({}) exceeds verifier.max_sources ({})",
            cfg.verifier.min_sources, cfg.verifier.max_sources
        ));
    }
    if cfg.guard.max_input_chars == 0 {
        errors.push("guard.max_input_chars must be at least 1".to_string());
    }
    if cfg.llm.model.trim().is_empty() {
        errors.push("llm.model must not be empty".to_string());
    }
    if let Err(e) = cfg.llm.response_mode() {
        errors.push(e.to_string());
    }
    if let Err(e) = cfg.verifier.dead_links() {
        errors.push(e.to_string());
    }
    if let Err(e) = cfg.logging.format.parse::<veracity_common::observability::LogFormat>() {
        errors.push(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Message(errors.join("; ")))
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct VeracityConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for VeracityConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl VeracityConfigLoader {
    /// Start with defaults only; environment overrides are applied in [`load`](Self::load).
    ///
    /// ```
    /// use veracity_config::VeracityConfigLoader;
    ///
    /// let config = VeracityConfigLoader::new()
    ///     .with_yaml_str("server:\n  bind: '127.0.0.1:8080'")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.server.bind, "127.0.0.1:8080");
    /// assert_eq!(config.verifier.max_sources, 10);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can rely purely on
    /// environment variables.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use veracity_config::VeracityConfigLoader;
    ///
    /// let cfg = VeracityConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// verifier:
    ///   min_sources: 2
    ///   dead_links: drop
    /// guard:
    ///   patterns_file: null
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.verifier.min_sources, 2);
    /// assert!(cfg.guard.patterns_file.is_none());
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use veracity_config::VeracityConfigLoader;
    ///
    /// unsafe { std::env::set_var("DOCTEST_LLM_TOKEN", "injected-from-env"); }
    ///
    /// let config = VeracityConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   model: "gpt-4o"
    ///   auth_token: "${DOCTEST_LLM_TOKEN}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.llm.model, "gpt-4o");
    /// assert_eq!(config.llm.api_key().as_deref(), Some("injected-from-env"));
    /// assert_eq!(config.llm.endpoint, "https://api.openai.com/v1");
    ///
    /// unsafe { std::env::remove_var("DOCTEST_LLM_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<VeracityConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        // env values arrive as strings; `config` coerces them per field type
        let mut typed: VeracityConfig = cfg.try_deserialize()?;
        typed.expand_env();
        validate(&typed)?;

        Ok(typed)
    }
}
