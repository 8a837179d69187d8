//! Tests for configuration loading.

use std::io::Write;
use std::sync::{Mutex, OnceLock};

use gemini_chat::config::ChatConfig;
use gemini_chat::error::ChatError;
use gemini_chat::models::GeminiModel;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const CONFIG_ENV_VARS: [&str; 6] = [
    "GOOGLE_API_KEY",
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "GEMINI_BASE_URL",
    "GEMINI_SYSTEM_PROMPT",
    "GEMINI_CHAT_BIND",
];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    /// Save the current values and clear them for the test.
    fn clear(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| ((*key).to_string(), std::env::var(key).ok()))
            .collect();
        for key in keys {
            std::env::remove_var(key);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(v) => std::env::set_var(key, v),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn load_reads_explicit_file() {
    let _env_lock = env_lock_guard();
    let _env_guard = EnvGuard::clear(&CONFIG_ENV_VARS);

    let file = write_config(
        r#"
        api_key = "file-key"
        model = "gemini-1.5-flash"
        system_prompt = "Answer like a pirate"
        max_output_tokens = 256
        bind = "0.0.0.0:9000"
        "#,
    );

    let config = ChatConfig::load(Some(file.path())).expect("config");

    assert_eq!(config.api_key(), Some("file-key"));
    assert!(!config.api_key_from_env);
    assert_eq!(config.model, GeminiModel::Gemini15Flash);
    assert_eq!(config.system_prompt.as_deref(), Some("Answer like a pirate"));
    assert_eq!(config.generation_settings().max_tokens, Some(256));
    assert_eq!(config.bind, "0.0.0.0:9000");
}

#[test]
fn environment_overrides_file() {
    let _env_lock = env_lock_guard();
    let _env_guard = EnvGuard::clear(&CONFIG_ENV_VARS);
    std::env::set_var("GOOGLE_API_KEY", "env-key");
    std::env::set_var("GEMINI_MODEL", "gemini-2.0-flash");

    let file = write_config(
        r#"
        api_key = "file-key"
        model = "gemini-1.5-flash"
        "#,
    );

    let config = ChatConfig::load(Some(file.path())).expect("config");

    assert_eq!(config.api_key(), Some("env-key"));
    assert!(config.api_key_from_env);
    assert_eq!(config.model, GeminiModel::Gemini20Flash);
}

#[test]
fn gemini_api_key_is_accepted_as_fallback() {
    let _env_lock = env_lock_guard();
    let _env_guard = EnvGuard::clear(&CONFIG_ENV_VARS);
    std::env::set_var("GEMINI_API_KEY", "fallback-key");

    let config = ChatConfig::from_env().expect("config");

    assert_eq!(config.api_key(), Some("fallback-key"));
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope.toml");

    let err = ChatConfig::load(Some(&missing)).unwrap_err();

    assert!(matches!(err, ChatError::Configuration(ref m) if m.contains("nope.toml")));
}

#[test]
fn malformed_file_is_an_error() {
    let file = write_config("model = [");

    assert!(matches!(
        ChatConfig::load(Some(file.path())),
        Err(ChatError::Toml(_))
    ));
}

#[test]
fn unknown_model_in_file_is_rejected() {
    let file = write_config("model = \"gemini-ultra-9000\"");

    assert!(matches!(
        ChatConfig::load(Some(file.path())),
        Err(ChatError::ModelNotFound(_))
    ));
}
