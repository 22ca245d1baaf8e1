use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::core::message::MIN_MESSAGE_CHARS;
use crate::core::FinderSettings;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    pub gemini: GeminiSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub supabase: SupabaseSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_gemini_endpoint(),
            api_key: String::new(),
            model: default_gemini_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_gemini_endpoint() -> String { crate::services::gemini::GEMINI_BASE_URL.to_string() }
fn default_gemini_model() -> String { crate::services::gemini::DEFAULT_MODEL.to_string() }
fn default_timeout_secs() -> u64 { 60 }

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_message_delay_ms")]
    pub message_delay_ms: u64,
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
    #[serde(default = "default_candidate_temperature")]
    pub candidate_temperature: f32,
    #[serde(default = "default_candidate_max_tokens")]
    pub candidate_max_tokens: u32,
    #[serde(default = "default_message_temperature")]
    pub message_temperature: f32,
    #[serde(default = "default_message_max_tokens")]
    pub message_max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            message_delay_ms: default_message_delay_ms(),
            max_message_chars: default_max_message_chars(),
            candidate_temperature: default_candidate_temperature(),
            candidate_max_tokens: default_candidate_max_tokens(),
            message_temperature: default_message_temperature(),
            message_max_tokens: default_message_max_tokens(),
        }
    }
}

fn default_batch_size() -> usize { 3 }
fn default_message_delay_ms() -> u64 { 2000 }
fn default_max_message_chars() -> usize { 300 }
fn default_candidate_temperature() -> f32 { 0.7 }
fn default_candidate_max_tokens() -> u32 { 2000 }
fn default_message_temperature() -> f32 { 0.8 }
fn default_message_max_tokens() -> u32 { 200 }

impl From<&GenerationSettings> for FinderSettings {
    fn from(settings: &GenerationSettings) -> Self {
        FinderSettings {
            batch_size: settings.batch_size,
            message_delay_ms: settings.message_delay_ms,
            max_message_chars: settings.max_message_chars.max(MIN_MESSAGE_CHARS),
            candidate_temperature: settings.candidate_temperature,
            candidate_max_tokens: settings.candidate_max_tokens,
            message_temperature: settings.message_temperature,
            message_max_tokens: settings.message_max_tokens,
        }
    }
}

/// Hosted profile store and identity provider; all optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupabaseSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub jwt_secret: Option<String>,
}

impl SupabaseSettings {
    /// URL and key, when both are present and non-empty
    pub fn store_credentials(&self) -> Option<(&str, &str)> {
        let url = self.url.as_deref().filter(|s| !s.is_empty())?;
        let key = self.api_key.as_deref().filter(|s| !s.is_empty())?;
        Some((url, key))
    }

    pub fn jwt_secret(&self) -> Option<&str> {
        self.jwt_secret.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with OUTREACH__)
    /// 5. Well-known provider variables (GEMINI_API_KEY, SUPABASE_*)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., OUTREACH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("OUTREACH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_provider_env(settings, |name| std::env::var(name).ok())?.try_deserialize()
    }
}

/// Provider variables that override config keys when set
const PROVIDER_ENV: &[(&str, &str)] = &[
    ("GEMINI_API_KEY", "gemini.api_key"),
    ("SUPABASE_URL", "supabase.url"),
    ("SUPABASE_KEY", "supabase.api_key"),
    ("SUPABASE_JWT_SECRET", "supabase.jwt_secret"),
];

fn apply_provider_env<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    for (var, key) in PROVIDER_ENV {
        if let Some(value) = lookup(var).filter(|v| !v.is_empty()) {
            builder = builder.set_override(*key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generation() {
        let generation = GenerationSettings::default();
        assert_eq!(generation.batch_size, 3);
        assert_eq!(generation.message_delay_ms, 2000);
        assert_eq!(generation.max_message_chars, 300);

        let finder = FinderSettings::from(&generation);
        assert_eq!(finder.batch_size, 3);
        assert_eq!(finder.max_message_chars, 300);
    }

    #[test]
    fn test_tiny_message_limit_is_raised() {
        let generation = GenerationSettings {
            max_message_chars: 2,
            ..Default::default()
        };
        let finder = FinderSettings::from(&generation);
        assert_eq!(finder.max_message_chars, MIN_MESSAGE_CHARS);
    }

    #[test]
    fn test_default_config_file_parses() {
        let settings: Settings = Config::builder()
            .add_source(File::with_name("config/default"))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.gemini.model, "gemini-2.5-flash");
        assert_eq!(settings.generation.batch_size, 3);
        assert_eq!(settings.generation.message_delay_ms, 2000);
        assert!(settings.gemini.api_key.is_empty());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_provider_env_overrides() {
        let base = Config::builder()
            .set_override("server.host", "127.0.0.1")
            .unwrap()
            .set_override("server.port", 9000)
            .unwrap()
            .set_override("gemini.api_key", "from-file")
            .unwrap()
            .build()
            .unwrap();

        let settings: Settings = apply_provider_env(base, |name| match name {
            "GEMINI_API_KEY" => Some("from-env".to_string()),
            "SUPABASE_URL" => Some(String::new()),
            _ => None,
        })
        .unwrap()
        .try_deserialize()
        .unwrap();

        assert_eq!(settings.gemini.api_key, "from-env");
        assert_eq!(settings.gemini.model, "gemini-2.5-flash");
        assert!(settings.supabase.url.is_none());
        assert!(settings.supabase.store_credentials().is_none());
        assert_eq!(settings.server.port, 9000);
    }
}
