use crate::error::{Result, SprintError};
use crate::paths;
use crate::sprint::{DEFAULT_CAPACITY, DEFAULT_DURATION_WEEKS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable overriding `generation.base_url`.
pub const ENV_BASE_URL: &str = "LM_STUDIO_URL";
/// Environment variable overriding `generation.model`.
pub const ENV_MODEL: &str = "MODEL_NAME";

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// SprintDefaults
// ---------------------------------------------------------------------------

/// Values used when `sprint create` is given no explicit duration/capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintDefaults {
    #[serde(default = "default_duration_weeks")]
    pub default_duration_weeks: u32,
    #[serde(default = "default_capacity")]
    pub default_capacity: u32,
}

fn default_duration_weeks() -> u32 {
    DEFAULT_DURATION_WEEKS
}

fn default_capacity() -> u32 {
    DEFAULT_CAPACITY
}

impl Default for SprintDefaults {
    fn default() -> Self {
        Self {
            default_duration_weeks: DEFAULT_DURATION_WEEKS,
            default_capacity: DEFAULT_CAPACITY,
        }
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Connection settings for the OpenAI-compatible text-generation server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:1234".to_string()
}

fn default_model() -> String {
    "qwen2.5-3b-instruct".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout() -> u64 {
    120
}

fn default_health_timeout() -> u64 {
    5
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
            health_timeout_secs: default_health_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub sprint: SprintDefaults,
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self::new("")
    }
}

impl Config {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            version: 1,
            project: project.into(),
            sprint: SprintDefaults::default(),
            generation: GenerationConfig::default(),
        }
    }

    /// Read `.sprint/config.yaml` and apply environment overrides.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let Some(data) = crate::io::read_optional(&path)? else {
            return Err(SprintError::NotInitialized);
        };
        let mut cfg: Config = serde_yaml::from_str(&data)?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Like [`Config::load`], but a missing file yields the defaults (with
    /// environment overrides still applied).
    pub fn load_or_default(root: &Path) -> Result<Self> {
        match Self::load(root) {
            Err(SprintError::NotInitialized) => {
                let mut cfg = Self::default();
                cfg.apply_env();
                Ok(cfg)
            }
            other => other,
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Replace generation settings with non-empty values from `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key| lookup(key).filter(|v: &String| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_BASE_URL) {
            self.generation.base_url = url;
        }
        if let Some(model) = non_empty(ENV_MODEL) {
            self.generation.model = model;
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut warn = |level, message: String| warnings.push(ConfigWarning { level, message });

        if self.sprint.default_capacity == 0 {
            warn(
                WarnLevel::Error,
                "sprint.default_capacity must be positive".to_string(),
            );
        }
        if self.sprint.default_duration_weeks == 0 {
            warn(
                WarnLevel::Error,
                "sprint.default_duration_weeks must be at least 1".to_string(),
            );
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            warn(
                WarnLevel::Warning,
                format!(
                    "generation.temperature={} is outside 0..=2",
                    self.generation.temperature
                ),
            );
        }
        if self.generation.model.trim().is_empty() {
            warn(WarnLevel::Warning, "generation.model is empty".to_string());
        }
        if self.generation.base_url.trim().is_empty() {
            warn(WarnLevel::Warning, "generation.base_url is empty".to_string());
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("demo");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.generation.base_url, "http://localhost:1234");
        assert_eq!(parsed.generation.request_timeout_secs, 120);
        assert_eq!(parsed.sprint.default_capacity, 40);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "project: demo\ngeneration:\n  model: llama\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.generation.model, "llama");
        assert_eq!(cfg.generation.max_tokens, 2048);
        assert_eq!(cfg.sprint.default_duration_weeks, 2);
        assert_eq!(cfg.version, 1);
    }

    #[test]
    fn load_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(SprintError::NotInitialized)
        ));
        let cfg = Config::load_or_default(dir.path()).unwrap();
        assert_eq!(cfg.sprint, SprintDefaults::default());
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("demo");
        cfg.sprint.default_capacity = 25;
        cfg.save(dir.path()).unwrap();
        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.project, "demo");
        assert_eq!(loaded.sprint.default_capacity, 25);
    }

    #[test]
    fn overrides_ignore_empty_values() {
        let mut cfg = Config::default();
        cfg.apply_overrides(|key| match key {
            ENV_BASE_URL => Some("http://gpu-box:8080".to_string()),
            ENV_MODEL => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(cfg.generation.base_url, "http://gpu-box:8080");
        assert_eq!(cfg.generation.model, "qwen2.5-3b-instruct");
    }

    #[test]
    fn validate_flags_bad_values() {
        assert!(Config::default().validate().is_empty());

        let mut cfg = Config::default();
        cfg.sprint.default_capacity = 0;
        cfg.generation.temperature = 3.5;
        cfg.generation.model = String::new();
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].level, WarnLevel::Error);
        assert!(warnings[1].message.contains("temperature"));
    }
}
