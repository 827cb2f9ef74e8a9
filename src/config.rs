//! Configuration types.
//!
//! Everything is read from environment variables, with a `.env` file
//! filling in keys the environment leaves unset. Anything still unset falls
//! back to the defaults below.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::knowledge::retriever::DEFAULT_TOP_K;
use crate::knowledge::splitter::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::llm::{LlmBackend, LlmConfig};

pub const DEFAULT_TICKETS_PATH: &str = "./data/tickets.json";
pub const DEFAULT_KNOWLEDGE_PATH: &str = "./data/knowledge_base";
pub const DEFAULT_TEMPERATURE: f64 = 0.1;
pub const DEFAULT_ENV_FILE: &str = ".env";

/// Knowledge base settings.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// Directory holding `.md`/`.txt` runbooks.
    pub path: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    /// Chunks passed to the LLM per question.
    pub top_k: usize,
    pub temperature: f64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_KNOWLEDGE_PATH),
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            top_k: DEFAULT_TOP_K,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Top-level copilot configuration.
#[derive(Debug, Clone)]
pub struct CopilotConfig {
    /// JSON file backing the ticket store.
    pub tickets_path: PathBuf,
    pub knowledge: KnowledgeConfig,
    pub llm: LlmConfig,
}

impl CopilotConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from the process environment and the dotenv file at
    /// `path`. Environment variables win; a missing file is not an error.
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = read_env_file(path.as_ref())?;
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file.get(key).cloned()))
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend: LlmBackend = match get("OPS_COPILOT_LLM_BACKEND") {
            Some(raw) => raw.parse()?,
            None => LlmBackend::Anthropic,
        };
        let api_key = get(backend.api_key_var())
            .ok_or_else(|| ConfigError::MissingEnvVar(backend.api_key_var().to_string()))?;
        let model = get("OPS_COPILOT_MODEL").unwrap_or_else(|| backend.default_model().to_string());

        let defaults = KnowledgeConfig::default();
        let knowledge = KnowledgeConfig {
            path: get("OPS_COPILOT_KB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            chunk_size: parse_or(&get, "OPS_COPILOT_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: parse_or(&get, "OPS_COPILOT_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: parse_or(&get, "OPS_COPILOT_TOP_K", defaults.top_k)?,
            temperature: parse_or(&get, "OPS_COPILOT_TEMPERATURE", defaults.temperature)?,
        };

        if knowledge.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "OPS_COPILOT_CHUNK_SIZE".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if knowledge.chunk_overlap >= knowledge.chunk_size {
            return Err(ConfigError::InvalidValue {
                key: "OPS_COPILOT_CHUNK_OVERLAP".to_string(),
                message: format!(
                    "overlap {} must be smaller than chunk size {}",
                    knowledge.chunk_overlap, knowledge.chunk_size
                ),
            });
        }

        Ok(Self {
            tickets_path: get("OPS_COPILOT_TICKETS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TICKETS_PATH)),
            knowledge,
            llm: LlmConfig {
                backend,
                api_key: secrecy::SecretString::from(api_key),
                model,
            },
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse a dotenv file into a map. A missing file yields an empty map.
pub fn read_env_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let invalid = |e: dotenvy::Error| ConfigError::InvalidValue {
        key: path.display().to_string(),
        message: e.to_string(),
    };

    match dotenvy::from_path_iter(path) {
        Ok(entries) => entries.map(|entry| entry.map_err(invalid)).collect(),
        Err(e) if e.not_found() => Ok(HashMap::new()),
        Err(e) => Err(invalid(e)),
    }
}
