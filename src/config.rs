use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub requester: RequesterConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    pub dir: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
}

fn default_include_globs() -> Vec<String> {
    vec![
        "**/*.pdf".to_string(),
        "**/*.md".to_string(),
        "**/*.txt".to_string(),
    ]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_max_tokens() -> usize {
    700
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: String,
    #[serde(default = "default_generation_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_generation_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_generation_retries")]
    pub max_retries: u32,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            temperature: 0.0,
            max_tokens: default_generation_max_tokens(),
            max_retries: default_generation_retries(),
            timeout_secs: default_generation_timeout_secs(),
        }
    }
}

fn default_generation_provider() -> String {
    "openai".to_string()
}
fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_generation_max_tokens() -> usize {
    512
}
fn default_generation_retries() -> u32 {
    2
}
fn default_generation_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct MemoryConfig {
    /// How many recent turns are replayed to the generative model.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
        }
    }
}

fn default_max_turns() -> usize {
    6
}

#[derive(Debug, Deserialize, Clone)]
pub struct RequesterConfig {
    #[serde(default = "default_requester_name")]
    pub name: String,
    #[serde(default = "default_requester_email")]
    pub email: String,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            name: default_requester_name(),
            email: default_requester_email(),
        }
    }
}

fn default_requester_name() -> String {
    "Anonymous User".to_string()
}
fn default_requester_email() -> String {
    "user@example.com".to_string()
}

/// Environment variable holding the OpenAI credential.
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking
    if config.chunking.max_tokens == 0 {
        anyhow::bail!("chunking.max_tokens must be > 0");
    }

    // Validate retrieval
    if config.retrieval.top_k < 1 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }

    // Validate embedding
    match config.embedding.provider.as_str() {
        "openai" | "ollama" => {
            if config.embedding.model.is_none() {
                anyhow::bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
            if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
                anyhow::bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    config.embedding.provider
                );
            }
        }
        "local" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be openai, ollama, or local.",
            other
        ),
    }

    // Validate generation
    match config.generation.provider.as_str() {
        "openai" => {}
        other => anyhow::bail!("Unknown generation provider: '{}'. Must be openai.", other),
    }

    // A missing credential must fail at startup, not on the first question.
    let needs_openai_key =
        config.generation.provider == "openai" || config.embedding.provider == "openai";
    if needs_openai_key && std::env::var(OPENAI_API_KEY_VAR).is_err() {
        anyhow::bail!("{} environment variable is required", OPENAI_API_KEY_VAR);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("docbot.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_minimal_config_with_defaults() {
        std::env::set_var(OPENAI_API_KEY_VAR, "sk-test");
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[corpus]
dir = "./docs"

[embedding]
model = "text-embedding-3-small"
dims = 1536
"#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.chunking.max_tokens, 700);
        assert_eq!(config.memory.max_turns, 6);
        assert_eq!(config.requester.name, "Anonymous User");
    }

    #[test]
    fn test_unknown_embedding_provider_rejected() {
        std::env::set_var(OPENAI_API_KEY_VAR, "sk-test");
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[corpus]
dir = "./docs"

[embedding]
provider = "faiss"
model = "x"
dims = 3
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Unknown embedding provider"));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        std::env::set_var(OPENAI_API_KEY_VAR, "sk-test");
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[corpus]
dir = "./docs"

[embedding]
model = "text-embedding-3-small"
dims = 1536

[retrieval]
top_k = 0
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("top_k"));
    }

    #[test]
    fn test_missing_embedding_model_rejected() {
        std::env::set_var(OPENAI_API_KEY_VAR, "sk-test");
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_config(
            &dir,
            r#"
[corpus]
dir = "./docs"

[embedding]
provider = "ollama"
dims = 768
"#,
        );
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("embedding.model"));
    }
}
