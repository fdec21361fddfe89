//! Process configuration from the environment.

use std::path::PathBuf;

use {directories::ProjectDirs, secrecy::Secret};

/// Everything the chatbot needs from the environment.
///
/// `OPENAI_API_KEY` is required; every other knob has a default and a
/// `VOXIS_*` override.
#[derive(Debug, Clone)]
pub struct VoxisConfig {
    pub openai_api_key: Secret<String>,
    /// Base URL override for OpenAI-compatible servers.
    pub openai_base_url: Option<String>,
    pub chat_model: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub speech_voice: String,
    /// Where the knowledge blobs live.
    pub state_dir: PathBuf,
    /// Where rendered audio clips are written.
    pub audio_dir: PathBuf,
    pub max_context_tokens: usize,
    pub retrieve_k: usize,
}

impl VoxisConfig {
    /// Load from the process environment. A `.env` file is honoured.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let openai_api_key = std::env::var("OPENAI_API_KEY").map(Secret::new).map_err(|_| {
            anyhow::anyhow!(
                "no OpenAI API key set, please set the OPENAI_API_KEY environment variable"
            )
        })?;

        let data_dir = ProjectDirs::from("org", "voxis", "voxis")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            openai_api_key,
            openai_base_url: std::env::var("VOXIS_OPENAI_BASE_URL").ok(),
            chat_model: env_or("VOXIS_CHAT_MODEL", "gpt-4o-mini"),
            embedding_model: env_or("VOXIS_EMBEDDING_MODEL", "text-embedding-3-small"),
            embedding_dimensions: env_parse("VOXIS_EMBEDDING_DIMENSIONS", 1536)?,
            speech_voice: env_or("VOXIS_SPEECH_VOICE", "alloy"),
            state_dir: std::env::var("VOXIS_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("knowledge")),
            audio_dir: std::env::var("VOXIS_AUDIO_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("audio")),
            max_context_tokens: env_parse("VOXIS_MAX_CONTEXT_TOKENS", 4000)?,
            retrieve_k: env_parse("VOXIS_RETRIEVE_K", 5)?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| anyhow::anyhow!("invalid {key} value {raw:?}: {err}")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_or_falls_back_when_unset() {
        assert_eq!(env_or("VOXIS_TEST_UNSET_STRING", "fallback"), "fallback");
    }

    #[test]
    fn env_parse_falls_back_when_unset() {
        assert_eq!(env_parse("VOXIS_TEST_UNSET_NUMBER", 42usize).unwrap(), 42);
    }
}
