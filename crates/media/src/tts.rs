//! Text-to-speech boundary and the OpenAI `/v1/audio/speech` backend.

use std::{path::PathBuf, sync::OnceLock};

use async_trait::async_trait;
use {
    regex::Regex,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    sha2::{Digest, Sha256},
    tracing::debug,
};

use voxis_providers::endpoint;

/// Handle to a rendered audio file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioClip {
    pub path: PathBuf,
}

/// Renders text into an audio clip.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> anyhow::Result<AudioClip>;
}

/// Character cap the speech API imposes on a single request.
const SPEECH_INPUT_LIMIT: usize = 4000;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_MODEL: &str = "tts-1";
const DEFAULT_VOICE: &str = "alloy";

pub struct OpenAiSpeech {
    client: reqwest::Client,
    api_key: Secret<String>,
    base_url: String,
    model: String,
    voice: String,
    out_dir: PathBuf,
}

impl OpenAiSpeech {
    /// Rendered clips are written under `out_dir`.
    pub fn new(api_key: String, out_dir: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: Secret::new(api_key),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            out_dir,
        }
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    /// Point at an OpenAI-compatible server.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> anyhow::Result<AudioClip> {
        let cleaned = clean_speech_text(text);
        let input = clip_chars(&cleaned, SPEECH_INPUT_LIMIT);

        let bytes = self
            .client
            .post(endpoint::join(&self.base_url, "audio/speech"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&SpeechRequest {
                model: &self.model,
                voice: &self.voice,
                input,
            })
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        tokio::fs::create_dir_all(&self.out_dir).await?;
        let path = self
            .out_dir
            .join(format!("response_{}.mp3", content_key(input)));
        tokio::fs::write(&path, &bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "speech rendered");
        Ok(AudioClip { path })
    }
}

/// Strip artifacts that read badly aloud: a leading `text:` label and a
/// trailing audio-file path.
#[allow(clippy::unwrap_used)] // both patterns are static
pub fn clean_speech_text(text: &str) -> String {
    static LEADING_LABEL: OnceLock<Regex> = OnceLock::new();
    static TRAILING_AUDIO_PATH: OnceLock<Regex> = OnceLock::new();

    let label = LEADING_LABEL.get_or_init(|| Regex::new(r"(?i)^text:\s*").unwrap());
    let path = TRAILING_AUDIO_PATH.get_or_init(|| Regex::new(r"\s*[\w/\\.-]+\.mp3$").unwrap());

    let text = label.replace(text, "");
    let text = path.replace(&text, "");
    text.trim().to_string()
}

/// First 16 hex chars of the input's SHA-256: a stable clip name.
fn content_key(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// Cut at the limit without splitting a character.
fn clip_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((offset, _)) => &text[..offset],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaning_strips_leading_label() {
        assert_eq!(clean_speech_text("text: Hello there"), "Hello there");
        assert_eq!(clean_speech_text("TEXT:  shouted"), "shouted");
    }

    #[test]
    fn cleaning_strips_trailing_audio_path() {
        assert_eq!(
            clean_speech_text("All done. temp/response_abc123.mp3"),
            "All done."
        );
    }

    #[test]
    fn cleaning_leaves_plain_text_alone() {
        assert_eq!(
            clean_speech_text("Paris is the capital of France."),
            "Paris is the capital of France."
        );
    }

    #[test]
    fn clip_chars_respects_character_boundaries() {
        assert_eq!(clip_chars("héllo", 2), "hé");
        assert_eq!(clip_chars("short", 100), "short");
    }

    #[test]
    fn content_key_is_stable_and_short() {
        assert_eq!(content_key("hello"), content_key("hello"));
        assert_ne!(content_key("hello"), content_key("goodbye"));
        assert_eq!(content_key("hello").len(), 16);
    }
}
