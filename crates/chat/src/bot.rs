use std::{collections::HashMap, path::PathBuf, sync::Arc};

use {
    serde::Serialize,
    tokio::sync::RwLock,
    tracing::{info, warn},
};

use {
    secrecy::ExposeSecret,
    voxis_config::VoxisConfig,
    voxis_knowledge::{
        config::KnowledgeConfig,
        embeddings_openai::OpenAiEmbeddingProvider,
        error::Result as KnowledgeResult,
        kb::KnowledgeBase,
        retrieval::RetrievedDoc,
        store::DocumentSummary,
        tokens::WordTokenizer,
    },
    voxis_media::{
        stt::{OpenAiTranscriber, Transcriber},
        tts::{AudioClip, OpenAiSpeech, SpeechSynthesizer},
    },
    voxis_providers::{ChatProvider, OpenAiChatProvider},
};

/// One turn of user input.
#[derive(Debug, Clone)]
pub enum UserInput {
    Text(String),
    /// Path to a recorded audio file, transcribed before generation.
    Voice(PathBuf),
}

/// The bot's reply for one turn.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub text: String,
    /// What the voice input transcribed to, when the turn was spoken.
    pub transcribed: Option<String>,
    /// Spoken rendition of `text`; absent when synthesis is unavailable.
    pub audio: Option<AudioClip>,
    /// Context documents behind `text`, in assembled order.
    pub sources: Vec<RetrievedDoc>,
}

/// Composition root around the shared knowledge base.
///
/// The knowledge base is a single mutable resource: document mutations go
/// through the write lock, retrieval and generation through the read lock,
/// so readers never observe a half-applied (index, store) change.
pub struct Chatbot {
    kb: Arc<RwLock<KnowledgeBase>>,
    chat: Arc<dyn ChatProvider>,
    synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl Chatbot {
    pub fn new(kb: KnowledgeBase, chat: Arc<dyn ChatProvider>) -> Self {
        Self {
            kb: Arc::new(RwLock::new(kb)),
            chat,
            synthesizer: None,
            transcriber: None,
        }
    }

    /// Assemble the full OpenAI-backed stack from configuration.
    pub async fn from_config(config: &VoxisConfig) -> anyhow::Result<Self> {
        let key = config.openai_api_key.expose_secret();

        let mut embedder = OpenAiEmbeddingProvider::new(key.clone())
            .with_model(config.embedding_model.clone(), config.embedding_dimensions);
        let mut chat = OpenAiChatProvider::new(key.clone()).with_model(config.chat_model.clone());
        let mut speech = OpenAiSpeech::new(key.clone(), config.audio_dir.clone())
            .with_voice(config.speech_voice.clone());
        let mut transcriber = OpenAiTranscriber::new(key.clone());
        if let Some(base_url) = &config.openai_base_url {
            embedder = embedder.with_base_url(base_url.clone());
            chat = chat.with_base_url(base_url.clone());
            speech = speech.with_base_url(base_url.clone());
            transcriber = transcriber.with_base_url(base_url.clone());
        }

        let kb = KnowledgeBase::open(
            KnowledgeConfig {
                state_dir: config.state_dir.clone(),
                retrieve_k: config.retrieve_k,
                max_context_tokens: config.max_context_tokens,
                ..Default::default()
            },
            Box::new(embedder),
            Box::new(WordTokenizer),
        )
        .await?;

        Ok(Self::new(kb, Arc::new(chat))
            .with_speech(Arc::new(speech))
            .with_transcription(Arc::new(transcriber)))
    }

    /// Speak replies through `synthesizer`.
    pub fn with_speech(mut self, synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Accept voice input through `transcriber`.
    pub fn with_transcription(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Handle one turn: transcribe voice input if needed, generate a
    /// grounded reply, and render it to speech when a synthesizer is
    /// configured. Synthesis is best-effort; a failed clip never fails
    /// the turn.
    pub async fn process_input(&self, input: UserInput) -> anyhow::Result<ChatReply> {
        let (query, transcribed) = match input {
            UserInput::Text(text) => (text, None),
            UserInput::Voice(path) => {
                let Some(transcriber) = &self.transcriber else {
                    anyhow::bail!("voice input received but no transcriber is configured");
                };
                let text = transcriber
                    .transcribe(&path)
                    .await
                    .map_err(|err| anyhow::anyhow!("failed to transcribe audio: {err}"))?;
                info!(path = %path.display(), "voice input transcribed");
                (text.clone(), Some(text))
            },
        };

        let response = {
            let kb = self.kb.read().await;
            kb.generate_response(self.chat.as_ref(), &query, true).await
        };

        let audio = match &self.synthesizer {
            Some(synthesizer) => match synthesizer.synthesize(&response.text).await {
                Ok(clip) => Some(clip),
                Err(err) => {
                    warn!(error = %err, "speech synthesis failed, replying with text only");
                    None
                },
            },
            None => None,
        };

        Ok(ChatReply {
            text: response.text,
            transcribed,
            audio,
            sources: response.sources,
        })
    }

    /// Ingest a document into the knowledge base.
    pub async fn add_document(
        &self,
        content: String,
        metadata: HashMap<String, String>,
    ) -> KnowledgeResult<String> {
        self.kb.write().await.add_document(content, metadata).await
    }

    pub async fn list_documents(&self) -> Vec<DocumentSummary> {
        self.kb.read().await.list_documents()
    }

    pub async fn delete_document(&self, id: &str) -> KnowledgeResult<bool> {
        self.kb.write().await.delete_document(id).await
    }
}
