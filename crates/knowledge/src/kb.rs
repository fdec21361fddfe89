//! Knowledge base facade: document lifecycle, retrieval, and grounded
//! generation over the persisted (index, store) pair.

use std::collections::HashMap;

use tracing::{error, info, warn};

use voxis_providers::ChatProvider;

use crate::{
    config::KnowledgeConfig,
    embeddings::EmbeddingProvider,
    error::{KnowledgeError, Result},
    index::FlatIndex,
    persist::{self, StatePaths},
    retrieval::{self, FALLBACK_REPLY, GeneratedResponse, RetrievedDoc, SYSTEM_PROMPT},
    store::{DocumentStore, DocumentSummary},
    tokens::Tokenizer,
};

/// The owned knowledge-base state plus its collaborators.
///
/// Mutations take `&mut self`, reads take `&self`; wrap in a
/// `tokio::sync::RwLock` when sharing across tasks so readers never
/// observe a half-applied (index, store) mutation.
pub struct KnowledgeBase {
    config: KnowledgeConfig,
    paths: StatePaths,
    embedder: Box<dyn EmbeddingProvider>,
    tokenizer: Box<dyn Tokenizer>,
    index: FlatIndex,
    store: DocumentStore,
}

impl KnowledgeBase {
    /// Load persisted state (or start empty) for the configured embedder.
    pub async fn open(
        config: KnowledgeConfig,
        embedder: Box<dyn EmbeddingProvider>,
        tokenizer: Box<dyn Tokenizer>,
    ) -> Result<Self> {
        let paths = StatePaths::in_dir(&config.state_dir);
        let (index, store) = persist::load(&paths, embedder.dimensions()).await?;
        if index.len() != store.len() {
            // Keep serving: lookups bounds-check, and the operator can
            // reconcile from the blobs.
            error!(
                rows = index.len(),
                docs = store.len(),
                "persisted index and document store have diverged"
            );
        }
        info!(
            documents = store.len(),
            model = embedder.model_name(),
            "knowledge base ready"
        );
        Ok(Self {
            config,
            paths,
            embedder,
            tokenizer,
            index,
            store,
        })
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Embed and store a document, flushing both blobs before returning.
    pub async fn add_document(
        &mut self,
        content: String,
        metadata: HashMap<String, String>,
    ) -> Result<String> {
        let vector = self
            .embedder
            .embed(&content)
            .await
            .map_err(KnowledgeError::Embedding)?;
        self.index.add(&vector)?;
        let id = self.store.insert(content, metadata);
        persist::save(&self.paths, &self.index, &self.store).await?;
        info!(id = %id, documents = self.store.len(), "document added");
        Ok(id)
    }

    /// All documents as `{id, filename}` summaries, insertion order.
    pub fn list_documents(&self) -> Vec<DocumentSummary> {
        self.store.list()
    }

    /// Delete a document by id.
    ///
    /// `Ok(false)` when the id is unknown; state is untouched. On success
    /// the document's index row is removed and later rows shift down in
    /// both structures together, then both blobs are flushed.
    pub async fn delete_document(&mut self, id: &str) -> Result<bool> {
        let Some(row) = self.store.position_of(id) else {
            return Ok(false);
        };
        if row >= self.index.len() {
            return Err(KnowledgeError::Corruption {
                rows: self.index.len(),
                docs: self.store.len(),
            });
        }
        self.index.remove(row)?;
        self.store.remove(id);
        persist::save(&self.paths, &self.index, &self.store).await?;
        info!(id = %id, documents = self.store.len(), "document deleted");
        Ok(true)
    }

    /// Nearest documents to `query`, token-budgeted.
    ///
    /// Results come back in ascending-distance order; accumulation stops
    /// at the first document that would push the running total past the
    /// context budget.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedDoc>> {
        let query_vec = self
            .embedder
            .embed(query)
            .await
            .map_err(KnowledgeError::Embedding)?;
        let hits = self.index.search(&query_vec, k)?;

        let mut accepted = Vec::new();
        let mut total_tokens = 0usize;
        for hit in hits {
            let Some(doc) = self.store.by_row(hit.row) else {
                warn!(
                    row = hit.row,
                    docs = self.store.len(),
                    "search hit outside document range, skipping"
                );
                continue;
            };
            let doc_tokens = self.tokenizer.count(&doc.content);
            if total_tokens + doc_tokens > self.config.max_context_tokens {
                break;
            }
            total_tokens += doc_tokens;
            accepted.push(RetrievedDoc {
                content: doc.content.clone(),
                metadata: doc.metadata.clone(),
            });
        }
        Ok(accepted)
    }

    /// Answer `query` grounded in retrieved context.
    ///
    /// Never fails outward: retrieval or generation errors degrade to a
    /// fixed apology, logged with the cause. Verbose replies carry the
    /// source documents in assembled order.
    pub async fn generate_response(
        &self,
        chat: &dyn ChatProvider,
        query: &str,
        verbose: bool,
    ) -> GeneratedResponse {
        match self.try_generate(chat, query).await {
            Ok((text, sources)) => GeneratedResponse {
                text,
                sources: if verbose { sources } else { Vec::new() },
            },
            Err(err) => {
                error!(error = %err, "response generation failed, sending fallback");
                GeneratedResponse {
                    text: FALLBACK_REPLY.to_string(),
                    sources: Vec::new(),
                }
            },
        }
    }

    async fn try_generate(
        &self,
        chat: &dyn ChatProvider,
        query: &str,
    ) -> Result<(String, Vec<RetrievedDoc>)> {
        let sources = self.retrieve(query, self.config.retrieve_k).await?;
        let context = retrieval::assemble_context(&sources);
        let context = retrieval::fit_context(
            self.tokenizer.as_ref(),
            context,
            query,
            self.config.max_context_tokens,
            self.config.reserve_tokens,
        );
        let prompt = retrieval::build_prompt(&context, query);
        let text = chat
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(KnowledgeError::Generation)?;
        Ok((text, sources))
    }
}
