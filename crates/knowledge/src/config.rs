use std::path::PathBuf;

/// Configuration for the knowledge engine.
#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// Directory holding the persisted index and document blobs.
    pub state_dir: PathBuf,
    /// How many nearest neighbours to pull before token budgeting.
    pub retrieve_k: usize,
    /// Token budget shared by the query and the assembled context.
    pub max_context_tokens: usize,
    /// Tokens held back from the context budget for prompt scaffolding.
    pub reserve_tokens: usize,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            state_dir: PathBuf::from("knowledge"),
            retrieve_k: 5,
            max_context_tokens: 4000,
            reserve_tokens: 100,
        }
    }
}
