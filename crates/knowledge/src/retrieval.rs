//! Context assembly: retrieved documents → budgeted prompt.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tokens::Tokenizer;

/// A document accepted into the context, in ascending-distance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedDoc {
    pub content: String,
    pub metadata: HashMap<String, String>,
}

/// Reply from `KnowledgeBase::generate_response`.
///
/// `sources` is populated only for verbose requests, in the order the
/// documents were assembled into the context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedResponse {
    pub text: String,
    pub sources: Vec<RetrievedDoc>,
}

/// Fixed instruction sent with every generation request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant with extensive knowledge. \
    Use the provided context to inform your responses, but also draw on your general \
    knowledge when appropriate. Always cite your sources using [Document X] notation \
    when using information from the provided context.";

/// User-facing reply when retrieval or generation fails.
pub const FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response at this time.";

/// Label retrieved documents and join them into one context block.
pub fn assemble_context(docs: &[RetrievedDoc]) -> String {
    docs.iter()
        .enumerate()
        .map(|(i, doc)| format!("Document {}: {}", i + 1, doc.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shrink `context` so that it and the query fit the token budget.
///
/// The query is never cut; the context keeps its prefix, truncated at a
/// token boundary to `budget - query - reserve` tokens.
pub fn fit_context(
    tokenizer: &dyn Tokenizer,
    context: String,
    query: &str,
    budget: usize,
    reserve: usize,
) -> String {
    let query_tokens = tokenizer.count(query);
    if tokenizer.count(&context) + query_tokens <= budget {
        return context;
    }
    let max = budget.saturating_sub(query_tokens + reserve);
    tokenizer.truncate(&context, max)
}

/// Build the user prompt around the assembled context.
pub fn build_prompt(context: &str, query: &str) -> String {
    format!(
        "Context information:\n{context}\n\nBased on the above context and the user's \
         input: '{query}', provide a helpful response. For any information used from \
         the context, specify the document number in square brackets like this: \
         [Document 1]."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::WordTokenizer;

    fn doc(content: &str) -> RetrievedDoc {
        RetrievedDoc {
            content: content.to_string(),
            metadata: HashMap::new(),
        }
    }

    #[test]
    fn context_labels_documents_from_one() {
        let docs = vec![doc("alpha"), doc("beta")];
        assert_eq!(assemble_context(&docs), "Document 1: alpha\nDocument 2: beta");
    }

    #[test]
    fn empty_context_is_empty() {
        assert_eq!(assemble_context(&[]), "");
    }

    #[test]
    fn fit_context_is_identity_under_budget() {
        let context = "one two three".to_string();
        let fitted = fit_context(&WordTokenizer, context.clone(), "a query", 100, 10);
        assert_eq!(fitted, context);
    }

    #[test]
    fn fit_context_truncates_to_budget_minus_query_and_reserve() {
        let t = WordTokenizer;
        let context: String = (0..20).map(|i| format!("w{i} ")).collect();
        let query = "three word query";
        // 20 + 3 > 10, so the context shrinks to 10 - 3 - 2 = 5 tokens.
        let fitted = fit_context(&t, context.clone(), query, 10, 2);
        assert_eq!(t.count(&fitted), 5);
        assert!(context.starts_with(&fitted));
        assert!(t.count(&fitted) + t.count(query) <= 10 - 2);
    }

    #[test]
    fn fit_context_never_cuts_the_query() {
        let t = WordTokenizer;
        let query: String = (0..50).map(|i| format!("q{i} ")).collect();
        let fitted = fit_context(&t, "some context".to_string(), &query, 10, 2);
        // Budget is exhausted by the query alone; the context goes, the
        // query is untouched by construction.
        assert_eq!(fitted, "");
    }

    #[test]
    fn prompt_carries_context_query_and_citation_notation() {
        let prompt = build_prompt("Document 1: Paris.", "capital?");
        assert!(prompt.starts_with("Context information:\nDocument 1: Paris."));
        assert!(prompt.contains("'capital?'"));
        assert!(prompt.contains("[Document 1]"));
    }
}
