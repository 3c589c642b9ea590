use semrag_vector_store::SearchResult;

/// Passages handed to the answer generator per query
pub const MAX_CONTEXT_PASSAGES: usize = 5;

pub const NO_CONTEXT_ANSWER: &str = "No relevant documents found to answer this question.";

const INSTRUCTION: &str = "Answer the question based on the following context. \
If the answer cannot be found in the context, say \"I cannot find the answer in the provided documents.\"";

/// Build the generator prompt for `query`.
///
/// `None` when there is nothing to ground an answer on; callers answer with
/// [`NO_CONTEXT_ANSWER`] instead of invoking a generator.
#[must_use]
pub fn build_prompt(query: &str, results: &[SearchResult]) -> Option<String> {
    if results.is_empty() {
        return None;
    }

    let context = results
        .iter()
        .take(MAX_CONTEXT_PASSAGES)
        .enumerate()
        .map(|(i, result)| format!("[{}] {}", i + 1, result.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    Some(format!(
        "{INSTRUCTION}\n\nContext:\n{context}\n\nQuestion: {query}\n\nAnswer:"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use semrag_vector_store::ChunkMetadata;

    fn result(text: &str) -> SearchResult {
        SearchResult {
            text: text.to_string(),
            metadata: ChunkMetadata::new("doc.txt", 0, 0, text.len()),
            score: 0.5,
        }
    }

    #[test]
    fn no_results_means_no_prompt() {
        assert_eq!(build_prompt("why?", &[]), None);
    }

    #[test]
    fn numbers_passages_and_caps_context() {
        let results: Vec<SearchResult> = (0..7).map(|i| result(&format!("passage {i}"))).collect();
        let prompt = build_prompt("What is here?", &results).unwrap();

        assert!(prompt.contains("[1] passage 0\n\n[2] passage 1"));
        assert!(prompt.contains("[5] passage 4"));
        assert!(!prompt.contains("passage 5"));
        assert!(prompt.ends_with("Question: What is here?\n\nAnswer:"));
    }
}
