//! Builds the generation prompt from retrieved chunks and the user question.
//!
//! The default template asks, in Modern Standard Arabic, for a one-line
//! explanation of each personality trait and five to six fitting careers in at
//! most 200 words, using only the supplied context. Templates use two
//! placeholders, `{context}` and `{query}`. They are substituted in one pass
//! over the template, so braces inside the chunks or the question are copied
//! through untouched.

use super::retriever::RetrievedChunk;

/// Prompt used by the career recommendation step.
pub const DEFAULT_TEMPLATE: &str = "أنت مساعد ذكاء اصطناعي متخصص في تحليل سمات الشخصية واقتراح المهن المناسبة.

استخدم المعلومات الموجودة في السياق فقط للإجابة.

السياق:
{context}

السؤال: {query}

المطلوب:
1. قدّم شرحًا مختصرًا جدًا لكل سمة شخصية مذكورة (سطر واحد لكل سمة).
2. اقترح ٥ إلى ٦ مهن مناسبة بناءً على السمات فقط.
3. لا تتجاوز الإجابة ٢٠٠ كلمة.
4. الإجابة بالعربية الفصحى المختصرة.

الإجابة:";

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUERY_PLACEHOLDER: &str = "{query}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAssembler {
    template: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PromptAssembler {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Render the template for `query` over `chunks`, in retrieval order.
    ///
    /// Nothing is truncated; with no chunks the context section is empty.
    pub fn assemble(&self, query: &str, chunks: &[RetrievedChunk]) -> String {
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        self.assemble_texts(query, &texts)
    }

    /// Same as [`assemble`](Self::assemble) for bare chunk texts.
    pub fn assemble_texts(&self, query: &str, chunks: &[&str]) -> String {
        let context = build_context(chunks);
        render(&self.template, &context, query)
    }
}

/// Number each chunk as `[السياق n]:` starting at 1.
pub fn build_context(chunks: &[&str]) -> String {
    let mut context = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        context.push_str(&format!("\n\n[السياق {}]:\n{}", i + 1, chunk));
    }
    context
}

fn render(template: &str, context: &str, query: &str) -> String {
    let mut out = String::with_capacity(template.len() + context.len() + query.len());
    let mut rest = template;
    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with(CONTEXT_PLACEHOLDER) {
            out.push_str(context);
            rest = &tail[CONTEXT_PLACEHOLDER.len()..];
        } else if tail.starts_with(QUERY_PLACEHOLDER) {
            out.push_str(query);
            rest = &tail[QUERY_PLACEHOLDER.len()..];
        } else {
            out.push('{');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ChunkMetadata;

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: "chunk_0".to_string(),
            text: text.to_string(),
            similarity: 0.5,
            metadata: ChunkMetadata {
                source: "a.txt".to_string(),
                doc_id: 0,
                chunk_id: 0,
            },
        }
    }

    #[test]
    fn test_context_is_numbered_in_order() {
        assert_eq!(build_context(&[]), "");
        assert_eq!(
            build_context(&["first", "second"]),
            "\n\n[السياق 1]:\nfirst\n\n[السياق 2]:\nsecond"
        );
    }

    #[test]
    fn test_default_template_contains_chunks_and_query() {
        let prompt = PromptAssembler::default()
            .assemble("ما هي المهن المناسبة؟", &[chunk("Investigative types like research")]);

        assert!(prompt.starts_with("أنت مساعد ذكاء اصطناعي"));
        assert!(prompt.contains("[السياق 1]:\nInvestigative types like research"));
        assert!(prompt.contains("السؤال: ما هي المهن المناسبة؟"));
        assert!(prompt.ends_with("الإجابة:"));
        assert!(!prompt.contains("{context}"));
        assert!(!prompt.contains("{query}"));
    }

    #[test]
    fn test_placeholders_in_inputs_are_not_expanded() {
        let assembler = PromptAssembler::new("C={context}|Q={query}|{other}");
        let prompt = assembler.assemble_texts("why {context}?", &["uses {query}"]);
        assert_eq!(
            prompt,
            "C=\n\n[السياق 1]:\nuses {query}|Q=why {context}?|{other}"
        );
    }

    #[test]
    fn test_long_chunks_are_not_truncated() {
        let long = "x".repeat(10_000);
        let prompt = PromptAssembler::new("{context}").assemble_texts("q", &[long.as_str()]);
        assert_eq!(prompt.chars().filter(|c| *c == 'x').count(), 10_000);
    }
}
