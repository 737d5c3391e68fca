//! System prompt construction.

/// Opens the retrieved context block inside a system prompt.
pub const CONTEXT_START: &str = "--- TRUSTED CONTEXT ---";
/// Closes the retrieved context block inside a system prompt.
pub const CONTEXT_END: &str = "--- END CONTEXT ---";

const GROUNDED_INSTRUCTIONS: &str = "You are a helpful health information assistant.
The following is trusted information from a knowledge base. Use this as the primary source for your answer.
You can enhance this information with your general knowledge to provide a more complete and helpful response.
Maintain an empathetic tone and format your answer using markdown (headings, bold text, and bullet points).";

const GENERAL_INSTRUCTIONS: &str = "You are a friendly and helpful assistant. \
For greetings like \"hi\" or \"hello\", respond warmly. \
For other questions, provide a concise answer using markdown where appropriate.";

/// Builds the system instruction that conditions generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptComposer;

impl PromptComposer {
    /// Compose the system prompt, embedding `context` verbatim when present.
    /// Blank context is treated as absent.
    pub fn compose(&self, context: Option<&str>) -> String {
        match context.filter(|c| !c.trim().is_empty()) {
            Some(context) => format!(
                "{}\n\n{}\n{}\n{}",
                GROUNDED_INSTRUCTIONS, CONTEXT_START, context, CONTEXT_END
            ),
            None => GENERAL_INSTRUCTIONS.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_context_has_no_delimiters() {
        let prompt = PromptComposer.compose(None);
        assert!(!prompt.is_empty());
        assert!(!prompt.contains(CONTEXT_START));
        assert!(!prompt.contains(CONTEXT_END));
        assert!(prompt.contains("respond warmly"));
    }

    #[test]
    fn test_context_embedded_between_delimiters() {
        let context = "Manage blood sugar.\n- Check levels daily.";
        let prompt = PromptComposer.compose(Some(context));
        let start = prompt.find(CONTEXT_START).unwrap() + CONTEXT_START.len();
        let end = prompt.find(CONTEXT_END).unwrap();
        assert_eq!(prompt[start..end].trim(), context);
    }

    #[test]
    fn test_context_prompt_instructions() {
        let prompt = PromptComposer.compose(Some("x"));
        assert!(prompt.contains("health information assistant"));
        assert!(prompt.contains("primary source"));
        assert!(prompt.contains("general knowledge"));
        assert!(prompt.contains("empathetic"));
        assert!(prompt.contains("bullet points"));
    }

    #[test]
    fn test_blank_context_uses_general_prompt() {
        for blank in ["", "  \n "] {
            let prompt = PromptComposer.compose(Some(blank));
            assert!(!prompt.contains(CONTEXT_START));
            assert_eq!(prompt, PromptComposer.compose(None));
        }
    }

    #[test]
    fn test_compose_is_deterministic() {
        let c = PromptComposer;
        assert_eq!(c.compose(Some("abc")), c.compose(Some("abc")));
        assert_eq!(c.compose(None), c.compose(None));
    }
}
