//! Chain-of-thought prompt pair used to answer questions over graph context.

pub const CHAIN_OF_THOUGHT_SYSTEM: &str = "\
You are Scholaris, a research assistant that answers questions about academic \
literature using a knowledge graph of concepts, authors, papers, methods, \
datasets and theories.

Reason step by step:
1. Identify the key concepts in the question.
2. Use only the knowledge graph context and the conversation history provided.
3. Connect the relevant facts into a coherent answer.

If the context does not contain the answer, say so plainly instead of guessing.";

const CHAIN_OF_THOUGHT_USER_TEMPLATE: &str = "\
Knowledge graph context:
{graph_context}

Conversation history:
{history}

Question: {query}

Answer:";

/// Fill the template in one pass so braces inside the values stay literal.
pub fn render_user_prompt(query: &str, graph_context: &str, history: &str) -> String {
    let mut out = String::with_capacity(
        CHAIN_OF_THOUGHT_USER_TEMPLATE.len() + query.len() + graph_context.len() + history.len(),
    );
    let mut rest = CHAIN_OF_THOUGHT_USER_TEMPLATE;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        let Some(close) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };

        match &tail[1..close] {
            "graph_context" => out.push_str(graph_context),
            "history" => out.push_str(history),
            "query" => out.push_str(query),
            _ => out.push_str(&tail[..=close]),
        }
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_user_prompt() {
        let prompt = render_user_prompt("What is BERT?", "Entity: BERT", "user: hi");

        assert!(prompt.contains("Entity: BERT"));
        assert!(prompt.contains("user: hi"));
        assert!(prompt.contains("Question: What is BERT?"));
        assert!(!prompt.contains('{'));
    }

    #[test]
    fn test_render_keeps_placeholder_text_in_values() {
        let prompt = render_user_prompt(
            "Why {history}?",
            "Entity: {query}",
            "user: see {graph_context}",
        );

        assert!(prompt.contains("Knowledge graph context:\nEntity: {query}\n"));
        assert!(prompt.contains("Conversation history:\nuser: see {graph_context}\n"));
        assert!(prompt.contains("Question: Why {history}?"));
    }
}
