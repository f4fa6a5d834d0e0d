use extract::RelationType;
use extract::text::is_entity_candidate;
use tracing::info;

use crate::analysis::{QueryAnalysis, QueryIntent};

pub const MAX_KEY_ENTITIES: usize = 5;

/// Checked in order; the first group with a keyword present wins.
const INTENT_KEYWORDS: &[(QueryIntent, &[&str])] = &[
    (QueryIntent::Comparative, &["compare", "difference", "versus"]),
    (QueryIntent::Causal, &["why", "because", "cause"]),
    (QueryIntent::Procedural, &["how", "steps", "process"]),
    (QueryIntent::Exploratory, &["explore", "related", "similar"]),
];

const RELATION_KEYWORDS: &[(RelationType, &[&str])] = &[
    (RelationType::Authored, &["author", "wrote"]),
    (RelationType::Cites, &["cite", "reference"]),
    (RelationType::Uses, &["use", "apply"]),
];

#[derive(Debug, Default, Clone)]
pub struct QueryAnalyzer;

impl QueryAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_query(&self, query: &str) -> QueryAnalysis {
        let analysis = QueryAnalysis {
            intent: classify_intent(query),
            key_entities: extract_key_entities(query),
            required_relations: identify_relations(query),
            sub_queries: decompose_query(query),
        };

        info!(
            intent = %analysis.intent,
            entities = analysis.key_entities.len(),
            sub_queries = analysis.sub_queries.len(),
            "query analyzed"
        );

        analysis
    }
}

/// Keywords match as substrings, so "however" counts as procedural.
pub fn classify_intent(query: &str) -> QueryIntent {
    let lower = query.to_lowercase();

    INTENT_KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(intent, _)| *intent)
        .unwrap_or(QueryIntent::Factual)
}

pub fn extract_key_entities(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .filter(|w| is_entity_candidate(w))
        .take(MAX_KEY_ENTITIES)
        .map(str::to_string)
        .collect()
}

pub fn identify_relations(query: &str) -> Vec<RelationType> {
    let lower = query.to_lowercase();

    let relations: Vec<RelationType> = RELATION_KEYWORDS
        .iter()
        .filter(|(_, words)| words.iter().any(|w| lower.contains(w)))
        .map(|(relation, _)| *relation)
        .collect();

    if relations.is_empty() {
        vec![RelationType::Mentions]
    } else {
        relations
    }
}

/// Split on a literal lower-case `" and "`; the check itself ignores case.
pub fn decompose_query(query: &str) -> Vec<String> {
    if query.to_lowercase().contains(" and ") {
        query.split(" and ").map(|p| p.trim().to_string()).collect()
    } else {
        vec![query.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparative_beats_causal() {
        assert_eq!(
            classify_intent("Why compare BERT and GPT?"),
            QueryIntent::Comparative
        );
    }

    #[test]
    fn test_intent_precedence() {
        assert_eq!(classify_intent("Why does dropout help?"), QueryIntent::Causal);
        assert_eq!(classify_intent("What steps train a model?"), QueryIntent::Procedural);
        assert_eq!(classify_intent("Find similar papers"), QueryIntent::Exploratory);
        assert_eq!(classify_intent("What is attention?"), QueryIntent::Factual);
        assert_eq!(classify_intent("Difference VERSUS"), QueryIntent::Comparative);
    }

    #[test]
    fn test_key_entities_are_capped() {
        let entities =
            extract_key_entities("Compare Alpha Bravo Charlie Delta Echo Foxtrot on GLUE");
        assert_eq!(entities, vec!["Compare", "Alpha", "Bravo", "Charlie", "Delta"]);
    }

    #[test]
    fn test_relations() {
        assert_eq!(
            identify_relations("Who wrote papers that cite BERT?"),
            vec![RelationType::Authored, RelationType::Cites]
        );
        assert_eq!(identify_relations("Which models apply dropout?"), vec![RelationType::Uses]);
        assert_eq!(identify_relations("What is a graph?"), vec![RelationType::Mentions]);
    }

    #[test]
    fn test_decompose_query() {
        assert_eq!(
            decompose_query("What is BERT and how is it trained"),
            vec!["What is BERT", "how is it trained"]
        );
        assert_eq!(decompose_query("What is BERT?"), vec!["What is BERT?"]);
        // Detected case-insensitively but split only on the lower-case form.
        assert_eq!(decompose_query("Cats AND dogs"), vec!["Cats AND dogs"]);
    }

    #[test]
    fn test_analyze_query() {
        let analysis = QueryAnalyzer::new().analyze_query("How does Transformer use Attention?");

        assert_eq!(analysis.intent, QueryIntent::Procedural);
        assert_eq!(analysis.key_entities, vec!["Transformer", "Attention?"]);
        assert_eq!(analysis.required_relations, vec![RelationType::Uses]);
        assert_eq!(analysis.sub_queries.len(), 1);
    }
}
