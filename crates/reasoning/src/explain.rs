use tracing::debug;

use graph::{GraphNode, GraphPath};

use crate::analysis::{ReasoningStep, Source};

const MERMAID_LABEL_CHARS: usize = 20;

/// Markdown rendering of reasoning traces and citations.
#[derive(Debug, Default, Clone)]
pub struct ReasoningFormatter;

impl ReasoningFormatter {
    pub fn format_reasoning_trace(&self, steps: &[ReasoningStep]) -> String {
        if steps.is_empty() {
            return "No reasoning steps available.".to_string();
        }

        let mut lines = vec!["## Reasoning Trace\n".to_string()];
        for step in steps {
            lines.push(format!("**Step {}: {}**", step.step_number, step.description));
            lines.push(format!("- Action: {}", step.action));
            lines.push(format!("- Result: {}", step.result));
            lines.push(format!("- Confidence: {:.2}\n", step.confidence));
        }

        debug!(steps = steps.len(), "reasoning trace formatted");
        lines.join("\n")
    }

    pub fn format_sources(&self, sources: &[Source]) -> String {
        if sources.is_empty() {
            return "No sources cited.".to_string();
        }

        let mut lines = vec!["## Sources\n".to_string()];
        for (i, source) in sources.iter().enumerate() {
            let mut citation = format!("{}. **{}**", i + 1, source.title);
            if let Some(page) = source.page.filter(|p| *p > 0) {
                citation.push_str(&format!(" (Page {})", page));
            }
            citation.push_str(&format!(" - Confidence: {:.2}", source.confidence));
            lines.push(citation);
        }

        debug!(count = sources.len(), "sources formatted");
        lines.join("\n")
    }

    pub fn format_complete_explanation(
        &self,
        answer: &str,
        steps: &[ReasoningStep],
        sources: &[Source],
    ) -> String {
        format!(
            "# Answer\n{}\n\n{}\n{}",
            answer,
            self.format_reasoning_trace(steps),
            self.format_sources(sources)
        )
    }
}

/// Text and Mermaid renderings of a graph path.
#[derive(Debug, Default, Clone)]
pub struct GraphVisualizer;

impl GraphVisualizer {
    pub fn visualize_path(&self, path: Option<&GraphPath>) -> String {
        let Some(path) = path.filter(|p| !p.nodes.is_empty()) else {
            return "No graph path available.".to_string();
        };

        let mut lines = vec!["## Graph Traversal Path\n".to_string()];
        for (i, node) in path.nodes.iter().enumerate() {
            lines.push(format!("{}. **{}**: {}", i + 1, node.label, display_text(node)));
            if let Some(edge) = path.edges.get(i) {
                lines.push(format!("   └─ *{}* →", edge.edge_type));
            }
        }
        lines.push(format!("\nPath length: {} hops", path.length));

        debug!(nodes = path.nodes.len(), edges = path.edges.len(), "path visualized");
        lines.join("\n")
    }

    pub fn generate_mermaid_diagram(&self, path: Option<&GraphPath>) -> String {
        let Some(path) = path.filter(|p| !p.nodes.is_empty()) else {
            return "graph LR\n  A[No path available]".to_string();
        };

        let mut lines = vec!["graph LR".to_string()];
        for (i, node) in path.nodes.iter().enumerate() {
            let label: String = display_text(node).chars().take(MERMAID_LABEL_CHARS).collect();
            lines.push(format!("  N{}[\"{}\"]", i, label.replace('"', "'")));
            if let Some(edge) = path.edges.get(i) {
                lines.push(format!("  N{} -->|{}| N{}", i, edge.edge_type, i + 1));
            }
        }

        debug!(nodes = path.nodes.len(), "mermaid diagram generated");
        lines.join("\n")
    }
}

fn display_text(node: &GraphNode) -> &str {
    node.text().unwrap_or(&node.id)
}
