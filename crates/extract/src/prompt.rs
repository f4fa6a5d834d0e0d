pub fn build_extraction_prompt(chunk_text: &str) -> String {
    format!(
        r#"Extract academic entities and relationships from the following text.

INSTRUCTIONS:
1. Identify key entities (concepts, authors, papers, methods, datasets, theories)
2. Extract relationships between entities
3. Output ONLY valid JSON, nothing else
4. Use the exact schema below

SCHEMA:
{{
  "entities": [
    {{"id": "E1", "text": "Entity text as written", "type": "CONCEPT|AUTHOR|PAPER|METHOD|DATASET|THEORY", "confidence": 0.9}}
  ],
  "relations": [
    {{"source": "E1", "target": "E2", "type": "DEFINES|USES|CITES|AUTHORED|PROPOSES|VALIDATES|CONTRADICTS|EXTENDS|MENTIONS", "confidence": 0.8}}
  ]
}}

RULES:
- Use sequential IDs: E1, E2, E3, etc.
- Entity and relation types must be one of the listed values
- Confidence is a number between 0 and 1
- Output ONLY the JSON object, no markdown, no explanations

TEXT:
{}

JSON OUTPUT:"#,
        chunk_text
    )
}

pub fn build_retry_prompt(invalid_json: &str) -> String {
    format!(
        r#"The following JSON is invalid:

{}

Fix this JSON. Output only valid JSON with no markdown formatting, no code blocks, no explanations. Just the raw JSON object."#,
        invalid_json
    )
}
