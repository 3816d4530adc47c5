//! Transcription prompts and the field list they ask for.
//!
//! A prompt is either plain text, where every line shaped like `fieldName: description`
//! declares an expected field, or a JSON document `{title, description, fields: [{name, description}]}`.
//! Lines before the first field become the title and description.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Name of the tool models are asked to call when native structured output is used.
pub const TRANSCRIPTION_TOOL: &str = "record_transcription";

const JSON_INSTRUCTION: &str = "Return your response as a valid JSON object with fields matching \
the requested information. Do not include any text outside the JSON structure.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptField {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub fields: Vec<PromptField>,
}

impl Prompt {
    pub fn parse(text: &str) -> Self {
        if let Ok(prompt) = serde_json::from_str::<Prompt>(text.trim()) {
            return prompt;
        }

        let lines: Vec<&str> = text.trim().lines().collect();
        let field_start = lines
            .iter()
            .position(|l| field_line(l).is_some())
            .unwrap_or(lines.len());

        let preamble = &lines[..field_start];
        let title = preamble.first().map(|l| l.trim().to_string()).unwrap_or_default();
        let description = preamble
            .iter()
            .skip(1)
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        let mut fields: Vec<PromptField> = Vec::new();
        for line in &lines[field_start..] {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match field_line(line) {
                Some((name, desc)) => fields.push(PromptField {
                    name: name.to_string(),
                    description: desc.to_string(),
                }),
                None => {
                    if let Some(last) = fields.last_mut() {
                        if !last.description.is_empty() {
                            last.description.push('\n');
                        }
                        last.description.push_str(line);
                    }
                }
            }
        }

        Self {
            title,
            description,
            fields,
        }
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }

    fn intro(&self) -> String {
        match (self.title.is_empty(), self.description.is_empty()) {
            (false, false) => format!("{}\n{}", self.title, self.description),
            (false, true) => self.title.clone(),
            (true, false) => self.description.clone(),
            (true, true) => String::new(),
        }
    }

    fn field_list(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("\n- {}: {}", f.name, f.description))
            .collect()
    }

    /// Prompt text for models that answer in free text.
    pub fn free_text(&self) -> String {
        format!(
            "{}\n\n{JSON_INSTRUCTION}\n\nPlease provide the following information in JSON format:{}",
            self.intro(),
            self.field_list()
        )
    }

    /// Prompt text for models forced to answer through the transcription tool.
    pub fn tool_text(&self) -> String {
        format!(
            "{}\n\nRecord the transcription by calling the {TRANSCRIPTION_TOOL} tool with these fields:{}",
            self.intro(),
            self.field_list()
        )
    }

    /// JSON schema of the reply: one string property per field, all required.
    pub fn json_schema(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|f| {
                (
                    f.name.clone(),
                    json!({"type": "string", "description": f.description}),
                )
            })
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": self.field_names(),
        })
    }
}

/// `name: description` where the name is a single word token.
fn field_line(line: &str) -> Option<(&str, &str)> {
    let (name, rest) = line.split_once(':')?;
    let name = name.trim();
    let is_word = !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    is_word.then(|| (name, rest.trim()))
}
