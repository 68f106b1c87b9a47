use std::collections::BTreeMap;

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use tracing::{info, warn};

use crate::config::LLMConfig;
use crate::models::AnnotationRecord;
use crate::types::{AppError, AppResult};

const SYSTEM_PROMPT: &str = r#"You are a spreadsheet data analysis specialist. Your job:

1. Analyze ONE spreadsheet file at a time
2. Use the user's description of what the file represents
3. Identify key reporting fields (metrics like Cost, Quantity, Revenue)
4. Identify join fields that link to other files (like Company Code, Product ID)
5. Output structured JSON with field roles

Example output format:
{
  "file_purpose": "Monthly inventory tracking",
  "fields": {
    "Company Code": {"type": "string", "role": "join_field"},
    "Product Cost": {"type": "float", "role": "reporting_field"},
    "Quantity": {"type": "integer", "role": "reporting_field"}
  }
}

Reply with the JSON only."#;

/// The structured shape the analyzer is asked to produce.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FileAnalysis {
    pub file_purpose: String,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldRole>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FieldRole {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub role: String,
}

/// Two-outcome contract for the analyzer: either the parsed JSON the model
/// was asked for, or its reply verbatim when the content does not parse.
/// Callers can always tell which they received.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Structured {
        analysis: FileAnalysis,
        raw_response: String,
    },
    Unstructured {
        raw_response: String,
    },
}

pub struct FileAnalyzer {
    client: Client<OpenAIConfig>,
    model: String,
}

impl FileAnalyzer {
    pub fn new(config: &LLMConfig) -> Self {
        let client =
            Client::with_config(OpenAIConfig::new().with_api_key(config.openai_api_key.clone()));
        Self {
            client,
            model: config.model.clone(),
        }
    }

    /// Ask the model to assign roles to the record's fields. Transport and
    /// API failures are hard errors; a reply that is not the requested JSON
    /// is a soft success carrying the raw text.
    pub async fn analyze(
        &self,
        record: &AnnotationRecord,
        user_input: &str,
    ) -> AppResult<AnalysisOutcome> {
        let prompt = build_analysis_prompt(record, user_input);
        info!(record_id = %record.id, model = %self.model, "Requesting field-role analysis");

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()
                    .map_err(|err| AppError::LLMApi(err.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()
                    .map_err(|err| AppError::LLMApi(err.to_string()))?
                    .into(),
            ])
            .build()
            .map_err(|err| AppError::LLMApi(err.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|err| AppError::LLMApi(err.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(parse_analysis(content))
    }
}

fn build_analysis_prompt(record: &AnnotationRecord, user_input: &str) -> String {
    format!(
        "File: {}\nFields found: {}\nRecord count: {}\nUser description: {}\n\n\
         Please analyze this file and identify field roles.",
        record.original_filename,
        record.fields.join(", "),
        record.record_count,
        user_input,
    )
}

fn parse_analysis(raw: String) -> AnalysisOutcome {
    match serde_json::from_str::<FileAnalysis>(raw.trim()) {
        Ok(analysis) => AnalysisOutcome::Structured {
            analysis,
            raw_response: raw,
        },
        Err(err) => {
            warn!(error = %err, "Analyzer reply was not the requested JSON; returning raw text");
            AnalysisOutcome::Unstructured { raw_response: raw }
        }
    }
}
