mod llm;
mod prompt;
mod rules;

pub use llm::{ApiFormat, DEFAULT_API_URL, DEFAULT_MODEL, LlmClient, LlmInterpreter};
pub use prompt::{command_prompt, reply_instruction, system_instruction};
pub use rules::RuleInterpreter;

use crate::locale::Language;
use crate::model::{ActionTag, CommandDescriptor, TaskContext, TaskData};
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Every way interpretation can fail. Callers treat all of them alike.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpretError {
    #[error("interpreter unavailable: {0}")]
    Unavailable(String),
    #[error("malformed interpreter output: {0}")]
    Malformed(String),
    /// Action absent, null, or outside the closed vocabulary.
    #[error("interpreter returned no recognised action")]
    MissingAction,
}

impl InterpretError {
    pub fn unavailable<M: Into<String>>(message: M) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn malformed<M: Into<String>>(message: M) -> Self {
        Self::Malformed(message.into())
    }
}

/// Turns an utterance into a descriptor. Purely advisory: nothing is
/// applied until the dispatcher runs.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(
        &self,
        utterance: &str,
        context: &[TaskContext],
    ) -> Result<CommandDescriptor, InterpretError>;
}

/// Free-text answer in the requested language.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, input: &str, language: Language) -> Result<String, InterpretError>;
}

pub fn strip_code_fences(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parses model output into a descriptor. Secondary fields are read
/// leniently; only the action tag is mandatory.
pub fn parse_descriptor(response: &str) -> Result<CommandDescriptor, InterpretError> {
    let cleaned = strip_code_fences(response);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|err| InterpretError::malformed(err.to_string()))?;

    let object = match value {
        Value::Object(object) => object,
        Value::Null => return Err(InterpretError::MissingAction),
        other => {
            return Err(InterpretError::malformed(format!(
                "expected a JSON object, got {other}"
            )));
        }
    };

    let action = object
        .get("action")
        .and_then(Value::as_str)
        .and_then(ActionTag::parse)
        .ok_or(InterpretError::MissingAction)?;

    Ok(CommandDescriptor {
        action,
        task_data: object.get("taskData").and_then(task_data_from),
        target_id: string_field(&object, "targetId"),
        query: string_field(&object, "query"),
        explanation: string_field(&object, "explanation"),
    })
}

fn task_data_from(value: &Value) -> Option<TaskData> {
    let object = value.as_object()?;
    let tags = match object.get("tags") {
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        Some(Value::String(joined)) => Some(joined.split(',').map(str::to_string).collect()),
        _ => None,
    };
    let recurring = match object.get("recurring") {
        Some(Value::Object(inner)) => string_field(inner, "frequency"),
        _ => string_field(object, "recurring"),
    };

    Some(TaskData {
        title: string_field(object, "title"),
        description: string_field(object, "description"),
        priority: string_field(object, "priority"),
        tags,
        due_date: string_field(object, "dueDate"),
        recurring,
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    }
}
