use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed action vocabulary the interpreter must choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionTag {
    Add,
    Delete,
    Update,
    Complete,
    Search,
    Chat,
}

impl ActionTag {
    pub const ALL: [ActionTag; 6] = [
        Self::Add,
        Self::Delete,
        Self::Update,
        Self::Complete,
        Self::Search,
        Self::Chat,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(trimmed))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "ADD",
            Self::Delete => "DELETE",
            Self::Update => "UPDATE",
            Self::Complete => "COMPLETE",
            Self::Search => "SEARCH",
            Self::Chat => "CHAT",
        }
    }
}

impl fmt::Display for ActionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partial task fields carried by ADD and UPDATE descriptors. Values are
/// kept raw; the dispatcher decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<String>,
}

impl TaskData {
    pub fn title(&self) -> Option<&str> {
        non_blank(self.title.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.title().is_none()
            && self.description().is_none()
            && non_blank(self.priority.as_deref()).is_none()
            && self.tags.as_ref().is_none_or(|tags| tags.is_empty())
            && non_blank(self.due_date.as_deref()).is_none()
            && non_blank(self.recurring.as_deref()).is_none()
    }
}

/// Structured interpretation of one utterance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDescriptor {
    pub action: ActionTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_data: Option<TaskData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl CommandDescriptor {
    pub fn new(action: ActionTag) -> Self {
        Self {
            action,
            task_data: None,
            target_id: None,
            query: None,
            explanation: None,
        }
    }

    pub fn with_task_data(mut self, task_data: TaskData) -> Self {
        self.task_data = Some(task_data);
        self
    }

    pub fn with_target(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    pub fn title(&self) -> Option<&str> {
        self.task_data.as_ref().and_then(TaskData::title)
    }

    pub fn target_id(&self) -> Option<&str> {
        non_blank(self.target_id.as_deref())
    }

    pub fn explanation(&self) -> Option<&str> {
        non_blank(self.explanation.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{ActionTag, CommandDescriptor, TaskData};

    #[test]
    fn action_tag_parse_ignores_case_and_whitespace() {
        assert_eq!(ActionTag::parse(" add "), Some(ActionTag::Add));
        assert_eq!(ActionTag::parse("Complete"), Some(ActionTag::Complete));
        assert_eq!(ActionTag::parse("ARCHIVE"), None);
        assert_eq!(ActionTag::parse(""), None);
    }

    #[test]
    fn blank_secondary_fields_count_as_absent() {
        let descriptor = CommandDescriptor::new(ActionTag::Delete)
            .with_target("   ")
            .with_task_data(TaskData {
                title: Some(" ".to_string()),
                ..TaskData::default()
            });

        assert_eq!(descriptor.target_id(), None);
        assert_eq!(descriptor.title(), None);
        assert!(descriptor.task_data.as_ref().unwrap().is_empty());
    }

    #[test]
    fn descriptor_serializes_camel_case() {
        let descriptor = CommandDescriptor::new(ActionTag::Complete).with_target("task-1");
        let json = serde_json::to_value(&descriptor).unwrap();

        assert_eq!(json["action"], "COMPLETE");
        assert_eq!(json["targetId"], "task-1");
        assert!(json.get("taskData").is_none());
    }
}
