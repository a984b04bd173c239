//! Offline English interpreter used when no model is configured.
//!
//! Recognises a handful of verb phrases and resolves targets against the
//! task context by title. Anything it cannot place becomes CHAT without an
//! explanation, which the dispatcher answers with its fallback line.

use super::{InterpretError, Interpreter, Responder};
use crate::locale::Language;
use crate::model::{ActionTag, CommandDescriptor, TaskContext, TaskData};
use async_trait::async_trait;

const ADD_PREFIXES: [&str; 6] = [
    "remind me to ",
    "remember to ",
    "add a task to ",
    "new task ",
    "create ",
    "add ",
];
const DELETE_PREFIXES: [&str; 3] = ["delete ", "remove ", "drop "];
const COMPLETE_PREFIXES: [&str; 6] = [
    "i finished ",
    "i completed ",
    "complete ",
    "finish ",
    "done with ",
    "done ",
];
const SEARCH_PREFIXES: [&str; 6] = [
    "search for ",
    "search ",
    "find ",
    "filter by ",
    "filter ",
    "show me ",
];
const CLEAR_SEARCH: [&str; 4] = ["show all", "show everything", "clear search", "clear filter"];
const LIST_SUFFIXES: [&str; 4] = [" to my list", " to the list", " to my tasks", " to list"];
const DONE_SUFFIXES: [&str; 5] = [
    " as done",
    " as complete",
    " as completed",
    " done",
    " complete",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleInterpreter;

impl RuleInterpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, utterance: &str, context: &[TaskContext]) -> CommandDescriptor {
        let text = utterance.trim().trim_end_matches(['.', '!']).trim();

        if is_question(text) {
            return CommandDescriptor::new(ActionTag::Chat).with_explanation(summary(context));
        }
        if CLEAR_SEARCH.iter().any(|phrase| text.eq_ignore_ascii_case(phrase)) {
            return CommandDescriptor::new(ActionTag::Search).with_query("");
        }
        if let Some(descriptor) = rename(text, context) {
            return descriptor;
        }
        if ["add", "create"].iter().any(|verb| text.eq_ignore_ascii_case(verb)) {
            return CommandDescriptor::new(ActionTag::Add);
        }
        if let Some(body) = strip_any_prefix(text, &ADD_PREFIXES) {
            return CommandDescriptor::new(ActionTag::Add).with_task_data(draft_from(body));
        }
        if let Some(body) = strip_any_prefix(text, &DELETE_PREFIXES) {
            return targeted(ActionTag::Delete, body, context);
        }
        if let Some(body) = strip_prefix_ci(text, "mark ") {
            let body = strip_any_suffix(body, &DONE_SUFFIXES).unwrap_or(body);
            return targeted(ActionTag::Complete, body, context);
        }
        if let Some(body) = strip_any_prefix(text, &COMPLETE_PREFIXES) {
            return targeted(ActionTag::Complete, body, context);
        }
        if let Some(body) = strip_any_prefix(text, &SEARCH_PREFIXES) {
            let query = strip_any_prefix(body, &["tasks about ", "tasks with ", "tasks for "])
                .unwrap_or(body);
            return CommandDescriptor::new(ActionTag::Search).with_query(query.trim());
        }
        if ["delete", "remove"].iter().any(|verb| text.eq_ignore_ascii_case(verb)) {
            return CommandDescriptor::new(ActionTag::Delete);
        }

        CommandDescriptor::new(ActionTag::Chat)
    }
}

#[async_trait]
impl Interpreter for RuleInterpreter {
    async fn interpret(
        &self,
        utterance: &str,
        context: &[TaskContext],
    ) -> Result<CommandDescriptor, InterpretError> {
        let descriptor = self.classify(utterance, context);
        tracing::debug!(action = %descriptor.action, "classified utterance offline");
        Ok(descriptor)
    }
}

#[async_trait]
impl Responder for RuleInterpreter {
    async fn respond(&self, _input: &str, _language: Language) -> Result<String, InterpretError> {
        Err(InterpretError::unavailable("no language model configured"))
    }
}

fn is_question(text: &str) -> bool {
    text.ends_with('?')
        || ["how many ", "what ", "which tasks ", "do i have "]
            .iter()
            .any(|prefix| strip_prefix_ci(text, prefix).is_some())
}

fn summary(context: &[TaskContext]) -> String {
    let open = context.iter().filter(|task| !task.completed).count();
    match context.len() {
        0 => "You have no tasks yet.".to_string(),
        1 => format!("You have 1 task, {open} still open."),
        total => format!("You have {total} tasks, {open} still open."),
    }
}

/// `rename <old> to <new>`.
fn rename(text: &str, context: &[TaskContext]) -> Option<CommandDescriptor> {
    let body = strip_prefix_ci(text, "rename ")?;
    let lowered = body.to_ascii_lowercase();
    let split = lowered.rfind(" to ")?;
    let (old, new) = (&body[..split], body[split + 4..].trim());

    let mut descriptor = CommandDescriptor::new(ActionTag::Update).with_task_data(TaskData {
        title: Some(new.to_string()),
        ..TaskData::default()
    });
    if let Some(id) = find_target(old, context) {
        descriptor = descriptor.with_target(id);
    }
    Some(descriptor)
}

fn targeted(action: ActionTag, phrase: &str, context: &[TaskContext]) -> CommandDescriptor {
    let descriptor = CommandDescriptor::new(action);
    match find_target(phrase, context) {
        Some(id) => descriptor.with_target(id),
        None => descriptor,
    }
}

/// Exact title match first, then substring either way.
fn find_target(phrase: &str, context: &[TaskContext]) -> Option<String> {
    let phrase = clean_phrase(phrase).to_lowercase();
    if phrase.is_empty() {
        return None;
    }

    context
        .iter()
        .find(|task| task.title.to_lowercase() == phrase)
        .or_else(|| {
            context.iter().find(|task| {
                let title = task.title.to_lowercase();
                title.contains(&phrase) || phrase.contains(&title)
            })
        })
        .map(|task| task.id.clone())
}

fn clean_phrase(phrase: &str) -> &str {
    let phrase = phrase.trim().trim_matches(['"', '\'']);
    let phrase = strip_any_prefix(phrase, &["the task ", "task ", "the "]).unwrap_or(phrase);
    let phrase = strip_any_suffix(phrase, &[" task"]).unwrap_or(phrase);
    phrase.trim().trim_matches(['"', '\''])
}

fn draft_from(body: &str) -> TaskData {
    let words: Vec<&str> = body.split_whitespace().collect();
    let mut kept = Vec::with_capacity(words.len());
    let mut tags = Vec::new();
    let mut priority = None;
    let mut recurring = None;

    let mut index = 0;
    while index < words.len() {
        let word = words[index];
        let next = words
            .get(index + 1)
            .map(|next| next.trim_end_matches([',', '.']).to_ascii_lowercase());
        let bare = word.trim_end_matches([',', '.']).to_ascii_lowercase();

        if let Some(tag) = word.strip_prefix('#').filter(|tag| !tag.is_empty()) {
            tags.push(tag.trim_end_matches([',', '.']).to_string());
        } else if next.as_deref() == Some("priority")
            && matches!(bare.as_str(), "high" | "medium" | "low")
        {
            priority = Some(bare);
            index += 1;
        } else if bare == "every"
            && let Some(unit) = next.as_deref().and_then(frequency_for)
        {
            recurring = Some(unit.to_string());
            index += 1;
        } else if bare == "urgent" || bare == "urgently" {
            priority = Some("high".to_string());
        } else {
            kept.push(word);
        }
        index += 1;
    }

    while kept
        .last()
        .is_some_and(|word| matches!(word.to_ascii_lowercase().as_str(), "with" | "and" | "as"))
    {
        kept.pop();
    }
    let joined = kept.join(" ");
    let title = strip_any_suffix(&joined, &LIST_SUFFIXES)
        .unwrap_or(&joined)
        .trim_end_matches([',', '.'])
        .trim()
        .to_string();

    TaskData {
        title: (!title.is_empty()).then_some(title),
        priority,
        tags: (!tags.is_empty()).then_some(tags),
        recurring,
        ..TaskData::default()
    }
}

fn frequency_for(unit: &str) -> Option<&'static str> {
    match unit {
        "day" | "morning" | "evening" | "night" => Some("daily"),
        "week" | "monday" | "tuesday" | "wednesday" | "thursday" | "friday" | "saturday"
        | "sunday" => Some("weekly"),
        "month" => Some("monthly"),
        _ => None,
    }
}

fn strip_prefix_ci<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let len = prefix.len();
    if text.len() >= len && text.is_char_boundary(len) && text[..len].eq_ignore_ascii_case(prefix) {
        Some(&text[len..])
    } else {
        None
    }
}

fn strip_suffix_ci<'a>(text: &'a str, suffix: &str) -> Option<&'a str> {
    let start = text.len().checked_sub(suffix.len())?;
    if text.is_char_boundary(start) && text[start..].eq_ignore_ascii_case(suffix) {
        Some(&text[..start])
    } else {
        None
    }
}

fn strip_any_prefix<'a>(text: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| strip_prefix_ci(text, prefix))
}

fn strip_any_suffix<'a>(text: &'a str, suffixes: &[&str]) -> Option<&'a str> {
    suffixes
        .iter()
        .find_map(|suffix| strip_suffix_ci(text, suffix))
}
