use crate::error::AppError;
use crate::locale::{self, Language, Message};
use crate::model::{ActionTag, CommandDescriptor, Frequency, Priority, TaskData};
use crate::session::Session;
use crate::store::{NewTask, TaskPatch, normalize_due_date};

/// How a descriptor's `targetId` relates to the current list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetResolution {
    Missing,
    Unknown(String),
    Found(String),
}

pub fn resolve_target(session: &Session, descriptor: &CommandDescriptor) -> TargetResolution {
    match descriptor.target_id() {
        None => TargetResolution::Missing,
        Some(id) => match session.store.get(id) {
            Some(task) => TargetResolution::Found(task.id.clone()),
            None => TargetResolution::Unknown(id.to_string()),
        },
    }
}

/// Applies at most one store mutation or view change and returns the
/// confirmation in the session language. Never fails: every problem turns
/// into a clarification or fallback message.
pub fn dispatch(session: &mut Session, descriptor: &CommandDescriptor) -> String {
    let language = session.language;
    tracing::debug!(action = %descriptor.action, "dispatching command");

    match descriptor.action {
        ActionTag::Chat => descriptor
            .explanation()
            .map(str::to_string)
            .unwrap_or_else(|| locale::text(language, Message::ChatFallback).to_string()),
        ActionTag::Add => {
            let Some(data) = descriptor.task_data.as_ref().filter(|data| data.title().is_some())
            else {
                return locale::text(language, Message::AskWhatToAdd).to_string();
            };
            let draft = new_task_from(data);
            let user_id = session.user.id.clone();
            match session.store.add(&user_id, draft) {
                Ok(task) => {
                    session.reset_view();
                    locale::task_added(language, &task.title)
                }
                Err(err) => failed(language, ActionTag::Add, &err),
            }
        }
        ActionTag::Delete => match target_or_clarify(session, descriptor) {
            Some(id) => match session.store.delete(&id) {
                Ok(_) => locale::text(language, Message::TaskDeleted).to_string(),
                Err(err) => failed(language, ActionTag::Delete, &err),
            },
            None => locale::text(language, Message::AskWhichToDelete).to_string(),
        },
        ActionTag::Complete => match target_or_clarify(session, descriptor) {
            Some(id) => match session.store.toggle(&id) {
                Ok(_) => locale::text(language, Message::TaskToggled).to_string(),
                Err(err) => failed(language, ActionTag::Complete, &err),
            },
            None => locale::text(language, Message::AskWhichCompleted).to_string(),
        },
        ActionTag::Update => {
            let patch = descriptor
                .task_data
                .as_ref()
                .map(patch_from)
                .unwrap_or_default();
            match target_or_clarify(session, descriptor) {
                Some(id) if !patch.is_empty() => match session.store.edit(&id, patch) {
                    Ok(task) => locale::task_edited(language, &task.title),
                    Err(err) => failed(language, ActionTag::Update, &err),
                },
                _ => locale::text(language, Message::AskWhichToUpdate).to_string(),
            }
        }
        ActionTag::Search => {
            let query = descriptor.query.as_deref().unwrap_or("").trim().to_string();
            let reply = locale::filtering_for(language, &query);
            session.filter.search = query;
            reply
        }
    }
}

/// Unknown ids get the same clarification as missing ones; only the log
/// tells them apart.
fn target_or_clarify(session: &Session, descriptor: &CommandDescriptor) -> Option<String> {
    match resolve_target(session, descriptor) {
        TargetResolution::Found(id) => Some(id),
        TargetResolution::Unknown(id) => {
            tracing::warn!(action = %descriptor.action, target_id = %id, "target task not found");
            None
        }
        TargetResolution::Missing => None,
    }
}

fn failed(language: Language, action: ActionTag, err: &AppError) -> String {
    tracing::error!(action = %action, error = %err, "command could not be applied");
    locale::text(language, Message::SomethingWentWrong).to_string()
}

fn new_task_from(data: &TaskData) -> NewTask {
    NewTask {
        title: data.title().unwrap_or_default().to_string(),
        description: data.description().map(str::to_string),
        priority: priority_from(data.priority.as_deref()).unwrap_or(Priority::Medium),
        tags: data.tags.clone().unwrap_or_default(),
        due_date: due_date_from(data.due_date.as_deref()),
        recurring: frequency_from(data.recurring.as_deref()),
    }
}

fn patch_from(data: &TaskData) -> TaskPatch {
    TaskPatch {
        title: data.title().map(str::to_string),
        description: data.description().map(str::to_string),
        priority: priority_from(data.priority.as_deref()),
        tags: data.tags.clone().filter(|tags| !tags.is_empty()),
        due_date: due_date_from(data.due_date.as_deref()),
        recurring: frequency_from(data.recurring.as_deref()),
    }
}

fn priority_from(raw: Option<&str>) -> Option<Priority> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match raw.parse() {
        Ok(priority) => Some(priority),
        Err(err) => {
            tracing::warn!(%err, "ignoring priority from interpreter");
            None
        }
    }
}

fn frequency_from(raw: Option<&str>) -> Option<Frequency> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match raw.parse() {
        Ok(frequency) => Some(frequency),
        Err(err) => {
            tracing::warn!(%err, "ignoring recurrence from interpreter");
            None
        }
    }
}

fn due_date_from(raw: Option<&str>) -> Option<String> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    match normalize_due_date(raw) {
        Ok(due_date) => Some(due_date),
        Err(err) => {
            tracing::warn!(due_date = raw, error = %err, "ignoring due date from interpreter");
            None
        }
    }
}
