use tabled::settings::Style;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use zen_core::config::Palette;
use zen_core::model::{ChatMessage, ChatRole, Task, User};

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = " ")]
    status: &'static str,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Priority")]
    priority: &'static str,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Due")]
    due: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.clone(),
            status: status_mark(task),
            title: task.title.clone(),
            priority: task.priority.as_str(),
            tags: tag_list(task),
            due: due_label(task),
        }
    }
}

pub fn tasks_table(tasks: &[Task]) -> String {
    let mut table = Table::new(tasks.iter().map(TaskRow::from));
    table.with(Style::rounded());
    table.to_string()
}

/// One line per task, for the chat transcript.
pub fn tasks_compact(tasks: &[Task], palette: &Palette) -> String {
    tasks
        .iter()
        .map(|task| {
            format!(
                "{} {} {}{}",
                status_mark(task),
                palette.priority(task.priority, task.priority.as_str()),
                task.title,
                palette.mutedize(&format!(" ({})", task.id))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn task_detail(task: &Task, palette: &Palette) -> String {
    let mut lines = vec![
        format!("{} {}", palette.accentize("Task:"), task.title),
        format!("ID: {}", task.id),
        format!(
            "Status: {}",
            if task.completed { "completed" } else { "open" }
        ),
        format!(
            "Priority: {}",
            palette.priority(task.priority, task.priority.as_str())
        ),
    ];
    if let Some(description) = task.description.as_deref() {
        lines.push(format!("Description: {description}"));
    }
    if !task.tags.is_empty() {
        lines.push(format!("Tags: {}", tag_list(task)));
    }
    if task.due_date.is_some() {
        lines.push(format!("Due: {}", due_label(task)));
    }
    if let Some(recurrence) = task.recurring.as_ref() {
        lines.push(format!("Repeats: {}", recurrence.frequency));
    }
    lines.push(palette.mutedize(&format!(
        "Created: {} | Updated: {}",
        short_timestamp(&task.created_at),
        short_timestamp(&task.updated_at)
    )));
    lines.join("\n")
}

pub fn task_json(task: &Task) -> serde_json::Value {
    serde_json::json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "completed": task.completed,
        "priority": task.priority,
        "tags": task.tags,
        "due_date": task.due_date,
        "recurring": task.recurring.as_ref().map(|recurrence| recurrence.frequency),
        "created_at": task.created_at,
        "updated_at": task.updated_at,
    })
}

pub fn tasks_json(tasks: &[Task]) -> serde_json::Value {
    serde_json::Value::Array(tasks.iter().map(task_json).collect())
}

/// The placeholder token is never printed.
pub fn user_json(user: &User) -> serde_json::Value {
    serde_json::json!({
        "id": user.id,
        "name": user.name,
        "email": user.email,
    })
}

pub fn transcript(messages: &[ChatMessage], palette: &Palette) -> String {
    messages
        .iter()
        .map(|message| match message.role {
            ChatRole::User => format!("{} {}", palette.mutedize("you>"), message.content),
            ChatRole::Assistant => format!("{} {}", palette.accentize("zen>"), message.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_mark(task: &Task) -> &'static str {
    if task.completed { "[x]" } else { "[ ]" }
}

fn tag_list(task: &Task) -> String {
    task.tags
        .iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn due_label(task: &Task) -> String {
    task.due_date
        .as_deref()
        .map(short_timestamp)
        .unwrap_or_else(|| "-".to_string())
}

/// RFC 3339 values shortened to minutes; anything else is shown as is.
fn short_timestamp(raw: &str) -> String {
    OffsetDateTime::parse(raw, &Rfc3339)
        .ok()
        .and_then(|parsed| {
            parsed
                .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
                .ok()
        })
        .unwrap_or_else(|| raw.to_string())
}
