use crate::error::AppError;
use crate::model::{Frequency, Priority, Recurrence, Task, TaskContext};
use crate::storage::json_store;
use std::cmp::Reverse;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Duration, Month, OffsetDateTime};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub fn admits(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.completed,
            Self::Completed => task.completed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" | "pending" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(format!("unknown filter '{other}'")),
        }
    }
}

/// Combined list filter: completion bucket plus search text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: StatusFilter,
    pub search: String,
}

impl TaskFilter {
    pub fn admits(&self, task: &Task) -> bool {
        self.status.admits(task) && task.matches_search(&self.search)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub tags: Vec<String>,
    pub due_date: Option<String>,
    pub recurring: Option<Frequency>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial edit. `None` leaves a field untouched; an empty description or
/// due date clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
    pub due_date: Option<String>,
    pub recurring: Option<Frequency>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
            && self.due_date.is_none()
            && self.recurring.is_none()
    }
}

/// Ordered task list. Every mutation builds the next full list, writes it
/// as a snapshot, then replaces the in-memory list.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    snapshot_path: Option<PathBuf>,
}

impl TaskStore {
    pub fn open(path: &Path) -> Result<Self, AppError> {
        Ok(Self {
            tasks: json_store::load_tasks(path)?,
            snapshot_path: Some(path.to_path_buf()),
        })
    }

    pub fn in_memory(tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            snapshot_path: None,
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        let trimmed = id.trim();
        self.tasks.iter().find(|task| task.id == trimmed)
    }

    pub fn context(&self) -> Vec<TaskContext> {
        self.tasks.iter().map(Task::context).collect()
    }

    /// Filtered tasks in display order.
    pub fn view(&self, filter: &TaskFilter) -> Vec<Task> {
        let mut visible = filter_tasks(&self.tasks, filter);
        sort_by_priority(&mut visible);
        visible
    }

    pub fn add(&mut self, user_id: &str, draft: NewTask) -> Result<Task, AppError> {
        let title = required_title(&draft.title)?;
        let now = OffsetDateTime::now_utc();
        let timestamp = format_timestamp(now)?;
        let due_date = match draft.due_date.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(normalize_due_date(raw)?),
            _ => None,
        };

        let task = Task {
            id: next_task_id(&self.tasks, now),
            user_id: user_id.to_string(),
            title,
            description: non_blank(draft.description),
            completed: false,
            priority: draft.priority,
            tags: normalize_tags(draft.tags),
            due_date,
            recurring: draft.recurring.map(|frequency| Recurrence {
                frequency,
                last_rescheduled: None,
            }),
            created_at: timestamp.clone(),
            updated_at: timestamp,
        };

        let mut next = self.tasks.clone();
        next.push(task.clone());
        self.commit(next)?;

        Ok(task)
    }

    pub fn toggle(&mut self, id: &str) -> Result<Task, AppError> {
        self.update_one(id, |task, now| {
            task.completed = !task.completed;
            touch(task, now)
        })
    }

    pub fn edit(&mut self, id: &str, patch: TaskPatch) -> Result<Task, AppError> {
        if patch.is_empty() {
            return Err(AppError::invalid_input("nothing to update"));
        }

        let title = patch.title.as_deref().map(required_title).transpose()?;
        let due_date = match patch.due_date.as_deref() {
            Some(raw) if raw.trim().is_empty() => Some(None),
            Some(raw) => Some(Some(normalize_due_date(raw)?)),
            None => None,
        };

        self.update_one(id, |task, now| {
            if let Some(title) = title {
                task.title = title;
            }
            if let Some(description) = patch.description {
                task.description = non_blank(Some(description));
            }
            if let Some(priority) = patch.priority {
                task.priority = priority;
            }
            if let Some(tags) = patch.tags {
                task.tags = normalize_tags(tags);
            }
            if let Some(due_date) = due_date {
                task.due_date = due_date;
            }
            if let Some(frequency) = patch.recurring {
                let last_rescheduled = task
                    .recurring
                    .take()
                    .and_then(|recurrence| recurrence.last_rescheduled);
                task.recurring = Some(Recurrence {
                    frequency,
                    last_rescheduled,
                });
            }
            touch(task, now)
        })
    }

    pub fn delete(&mut self, id: &str) -> Result<Task, AppError> {
        let trimmed_id = required_id(id)?;
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == trimmed_id)
            .ok_or_else(|| AppError::invalid_input("task not found"))?;

        let mut next = self.tasks.clone();
        let removed = next.remove(index);
        self.commit(next)?;

        Ok(removed)
    }

    /// Reopens completed recurring tasks with their due date advanced by
    /// one period.
    pub fn roll_recurring(&mut self, now: OffsetDateTime) -> Result<Vec<Task>, AppError> {
        let timestamp = format_timestamp(now)?;
        let mut next = self.tasks.clone();
        let mut rolled = Vec::new();

        for task in &mut next {
            let Some(recurrence) = task.recurring.as_mut() else {
                continue;
            };
            if !task.completed {
                continue;
            }

            task.due_date = Some(advance_due_date(
                task.due_date.as_deref(),
                recurrence.frequency,
                now,
            )?);
            recurrence.last_rescheduled = Some(timestamp.clone());
            task.completed = false;
            touch(task, now)?;
            rolled.push(task.clone());
        }

        if !rolled.is_empty() {
            self.commit(next)?;
        }

        Ok(rolled)
    }

    fn update_one<F>(&mut self, id: &str, apply: F) -> Result<Task, AppError>
    where
        F: FnOnce(&mut Task, OffsetDateTime) -> Result<(), AppError>,
    {
        let trimmed_id = required_id(id)?;
        let mut next = self.tasks.clone();
        let task = next
            .iter_mut()
            .find(|task| task.id == trimmed_id)
            .ok_or_else(|| AppError::invalid_input("task not found"))?;

        apply(task, OffsetDateTime::now_utc())?;
        let updated = task.clone();
        self.commit(next)?;

        Ok(updated)
    }

    fn commit(&mut self, next: Vec<Task>) -> Result<(), AppError> {
        if let Some(path) = self.snapshot_path.as_deref() {
            json_store::save_tasks(path, &next)?;
        }
        self.tasks = next;
        Ok(())
    }
}

pub fn filter_tasks(tasks: &[Task], filter: &TaskFilter) -> Vec<Task> {
    tasks
        .iter()
        .filter(|task| filter.admits(task))
        .cloned()
        .collect()
}

/// Stable: equal priorities keep their relative order.
pub fn sort_by_priority(tasks: &mut [Task]) {
    tasks.sort_by_key(|task| Reverse(task.priority.weight()));
}

pub fn now_timestamp() -> Result<String, AppError> {
    format_timestamp(OffsetDateTime::now_utc())
}

fn format_timestamp(at: OffsetDateTime) -> Result<String, AppError> {
    at.format(&Rfc3339)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

/// Bumps `updated_at`, never letting it fall behind `created_at`.
fn touch(task: &mut Task, now: OffsetDateTime) -> Result<(), AppError> {
    let created = OffsetDateTime::parse(&task.created_at, &Rfc3339).ok();
    task.updated_at = match created {
        Some(created) if created > now => task.created_at.clone(),
        _ => format_timestamp(now)?,
    };
    Ok(())
}

fn next_task_id(existing: &[Task], now: OffsetDateTime) -> String {
    let mut stamp = now.unix_timestamp_nanos();
    loop {
        let candidate = format!("task-{stamp}");
        if !existing.iter().any(|task| task.id == candidate) {
            return candidate;
        }
        stamp += 1;
    }
}

fn required_id(id: &str) -> Result<&str, AppError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }
    Ok(trimmed)
}

fn required_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("title is required"));
    }
    Ok(trimmed.to_string())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Trimmed, deduplicated, first-seen order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let trimmed = tag.trim().trim_start_matches('#').trim();
        if trimmed.is_empty() || normalized.iter().any(|existing| existing == trimmed) {
            continue;
        }
        normalized.push(trimmed.to_string());
    }
    normalized
}

/// Accepts an RFC 3339 timestamp or a plain `YYYY-MM-DD` date.
pub fn normalize_due_date(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(trimmed, &Rfc3339) {
        return format_timestamp(parsed);
    }
    if Date::parse(trimmed, format_description!("[year]-[month]-[day]")).is_ok() {
        return Ok(trimmed.to_string());
    }
    Err(AppError::invalid_input(
        "due date must be RFC3339 or YYYY-MM-DD",
    ))
}

fn advance_due_date(
    current: Option<&str>,
    frequency: Frequency,
    now: OffsetDateTime,
) -> Result<String, AppError> {
    let date_format = format_description!("[year]-[month]-[day]");

    if let Some(raw) = current {
        if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
            let advanced = parsed.replace_date(advance_date(parsed.date(), frequency)?);
            return format_timestamp(advanced);
        }
        if let Ok(date) = Date::parse(raw, date_format) {
            return advance_date(date, frequency)?
                .format(date_format)
                .map_err(|err| AppError::invalid_data(err.to_string()));
        }
    }

    advance_date(now.date(), frequency)?
        .format(date_format)
        .map_err(|err| AppError::invalid_data(err.to_string()))
}

fn advance_date(date: Date, frequency: Frequency) -> Result<Date, AppError> {
    match frequency {
        Frequency::Daily => step_days(date, 1),
        Frequency::Weekly => step_days(date, 7),
        Frequency::Monthly => {
            let (year, month) = match date.month() {
                Month::December => (date.year() + 1, Month::January),
                other => (date.year(), other.next()),
            };
            let day = date.day().min(time::util::days_in_year_month(year, month));
            Date::from_calendar_date(year, month, day)
                .map_err(|err| AppError::invalid_data(err.to_string()))
        }
    }
}

fn step_days(date: Date, days: i64) -> Result<Date, AppError> {
    date.checked_add(Duration::days(days)).ok_or_else(|| {
        AppError::invalid_data("due date cannot be advanced past the calendar range")
    })
}
