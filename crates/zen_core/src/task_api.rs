use crate::error::AppError;
use crate::model::{Task, User};
use crate::session::Session;
use crate::storage::json_store::{self, StorePaths};
use crate::store::{NewTask, TaskFilter, TaskPatch};
use time::OffsetDateTime;

pub fn login(name: &str, email: &str) -> Result<User, AppError> {
    let paths = json_store::store_paths()?;
    login_with_paths(paths, name, email)
}

pub fn logout() -> Result<User, AppError> {
    let paths = json_store::store_paths()?;
    logout_with_paths(paths)
}

pub fn current_user() -> Result<User, AppError> {
    let paths = json_store::store_paths()?;
    current_user_with_paths(&paths)
}

pub fn add_task(draft: NewTask) -> Result<Task, AppError> {
    let paths = json_store::store_paths()?;
    add_task_with_paths(paths, draft)
}

pub fn list_tasks(filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
    let paths = json_store::store_paths()?;
    list_tasks_with_paths(paths, filter)
}

pub fn get_task_by_id(id: &str) -> Result<Task, AppError> {
    let paths = json_store::store_paths()?;
    get_task_by_id_with_paths(paths, id)
}

pub fn toggle_task(id: &str) -> Result<Task, AppError> {
    let paths = json_store::store_paths()?;
    toggle_task_with_paths(paths, id)
}

pub fn edit_task(id: &str, patch: TaskPatch) -> Result<Task, AppError> {
    let paths = json_store::store_paths()?;
    edit_task_with_paths(paths, id, patch)
}

pub fn delete_task(id: &str) -> Result<Task, AppError> {
    let paths = json_store::store_paths()?;
    delete_task_with_paths(paths, id)
}

pub fn roll_recurring_tasks() -> Result<Vec<Task>, AppError> {
    let paths = json_store::store_paths()?;
    roll_recurring_tasks_with_paths(paths, OffsetDateTime::now_utc())
}

fn login_with_paths(paths: StorePaths, name: &str, email: &str) -> Result<User, AppError> {
    Ok(Session::login(paths, name, email)?.user)
}

fn logout_with_paths(paths: StorePaths) -> Result<User, AppError> {
    Session::restore(paths)?.logout()
}

fn current_user_with_paths(paths: &StorePaths) -> Result<User, AppError> {
    json_store::load_user(&paths.user)?
        .ok_or_else(|| AppError::invalid_input("not logged in; run `zen login` first"))
}

fn add_task_with_paths(paths: StorePaths, draft: NewTask) -> Result<Task, AppError> {
    let mut session = Session::restore(paths)?;
    let user_id = session.user.id.clone();
    session.store.add(&user_id, draft)
}

fn list_tasks_with_paths(paths: StorePaths, filter: &TaskFilter) -> Result<Vec<Task>, AppError> {
    Ok(Session::restore(paths)?.store.view(filter))
}

fn get_task_by_id_with_paths(paths: StorePaths, id: &str) -> Result<Task, AppError> {
    let trimmed_id = id.trim();
    if trimmed_id.is_empty() {
        return Err(AppError::invalid_input("id is required"));
    }

    Session::restore(paths)?
        .store
        .get(trimmed_id)
        .cloned()
        .ok_or_else(|| AppError::invalid_input("task not found"))
}

fn toggle_task_with_paths(paths: StorePaths, id: &str) -> Result<Task, AppError> {
    Session::restore(paths)?.store.toggle(id)
}

fn edit_task_with_paths(paths: StorePaths, id: &str, patch: TaskPatch) -> Result<Task, AppError> {
    Session::restore(paths)?.store.edit(id, patch)
}

fn delete_task_with_paths(paths: StorePaths, id: &str) -> Result<Task, AppError> {
    Session::restore(paths)?.store.delete(id)
}

fn roll_recurring_tasks_with_paths(
    paths: StorePaths,
    now: OffsetDateTime,
) -> Result<Vec<Task>, AppError> {
    Session::restore(paths)?.store.roll_recurring(now)
}

#[cfg(test)]
mod tests {
    use super::{
        add_task_with_paths, current_user_with_paths, delete_task_with_paths,
        edit_task_with_paths, get_task_by_id_with_paths, list_tasks_with_paths, login_with_paths,
        logout_with_paths, roll_recurring_tasks_with_paths, toggle_task_with_paths,
    };
    use crate::model::{Frequency, Priority};
    use crate::storage::json_store::{self, StorePaths};
    use crate::store::{NewTask, StatusFilter, TaskFilter, TaskPatch};
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use time::macros::datetime;

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("zen-{nanos}-{name}"))
    }

    fn logged_in(name: &str) -> (PathBuf, StorePaths) {
        let dir = temp_dir(name);
        let paths = StorePaths::in_dir(&dir);
        login_with_paths(paths.clone(), "Jane", "jane@example.com").unwrap();
        (dir, paths)
    }

    #[test]
    fn task_commands_require_login() {
        let dir = temp_dir("no-login");
        let paths = StorePaths::in_dir(&dir);

        let err = add_task_with_paths(paths.clone(), NewTask::titled("milk")).unwrap_err();
        let whoami = current_user_with_paths(&paths).unwrap_err();

        assert_eq!(err.code(), "invalid_input");
        assert!(whoami.message().contains("not logged in"));
    }

    #[test]
    fn add_task_persists_with_owner() {
        let (dir, paths) = logged_in("add");

        let task = add_task_with_paths(
            paths.clone(),
            NewTask {
                title: "  Pay rent ".to_string(),
                priority: Priority::High,
                tags: vec!["#home".to_string(), "home".to_string()],
                due_date: Some("2026-11-01".to_string()),
                ..NewTask::default()
            },
        )
        .unwrap();
        let user = current_user_with_paths(&paths).unwrap();
        let stored = json_store::load_tasks(&paths.tasks).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(task.title, "Pay rent");
        assert_eq!(task.user_id, user.id);
        assert_eq!(task.tags, vec!["home".to_string()]);
        assert_eq!(stored, vec![task]);
    }

    #[test]
    fn add_task_rejects_blank_title_and_bad_due_date() {
        let (dir, paths) = logged_in("add-invalid");

        let blank = add_task_with_paths(paths.clone(), NewTask::titled("   ")).unwrap_err();
        let bad_due = add_task_with_paths(
            paths.clone(),
            NewTask {
                due_date: Some("next tuesday".to_string()),
                ..NewTask::titled("dentist")
            },
        )
        .unwrap_err();
        let stored = json_store::load_tasks(&paths.tasks).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(blank.message(), "title is required");
        assert_eq!(bad_due.code(), "invalid_input");
        assert!(stored.is_empty());
    }

    #[test]
    fn list_tasks_filters_and_sorts() {
        let (dir, paths) = logged_in("list");
        add_task_with_paths(paths.clone(), NewTask::titled("low one")).unwrap();
        let high = add_task_with_paths(
            paths.clone(),
            NewTask {
                priority: Priority::High,
                ..NewTask::titled("urgent thing")
            },
        )
        .unwrap();
        let done = add_task_with_paths(paths.clone(), NewTask::titled("done thing")).unwrap();
        toggle_task_with_paths(paths.clone(), &done.id).unwrap();

        let all = list_tasks_with_paths(paths.clone(), &TaskFilter::default()).unwrap();
        let active = list_tasks_with_paths(
            paths.clone(),
            &TaskFilter {
                status: StatusFilter::Active,
                search: "THING".to_string(),
            },
        )
        .unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, high.id);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, high.id);
    }

    #[test]
    fn get_edit_toggle_delete_round_trip() {
        let (dir, paths) = logged_in("crud");
        let task = add_task_with_paths(paths.clone(), NewTask::titled("draft")).unwrap();

        let edited = edit_task_with_paths(
            paths.clone(),
            &task.id,
            TaskPatch {
                title: Some("final".to_string()),
                description: Some("with notes".to_string()),
                ..TaskPatch::default()
            },
        )
        .unwrap();
        let toggled = toggle_task_with_paths(paths.clone(), &task.id).unwrap();
        let fetched = get_task_by_id_with_paths(paths.clone(), &format!(" {} ", task.id)).unwrap();
        let deleted = delete_task_with_paths(paths.clone(), &task.id).unwrap();
        let missing = get_task_by_id_with_paths(paths.clone(), &task.id).unwrap_err();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(edited.title, "final");
        assert_eq!(edited.description.as_deref(), Some("with notes"));
        assert!(toggled.completed);
        assert_eq!(fetched, toggled);
        assert_eq!(deleted.id, task.id);
        assert_eq!(missing.message(), "task not found");
    }

    #[test]
    fn roll_recurring_reopens_completed_tasks() {
        let (dir, paths) = logged_in("recur");
        let task = add_task_with_paths(
            paths.clone(),
            NewTask {
                due_date: Some("2026-01-31".to_string()),
                recurring: Some(Frequency::Monthly),
                ..NewTask::titled("pay bills")
            },
        )
        .unwrap();
        toggle_task_with_paths(paths.clone(), &task.id).unwrap();

        let rolled =
            roll_recurring_tasks_with_paths(paths.clone(), datetime!(2026-02-01 09:00 UTC))
                .unwrap();
        let again =
            roll_recurring_tasks_with_paths(paths.clone(), datetime!(2026-02-01 09:00 UTC))
                .unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(rolled.len(), 1);
        assert!(!rolled[0].completed);
        assert!(rolled[0].due_date.as_deref().unwrap().starts_with("2026-02-28"));
        assert!(again.is_empty());
    }

    #[test]
    fn logout_clears_everything() {
        let (dir, paths) = logged_in("logout");
        add_task_with_paths(paths.clone(), NewTask::titled("milk")).unwrap();

        let user = logout_with_paths(paths.clone()).unwrap();
        let whoami = current_user_with_paths(&paths);
        let relogin = login_with_paths(paths.clone(), "Joe", "joe@example.com").unwrap();
        let tasks = list_tasks_with_paths(paths.clone(), &TaskFilter::default()).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(user.name, "Jane");
        assert!(whoami.is_err());
        assert_eq!(relogin.name, "Joe");
        assert!(tasks.is_empty());
    }
}
