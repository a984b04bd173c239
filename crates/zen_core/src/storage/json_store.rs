use crate::error::AppError;
use crate::model::{Task, User};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: u32 = 1;
const TASKS_FILE_NAME: &str = "tasks.json";
const USER_FILE_NAME: &str = "user.json";
const DATA_DIR_ENV_VAR: &str = "ZEN_DATA_DIR";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTasks {
    schema_version: u32,
    tasks: Vec<Task>,
}

/// Locations of the two flat records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    pub tasks: PathBuf,
    pub user: PathBuf,
}

impl StorePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            tasks: dir.join(TASKS_FILE_NAME),
            user: dir.join(USER_FILE_NAME),
        }
    }
}

pub fn data_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(DATA_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("zen"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("zen"))
    }
}

pub fn store_paths() -> Result<StorePaths, AppError> {
    Ok(StorePaths::in_dir(&data_dir()?))
}

pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let stored: StoredTasks =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;

    if stored.schema_version != SCHEMA_VERSION {
        return Err(AppError::invalid_data("schema_version mismatch"));
    }

    Ok(stored.tasks)
}

pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    let stored = StoredTasks {
        schema_version: SCHEMA_VERSION,
        tasks: tasks.to_vec(),
    };
    let content = serde_json::to_string_pretty(&stored)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    write_private(path, &content)?;
    tracing::debug!(path = %path.display(), count = tasks.len(), "task snapshot written");
    Ok(())
}

pub fn load_user(path: &Path) -> Result<Option<User>, AppError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path).map_err(|err| AppError::io(err.to_string()))?;
    let user =
        serde_json::from_str(&content).map_err(|err| AppError::invalid_data(err.to_string()))?;
    Ok(Some(user))
}

pub fn save_user(path: &Path, user: &User) -> Result<(), AppError> {
    let content = serde_json::to_string_pretty(user)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;
    write_private(path, &content)
}

/// Removes both records. Missing files are not an error.
pub fn clear(paths: &StorePaths) -> Result<(), AppError> {
    for path in [&paths.user, &paths.tasks] {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(AppError::io(err.to_string())),
        }
    }
    Ok(())
}

fn write_private(path: &Path, content: &str) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::io(err.to_string()))?;
    }

    std::fs::write(path, content).map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, permissions).map_err(|err| AppError::io(err.to_string()))?;
    }

    Ok(())
}
