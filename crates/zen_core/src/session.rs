use crate::error::AppError;
use crate::locale::Language;
use crate::model::{CommandDescriptor, TaskContext, User};
use crate::storage::json_store::{self, StorePaths};
use crate::store::{TaskFilter, TaskStore};
use time::OffsetDateTime;

/// Everything one signed-in user works against: profile, language, list
/// view and the task list itself.
#[derive(Debug)]
pub struct Session {
    pub user: User,
    pub language: Language,
    pub filter: TaskFilter,
    pub store: TaskStore,
    paths: Option<StorePaths>,
    issued_generation: u64,
    committed_generation: u64,
}

/// An interpretation request that has been issued but not yet applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommand {
    pub generation: u64,
    pub utterance: String,
    pub context: Vec<TaskContext>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Applied(String),
    /// A later command already committed; nothing was changed.
    Superseded,
}

impl Session {
    pub fn login(paths: StorePaths, name: &str, email: &str) -> Result<Self, AppError> {
        if let Some(existing) = json_store::load_user(&paths.user)? {
            return Err(AppError::invalid_input(format!(
                "already logged in as {}; log out first",
                existing.email
            )));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::invalid_input("name is required"));
        }
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::invalid_input("a valid email is required"));
        }

        let stamp = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let user = User {
            id: format!("user-{stamp}"),
            email: email.to_string(),
            name: name.to_string(),
            token: format!("local-token-{stamp}"),
        };
        json_store::save_user(&paths.user, &user)?;
        tracing::debug!(user_id = %user.id, "user logged in");

        Self::with_paths(user, paths)
    }

    pub fn restore(paths: StorePaths) -> Result<Self, AppError> {
        let user = json_store::load_user(&paths.user)?
            .ok_or_else(|| AppError::invalid_input("not logged in; run `zen login` first"))?;
        Self::with_paths(user, paths)
    }

    /// Session without persistence.
    pub fn ephemeral(user: User, store: TaskStore) -> Self {
        Self {
            user,
            language: Language::default(),
            filter: TaskFilter::default(),
            store,
            paths: None,
            issued_generation: 0,
            committed_generation: 0,
        }
    }

    fn with_paths(user: User, paths: StorePaths) -> Result<Self, AppError> {
        let store = TaskStore::open(&paths.tasks)?;
        let mut session = Self::ephemeral(user, store);
        session.paths = Some(paths);
        Ok(session)
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Clears both persisted records and ends the session.
    pub fn logout(self) -> Result<User, AppError> {
        if let Some(paths) = self.paths.as_ref() {
            json_store::clear(paths)?;
        }
        tracing::debug!(user_id = %self.user.id, "user logged out");
        Ok(self.user)
    }

    pub fn reset_view(&mut self) {
        self.filter = TaskFilter::default();
    }

    pub fn begin_command(&mut self, utterance: &str) -> PendingCommand {
        self.issued_generation += 1;
        PendingCommand {
            generation: self.issued_generation,
            utterance: utterance.trim().to_string(),
            context: self.store.context(),
        }
    }

    /// Applies an interpretation outcome unless a newer command has already
    /// landed. Failed interpretations still count as committed.
    pub fn commit<E: std::fmt::Display>(
        &mut self,
        pending: PendingCommand,
        outcome: Result<CommandDescriptor, E>,
    ) -> CommitOutcome {
        if pending.generation <= self.committed_generation {
            tracing::debug!(
                generation = pending.generation,
                committed = self.committed_generation,
                "dropping superseded command"
            );
            return CommitOutcome::Superseded;
        }
        self.committed_generation = pending.generation;

        match outcome {
            Ok(descriptor) => CommitOutcome::Applied(crate::dispatch::dispatch(self, &descriptor)),
            Err(err) => {
                tracing::warn!(error = %err, "interpretation failed");
                CommitOutcome::Applied(
                    crate::locale::text(self.language, crate::locale::Message::NotUnderstood)
                        .to_string(),
                )
            }
        }
    }
}
