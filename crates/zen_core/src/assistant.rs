use crate::config::Config;
use crate::interpreter::{
    InterpretError, Interpreter, LlmClient, LlmInterpreter, Responder, RuleInterpreter,
};
use crate::locale::{self, Language, Message};
use crate::model::CommandDescriptor;
use crate::session::{CommitOutcome, PendingCommand, Session};
use std::sync::Arc;

/// Pairs the command interpreter with the free-text responder.
#[derive(Clone)]
pub struct Assistant {
    interpreter: Arc<dyn Interpreter>,
    responder: Arc<dyn Responder>,
}

impl Assistant {
    pub fn new(interpreter: Arc<dyn Interpreter>, responder: Arc<dyn Responder>) -> Self {
        Self {
            interpreter,
            responder,
        }
    }

    pub fn offline() -> Self {
        let rules = Arc::new(RuleInterpreter::new());
        Self::new(rules.clone(), rules)
    }

    /// Hosted model when a key is available and `offline` is not set,
    /// otherwise the rule-based interpreter.
    pub fn from_config(config: &Config, offline: bool) -> Self {
        if offline {
            return Self::offline();
        }
        match LlmClient::from_config(config) {
            Some(client) => {
                tracing::debug!(model = client.model(), "using hosted interpreter");
                let llm = Arc::new(LlmInterpreter::new(client));
                Self::new(llm.clone(), llm)
            }
            None => {
                tracing::debug!("no API key set; using offline interpreter");
                Self::offline()
            }
        }
    }

    pub async fn interpret(
        &self,
        pending: &PendingCommand,
    ) -> Result<CommandDescriptor, InterpretError> {
        tracing::debug!(
            generation = pending.generation,
            tasks = pending.context.len(),
            "interpreting utterance"
        );
        self.interpreter
            .interpret(&pending.utterance, &pending.context)
            .await
    }

    /// One full round: snapshot, interpret, dispatch.
    pub async fn handle(&self, session: &mut Session, utterance: &str) -> CommitOutcome {
        let pending = session.begin_command(utterance);
        let outcome = self.interpret(&pending).await;
        session.commit(pending, outcome)
    }

    /// Plain-response variant: never touches the task list.
    pub async fn ask(&self, input: &str, language: Language) -> String {
        match self.responder.respond(input.trim(), language).await {
            Ok(reply) if !reply.trim().is_empty() => reply.trim().to_string(),
            Ok(_) => locale::text(language, Message::NoResponse).to_string(),
            Err(err) => {
                tracing::warn!(error = %err, "free-text reply failed");
                locale::text(language, Message::ConnectionTrouble).to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Assistant;
    use crate::interpreter::{InterpretError, Interpreter, Responder, parse_descriptor};
    use crate::locale::{Language, Message, text};
    use crate::model::{CommandDescriptor, Priority, TaskContext, User};
    use crate::session::{CommitOutcome, Session};
    use crate::store::{TaskStore, filter_tasks};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Replays canned model output and records what it was asked.
    struct Scripted {
        reply: Result<String, InterpretError>,
        seen: Mutex<Vec<(String, usize)>>,
    }

    impl Scripted {
        fn replying(json: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(json.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(InterpretError::unavailable("connection refused")),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Interpreter for Scripted {
        async fn interpret(
            &self,
            utterance: &str,
            context: &[TaskContext],
        ) -> Result<CommandDescriptor, InterpretError> {
            self.seen
                .lock()
                .unwrap()
                .push((utterance.to_string(), context.len()));
            parse_descriptor(&self.reply.clone()?)
        }
    }

    #[async_trait]
    impl Responder for Scripted {
        async fn respond(
            &self,
            _input: &str,
            _language: Language,
        ) -> Result<String, InterpretError> {
            self.reply.clone()
        }
    }

    fn session() -> Session {
        Session::ephemeral(
            User {
                id: "user-1".to_string(),
                email: "jane@example.com".to_string(),
                name: "Jane".to_string(),
                token: "local-token-1".to_string(),
            },
            TaskStore::in_memory(Vec::new()),
        )
    }

    fn applied(outcome: CommitOutcome) -> String {
        match outcome {
            CommitOutcome::Applied(reply) => reply,
            CommitOutcome::Superseded => panic!("command was superseded"),
        }
    }

    #[tokio::test]
    async fn add_appends_one_medium_task() {
        let scripted =
            Scripted::replying("{\"action\":\"ADD\",\"taskData\":{\"title\":\"buy eggs\"}}");
        let assistant = Assistant::new(scripted.clone(), scripted.clone());
        let mut session = session();

        let reply = applied(assistant.handle(&mut session, "Add buy eggs to my list").await);

        assert!(reply.contains("buy eggs"));
        assert_eq!(session.store.len(), 1);
        let task = &session.store.tasks()[0];
        assert_eq!(task.title, "buy eggs");
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
        assert_eq!(
            scripted.seen.lock().unwrap()[0],
            ("Add buy eggs to my list".to_string(), 0)
        );
    }

    #[tokio::test]
    async fn delete_without_target_asks_for_clarification() {
        let assistant = Assistant::offline();
        let mut session = session();
        applied(assistant.handle(&mut session, "add foo bar").await);

        let scripted = Scripted::replying("{\"action\":\"DELETE\"}");
        let assistant = Assistant::new(scripted.clone(), scripted);
        let reply = applied(assistant.handle(&mut session, "delete foo").await);

        assert_eq!(reply, text(Language::En, Message::AskWhichToDelete));
        assert_eq!(session.store.len(), 1);
    }

    #[tokio::test]
    async fn search_filters_case_insensitively() {
        let offline = Assistant::offline();
        let mut session = session();
        applied(offline.handle(&mut session, "add Buy Eggs").await);
        applied(offline.handle(&mut session, "add walk dog").await);

        let scripted = Scripted::replying("{\"action\":\"SEARCH\",\"query\":\"eggs\"}");
        let assistant = Assistant::new(scripted.clone(), scripted);
        applied(assistant.handle(&mut session, "find eggs").await);

        let visible = filter_tasks(session.store.tasks(), &session.filter);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "Buy Eggs");
    }

    #[tokio::test]
    async fn interpreter_failure_returns_localized_error() {
        let scripted = Scripted::failing();
        let assistant = Assistant::new(scripted.clone(), scripted);
        let mut session = session().with_language(Language::Ur);

        let reply = applied(assistant.handle(&mut session, "add milk").await);

        assert_eq!(reply, text(Language::Ur, Message::NotUnderstood));
        assert!(session.store.is_empty());
    }

    #[tokio::test]
    async fn ask_falls_back_on_empty_and_failed_replies() {
        let empty = Scripted::replying("   ");
        let failing = Scripted::failing();
        let answering = Scripted::replying(" Sure. ");

        let empty = Assistant::new(empty.clone(), empty).ask("hi", Language::En).await;
        let failed = Assistant::new(failing.clone(), failing).ask("hi", Language::Ur).await;
        let answered = Assistant::new(answering.clone(), answering)
            .ask("hi", Language::En)
            .await;

        assert_eq!(empty, text(Language::En, Message::NoResponse));
        assert_eq!(failed, text(Language::Ur, Message::ConnectionTrouble));
        assert_eq!(answered, "Sure.");
    }

    #[tokio::test]
    async fn offline_assistant_cannot_answer_free_text() {
        let reply = Assistant::offline().ask("how are you", Language::En).await;

        assert_eq!(reply, text(Language::En, Message::ConnectionTrouble));
    }
}
