use super::Surface;
use crate::assistant::Assistant;
use crate::locale::{self, Language, Message};
use crate::session::{CommitOutcome, Session};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

const LOCALE_PLACEHOLDER: &str = "{locale}";
const LOCALE_ENV_VAR: &str = "ZEN_SPEECH_LOCALE";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("speech recognition is not supported on this platform")]
    Unsupported,
    #[error("no speech was detected")]
    NoSpeech,
    #[error("speech recognition failed: {0}")]
    Failed(String),
}

/// One-shot speech-to-text: a single utterance per call.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn recognize(&self, locale: &str) -> Result<String, VoiceError>;
}

pub struct UnsupportedRecognizer;

#[async_trait]
impl SpeechRecognizer for UnsupportedRecognizer {
    async fn recognize(&self, _locale: &str) -> Result<String, VoiceError> {
        Err(VoiceError::Unsupported)
    }
}

/// Runs an external capture program and reads the transcript from stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    pub fn from_parts(parts: &[String]) -> Option<Self> {
        let (program, args) = parts.split_first()?;
        let program = program.trim();
        if program.is_empty() {
            return None;
        }
        Some(Self {
            program: program.to_string(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    async fn recognize(&self, locale: &str) -> Result<String, VoiceError> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.replace(LOCALE_PLACEHOLDER, locale));
        tracing::debug!(program = %self.program, locale, "starting speech capture");

        let output = tokio::process::Command::new(&self.program)
            .args(args)
            .env(LOCALE_ENV_VAR, locale)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => VoiceError::Unsupported,
                _ => VoiceError::Failed(err.to_string()),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        let transcript = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if transcript.is_empty() {
            return Err(VoiceError::NoSpeech);
        }
        Ok(transcript)
    }
}

pub fn recognizer_from_config(command: &[String]) -> Box<dyn SpeechRecognizer> {
    match CommandRecognizer::from_parts(command) {
        Some(recognizer) => Box::new(recognizer),
        None => Box::new(UnsupportedRecognizer),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceOutcome {
    Busy,
    /// Shown once, when capture turns out to be unsupported.
    Notice(String),
    /// Capture was disabled by an earlier notice.
    Unavailable,
    Silent,
    Failed(String),
    Heard {
        status: String,
        reply: CommitOutcome,
    },
}

pub struct VoiceSurface {
    surface: Surface,
    recognizer: Box<dyn SpeechRecognizer>,
    disabled: AtomicBool,
}

impl VoiceSurface {
    pub fn new(recognizer: Box<dyn SpeechRecognizer>) -> Self {
        Self {
            surface: Surface::new(),
            recognizer,
            disabled: AtomicBool::new(false),
        }
    }

    pub fn is_available(&self) -> bool {
        !self.disabled.load(Ordering::Acquire)
    }

    pub fn listening_status(language: Language) -> &'static str {
        locale::text(language, Message::Listening)
    }

    /// Captures one utterance in the session language and runs it.
    pub async fn capture(
        &self,
        assistant: &Assistant,
        session: &tokio::sync::Mutex<Session>,
    ) -> VoiceOutcome {
        if !self.is_available() {
            return VoiceOutcome::Unavailable;
        }
        let Some(_guard) = self.surface.try_begin() else {
            return VoiceOutcome::Busy;
        };

        let language = session.lock().await.language;
        let transcript = match self.recognizer.recognize(language.speech_locale()).await {
            Ok(transcript) => transcript,
            Err(VoiceError::Unsupported) => {
                tracing::warn!("speech capture unsupported; disabling voice input");
                self.disabled.store(true, Ordering::Release);
                return VoiceOutcome::Notice(
                    locale::text(language, Message::VoiceUnsupported).to_string(),
                );
            }
            Err(VoiceError::NoSpeech) => return VoiceOutcome::Silent,
            Err(err) => {
                tracing::warn!(error = %err, "speech capture failed");
                return VoiceOutcome::Failed(
                    locale::text(language, Message::VoiceFailed).to_string(),
                );
            }
        };

        let status = locale::heard(language, &transcript);
        let pending = session.lock().await.begin_command(&transcript);
        let outcome = assistant.interpret(&pending).await;
        let reply = session.lock().await.commit(pending, outcome);

        VoiceOutcome::Heard { status, reply }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        CommandRecognizer, SpeechRecognizer, UnsupportedRecognizer, VoiceError, VoiceOutcome,
        VoiceSurface, recognizer_from_config,
    };
    use crate::assistant::Assistant;
    use crate::locale::{Language, Message, text};
    use crate::model::User;
    use crate::session::{CommitOutcome, Session};
    use crate::store::TaskStore;
    use tokio::sync::Mutex;

    fn session(language: Language) -> Mutex<Session> {
        Mutex::new(
            Session::ephemeral(
                User {
                    id: "user-1".to_string(),
                    email: "jane@example.com".to_string(),
                    name: "Jane".to_string(),
                    token: "local-token-1".to_string(),
                },
                TaskStore::in_memory(Vec::new()),
            )
            .with_language(language),
        )
    }

    fn command(parts: &[&str]) -> CommandRecognizer {
        let parts: Vec<String> = parts.iter().map(|part| part.to_string()).collect();
        CommandRecognizer::from_parts(&parts).unwrap()
    }

    #[test]
    fn empty_command_falls_back_to_unsupported() {
        assert!(CommandRecognizer::from_parts(&[]).is_none());
        assert!(CommandRecognizer::from_parts(&[" ".to_string()]).is_none());
    }

    #[tokio::test]
    async fn unsupported_capture_shows_notice_once() {
        let voice = VoiceSurface::new(recognizer_from_config(&[]));
        let session = session(Language::Ur);

        let first = voice.capture(&Assistant::offline(), &session).await;
        let second = voice.capture(&Assistant::offline(), &session).await;

        assert_eq!(
            first,
            VoiceOutcome::Notice(text(Language::Ur, Message::VoiceUnsupported).to_string())
        );
        assert_eq!(second, VoiceOutcome::Unavailable);
        assert!(!voice.is_available());
    }

    #[tokio::test]
    async fn missing_program_is_unsupported() {
        let recognizer = command(&["zen-no-such-speech-program"]);

        let err = recognizer.recognize("en-US").await.unwrap_err();

        assert_eq!(err, VoiceError::Unsupported);
        assert_eq!(
            UnsupportedRecognizer.recognize("en-US").await,
            Err(VoiceError::Unsupported)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_output_becomes_transcript() {
        let recognizer = command(&["echo", "hello", "{locale}"]);

        let transcript = recognizer.recognize("ur-PK").await.unwrap();

        assert_eq!(transcript, "hello ur-PK");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_or_silent_program_is_reported() {
        assert!(matches!(
            command(&["false"]).recognize("en-US").await,
            Err(VoiceError::Failed(_))
        ));
        assert_eq!(
            command(&["true"]).recognize("en-US").await,
            Err(VoiceError::NoSpeech)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn heard_utterance_is_dispatched() {
        let voice = VoiceSurface::new(Box::new(command(&["echo", "add buy eggs"])));
        let session = session(Language::En);

        let outcome = voice.capture(&Assistant::offline(), &session).await;

        assert_eq!(
            outcome,
            VoiceOutcome::Heard {
                status: "Heard: \"add buy eggs\"".to_string(),
                reply: CommitOutcome::Applied("✅ Added: buy eggs".to_string()),
            }
        );
        assert_eq!(session.lock().await.store.tasks()[0].title, "buy eggs");
    }
}
