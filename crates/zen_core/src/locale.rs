use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    En,
    Ur,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ur => "ur",
        }
    }

    /// Recognition locale handed to the speech-to-text collaborator.
    pub fn speech_locale(self) -> &'static str {
        match self {
            Self::En => "en-US",
            Self::Ur => "ur-PK",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::En => Self::Ur,
            Self::Ur => Self::En,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "ur" | "urdu" => Ok(Self::Ur),
            other => Err(format!("unsupported language '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    NotUnderstood,
    ChatFallback,
    AskWhatToAdd,
    AskWhichToDelete,
    AskWhichCompleted,
    AskWhichToUpdate,
    TaskDeleted,
    TaskToggled,
    SomethingWentWrong,
    NoResponse,
    ConnectionTrouble,
    Listening,
    VoiceUnsupported,
    VoiceDisabled,
    VoiceFailed,
    NoTasks,
    NoMatches,
}

pub fn text(language: Language, message: Message) -> &'static str {
    match (language, message) {
        (Language::En, Message::NotUnderstood) => {
            "I processed that, but I'm not sure what action to take."
        }
        (Language::Ur, Message::NotUnderstood) => "مجھے سمجھ نہیں آئی کہ کیا عمل کرنا ہے۔",
        (Language::En, Message::ChatFallback) => "I'm not sure how to answer that.",
        (Language::Ur, Message::ChatFallback) => "مجھے نہیں معلوم کہ اس کا جواب کیسے دوں۔",
        (Language::En, Message::AskWhatToAdd) => "What task would you like to add?",
        (Language::Ur, Message::AskWhatToAdd) => "آپ کون سا ٹاسک شامل کرنا چاہتے ہیں؟",
        (Language::En, Message::AskWhichToDelete) => "Which task should I delete?",
        (Language::Ur, Message::AskWhichToDelete) => "مجھے کون سا ٹاسک ختم کرنا چاہئے؟",
        (Language::En, Message::AskWhichCompleted) => "Which task did you complete?",
        (Language::Ur, Message::AskWhichCompleted) => "آپ نے کون سا ٹاسک مکمل کیا؟",
        (Language::En, Message::AskWhichToUpdate) => "Which task should I update?",
        (Language::Ur, Message::AskWhichToUpdate) => "مجھے کون سا ٹاسک اپ ڈیٹ کرنا چاہئے؟",
        (Language::En, Message::TaskDeleted) => "🗑️ Task deleted.",
        (Language::Ur, Message::TaskDeleted) => "🗑️ ٹاسک ختم کر دیا گیا۔",
        (Language::En, Message::TaskToggled) => "✔️ Task updated.",
        (Language::Ur, Message::TaskToggled) => "✔️ ٹاسک اپ ڈیٹ ہو گیا۔",
        (Language::En, Message::SomethingWentWrong) => "Something went wrong.",
        (Language::Ur, Message::SomethingWentWrong) => "کچھ غلط ہو گیا۔",
        (Language::En, Message::NoResponse) => "I couldn't generate a response.",
        (Language::Ur, Message::NoResponse) => "میں جواب نہیں دے سکا۔",
        (Language::En, Message::ConnectionTrouble) => {
            "Sorry, I'm having trouble connecting right now."
        }
        (Language::Ur, Message::ConnectionTrouble) => {
            "معذرت، مجھے اس وقت رابطہ کرنے میں دشواری ہو رہی ہے۔"
        }
        (Language::En, Message::Listening) => "Listening...",
        (Language::Ur, Message::Listening) => "سن رہا ہوں...",
        (Language::En, Message::VoiceUnsupported) => {
            "Speech recognition is not supported on this platform."
        }
        (Language::Ur, Message::VoiceUnsupported) => {
            "اس پلیٹ فارم پر آواز کی شناخت دستیاب نہیں ہے۔"
        }
        (Language::En, Message::VoiceDisabled) => "Voice input is disabled.",
        (Language::Ur, Message::VoiceDisabled) => "آواز سے ان پٹ بند ہے۔",
        (Language::En, Message::VoiceFailed) => "Error occurred.",
        (Language::Ur, Message::VoiceFailed) => "ایک غلطی ہو گئی۔",
        (Language::En, Message::NoTasks) => "No tasks found. Try adding one!",
        (Language::Ur, Message::NoTasks) => "کوئی ٹاسک نہیں ملا۔ ایک نیا ٹاسک شامل کریں!",
        (Language::En, Message::NoMatches) => "No matches found.",
        (Language::Ur, Message::NoMatches) => "کوئی ٹاسک نہیں ملا۔",
    }
}

pub fn task_added(language: Language, title: &str) -> String {
    match language {
        Language::En => format!("✅ Added: {title}"),
        Language::Ur => format!("✅ شامل کر دیا گیا: {title}"),
    }
}

pub fn task_edited(language: Language, title: &str) -> String {
    match language {
        Language::En => format!("✏️ Updated: {title}"),
        Language::Ur => format!("✏️ اپ ڈیٹ ہو گیا: {title}"),
    }
}

pub fn filtering_for(language: Language, query: &str) -> String {
    match language {
        Language::En => format!("🔍 Filtering for: {query}"),
        Language::Ur => format!("🔍 تلاش جاری ہے: {query}"),
    }
}

pub fn heard(language: Language, transcript: &str) -> String {
    match language {
        Language::En => format!("Heard: \"{transcript}\""),
        Language::Ur => format!("سنا: \"{transcript}\""),
    }
}
